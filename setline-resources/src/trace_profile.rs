//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use setline_engine::identity::{DEFAULT_ROUTING_INSTANCE, Identity, KeySegment};
use setline_engine::resource::Resource;
use setline_engine::schema::{Block, Check, Field, Format, Quoting, Rule};

use crate::{instance_dependencies, instance_prefix};

pub static SCHEMA: Lazy<Block> = Lazy::new(load_schema);

static KEYS: &[KeySegment] = &[
    KeySegment::new("protocol"),
    KeySegment::with_default("routing_instance", DEFAULT_ROUTING_INSTANCE),
];

const PROTOCOLS: &[&str] = &[
    "bfd", "bgp", "isis", "ldp", "mpls", "ospf", "ospf3", "pim", "rip",
    "ripng", "rsvp",
];

/// Trace options of a routing protocol,
/// `protocols <protocol> traceoptions`.
#[derive(Debug)]
pub struct TraceProfile;

// ===== impl TraceProfile =====

impl Resource for TraceProfile {
    const TYPE_NAME: &'static str = "junos_protocols_traceoptions";

    fn schema() -> &'static Block {
        &SCHEMA
    }

    fn keys() -> &'static [KeySegment] {
        KEYS
    }

    fn address(identity: &Identity) -> String {
        let protocol = identity.get("protocol").unwrap_or_default();
        let prefix = instance_prefix(identity);
        format!("{prefix}protocols {protocol} traceoptions")
    }

    fn dependencies(identity: &Identity) -> Vec<String> {
        instance_dependencies(identity)
    }
}

// ===== helper functions =====

fn load_schema() -> Block {
    Block::root("trace_profile")
        .field(
            Field::string("protocol", "")
                .key()
                .check(Check::OneOf(PROTOCOLS)),
        )
        .field(
            Field::string("routing_instance", "")
                .key()
                .default_value(DEFAULT_ROUTING_INSTANCE)
                .check(Check::Format(Format::Default)),
        )
        .field(Field::flag("no_remote_trace", "no-remote-trace"))
        .block(
            Block::singleton("file", "file")
                .field(
                    Field::string("filename", "")
                        .quoted(Quoting::IfNeeded)
                        .check(Check::Length(1, 250))
                        .check(Check::Format(Format::NoDoubleQuote)),
                )
                .field(
                    Field::int("files", "files").check(Check::Range(2, 1000)),
                )
                .field(
                    Field::size("size", "size")
                        .check(Check::Range(10_240, 1_073_741_824)),
                )
                .field(Field::flag("replace", "replace"))
                .field(Field::flag("world_readable", "world-readable"))
                .field(Field::flag("no_world_readable", "no-world-readable"))
                .rule(Rule::conflicts(
                    "world_readable",
                    &["no_world_readable"],
                )),
        )
        .block(
            Block::repeated("flag", "flag", &["name"])
                .field(
                    Field::string("name", "")
                        .key()
                        .check(Check::Format(Format::Default)),
                )
                .field(Field::flag("detail", "detail"))
                .field(Field::flag("disable", "disable"))
                .field(Field::flag("receive", "receive"))
                .field(Field::flag("send", "send"))
                .rule(Rule::conflicts(
                    "disable",
                    &["detail", "receive", "send"],
                )),
        )
        .rule(Rule::at_least_one_of(&["file", "flag"]))
}
