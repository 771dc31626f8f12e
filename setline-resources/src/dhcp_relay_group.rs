//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use setline_engine::delete::render_delete_blocks;
use setline_engine::identity::{DEFAULT_ROUTING_INSTANCE, Identity, KeySegment};
use setline_engine::resource::Resource;
use setline_engine::schema::{
    Block, Check, Field, Format, ListStyle, Quoting, Rule,
};

use crate::{instance_dependencies, instance_prefix};

pub static SCHEMA: Lazy<Block> = Lazy::new(load_schema);

static KEYS: &[KeySegment] = &[
    KeySegment::new("name"),
    KeySegment::with_default("routing_instance", DEFAULT_ROUTING_INSTANCE),
    KeySegment::with_default("version", "v4"),
];

// Fields only DHCPv6 relay groups accept.
const V6_ONLY: &[&str] = &[
    "exclude_relay_agent_identifier",
    "relay_agent_interface_id",
    "relay_agent_option_79",
    "relay_agent_remote_id",
    "route_suppression_access_internal",
    "vendor_specific_information_host_name",
    "vendor_specific_information_location",
    "overrides.allow_snooped_clients",
];

// Fields only DHCPv4 relay groups accept.
const V4_ONLY: &[&str] = &[
    "client_response_ttl",
    "source_ip_change",
    "relay_option_82",
    "overrides.always_write_giaddr",
    "overrides.always_write_option_82",
    "overrides.bootp_support",
    "overrides.proxy_mode",
    "overrides.replace_ip_source_with_giaddr",
];

const SERVER_MATCH_ACTIONS: &[&str] = &["create-relay-entry", "forward-only"];

/// DHCP relay group, `forwarding-options dhcp-relay [dhcpv6] group <name>`.
#[derive(Debug)]
pub struct DhcpRelayGroup;

// ===== impl DhcpRelayGroup =====

impl DhcpRelayGroup {
    // Lines tearing down the overrides of a group, leaving the rest intact.
    pub fn reset_overrides(identity: &Identity) -> Vec<String> {
        render_delete_blocks(&Self::address(identity), &["overrides"])
    }
}

impl Resource for DhcpRelayGroup {
    const TYPE_NAME: &'static str = "junos_forwardingoptions_dhcprelay_group";

    fn schema() -> &'static Block {
        &SCHEMA
    }

    fn keys() -> &'static [KeySegment] {
        KEYS
    }

    fn address(identity: &Identity) -> String {
        let mut address = instance_prefix(identity);
        address.push_str("forwarding-options dhcp-relay ");
        if identity.get("version") == Some("v6") {
            address.push_str("dhcpv6 ");
        }
        address.push_str("group ");
        address.push_str(identity.get("name").unwrap_or_default());
        address
    }

    fn dependencies(identity: &Identity) -> Vec<String> {
        instance_dependencies(identity)
    }
}

// ===== helper functions =====

fn load_schema() -> Block {
    Block::root("dhcp_relay_group")
        .field(
            Field::string("name", "")
                .key()
                .check(Check::Length(1, 64))
                .check(Check::Format(Format::Default)),
        )
        .field(
            Field::string("routing_instance", "")
                .key()
                .default_value(DEFAULT_ROUTING_INSTANCE)
                .check(Check::Length(1, 63))
                .check(Check::Format(Format::Default)),
        )
        .field(
            Field::string("version", "")
                .key()
                .default_value("v4")
                .check(Check::OneOf(&["v4", "v6"])),
        )
        .field(
            Field::string("description", "description")
                .quoted(Quoting::Always)
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::string("access_profile", "access-profile")
                .quoted(Quoting::Always)
                .check(Check::Length(1, 250))
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::string("active_server_group", "active-server-group")
                .check(Check::Length(1, 64))
                .check(Check::Format(Format::Default)),
        )
        .field(Field::flag(
            "active_server_group_allow_server_change",
            "active-server-group allow-server-change",
        ))
        .field(
            Field::string("authentication_password", "authentication password")
                .quoted(Quoting::Always)
                .check(Check::Length(1, 64))
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::int("client_response_ttl", "client-response-ttl")
                .check(Check::Range(1, 255)),
        )
        .field(
            Field::string("dynamic_profile", "dynamic-profile")
                .quoted(Quoting::Always)
                .check(Check::Length(1, 80))
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(Field::flag(
            "dynamic_profile_aggregate_clients",
            "dynamic-profile aggregate-clients",
        ))
        .field(
            Field::string(
                "dynamic_profile_aggregate_clients_action",
                "dynamic-profile aggregate-clients",
            )
            .implies("dynamic_profile_aggregate_clients")
            .check(Check::OneOf(&["merge", "replace"])),
        )
        .field(Field::flag(
            "exclude_relay_agent_identifier",
            "exclude-relay-agent-identifier",
        ))
        .field(Field::flag("forward_only", "forward-only"))
        .field(
            Field::string(
                "forward_only_routing_instance",
                "forward-only routing-instance",
            )
            .implies("forward_only")
            .check(Check::Format(Format::Default)),
        )
        .field(Field::flag(
            "relay_agent_interface_id",
            "relay-agent-interface-id",
        ))
        .field(Field::flag("relay_agent_option_79", "relay-agent-option-79"))
        .field(Field::flag("relay_agent_remote_id", "relay-agent-remote-id"))
        .field(Field::flag(
            "remote_id_mismatch_disconnect",
            "remote-id-mismatch disconnect",
        ))
        .field(Field::flag(
            "route_suppression_access",
            "route-suppression access",
        ))
        .field(Field::flag(
            "route_suppression_access_internal",
            "route-suppression access-internal",
        ))
        .field(Field::flag(
            "route_suppression_destination",
            "route-suppression destination",
        ))
        .field(
            Field::string(
                "server_match_default_action",
                "server-match default-action",
            )
            .check(Check::OneOf(SERVER_MATCH_ACTIONS)),
        )
        .field(
            Field::string("service_profile", "service-profile")
                .quoted(Quoting::Always)
                .check(Check::Length(1, 254))
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::int(
                "short_cycle_protection_lockout_max_time",
                "short-cycle-protection lockout-max-time",
            )
            .check(Check::Range(1, 86400)),
        )
        .field(
            Field::int(
                "short_cycle_protection_lockout_min_time",
                "short-cycle-protection lockout-min-time",
            )
            .check(Check::Range(1, 86400)),
        )
        .field(Field::flag("source_ip_change", "source-ip-change"))
        .field(Field::flag(
            "vendor_specific_information_host_name",
            "vendor-specific-information host-name",
        ))
        .field(Field::flag(
            "vendor_specific_information_location",
            "vendor-specific-information location",
        ))
        .field(
            Field::set(
                "authentication_username_include",
                "authentication username-include",
                ListStyle::Lines,
            )
            .check(Check::OneOf(&[
                "circuit-type",
                "client-id",
                "interface-name",
                "mac-address",
                "relay-agent-remote-id",
                "user-prefix",
            ])),
        )
        .block(interface_block())
        .block(lease_time_validation_block())
        .block(overrides_block())
        .block(relay_option_82_block())
        .block(server_match_address_block())
        .rule(Rule::gate("version", "v4", V6_ONLY))
        .rule(Rule::gate("version", "v6", V4_ONLY))
        .rule(Rule::requires(
            "active_server_group_allow_server_change",
            &["active_server_group"],
        ))
        .rule(Rule::requires(
            "dynamic_profile_aggregate_clients",
            &["dynamic_profile"],
        ))
        .rule(Rule::requires(
            "dynamic_profile_aggregate_clients_action",
            &["dynamic_profile_aggregate_clients"],
        ))
        .rule(Rule::requires(
            "forward_only_routing_instance",
            &["forward_only"],
        ))
        .rule(Rule::requires(
            "short_cycle_protection_lockout_max_time",
            &["short_cycle_protection_lockout_min_time"],
        ))
        .rule(Rule::requires(
            "short_cycle_protection_lockout_min_time",
            &["short_cycle_protection_lockout_max_time"],
        ))
        .rule(Rule::conflicts(
            "route_suppression_access",
            &["route_suppression_access_internal"],
        ))
}

fn interface_block() -> Block {
    Block::repeated("interface", "interface", &["name"])
        .field(
            Field::string("name", "")
                .key()
                .check(Check::Format(Format::InterfaceName)),
        )
        .field(
            Field::string("access_profile", "access-profile")
                .quoted(Quoting::Always)
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::string("description", "description")
                .quoted(Quoting::Always)
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(
            Field::string("dynamic_profile", "dynamic-profile")
                .quoted(Quoting::Always)
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(Field::flag("exclude", "exclude"))
        .field(
            Field::string("service_profile", "service-profile")
                .quoted(Quoting::Always)
                .check(Check::Format(Format::NoDoubleQuote)),
        )
        .field(Field::flag("trace", "trace"))
        .field(
            Field::string("upto", "upto")
                .check(Check::Format(Format::InterfaceName)),
        )
        .rule(Rule::conflicts(
            "exclude",
            &[
                "access_profile",
                "description",
                "dynamic_profile",
                "service_profile",
                "trace",
                "upto",
            ],
        ))
}

fn lease_time_validation_block() -> Block {
    Block::singleton("lease_time_validation", "lease-time-validation")
        .allow_empty()
        .field(
            Field::int("lease_time_threshold", "lease-time-threshold")
                .check(Check::Range(60, 2_147_483_647)),
        )
        .field(Field::flag("violation_action_drop", "violation-action drop"))
}

fn overrides_block() -> Block {
    Block::singleton("overrides", "overrides")
        .field(Field::flag("allow_snooped_clients", "allow-snooped-clients"))
        .field(Field::flag("always_write_giaddr", "always-write-giaddr"))
        .field(Field::flag("always_write_option_82", "always-write-option-82"))
        .field(
            Field::int("asymmetric_lease_time", "asymmetric-lease-time")
                .check(Check::Range(600, 86400)),
        )
        .field(Field::flag("bootp_support", "bootp-support"))
        .field(Field::flag("delay_authentication", "delay-authentication"))
        .field(Field::flag(
            "delete_binding_on_renegotiation",
            "delete-binding-on-renegotiation",
        ))
        .field(
            Field::string("dual_stack", "dual-stack")
                .check(Check::Format(Format::Default)),
        )
        .field(
            Field::int("interface_client_limit", "interface-client-limit")
                .check(Check::Range(1, 500_000)),
        )
        .field(Field::flag(
            "no_allow_snooped_clients",
            "no-allow-snooped-clients",
        ))
        .field(Field::flag("no_bind_on_request", "no-bind-on-request"))
        .field(Field::flag("proxy_mode", "proxy-mode"))
        .field(
            Field::string("relay_source", "relay-source")
                .check(Check::Format(Format::InterfaceName)),
        )
        .field(Field::flag(
            "replace_ip_source_with_giaddr",
            "replace-ip-source-with giaddr",
        ))
        .field(Field::flag("send_release_on_delete", "send-release-on-delete"))
        .rule(Rule::conflicts(
            "allow_snooped_clients",
            &["no_allow_snooped_clients"],
        ))
}

fn relay_option_82_block() -> Block {
    Block::singleton("relay_option_82", "relay-option-82")
        .allow_empty()
        .field(Field::flag("circuit_id", "circuit-id"))
        .field(Field::flag(
            "exclude_relay_agent_identifier",
            "exclude-relay-agent-identifier",
        ))
        .field(Field::flag("link_selection", "link-selection"))
        .field(Field::flag("remote_id", "remote-id"))
        .field(Field::flag("server_id_override", "server-id-override"))
        .field(Field::flag(
            "vendor_specific_host_name",
            "vendor-specific host-name",
        ))
}

fn server_match_address_block() -> Block {
    Block::repeated(
        "server_match_address",
        "server-match address",
        &["address"],
    )
    .field(Field::string("address", "").key())
    .field(
        Field::string("action", "")
            .required()
            .check(Check::OneOf(SERVER_MATCH_ACTIONS)),
    )
}
