//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_engine::error::{Error, ParseError};
use setline_engine::identity::Identity;
use setline_engine::parse::{Dispatcher, Handler, Matcher, Parser};
use setline_engine::render::render;
use setline_engine::tree::{Node, Scalar, Value};

use crate::fixtures::{KEYS, PREFIX, SCHEMA, group};
use crate::render::full_tree;

//
// Helper functions.
//

fn seed() -> Node {
    let mut seed = Node::new();
    Identity::parse(KEYS, "grp1").unwrap().apply(&mut seed);
    seed
}

fn parse(lines: &[&str]) -> Node {
    Parser::new(&SCHEMA).parse_lines(seed(), lines).unwrap()
}

// Turns rendered lines into the relative output of a scoped query.
fn device_output(lines: &[String]) -> String {
    let mut output = String::from("\n<configuration-output>\nset\n");
    for line in lines {
        output.push_str(&line.replacen(PREFIX, "set ", 1));
        output.push('\n');
    }
    output.push_str("</configuration-output>\n");
    output
}

fn handler_name(handler: &Handler<'_>) -> &'static str {
    match handler {
        Handler::Field(field) => field.name,
        Handler::Block(block, _) => block.name,
    }
}

//
// Tests.
//

#[test]
fn round_trip() {
    let tree = full_tree();
    let lines = render(&SCHEMA, &tree, PREFIX).unwrap();
    let parsed = Parser::new(&SCHEMA)
        .parse_output(seed(), &device_output(&lines))
        .unwrap();
    assert_eq!(parsed.normalized(&SCHEMA), tree.normalized(&SCHEMA));
}

#[test]
fn idempotent() {
    let tree = full_tree();
    let lines = render(&SCHEMA, &tree, PREFIX).unwrap();
    let parsed = Parser::new(&SCHEMA)
        .parse_output(seed(), &device_output(&lines))
        .unwrap();
    assert_eq!(render(&SCHEMA, &parsed, PREFIX).unwrap(), lines);
}

#[test]
fn values_with_spaces_round_trip() {
    let tree = group("grp1")
        .with_field("active_server_group", "my group")
        .with_field("flag", vec!["hello", "all detail"])
        .with_field("server", vec!["a b", "c"])
        .with_instance(
            "interface",
            Node::new()
                .with_field("name", "ge-0/0/0")
                .with_field("access_profile", "ap 1"),
        );
    let lines = render(&SCHEMA, &tree, PREFIX).unwrap();
    let parsed = Parser::new(&SCHEMA)
        .parse_output(seed(), &device_output(&lines))
        .unwrap();
    assert_eq!(
        parsed.field("flag"),
        &Value::known(vec!["all detail", "hello"])
    );
    assert_eq!(parsed.field("server"), &Value::known(vec!["a b", "c"]));
    assert_eq!(parsed.normalized(&SCHEMA), tree.normalized(&SCHEMA));
}

#[test]
fn lines_replace_unresolved_seed_blocks() {
    let seed = seed()
        .with_unknown_block("file")
        .with_block("interface", Node::new());
    let tree = Parser::new(&SCHEMA)
        .parse_lines(seed, ["file size 1k", "interface ge-0/0/0 trace"])
        .unwrap();
    assert_eq!(tree.lookup_value("file.size"), Some(&Value::known(1024_i64)));
    let instances = tree.instances("interface");
    assert_eq!(instances.len(), 1);
    assert_eq!(instances[0].field("trace"), &Value::known(true));
}

#[test]
fn dispatcher_order() {
    let dispatcher = Dispatcher::new(&SCHEMA);
    let tokens = dispatcher
        .entries()
        .iter()
        .map(|entry| entry.token)
        .collect::<Vec<_>>();
    assert_eq!(
        tokens,
        [
            "active-server-group allow-server-change",
            "description",
            "active-server-group",
            "forward-only",
            "relay-agent-option-79",
            "client-response-ttl",
            "flag",
            "server",
            "file",
            "interface",
            "overrides",
        ]
    );
    assert_eq!(dispatcher.entries()[0].matcher, Matcher::Exact);

    let (entry, rest) = dispatcher
        .dispatch("active-server-group allow-server-change")
        .unwrap();
    assert_eq!(
        handler_name(&entry.handler),
        "active_server_group_allow_server_change"
    );
    assert_eq!(rest, "");

    let (entry, rest) =
        dispatcher.dispatch("active-server-group asg1").unwrap();
    assert_eq!(handler_name(&entry.handler), "active_server_group");
    assert_eq!(rest, "asg1");

    assert!(dispatcher.dispatch("forward-only extra").is_none());
    assert!(dispatcher.dispatch("interface").is_none());
}

#[test]
fn specific_token_wins() {
    let tree = parse(&["active-server-group allow-server-change"]);
    assert_eq!(
        tree.field("active_server_group_allow_server_change"),
        &Value::known(true)
    );
    assert!(tree.field("active_server_group").is_null());
}

#[test]
fn instances_merge_by_key() {
    let tree = parse(&[
        "interface ge-0/0/0 trace",
        "forward-only",
        "interface ge-0/0/1",
        "interface ge-0/0/0 access-profile ap1",
    ]);
    let instances = tree.instances("interface");
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].field("name"), &Value::known("ge-0/0/0"));
    assert_eq!(instances[0].field("trace"), &Value::known(true));
    assert_eq!(instances[0].field("access_profile"), &Value::known("ap1"));
    assert_eq!(instances[1].field("name"), &Value::known("ge-0/0/1"));
}

#[test]
fn quoted_key_and_values() {
    let tree = parse(&[
        r#"description "say \"hi\"""#,
        r#"interface "ge-0/0/0" trace"#,
        r#"file "dump 1""#,
    ]);
    assert_eq!(tree.field("description"), &Value::known(r#"say "hi""#));
    assert_eq!(
        tree.instances("interface")[0].field("name"),
        &Value::known("ge-0/0/0")
    );
    assert_eq!(
        tree.lookup_value("file.filename"),
        Some(&Value::known("dump 1"))
    );
}

#[test]
fn size_expansion() {
    let tree = parse(&["set file dump1", "set file size 51200"]);
    assert_eq!(tree.lookup_value("file.size"), Some(&Value::known(51200_i64)));

    let tree = parse(&["file size 50k"]);
    assert_eq!(tree.lookup_value("file.size"), Some(&Value::known(51200_i64)));
}

#[test]
fn list_values() {
    let tree = parse(&[
        "flag b",
        "flag a",
        "flag b",
        "server [ 10.0.0.2 10.0.0.1 ]",
    ]);
    assert_eq!(tree.field("flag"), &Value::known(vec!["a", "b"]));
    assert_eq!(
        tree.field("server"),
        &Value::known(vec!["10.0.0.2", "10.0.0.1"])
    );
}

#[test]
fn unrecognized_lines_are_ignored() {
    let tree =
        parse(&["bogus-statement 1", "file dump1 bogus", "forward-only"]);
    assert_eq!(tree.field("forward_only"), &Value::known(true));
    assert_eq!(tree.fields.len(), 4);
}

#[test]
fn framing() {
    let output = "\
show configuration forwarding-options dhcp-relay group grp1
<configuration-output>
set

set forward-only
</configuration-output>
set description late
";
    let tree = Parser::new(&SCHEMA).parse_output(seed(), output).unwrap();
    assert_eq!(tree.field("forward_only"), &Value::known(true));
    assert!(tree.field("description").is_null());

    let tree = parse(&[
        "<configuration-output>",
        "forward-only",
        "</configuration-output>",
        "description late",
    ]);
    assert!(tree.field("description").is_null());
}

#[test]
fn defaults_are_filled() {
    let tree = Parser::new(&SCHEMA)
        .parse_lines(group("grp1"), ["forward-only"])
        .unwrap();
    assert_eq!(tree.field("routing_instance"), &Value::known("default"));
    assert_eq!(tree.field("version"), &Value::known("v4"));
}

#[test]
fn overrides_presence() {
    let tree = parse(&["overrides"]);
    assert_eq!(tree.singleton("overrides"), Some(&Node::new()));

    let tree = parse(&["overrides interface-client-limit 10"]);
    assert_eq!(
        tree.lookup_value("overrides.interface_client_limit"),
        Some(&Value::Known(Scalar::Int(10)))
    );
}

#[test]
fn parse_errors() {
    let parser = Parser::new(&SCHEMA);

    let error = parser
        .parse_lines(seed(), ["client-response-ttl abc"])
        .unwrap_err();
    assert!(matches!(
        error,
        Error::Parse(ParseError::InvalidNumber(ref path, ref value))
            if path.as_str() == "client_response_ttl" && value == "abc"
    ));

    let error = parser.parse_lines(seed(), ["file size 5x"]).unwrap_err();
    assert!(matches!(
        error,
        Error::Parse(ParseError::InvalidSize(ref path, _))
            if path.as_str() == "file.size"
    ));

    let error = parser
        .parse_lines(seed(), [r#"interface "" trace"#])
        .unwrap_err();
    assert!(matches!(
        error,
        Error::Parse(ParseError::MissingKey(ref path, _))
            if path.as_str() == "interface"
    ));
}
