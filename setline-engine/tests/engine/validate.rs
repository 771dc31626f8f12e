//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_engine::error::{EncodingError, Error};
use setline_engine::tree::{Node, Value};
use setline_engine::validate::{ConstraintViolation, ViolationKind, validate};

use crate::fixtures::{SCHEMA, group, interface};

//
// Helper functions.
//

fn violations(tree: &Node) -> Vec<ConstraintViolation> {
    validate(&SCHEMA, tree).unwrap()
}

fn paths(violation: &ConstraintViolation) -> Vec<String> {
    violation.paths.iter().map(ToString::to_string).collect()
}

fn kinds(violations: &[ConstraintViolation]) -> Vec<ViolationKind> {
    violations.iter().map(|violation| violation.kind).collect()
}

//
// Tests.
//

#[test]
fn valid_tree_has_no_violations() {
    let tree = group("grp1")
        .with_field("description", "relay for lab")
        .with_field("active_server_group", "asg1")
        .with_field("active_server_group_allow_server_change", true)
        .with_field("client_response_ttl", 60_i64)
        .with_block(
            "file",
            Node::new()
                .with_field("filename", "dump1")
                .with_field("size", "50k"),
        )
        .with_instance(
            "interface",
            interface("ge-0/0/0").with_field("trace", true),
        )
        .with_block("overrides", Node::new());
    assert_eq!(violations(&tree), vec![]);
}

#[test]
fn forbidden_under_active_mode() {
    let tree = group("grp1")
        .with_field("version", "v4")
        .with_field("relay_agent_option_79", true);
    let violations = violations(&tree);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, ViolationKind::Forbidden);
    assert_eq!(paths(&violations[0]), ["relay_agent_option_79"]);
    assert!(violations[0].message.contains("relay_agent_option_79"));
}

#[test]
fn gate_uses_discriminant_default() {
    let tree = group("grp1").with_field("relay_agent_option_79", true);
    assert_eq!(kinds(&violations(&tree)), [ViolationKind::Forbidden]);

    let tree = group("grp1")
        .with_field("version", "v6")
        .with_field("relay_agent_option_79", true);
    assert_eq!(violations(&tree), vec![]);
}

#[test]
fn unknown_values_are_skipped() {
    let tree = group("grp1")
        .with_unknown("version")
        .with_field("relay_agent_option_79", true)
        .with_unknown("active_server_group")
        .with_field("active_server_group_allow_server_change", true)
        .with_unknown("client_response_ttl")
        .with_unknown_block("file");
    assert_eq!(violations(&tree), vec![]);
}

#[test]
fn duplicate_key_reported_once() {
    let tree = group("grp1")
        .with_instance("interface", interface("ge-0/0/0"))
        .with_instance("interface", interface("ge-0/0/1"))
        .with_instance(
            "interface",
            interface("ge-0/0/0").with_field("trace", true),
        )
        .with_instance("interface", interface("ge-0/0/0"));
    let violations = violations(&tree);
    assert_eq!(kinds(&violations), [ViolationKind::Duplicate]);
    assert_eq!(
        violations[0].message,
        r#"multiple interface blocks with the same name "ge-0/0/0""#
    );
    assert_eq!(paths(&violations[0]), [r#"interface["ge-0/0/0"]"#]);
}

#[test]
fn conflict_names_both_paths() {
    let tree = group("grp1").with_instance(
        "interface",
        interface("ge-0/0/0")
            .with_field("exclude", true)
            .with_field("access_profile", "ap1"),
    );
    let violations = violations(&tree);
    assert_eq!(kinds(&violations), [ViolationKind::Conflict]);
    assert_eq!(
        paths(&violations[0]),
        [
            r#"interface["ge-0/0/0"].exclude"#,
            r#"interface["ge-0/0/0"].access_profile"#
        ]
    );
}

#[test]
fn false_flag_does_not_conflict() {
    let tree = group("grp1").with_block(
        "file",
        Node::new()
            .with_field("filename", "dump1")
            .with_field("world_readable", true)
            .with_field("no_world_readable", false),
    );
    assert_eq!(violations(&tree), vec![]);
}

#[test]
fn requirement() {
    let tree = group("grp1")
        .with_field("active_server_group_allow_server_change", true);
    let violations = violations(&tree);
    assert_eq!(kinds(&violations), [ViolationKind::Requirement]);
    assert_eq!(
        paths(&violations[0]),
        ["active_server_group_allow_server_change", "active_server_group"]
    );

    // Empty strings count as unset.
    let tree = group("grp1")
        .with_field("active_server_group", "")
        .with_field("active_server_group_allow_server_change", true);
    assert_eq!(
        kinds(&self::violations(&tree)),
        [ViolationKind::Requirement]
    );
}

#[test]
fn requires_mode_in_nested_block() {
    let tree = group("grp1")
        .with_field("version", "v6")
        .with_block("overrides", Node::new().with_field("proxy_mode", true));
    let violations = violations(&tree);
    assert_eq!(kinds(&violations), [ViolationKind::Requirement]);
    assert_eq!(paths(&violations[0]), ["overrides.proxy_mode", "version"]);
}

#[test]
fn empty_blocks() {
    let tree = group("grp1").with_block("file", Node::new());
    let violations = violations(&tree);
    assert_eq!(kinds(&violations), [ViolationKind::Empty]);
    assert_eq!(paths(&violations[0]), ["file"]);

    // Presence block.
    let tree = group("grp1").with_block("overrides", Node::new());
    assert_eq!(self::violations(&tree), vec![]);
}

#[test]
fn missing_and_invalid_values() {
    let tree = Node::new()
        .with_field("version", "v5")
        .with_field("client_response_ttl", 300_i64)
        .with_field("description", r#"say "hi""#)
        .with_instance("interface", interface("not an interface"));
    let violations = violations(&tree);
    assert_eq!(
        kinds(&violations),
        [
            ViolationKind::Missing,
            ViolationKind::Invalid,
            ViolationKind::Invalid,
            ViolationKind::Invalid,
            ViolationKind::Invalid,
        ]
    );
    assert_eq!(paths(&violations[0]), ["name"]);
    assert_eq!(paths(&violations[1]), ["version"]);
    assert_eq!(paths(&violations[2]), ["description"]);
    assert_eq!(paths(&violations[3]), ["client_response_ttl"]);
    assert_eq!(
        paths(&violations[4]),
        [r#"interface["not an interface"].name"#]
    );
}

#[test]
fn unexpected_attributes() {
    let tree = group("grp1")
        .with_field("bogus", "x")
        .with_block("nothing", Node::new());
    assert_eq!(
        kinds(&violations(&tree)),
        [ViolationKind::Unexpected, ViolationKind::Unexpected]
    );
}

#[test]
fn all_violations_are_collected() {
    let tree = group("grp1")
        .with_field("relay_agent_option_79", true)
        .with_field("active_server_group_allow_server_change", true)
        .with_block("file", Node::new())
        .with_field("client_response_ttl", Value::known("abc"));
    assert_eq!(
        kinds(&violations(&tree)),
        [
            ViolationKind::Invalid,
            ViolationKind::Empty,
            ViolationKind::Forbidden,
            ViolationKind::Requirement,
        ]
    );
}

#[test]
fn malformed_size_is_a_hard_error() {
    let tree = group("grp1").with_block(
        "file",
        Node::new().with_field("filename", "dump1").with_field("size", "50q"),
    );
    let error = validate(&SCHEMA, &tree).unwrap_err();
    assert!(matches!(
        error,
        Error::Encoding(EncodingError::InvalidSize(ref path, _))
            if path.as_str() == "file.size"
    ));
}
