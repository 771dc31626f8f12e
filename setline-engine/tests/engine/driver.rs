//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use maplit::btreeset;
use setline_engine::config::Config;
use setline_engine::driver::{Driver, Object, ObjectState};
use setline_engine::error::{Error, ExistenceError};
use setline_engine::tree::{Node, Value};
use setline_utils::session::{ConfigSession, SessionError, SessionLock};
use setline_utils::testing::{MockDevice, Transaction, setup};

use crate::fixtures::{TestGroup, group, interface};

const ADDRESS: &str = "forwarding-options dhcp-relay group grp1";

//
// Helper functions.
//

fn planned(config: &Config, device: &mut MockDevice, tree: &Node) -> Object {
    Driver::new(device, config).plan::<TestGroup>(tree).unwrap()
}

fn created(config: &Config, device: &mut MockDevice, tree: &Node) -> Object {
    let mut object = planned(config, device, tree);
    Driver::new(device, config)
        .create::<TestGroup>(&mut object)
        .unwrap();
    object
}

fn existence_error(result: Result<(), Error>) -> ExistenceError {
    match result {
        Err(Error::Existence(error)) => error,
        result => panic!("unexpected result: {result:?}"),
    }
}

fn lines(lines: &[&str]) -> Vec<String> {
    lines.iter().map(ToString::to_string).collect()
}

//
// Tests.
//

#[test]
fn create_lifecycle() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    let tree = group("grp1")
        .with_field("forward_only", true)
        .with_instance("interface", interface("ge-0/0/0"));

    let object = created(&config, &mut device, &tree);
    assert_eq!(object.state, ObjectState::Present);
    assert_eq!(object.identity.to_string(), "grp1_-_default_-_v4");
    assert_eq!(object.config.field("forward_only"), &Value::known(true));
    assert_eq!(object.config.field("version"), &Value::known("v4"));
    assert_eq!(object.config.instances("interface").len(), 1);

    assert_eq!(
        device.transactions,
        [Transaction::new(
            lines(&[
                "set forwarding-options dhcp-relay group grp1",
                "set forwarding-options dhcp-relay group grp1 forward-only",
                "set forwarding-options dhcp-relay group grp1 interface ge-0/0/0",
            ]),
            "create resource test_group".to_owned(),
        )]
    );
    assert!(!device.has_candidate());
}

#[test]
fn create_existing_object() {
    setup();
    let config = Config::default();
    let mut device =
        MockDevice::with_config([format!("set {ADDRESS} forward-only")]);
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        existence_error(result),
        ExistenceError::AlreadyExists(address) if address == ADDRESS
    ));
    assert_eq!(object.state, ObjectState::Planned);
    assert!(device.transactions.is_empty());
}

#[test]
fn create_silently_dropped() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    device.drop_on_commit(ADDRESS);
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        existence_error(result),
        ExistenceError::MissingAfterCommit(address) if address == ADDRESS
    ));
    assert_eq!(object.state, ObjectState::Inconsistent);
    assert_eq!(device.transactions.len(), 1);
}

#[test]
fn create_without_verification() {
    setup();
    let config = Config::from_toml("[commit]\nverify = false").unwrap();
    let mut device = MockDevice::new();
    device.drop_on_commit(ADDRESS);
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        existence_error(result),
        ExistenceError::MissingAfterCommit(address) if address == ADDRESS
    ));
    assert_eq!(object.state, ObjectState::Inconsistent);
    // Pre-create check and read back only.
    assert_eq!(device.commands.len(), 2);
}

#[test]
fn failed_commit_discards_candidate() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    device.fail_next_commit("commit check failed");
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        result,
        Err(Error::Session(SessionError::Commit(ref message)))
            if message == "commit check failed"
    ));
    assert!(!device.has_candidate());
    assert!(device.running().is_empty());
    assert!(device.transactions.is_empty());
    assert_eq!(object.state, ObjectState::Planned);

    // The device is usable again.
    Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object)
        .unwrap();
    assert_eq!(object.state, ObjectState::Present);
}

#[test]
fn failed_load_discards_candidate() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    device.fail_next_config_set("syntax error");
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        result,
        Err(Error::Session(SessionError::ConfigSet(_)))
    ));
    assert!(!device.has_candidate());
    assert!(device.transactions.is_empty());
}

#[test]
fn update_replaces_in_one_transaction() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    let tree = group("grp1")
        .with_field("forward_only", true)
        .with_field("active_server_group", "asg1");
    let mut object = created(&config, &mut device, &tree);

    let tree = group("grp1").with_field("description", "lab");
    Driver::new(&mut device, &config)
        .update::<TestGroup>(&mut object, &tree)
        .unwrap();
    assert_eq!(object.state, ObjectState::Present);
    assert_eq!(object.config.field("description"), &Value::known("lab"));
    assert!(object.config.field("forward_only").is_null());

    let transaction = device.transactions.last().unwrap();
    assert_eq!(transaction.comment, "update resource test_group");
    assert_eq!(
        transaction.lines,
        lines(&[
            "delete forwarding-options dhcp-relay group grp1",
            "set forwarding-options dhcp-relay group grp1",
            r#"set forwarding-options dhcp-relay group grp1 description "lab""#,
        ])
    );
    assert_eq!(
        device.running(),
        [ADDRESS.to_owned(), format!(r#"{ADDRESS} description "lab""#)]
    );
}

#[test]
fn update_moves_to_a_new_address() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    let mut object = created(&config, &mut device, &group("grp1"));

    Driver::new(&mut device, &config)
        .update::<TestGroup>(&mut object, &group("grp2"))
        .unwrap();
    assert_eq!(object.identity.to_string(), "grp2_-_default_-_v4");
    assert_eq!(device.running(), ["forwarding-options dhcp-relay group grp2"]);
}

#[test]
fn update_to_an_occupied_address() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::with_config([
        "set forwarding-options dhcp-relay group grp2 forward-only",
    ]);
    let mut object = created(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .update::<TestGroup>(&mut object, &group("grp2"));
    assert!(matches!(
        existence_error(result),
        ExistenceError::AlreadyExists(_)
    ));
    assert_eq!(object.state, ObjectState::Present);
    assert_eq!(object.identity.to_string(), "grp1_-_default_-_v4");
    assert_eq!(device.transactions.len(), 1);
}

#[test]
fn delete_is_a_single_line() {
    setup();
    let config =
        Config::from_toml("[commit]\ncomment_prefix = \"[ops]\"").unwrap();
    let mut device = MockDevice::with_config(["set system host-name r1"]);
    let tree = group("grp1")
        .with_field("forward_only", true)
        .with_block("overrides", Node::new());
    let mut object = created(&config, &mut device, &tree);

    Driver::new(&mut device, &config)
        .delete::<TestGroup>(&mut object)
        .unwrap();
    assert_eq!(object.state, ObjectState::Deleted);
    assert_eq!(
        device.transactions.last().unwrap(),
        &Transaction::new(
            lines(&["delete forwarding-options dhcp-relay group grp1"]),
            "[ops] delete resource test_group".to_owned(),
        )
    );
    assert_eq!(device.running(), ["system host-name r1"]);
}

#[test]
fn delete_requires_an_existing_object() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    let mut object = planned(&config, &mut device, &group("grp1"));

    let result = Driver::new(&mut device, &config)
        .delete::<TestGroup>(&mut object);
    assert!(matches!(
        result,
        Err(Error::InvalidTransition(
            ObjectState::Planned,
            ObjectState::Deleted
        ))
    ));

    let result = Driver::new(&mut device, &config)
        .update::<TestGroup>(&mut object, &group("grp1"));
    assert!(matches!(
        result,
        Err(Error::InvalidTransition(
            ObjectState::Planned,
            ObjectState::Updated
        ))
    ));
    assert!(device.transactions.is_empty());
}

#[test]
fn import_and_refresh() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::with_config([
        "set forwarding-options dhcp-relay dhcpv6 group g6",
        "set forwarding-options dhcp-relay dhcpv6 group g6 forward-only",
        "set forwarding-options dhcp-relay dhcpv6 group g6 interface ge-0/0/3 trace",
    ]);

    let mut object = Driver::new(&mut device, &config)
        .import::<TestGroup>("g6_-_default_-_v6")
        .unwrap();
    assert_eq!(object.state, ObjectState::Present);
    assert_eq!(object.config.field("version"), &Value::known("v6"));
    assert_eq!(object.config.field("forward_only"), &Value::known(true));
    assert_eq!(
        object.config.instances("interface")[0].field("trace"),
        &Value::known(true)
    );

    device
        .config_set(&lines(&["delete forwarding-options dhcp-relay dhcpv6"]))
        .unwrap();
    device.commit("out of band").unwrap();

    Driver::new(&mut device, &config)
        .refresh::<TestGroup>(&mut object)
        .unwrap();
    assert_eq!(object.state, ObjectState::Deleted);
}

#[test]
fn import_missing_object() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();

    let result = Driver::new(&mut device, &config)
        .import::<TestGroup>("missing");
    assert!(matches!(
        result,
        Err(Error::Existence(ExistenceError::NotFound(ref address)))
            if address == "forwarding-options dhcp-relay group missing"
    ));

    let result = Driver::new(&mut device, &config)
        .import::<TestGroup>("a_-_b_-_c_-_d");
    assert!(matches!(result, Err(Error::Identity(_))));
}

#[test]
fn dependencies() {
    setup();
    let config = Config::default();
    let tree = group("grp1").with_field("routing_instance", "ri1");

    let mut device = MockDevice::new();
    let mut object = planned(&config, &mut device, &tree);
    let result = Driver::new(&mut device, &config)
        .create::<TestGroup>(&mut object);
    assert!(matches!(
        existence_error(result),
        ExistenceError::MissingDependency(_, dependency)
            if dependency == "routing-instances ri1"
    ));

    let mut device = MockDevice::with_config([
        "set routing-instances ri1 instance-type virtual-router",
    ]);
    let object = created(&config, &mut device, &tree);
    assert_eq!(object.identity.to_string(), "grp1_-_ri1_-_v4");
    assert_eq!(
        device.transactions[0].lines[0],
        "set routing-instances ri1 forwarding-options dhcp-relay group grp1"
    );

    let config = Config::from_toml("[checks]\ndependencies = false").unwrap();
    let mut device = MockDevice::new();
    created(&config, &mut device, &tree);
}

#[test]
fn plan_rejects_invalid_configuration() {
    setup();
    let config = Config::default();
    let mut device = MockDevice::new();
    let tree = group("grp1").with_field("relay_agent_option_79", true);

    let result = Driver::new(&mut device, &config)
        .plan::<TestGroup>(&tree);
    match result {
        Err(Error::Validation(violations)) => assert_eq!(violations.len(), 1),
        result => panic!("unexpected result: {result:?}"),
    }
    assert!(device.commands.is_empty());
}

#[test]
fn operations_under_the_session_lock() {
    setup();
    let config = Config::default();
    let lock = SessionLock::new(MockDevice::new());
    {
        let mut guard = lock.lock();
        let mut object = planned(&config, &mut guard, &group("grp1"));
        Driver::new(&mut *guard, &config)
            .create::<TestGroup>(&mut object)
            .unwrap();
    }

    let device = lock.into_inner();
    let queries: BTreeSet<String> = device.commands.iter().cloned().collect();
    assert_eq!(
        queries,
        btreeset![format!(
            "show configuration {ADDRESS} | display set relative"
        )]
    );
}

#[test]
fn configuration_errors() {
    assert!(matches!(
        Config::from_toml("[commit]\nverify = \"yes\""),
        Err(Error::Config(_))
    ));
    assert!(matches!(
        Config::from_toml("[commit]\nretries = 3"),
        Err(Error::Config(_))
    ));
    assert!(Config::from_toml("").unwrap().commit.verify);
}
