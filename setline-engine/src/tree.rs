//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeMap;

use enum_as_inner::EnumAsInner;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use setline_utils::units::parse_size;

use crate::schema::{Block, BlockKind, Field, FieldKind};

static NULL: Value = Value::Null;

/// Resolved leaf value.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    String(String),
    List(Vec<String>),
}

/// Leaf value as seen by the engine.
///
/// `Unknown` stands for a value that is not resolved yet (e.g. derived from
/// another object that is planned but not committed). Every check touching
/// an unknown value is skipped.
#[derive(Clone, Debug, Default, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(from = "Option<Scalar>", into = "Option<Scalar>")]
pub enum Value {
    #[default]
    Null,
    Unknown,
    Known(Scalar),
}

/// Contents of a nested block.
#[derive(Clone, Debug, EnumAsInner, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(untagged)]
pub enum BlockValue {
    Singleton(Box<Node>),
    Repeated(Vec<Node>),
    Unknown,
}

/// One configuration object, or one nested block of it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Node {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub blocks: BTreeMap<String, BlockValue>,
}

// State of a field or block addressed by a dotted path.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MemberState {
    Unknown,
    Absent,
    Known,
}

// ===== impl Scalar =====

impl Scalar {
    // Whether the value is indistinguishable from "unset" on the wire.
    pub fn is_empty(&self) -> bool {
        match self {
            Scalar::Bool(value) => !value,
            Scalar::Int(_) => false,
            Scalar::String(value) => value.is_empty(),
            Scalar::List(values) => values.is_empty(),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Scalar {
        Scalar::String(value.to_owned())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Scalar {
        Scalar::String(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Scalar {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Scalar {
        Scalar::Int(value)
    }
}

impl From<Vec<&str>> for Scalar {
    fn from(values: Vec<&str>) -> Scalar {
        Scalar::List(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<Vec<String>> for Scalar {
    fn from(values: Vec<String>) -> Scalar {
        Scalar::List(values)
    }
}

// ===== impl Value =====

impl Value {
    pub fn known<T: Into<Scalar>>(value: T) -> Value {
        Value::Known(value.into())
    }

    // Null, or known but carrying nothing the wire can express.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Unknown => false,
            Value::Known(scalar) => scalar.is_empty(),
        }
    }

    pub fn has_known_value(&self) -> bool {
        match self {
            Value::Known(scalar) => !scalar.is_empty(),
            Value::Null | Value::Unknown => false,
        }
    }

    pub fn state(&self) -> MemberState {
        if self.is_unknown() {
            MemberState::Unknown
        } else if self.has_known_value() {
            MemberState::Known
        } else {
            MemberState::Absent
        }
    }

    // Known string value, if any.
    pub fn as_str(&self) -> Option<&str> {
        self.as_known()
            .and_then(Scalar::as_string)
            .map(String::as_str)
    }
}

impl From<Scalar> for Value {
    fn from(value: Scalar) -> Value {
        Value::Known(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Value {
        Value::known(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Value {
        Value::known(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Value {
        Value::known(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Value {
        Value::known(value)
    }
}

impl From<Vec<&str>> for Value {
    fn from(values: Vec<&str>) -> Value {
        Value::known(values)
    }
}

impl From<Option<Scalar>> for Value {
    fn from(value: Option<Scalar>) -> Value {
        match value {
            Some(scalar) => Value::Known(scalar),
            None => Value::Null,
        }
    }
}

impl From<Value> for Option<Scalar> {
    fn from(value: Value) -> Option<Scalar> {
        value.into_known().ok()
    }
}

// ===== impl BlockValue =====

impl BlockValue {
    // Whether the block carries nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            BlockValue::Singleton(node) => node.is_empty(),
            BlockValue::Repeated(nodes) => nodes.is_empty(),
            BlockValue::Unknown => false,
        }
    }

    pub fn has_known_value(&self) -> bool {
        match self {
            BlockValue::Singleton(node) => node.has_known_value(),
            BlockValue::Repeated(nodes) => !nodes.is_empty(),
            BlockValue::Unknown => false,
        }
    }

    // A present singleton counts as configured even when empty, since the
    // bare block token is meaningful on the wire.
    pub fn state(&self) -> MemberState {
        match self {
            BlockValue::Unknown => MemberState::Unknown,
            BlockValue::Singleton(_) => MemberState::Known,
            BlockValue::Repeated(nodes) if !nodes.is_empty() => {
                MemberState::Known
            }
            BlockValue::Repeated(_) => MemberState::Absent,
        }
    }

    // Turns the value into a singleton, keeping an existing child.
    fn make_singleton(&mut self) -> &mut Node {
        match self {
            BlockValue::Singleton(node) => node,
            other => {
                *other = BlockValue::Singleton(Box::default());
                other.make_singleton()
            }
        }
    }

    // Turns the value into a repeated block, keeping existing instances.
    fn make_repeated(&mut self) -> &mut Vec<Node> {
        match self {
            BlockValue::Repeated(nodes) => nodes,
            other => {
                *other = BlockValue::Repeated(vec![]);
                other.make_repeated()
            }
        }
    }
}

// ===== impl Node =====

impl Node {
    pub fn new() -> Node {
        Node::default()
    }

    #[must_use]
    pub fn with_field<V: Into<Value>>(mut self, name: &str, value: V) -> Node {
        self.set_field(name, value.into());
        self
    }

    #[must_use]
    pub fn with_unknown(mut self, name: &str) -> Node {
        self.set_field(name, Value::Unknown);
        self
    }

    #[must_use]
    pub fn with_block(mut self, name: &str, node: Node) -> Node {
        self.blocks
            .insert(name.to_owned(), BlockValue::Singleton(Box::new(node)));
        self
    }

    #[must_use]
    pub fn with_instance(mut self, name: &str, node: Node) -> Node {
        self.instances_mut(name).push(node);
        self
    }

    #[must_use]
    pub fn with_unknown_block(mut self, name: &str) -> Node {
        self.blocks.insert(name.to_owned(), BlockValue::Unknown);
        self
    }

    pub fn set_field(&mut self, name: &str, value: Value) {
        self.fields.insert(name.to_owned(), value);
    }

    // Returns the field value, `Null` when the field is absent.
    pub fn field(&self, name: &str) -> &Value {
        self.fields.get(name).unwrap_or(&NULL)
    }

    pub fn block(&self, name: &str) -> Option<&BlockValue> {
        self.blocks.get(name)
    }

    pub fn singleton(&self, name: &str) -> Option<&Node> {
        self.blocks
            .get(name)
            .and_then(BlockValue::as_singleton)
            .map(Box::as_ref)
    }

    pub fn instances(&self, name: &str) -> &[Node] {
        self.blocks
            .get(name)
            .and_then(BlockValue::as_repeated)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    // Returns the singleton child, creating it when absent.
    pub fn singleton_mut(&mut self, name: &str) -> &mut Node {
        self.blocks
            .entry(name.to_owned())
            .or_insert_with(|| BlockValue::Singleton(Box::default()))
            .make_singleton()
    }

    // Returns the repeated-block instances, creating the list when absent.
    pub fn instances_mut(&mut self, name: &str) -> &mut Vec<Node> {
        self.blocks
            .entry(name.to_owned())
            .or_insert_with(|| BlockValue::Repeated(vec![]))
            .make_repeated()
    }

    // Finds the instance whose key fields match `key`, creating it when no
    // such instance exists yet.
    pub fn instance_mut(
        &mut self,
        name: &str,
        key_fields: &[&Field],
        key: &[String],
    ) -> &mut Node {
        let instances = self.instances_mut(name);
        let position = instances.iter().position(|instance| {
            key_fields
                .iter()
                .zip(key)
                .all(|(field, value)| {
                    instance.field(field.name).as_str() == Some(value.as_str())
                })
        });
        let idx = match position {
            Some(idx) => idx,
            None => {
                let mut instance = Node::new();
                for (field, value) in key_fields.iter().zip(key) {
                    instance
                        .set_field(field.name, Value::known(value.as_str()));
                }
                instances.push(instance);
                instances.len() - 1
            }
        };
        &mut instances[idx]
    }

    // Whether no field or block carries anything. Unknown values count as
    // content since they may resolve to something.
    pub fn is_empty(&self) -> bool {
        self.fields.values().all(Value::is_empty)
            && self.blocks.values().all(BlockValue::is_empty)
    }

    pub fn has_known_value(&self) -> bool {
        self.fields.values().any(Value::has_known_value)
            || self.blocks.values().any(BlockValue::has_known_value)
    }

    // Resolves a dotted path through singleton blocks to a field value.
    pub fn lookup_value(&self, path: &str) -> Option<&Value> {
        match path.split_once('.') {
            Some((head, tail)) => self.singleton(head)?.lookup_value(tail),
            None => self.fields.get(path),
        }
    }

    // State of the field or block addressed by a dotted path.
    pub fn member_state(&self, path: &str) -> MemberState {
        match path.split_once('.') {
            Some((head, tail)) => match self.blocks.get(head) {
                Some(BlockValue::Singleton(node)) => node.member_state(tail),
                Some(BlockValue::Unknown) => MemberState::Unknown,
                Some(BlockValue::Repeated(_)) | None => MemberState::Absent,
            },
            None => {
                if let Some(value) = self.fields.get(path) {
                    value.state()
                } else if let Some(block) = self.blocks.get(path) {
                    block.state()
                } else {
                    MemberState::Absent
                }
            }
        }
    }

    /// Canonical form used to compare trees across a render/parse cycle.
    ///
    /// Drops everything the wire format cannot tell apart from absent (false
    /// flags, empty strings and lists, values equal to their default),
    /// expands size values to integers and sorts set fields. Attributes
    /// unknown to the schema are dropped.
    pub fn normalized(&self, schema: &Block) -> Node {
        let mut normalized = Node::new();

        for field in &schema.fields {
            let value = normalize_value(field, self.field(field.name));
            if let Some(value) = value {
                normalized.set_field(field.name, value);
            }
        }

        for block in &schema.blocks {
            let value = match (self.block(block.name), &block.kind) {
                (Some(BlockValue::Singleton(node)), BlockKind::Singleton) => {
                    BlockValue::Singleton(Box::new(node.normalized(block)))
                }
                (Some(BlockValue::Repeated(nodes)), BlockKind::Repeated { .. })
                    if !nodes.is_empty() =>
                {
                    BlockValue::Repeated(
                        nodes
                            .iter()
                            .map(|node| node.normalized(block))
                            .collect(),
                    )
                }
                (Some(BlockValue::Unknown), _) => BlockValue::Unknown,
                _ => continue,
            };
            normalized.blocks.insert(block.name.to_owned(), value);
        }

        normalized
    }
}

// ===== helper functions =====

fn normalize_value(field: &Field, value: &Value) -> Option<Value> {
    let scalar = match value {
        Value::Null => return None,
        Value::Unknown => return Some(Value::Unknown),
        Value::Known(scalar) if scalar.is_empty() => return None,
        Value::Known(scalar) => scalar,
    };

    let scalar = match (field.kind, scalar) {
        (FieldKind::Size, Scalar::String(value)) => match parse_size(value) {
            Ok(size) => Scalar::Int(size),
            Err(_) => scalar.clone(),
        },
        (FieldKind::Int, Scalar::String(value)) => {
            match value.trim().parse::<i64>() {
                Ok(number) => Scalar::Int(number),
                Err(_) => scalar.clone(),
            }
        }
        (FieldKind::StringSet(_), Scalar::List(values)) => {
            Scalar::List(values.iter().sorted().dedup().cloned().collect())
        }
        _ => scalar.clone(),
    };

    if field.default.as_ref() == Some(&scalar) {
        return None;
    }

    Some(Value::Known(scalar))
}
