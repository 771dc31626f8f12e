//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use derive_new::new;
use itertools::Itertools;
use serde::Serialize;
use setline_utils::units::parse_size;

use crate::debug::Debug;
use crate::error::{EncodingError, Error};
use crate::path::DataPath;
use crate::schema::{Block, BlockKind, Field, FieldKind, Member, Presence, Rule};
use crate::tree::{BlockValue, MemberState, Node, Scalar, Value};

/// Soft validation error. All of them are collected in a single pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, new)]
pub struct ConstraintViolation {
    pub kind: ViolationKind,
    pub paths: Vec<DataPath>,
    pub message: String,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ViolationKind {
    Missing,
    Empty,
    Conflict,
    Requirement,
    Forbidden,
    Duplicate,
    Invalid,
    Unexpected,
}

// ===== global functions =====

/// Checks a configuration tree against its schema.
///
/// Every check that touches an unknown value is skipped. A malformed size
/// value aborts the pass with a hard error.
pub fn validate(
    schema: &Block,
    tree: &Node,
) -> Result<Vec<ConstraintViolation>, Error> {
    let mut violations = vec![];
    validate_block(schema, tree, &DataPath::root(), &mut violations)?;
    Debug::Validated(schema.name, violations.len()).log();
    Ok(violations)
}

// Known value of a discriminant, falling back to the field default.
//
// Returns `None` when the discriminant is unknown or has no value at all.
pub(crate) fn discriminant_value(
    block: &Block,
    node: &Node,
    name: &str,
) -> Option<String> {
    match node.lookup_value(name) {
        Some(Value::Unknown) => None,
        Some(value) if value.has_known_value() => {
            value.as_known().and_then(scalar_text)
        }
        _ => match block.resolve(name) {
            Some(Member::Field(field)) => {
                field.default.as_ref().and_then(scalar_text)
            }
            _ => None,
        },
    }
}

// Text form of a single-valued scalar.
pub(crate) fn scalar_text(scalar: &Scalar) -> Option<String> {
    match scalar {
        Scalar::String(value) => Some(value.clone()),
        Scalar::Int(value) => Some(value.to_string()),
        Scalar::Bool(value) => Some(value.to_string()),
        Scalar::List(_) => None,
    }
}

// ===== helper functions =====

fn validate_block(
    block: &Block,
    node: &Node,
    path: &DataPath,
    violations: &mut Vec<ConstraintViolation>,
) -> Result<(), Error> {
    for name in node.fields.keys() {
        if block.get_field(name).is_none() {
            violations.push(unexpected(&path.child(name)));
        }
    }
    for name in node.blocks.keys() {
        if block.get_block(name).is_none() {
            violations.push(unexpected(&path.child(name)));
        }
    }

    for field in &block.fields {
        let field_path = path.child(field.name);
        validate_field(field, node.field(field.name), &field_path, violations)?;
    }

    for child in &block.blocks {
        let child_path = path.child(child.name);
        match (node.block(child.name), &child.kind) {
            (None | Some(BlockValue::Unknown), _) => (),
            (Some(BlockValue::Singleton(inner)), BlockKind::Singleton) => {
                if inner.is_empty() {
                    if !child.allow_empty {
                        violations.push(ConstraintViolation::new(
                            ViolationKind::Empty,
                            vec![child_path.clone()],
                            format!("{child_path}: block is present but empty"),
                        ));
                    }
                    continue;
                }
                validate_block(child, inner, &child_path, violations)?;
            }
            (
                Some(BlockValue::Repeated(instances)),
                BlockKind::Repeated { .. },
            ) => {
                validate_instances(child, instances, path, violations)?;
            }
            _ => {
                violations.push(ConstraintViolation::new(
                    ViolationKind::Invalid,
                    vec![child_path.clone()],
                    format!("{child_path}: block shape does not match schema"),
                ));
            }
        }
    }

    for rule in &block.rules {
        validate_rule(block, node, path, rule, violations);
    }

    Ok(())
}

fn validate_instances(
    block: &Block,
    instances: &[Node],
    path: &DataPath,
    violations: &mut Vec<ConstraintViolation>,
) -> Result<(), Error> {
    let key_fields = block.key_fields();
    let mut seen = BTreeSet::new();
    let mut reported = BTreeSet::new();

    for instance in instances {
        // Instances with an unresolved key are skipped by the uniqueness
        // check.
        let key = key_fields
            .iter()
            .map(|field| {
                instance.field(field.name).as_known().and_then(scalar_text)
            })
            .collect::<Option<Vec<_>>>();

        let instance_path = match &key {
            Some(key) => path.instance(block.name, key.as_slice()),
            None => path.child(block.name),
        };

        if let Some(key) = key {
            if !seen.insert(key.clone()) && reported.insert(key.clone()) {
                let names = key_fields
                    .iter()
                    .zip(&key)
                    .map(|(field, value)| format!("{} {value:?}", field.name))
                    .join(", ");
                violations.push(ConstraintViolation::new(
                    ViolationKind::Duplicate,
                    vec![instance_path.clone()],
                    format!(
                        "multiple {} blocks with the same {names}",
                        block.token
                    ),
                ));
            }
        }

        validate_block(block, instance, &instance_path, violations)?;
    }

    Ok(())
}

fn validate_field(
    field: &Field,
    value: &Value,
    path: &DataPath,
    violations: &mut Vec<ConstraintViolation>,
) -> Result<(), Error> {
    let scalar = match value {
        Value::Unknown => return Ok(()),
        Value::Known(scalar) if !scalar.is_empty() => scalar,
        // Empty strings and lists cannot be told apart from unset.
        Value::Null | Value::Known(_) => {
            if field.presence == Presence::Required && field.default.is_none()
            {
                violations.push(ConstraintViolation::new(
                    ViolationKind::Missing,
                    vec![path.clone()],
                    format!("{path}: missing required value"),
                ));
            }
            return Ok(());
        }
    };

    let result = match (field.kind, scalar) {
        (FieldKind::String, Scalar::String(value)) => check_str(field, value),
        (FieldKind::Bool, Scalar::Bool(_)) => Ok(()),
        (FieldKind::Int | FieldKind::Size, Scalar::Int(value)) => {
            check_int(field, *value)
        }
        (FieldKind::Int, Scalar::String(value)) => {
            match value.trim().parse::<i64>() {
                Ok(value) => check_int(field, value),
                Err(_) => Err(format!("invalid number {value:?}")),
            }
        }
        (FieldKind::Size, Scalar::String(value)) => {
            let size = parse_size(value).map_err(|error| {
                EncodingError::InvalidSize(path.clone(), error)
            })?;
            check_int(field, size)
        }
        (
            FieldKind::StringList(_) | FieldKind::StringSet(_),
            Scalar::List(values),
        ) => values.iter().try_for_each(|value| check_str(field, value)),
        _ => Err("value does not match the field type".to_owned()),
    };

    if let Err(reason) = result {
        violations.push(ConstraintViolation::new(
            ViolationKind::Invalid,
            vec![path.clone()],
            format!("{path}: {reason}"),
        ));
    }

    Ok(())
}

fn check_str(field: &Field, value: &str) -> Result<(), String> {
    field.checks.iter().try_for_each(|check| check.check_str(value))
}

fn check_int(field: &Field, value: i64) -> Result<(), String> {
    field.checks.iter().try_for_each(|check| check.check_int(value))
}

fn validate_rule(
    block: &Block,
    node: &Node,
    path: &DataPath,
    rule: &Rule,
    violations: &mut Vec<ConstraintViolation>,
) {
    let known = |name: &str| node.member_state(name) == MemberState::Known;

    match rule {
        Rule::Conflicts { field, with } => {
            if !known(field) {
                return;
            }
            for other in with.iter().filter(|other| known(other)) {
                violations.push(ConstraintViolation::new(
                    ViolationKind::Conflict,
                    vec![path.child(field), path.child(other)],
                    format!(
                        "{:?} and {:?} cannot be configured together",
                        path.child(field).as_str(),
                        path.child(other).as_str()
                    ),
                ));
            }
        }
        Rule::Requires { field, requires } => {
            if !known(field) {
                return;
            }
            for required in requires {
                if node.member_state(required) == MemberState::Absent {
                    violations.push(ConstraintViolation::new(
                        ViolationKind::Requirement,
                        vec![path.child(field), path.child(required)],
                        format!(
                            "{:?} requires {:?} to be configured",
                            path.child(field).as_str(),
                            path.child(required).as_str()
                        ),
                    ));
                }
            }
        }
        Rule::AtLeastOneOf(names) => {
            if names
                .iter()
                .all(|name| node.member_state(name) == MemberState::Absent)
            {
                let paths = names.iter().map(|name| path.child(name)).collect();
                violations.push(ConstraintViolation::new(
                    ViolationKind::Requirement,
                    paths,
                    format!(
                        "{}one of {} must be configured",
                        block_label(path),
                        names.iter().map(|name| format!("{name:?}")).join(", ")
                    ),
                ));
            }
        }
        Rule::Gate {
            discriminant,
            mode,
            forbidden,
        } => {
            if discriminant_value(block, node, discriminant).as_deref()
                != Some(*mode)
            {
                return;
            }
            for name in forbidden.iter().filter(|name| known(name)) {
                violations.push(ConstraintViolation::new(
                    ViolationKind::Forbidden,
                    vec![path.child(name)],
                    format!(
                        "{:?} cannot be configured when {discriminant} = {mode:?}",
                        path.child(name).as_str()
                    ),
                ));
            }
        }
        Rule::RequiresMode {
            field,
            discriminant,
            mode,
        } => {
            if !known(field) {
                return;
            }
            if let Some(value) = discriminant_value(block, node, discriminant)
                && value != *mode
            {
                violations.push(ConstraintViolation::new(
                    ViolationKind::Requirement,
                    vec![path.child(field), path.child(discriminant)],
                    format!(
                        "{:?} requires {discriminant} = {mode:?}, got {value:?}",
                        path.child(field).as_str()
                    ),
                ));
            }
        }
    }
}

fn unexpected(path: &DataPath) -> ConstraintViolation {
    ConstraintViolation::new(
        ViolationKind::Unexpected,
        vec![path.clone()],
        format!("{path}: unsupported attribute"),
    )
}

fn block_label(path: &DataPath) -> String {
    if path.is_root() {
        String::new()
    } else {
        format!("{path}: ")
    }
}
