//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::collections::BTreeSet;

use itertools::Itertools;
use setline_utils::quote::{needs_quoting, quote};
use setline_utils::units::parse_size;

use crate::debug::Debug;
use crate::error::{EncodingError, Error};
use crate::path::DataPath;
use crate::schema::{
    Block, BlockKind, Field, FieldKind, ListStyle, Quoting, Rule,
};
use crate::tree::{BlockValue, MemberState, Node, Scalar, Value};
use crate::validate::{discriminant_value, scalar_text};

// ===== global functions =====

/// Renders a fully resolved tree into an ordered list of configuration
/// lines.
///
/// Every line starts with `prefix`, which is expected to end with a space
/// (e.g. `"set forwarding-options dhcp-relay group g1 "`). Fields render in
/// schema declaration order, followed by nested blocks, so the output is
/// reproducible for identical input.
pub fn render(
    schema: &Block,
    tree: &Node,
    prefix: &str,
) -> Result<Vec<String>, Error> {
    let mut lines = vec![];
    render_block(schema, tree, prefix, &DataPath::root(), &mut lines)?;
    Debug::LinesRendered(schema.name, lines.len()).log();
    Ok(lines)
}

// ===== helper functions =====

fn render_block(
    block: &Block,
    node: &Node,
    prefix: &str,
    path: &DataPath,
    lines: &mut Vec<String>,
) -> Result<(), EncodingError> {
    check_modes(block, node, path)?;

    for field in block.fields.iter().filter(|field| field.is_rendered()) {
        let field_path = path.child(field.name);
        let value = node.field(field.name);
        render_field(field, value, prefix, &field_path, lines)?;
    }

    for child in &block.blocks {
        let child_path = path.child(child.name);
        match (node.block(child.name), &child.kind) {
            (None, _) => (),
            (Some(BlockValue::Unknown), _) => {
                return Err(EncodingError::Unresolved(child_path));
            }
            (Some(BlockValue::Singleton(inner)), BlockKind::Singleton) => {
                let start = lines.len();
                let child_prefix = format!("{prefix}{} ", child.token);
                render_block(child, inner, &child_prefix, &child_path, lines)?;
                if lines.len() == start {
                    if !child.allow_empty {
                        return Err(EncodingError::EmptyBlock(child_path));
                    }
                    lines.push(format!("{prefix}{}", child.token));
                }
            }
            (
                Some(BlockValue::Repeated(instances)),
                BlockKind::Repeated { .. },
            ) => {
                let keys = instance_keys(child, instances, path)?;
                for (instance, key) in instances.iter().zip(keys) {
                    let instance_prefix = format!(
                        "{prefix}{} {}",
                        child.token,
                        key.iter().map(|value| encode_key(value)).join(" ")
                    );
                    let instance_path =
                        path.instance(child.name, key.as_slice());
                    let start = lines.len();
                    render_block(
                        child,
                        instance,
                        &format!("{instance_prefix} "),
                        &instance_path,
                        lines,
                    )?;
                    // An instance without content is still addressable.
                    if lines.len() == start {
                        lines.push(instance_prefix);
                    }
                }
            }
            _ => return Err(EncodingError::KindMismatch(child_path)),
        }
    }

    Ok(())
}

// Mode rules are enforced again at render time, independently of
// validation.
fn check_modes(
    block: &Block,
    node: &Node,
    path: &DataPath,
) -> Result<(), EncodingError> {
    let known = |name: &str| node.member_state(name) == MemberState::Known;

    for rule in &block.rules {
        match rule {
            Rule::Gate {
                discriminant,
                mode,
                forbidden,
            } => {
                if discriminant_value(block, node, discriminant).as_deref()
                    != Some(*mode)
                {
                    continue;
                }
                if let Some(name) = forbidden.iter().find(|name| known(name)) {
                    return Err(EncodingError::DiscriminantConflict(
                        path.child(name),
                        *discriminant,
                        mode.to_string(),
                    ));
                }
            }
            Rule::RequiresMode {
                field,
                discriminant,
                mode,
            } => {
                if known(field)
                    && let Some(value) =
                        discriminant_value(block, node, discriminant)
                    && value != *mode
                {
                    return Err(EncodingError::DiscriminantConflict(
                        path.child(field),
                        *discriminant,
                        value,
                    ));
                }
            }
            _ => (),
        }
    }

    Ok(())
}

// Collects the key of every instance, rejecting duplicates.
fn instance_keys(
    block: &Block,
    instances: &[Node],
    path: &DataPath,
) -> Result<Vec<Vec<String>>, EncodingError> {
    let key_fields = block.key_fields();
    let mut seen = BTreeSet::new();
    let mut keys = Vec::with_capacity(instances.len());

    for instance in instances {
        let mut key = Vec::with_capacity(key_fields.len());
        for field in &key_fields {
            let field_path = path.child(block.name).child(field.name);
            let value = match instance.field(field.name) {
                Value::Unknown => {
                    return Err(EncodingError::Unresolved(field_path));
                }
                Value::Known(scalar) if !scalar.is_empty() => {
                    scalar_text(scalar)
                        .ok_or(EncodingError::KindMismatch(field_path))?
                }
                _ => return Err(EncodingError::MissingKey(field_path)),
            };
            key.push(value);
        }

        if !seen.insert(key.clone()) {
            return Err(EncodingError::DuplicateKey(
                path.instance(block.name, key.as_slice()),
                key.join(" "),
            ));
        }
        keys.push(key);
    }

    Ok(keys)
}

fn render_field(
    field: &Field,
    value: &Value,
    prefix: &str,
    path: &DataPath,
    lines: &mut Vec<String>,
) -> Result<(), EncodingError> {
    let scalar = match value {
        Value::Null => return Ok(()),
        Value::Unknown => return Err(EncodingError::Unresolved(path.clone())),
        Value::Known(scalar) if scalar.is_empty() => return Ok(()),
        Value::Known(scalar) => scalar,
    };

    // Flags carry no value: the token alone asserts them.
    if field.kind == FieldKind::Bool {
        return match scalar {
            Scalar::Bool(_) => {
                lines.push(format!("{prefix}{}", field.token));
                Ok(())
            }
            _ => Err(EncodingError::KindMismatch(path.clone())),
        };
    }

    let head = if field.is_positional() {
        prefix.to_owned()
    } else {
        format!("{prefix}{} ", field.token)
    };

    let scalar = encoded_scalar(field, scalar, path)?;
    if field.default.as_ref() == Some(&scalar) {
        return Ok(());
    }

    match (field.kind, scalar) {
        (FieldKind::String, Scalar::String(value)) => {
            let value = encode_string(field.quoting, &value);
            lines.push(format!("{head}{value}"));
        }
        (FieldKind::Int | FieldKind::Size, Scalar::Int(value)) => {
            lines.push(format!("{head}{value}"));
        }
        (
            FieldKind::StringList(style) | FieldKind::StringSet(style),
            Scalar::List(values),
        ) => {
            let values = values
                .iter()
                .map(|value| encode_string(field.quoting, value))
                .collect::<Vec<_>>();
            match style {
                ListStyle::Lines => {
                    lines.extend(
                        values.iter().map(|value| format!("{head}{value}")),
                    );
                }
                ListStyle::Inline if values.len() == 1 => {
                    lines.push(format!("{head}{}", values[0]));
                }
                ListStyle::Inline => {
                    lines.push(format!("{head}[ {} ]", values.join(" ")));
                }
            }
        }
        _ => return Err(EncodingError::KindMismatch(path.clone())),
    }

    Ok(())
}

// Converts a value to the form it takes on the wire: numbers parsed, size
// units expanded, sets sorted.
fn encoded_scalar(
    field: &Field,
    scalar: &Scalar,
    path: &DataPath,
) -> Result<Scalar, EncodingError> {
    let scalar = match (field.kind, scalar) {
        (FieldKind::Int, Scalar::String(value)) => value
            .trim()
            .parse::<i64>()
            .map(Scalar::Int)
            .map_err(|_| {
                EncodingError::InvalidNumber(path.clone(), value.clone())
            })?,
        (FieldKind::Size, Scalar::String(value)) => parse_size(value)
            .map(Scalar::Int)
            .map_err(|error| EncodingError::InvalidSize(path.clone(), error))?,
        (FieldKind::StringSet(_), Scalar::List(values)) => {
            Scalar::List(values.iter().sorted().dedup().cloned().collect())
        }
        _ => scalar.clone(),
    };

    Ok(scalar)
}

fn encode_string(quoting: Quoting, value: &str) -> String {
    if quoting == Quoting::Always || needs_quoting(value) {
        return quote(value);
    }
    value.to_owned()
}

fn encode_key(value: &str) -> String {
    encode_string(Quoting::IfNeeded, value)
}
