//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::error::IdentityError;
use crate::tree::{Node, Value};
use crate::validate::scalar_text;

// Separator between identifier segments.
pub const ID_SEPARATOR: &str = "_-_";

// Sentinel routing-instance value standing for the master instance.
pub const DEFAULT_ROUTING_INSTANCE: &str = "default";

/// One segment of a composite object identifier.
#[derive(Clone, Copy, Debug)]
pub struct KeySegment {
    pub field: &'static str,
    // Value assumed when the segment is omitted.
    pub default: Option<&'static str>,
}

/// External identifier of a configuration object.
///
/// Segments follow the order of the resource key segments. The textual form
/// always carries every segment, so parsing it back yields the same
/// identity.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Identity {
    segments: Vec<(String, String)>,
}

// ===== impl KeySegment =====

impl KeySegment {
    pub const fn new(field: &'static str) -> KeySegment {
        KeySegment {
            field,
            default: None,
        }
    }

    pub const fn with_default(
        field: &'static str,
        default: &'static str,
    ) -> KeySegment {
        KeySegment {
            field,
            default: Some(default),
        }
    }
}

// ===== impl Identity =====

impl Identity {
    // Builds the identity out of the key fields of a tree.
    pub fn from_tree(
        keys: &[KeySegment],
        tree: &Node,
    ) -> Result<Identity, IdentityError> {
        let segments = keys
            .iter()
            .map(|segment| {
                let value = tree
                    .field(segment.field)
                    .as_known()
                    .and_then(scalar_text)
                    .filter(|value| !value.is_empty())
                    .or_else(|| segment.default.map(str::to_owned))
                    .ok_or(IdentityError::MissingSegment(segment.field))?;
                check_value(segment, value)
            })
            .collect::<Result<_, _>>()?;

        Ok(Identity { segments })
    }

    // Parses an identifier string. Trailing segments may be omitted when
    // they have a default.
    pub fn parse(
        keys: &[KeySegment],
        id: &str,
    ) -> Result<Identity, IdentityError> {
        let parts = id.split(ID_SEPARATOR).collect::<Vec<_>>();
        if parts.len() > keys.len() {
            return Err(IdentityError::TooManySegments(keys.len(), parts.len()));
        }

        let segments = keys
            .iter()
            .enumerate()
            .map(|(idx, segment)| match parts.get(idx) {
                Some(part) if part.is_empty() => {
                    Err(IdentityError::EmptySegment(segment.field))
                }
                Some(part) => check_value(segment, (*part).to_owned()),
                None => segment
                    .default
                    .ok_or(IdentityError::MissingSegment(segment.field))
                    .map(|default| {
                        (segment.field.to_owned(), default.to_owned())
                    }),
            })
            .collect::<Result<_, _>>()?;

        Ok(Identity { segments })
    }

    // Value of a key field.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.segments
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(|(_, value)| value.as_str())
    }

    // Seeds a tree with the key fields.
    pub fn apply(&self, tree: &mut Node) {
        for (field, value) in &self.segments {
            tree.set_field(field, Value::known(value.as_str()));
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.values().join(ID_SEPARATOR))
    }
}

// ===== helper functions =====

fn check_value(
    segment: &KeySegment,
    value: String,
) -> Result<(String, String), IdentityError> {
    if value.contains(ID_SEPARATOR) {
        return Err(IdentityError::SeparatorInValue(segment.field, value));
    }
    Ok((segment.field.to_owned(), value))
}

// ===== unit tests =====
