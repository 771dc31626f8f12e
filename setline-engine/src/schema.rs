//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::LazyLock as Lazy;

use regex::Regex;

use crate::tree::Scalar;

static DEFAULT_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap());
static INTERFACE_FORMAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z]+(-\d+/\d+/\d+(:\d+)?|\d+)?(\.\d+)?$").unwrap()
});

/// Semantic type of a field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    String,
    // One-way flag: only `true` is ever rendered.
    Bool,
    Int,
    // Integer accepting a `k`/`m`/`g` unit suffix on input.
    Size,
    StringList(ListStyle),
    StringSet(ListStyle),
}

/// How a multi-valued field is laid out on the wire.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ListStyle {
    // One line per value, all sharing the same prefix.
    Lines,
    // All values as repeated tokens on a single line.
    Inline,
}

// Values the wire grammar cannot carry bare (whitespace, Junos special
// characters) are quoted whatever the field declares.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Quoting {
    #[default]
    IfNeeded,
    Always,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Presence {
    Required,
    #[default]
    Optional,
    // Filled in by the device; never rendered.
    Computed,
}

/// Value check attached to a field.
#[derive(Clone, Debug)]
pub enum Check {
    Length(usize, usize),
    Range(i64, i64),
    OneOf(&'static [&'static str]),
    Pattern(Regex),
    Format(Format),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Format {
    // Letters, digits, dashes and underscores.
    Default,
    InterfaceName,
    NoDoubleQuote,
}

/// Leaf of the schema.
#[derive(Clone, Debug)]
pub struct Field {
    // Attribute name in the tree.
    pub name: &'static str,
    // Wire token; empty for a positional value.
    pub token: &'static str,
    pub kind: FieldKind,
    pub presence: Presence,
    // Part of the object (or block instance) address.
    pub key: bool,
    pub quoting: Quoting,
    pub default: Option<Scalar>,
    pub checks: Vec<Check>,
    // Flag of the same block asserted by any line of this field. The device
    // omits the bare flag line once a more specific one is configured.
    pub implies: Option<&'static str>,
}

#[derive(Clone, Debug)]
pub enum BlockKind {
    Singleton,
    Repeated { keys: Vec<&'static str> },
}

/// Named substructure of the schema. The root of a resource is a block too.
#[derive(Clone, Debug)]
pub struct Block {
    pub name: &'static str,
    pub token: &'static str,
    pub kind: BlockKind,
    pub fields: Vec<Field>,
    pub blocks: Vec<Block>,
    pub rules: Vec<Rule>,
    // Presence block: rendered as the bare token when it has no content.
    pub allow_empty: bool,
}

// Member of a block addressed by a dotted path.
#[derive(Clone, Copy, Debug)]
pub enum Member<'a> {
    Field(&'a Field),
    Block(&'a Block),
}

/// Cross-field contract evaluated within the block declaring it.
///
/// Member names are dotted paths relative to that block.
#[derive(Clone, Debug)]
pub enum Rule {
    // `field` cannot carry a value together with any of `with`.
    Conflicts {
        field: &'static str,
        with: Vec<&'static str>,
    },
    // `field` is meaningless without every member of `requires`.
    Requires {
        field: &'static str,
        requires: Vec<&'static str>,
    },
    AtLeastOneOf(Vec<&'static str>),
    // While `discriminant` equals `mode`, every member of `forbidden` must
    // stay unset.
    Gate {
        discriminant: &'static str,
        mode: &'static str,
        forbidden: Vec<&'static str>,
    },
    // `field` may only be set while `discriminant` equals `mode`.
    RequiresMode {
        field: &'static str,
        discriminant: &'static str,
        mode: &'static str,
    },
}

// ===== impl Check =====

impl Check {
    pub fn pattern(pattern: &str) -> Result<Check, regex::Error> {
        Regex::new(pattern).map(Check::Pattern)
    }

    pub(crate) fn check_str(&self, value: &str) -> Result<(), String> {
        match self {
            Check::Length(min, max) => {
                let len = value.chars().count();
                if len < *min || len > *max {
                    return Err(format!(
                        "string length must be between {min} and {max}, got: {len}"
                    ));
                }
            }
            Check::OneOf(values) => {
                if !values.contains(&value) {
                    return Err(format!(
                        "value must be one of: {}, got: {value:?}",
                        values
                            .iter()
                            .map(|value| format!("{value:?}"))
                            .collect::<Vec<_>>()
                            .join(", ")
                    ));
                }
            }
            Check::Pattern(regex) => {
                if !regex.is_match(value) {
                    return Err(format!(
                        "value {value:?} must match {:?}",
                        regex.as_str()
                    ));
                }
            }
            Check::Format(format) => format.check(value)?,
            Check::Range(..) => (),
        }

        Ok(())
    }

    pub(crate) fn check_int(&self, value: i64) -> Result<(), String> {
        match self {
            Check::Range(min, max) => {
                if value < *min || value > *max {
                    return Err(format!(
                        "value must be between {min} and {max}, got: {value}"
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

// ===== impl Format =====

impl Format {
    fn check(&self, value: &str) -> Result<(), String> {
        let valid = match self {
            Format::Default => DEFAULT_FORMAT.is_match(value),
            Format::InterfaceName => INTERFACE_FORMAT.is_match(value),
            Format::NoDoubleQuote => !value.contains('"'),
        };
        if !valid {
            let expected = match self {
                Format::Default => {
                    "letters, digits, dashes and underscores only"
                }
                Format::InterfaceName => "an interface name",
                Format::NoDoubleQuote => "no double quote",
            };
            return Err(format!("value {value:?} must contain {expected}"));
        }

        Ok(())
    }
}

// ===== impl Field =====

impl Field {
    pub fn new(
        name: &'static str,
        token: &'static str,
        kind: FieldKind,
    ) -> Field {
        Field {
            name,
            token,
            kind,
            presence: Presence::Optional,
            key: false,
            quoting: Quoting::IfNeeded,
            default: None,
            checks: vec![],
            implies: None,
        }
    }

    pub fn string(name: &'static str, token: &'static str) -> Field {
        Field::new(name, token, FieldKind::String)
    }

    pub fn flag(name: &'static str, token: &'static str) -> Field {
        Field::new(name, token, FieldKind::Bool)
    }

    pub fn int(name: &'static str, token: &'static str) -> Field {
        Field::new(name, token, FieldKind::Int)
    }

    pub fn size(name: &'static str, token: &'static str) -> Field {
        Field::new(name, token, FieldKind::Size)
    }

    pub fn list(
        name: &'static str,
        token: &'static str,
        style: ListStyle,
    ) -> Field {
        Field::new(name, token, FieldKind::StringList(style))
    }

    pub fn set(
        name: &'static str,
        token: &'static str,
        style: ListStyle,
    ) -> Field {
        Field::new(name, token, FieldKind::StringSet(style))
    }

    // Key fields are part of the address and always required.
    #[must_use]
    pub fn key(mut self) -> Field {
        self.key = true;
        self.presence = Presence::Required;
        self
    }

    #[must_use]
    pub fn required(mut self) -> Field {
        self.presence = Presence::Required;
        self
    }

    #[must_use]
    pub fn computed(mut self) -> Field {
        self.presence = Presence::Computed;
        self
    }

    #[must_use]
    pub fn quoted(mut self, quoting: Quoting) -> Field {
        self.quoting = quoting;
        self
    }

    #[must_use]
    pub fn default_value<V: Into<Scalar>>(mut self, value: V) -> Field {
        self.default = Some(value.into());
        self
    }

    #[must_use]
    pub fn check(mut self, check: Check) -> Field {
        self.checks.push(check);
        self
    }

    #[must_use]
    pub fn implies(mut self, flag: &'static str) -> Field {
        self.implies = Some(flag);
        self
    }

    pub fn is_positional(&self) -> bool {
        self.token.is_empty()
    }

    // Whether the field appears in rendered lines.
    pub fn is_rendered(&self) -> bool {
        !self.key && self.presence != Presence::Computed
    }
}

// ===== impl Block =====

impl Block {
    fn new(name: &'static str, token: &'static str, kind: BlockKind) -> Block {
        Block {
            name,
            token,
            kind,
            fields: vec![],
            blocks: vec![],
            rules: vec![],
            allow_empty: false,
        }
    }

    // Root block of a resource.
    pub fn root(name: &'static str) -> Block {
        Block::new(name, "", BlockKind::Singleton)
    }

    pub fn singleton(name: &'static str, token: &'static str) -> Block {
        Block::new(name, token, BlockKind::Singleton)
    }

    pub fn repeated(
        name: &'static str,
        token: &'static str,
        keys: &[&'static str],
    ) -> Block {
        let keys = keys.to_vec();
        Block::new(name, token, BlockKind::Repeated { keys })
    }

    #[must_use]
    pub fn field(mut self, field: Field) -> Block {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn block(mut self, block: Block) -> Block {
        self.blocks.push(block);
        self
    }

    #[must_use]
    pub fn rule(mut self, rule: Rule) -> Block {
        self.rules.push(rule);
        self
    }

    #[must_use]
    pub fn allow_empty(mut self) -> Block {
        self.allow_empty = true;
        self
    }

    pub fn get_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn get_block(&self, name: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| block.name == name)
    }

    // Key fields of a repeated block, in key order.
    pub fn key_fields(&self) -> Vec<&Field> {
        match &self.kind {
            BlockKind::Repeated { keys } => keys
                .iter()
                .filter_map(|key| self.get_field(key))
                .collect(),
            BlockKind::Singleton => vec![],
        }
    }

    // Resolves a dotted path through nested blocks.
    pub fn resolve(&self, path: &str) -> Option<Member<'_>> {
        match path.split_once('.') {
            Some((head, tail)) => self.get_block(head)?.resolve(tail),
            None => self
                .get_field(path)
                .map(Member::Field)
                .or_else(|| self.get_block(path).map(Member::Block)),
        }
    }
}

// ===== impl Rule =====

impl Rule {
    pub fn conflicts(field: &'static str, with: &[&'static str]) -> Rule {
        Rule::Conflicts {
            field,
            with: with.to_vec(),
        }
    }

    pub fn requires(field: &'static str, requires: &[&'static str]) -> Rule {
        Rule::Requires {
            field,
            requires: requires.to_vec(),
        }
    }

    pub fn at_least_one_of(names: &[&'static str]) -> Rule {
        Rule::AtLeastOneOf(names.to_vec())
    }

    pub fn gate(
        discriminant: &'static str,
        mode: &'static str,
        forbidden: &[&'static str],
    ) -> Rule {
        Rule::Gate {
            discriminant,
            mode,
            forbidden: forbidden.to_vec(),
        }
    }

    pub fn requires_mode(
        field: &'static str,
        discriminant: &'static str,
        mode: &'static str,
    ) -> Rule {
        Rule::RequiresMode {
            field,
            discriminant,
            mode,
        }
    }
}
