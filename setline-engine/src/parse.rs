//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::cmp::Reverse;

use setline_utils::quote::{split_segment, split_segments, unquote};
use setline_utils::units::parse_size;

use crate::config::Framing;
use crate::debug::Debug;
use crate::error::{Error, ParseError};
use crate::path::DataPath;
use crate::schema::{Block, BlockKind, Field, FieldKind, ListStyle, Presence};
use crate::tree::{BlockValue, Node, Scalar, Value};

/// How a dispatch entry matches the head of a line.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Matcher {
    // The line is the token itself.
    Exact,
    // The line is the token followed by a value.
    Prefix,
    ExactOrPrefix,
    // Any line; used by positional values.
    Any,
}

#[derive(Debug)]
pub enum Handler<'a> {
    Field(&'a Field),
    Block(&'a Block, Dispatcher<'a>),
}

#[derive(Debug)]
pub struct Entry<'a> {
    pub token: &'static str,
    pub matcher: Matcher,
    pub handler: Handler<'a>,
}

/// Ordered dispatch table of one block.
///
/// Entries are sorted by token specificity (number of words, most specific
/// first). Entries with equally specific tokens keep their declaration
/// order, fields before blocks. The first matching entry wins.
#[derive(Debug)]
pub struct Dispatcher<'a> {
    entries: Vec<Entry<'a>>,
}

/// Rebuilds attribute trees out of configuration lines.
#[derive(Debug)]
pub struct Parser<'a> {
    schema: &'a Block,
    dispatcher: Dispatcher<'a>,
    framing: Framing,
}

// ===== impl Matcher =====

impl Matcher {
    // Returns the remainder of the line after the token, if it matches.
    pub fn matches<'l>(&self, token: &str, line: &'l str) -> Option<&'l str> {
        match self {
            Matcher::Exact => (line == token).then_some(""),
            Matcher::Prefix => line
                .strip_prefix(token)?
                .strip_prefix(' ')
                .map(str::trim_start)
                .filter(|rest| !rest.is_empty()),
            Matcher::ExactOrPrefix => {
                if line == token {
                    Some("")
                } else {
                    Matcher::Prefix.matches(token, line)
                }
            }
            Matcher::Any => Some(line),
        }
    }
}

// ===== impl Dispatcher =====

impl<'a> Dispatcher<'a> {
    pub fn new(block: &'a Block) -> Dispatcher<'a> {
        let mut entries = vec![];

        // Key fields are carried by the address, not by their own lines.
        for field in block.fields.iter().filter(|field| !field.key) {
            let matcher = match field.kind {
                _ if field.is_positional() => Matcher::Any,
                FieldKind::Bool => Matcher::Exact,
                _ => Matcher::Prefix,
            };
            entries.push(Entry {
                token: field.token,
                matcher,
                handler: Handler::Field(field),
            });
        }
        for child in &block.blocks {
            let matcher = match child.kind {
                BlockKind::Singleton if child.allow_empty => {
                    Matcher::ExactOrPrefix
                }
                BlockKind::Singleton | BlockKind::Repeated { .. } => {
                    Matcher::Prefix
                }
            };
            entries.push(Entry {
                token: child.token,
                matcher,
                handler: Handler::Block(child, Dispatcher::new(child)),
            });
        }

        // Stable sort: declaration order is kept among equal tokens.
        entries.sort_by_key(|entry| {
            Reverse(entry.token.split_whitespace().count())
        });

        Dispatcher { entries }
    }

    pub fn entries(&self) -> &[Entry<'a>] {
        &self.entries
    }

    // Finds the first entry matching the line, along with the line
    // remainder.
    pub fn dispatch<'l>(&self, line: &'l str) -> Option<(&Entry<'a>, &'l str)> {
        self.entries.iter().find_map(|entry| {
            entry
                .matcher
                .matches(entry.token, line)
                .map(|rest| (entry, rest))
        })
    }
}

// ===== impl Parser =====

impl<'a> Parser<'a> {
    pub fn new(schema: &'a Block) -> Parser<'a> {
        Parser {
            schema,
            dispatcher: Dispatcher::new(schema),
            framing: Framing::default(),
        }
    }

    #[must_use]
    pub fn with_framing(mut self, framing: Framing) -> Parser<'a> {
        self.framing = framing;
        self
    }

    /// Parses configuration lines relative to the object address on top of
    /// `seed` (usually holding the key fields).
    ///
    /// Framing marker lines are skipped, the end marker stops the pass and a
    /// leading set marker is stripped. Fields left unset receive their
    /// default value once all lines are consumed.
    pub fn parse_lines<I, L>(&self, seed: Node, lines: I) -> Result<Node, Error>
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let mut tree = seed;

        for line in lines {
            let line = line.as_ref().trim();
            if line == self.framing.end_marker {
                break;
            }
            if line == self.framing.start_marker {
                continue;
            }
            let line = self.framing.strip_set(line);
            if line.is_empty() {
                continue;
            }
            parse_line(&self.dispatcher, &mut tree, line, &DataPath::root())?;
        }

        apply_defaults(self.schema, &mut tree);

        Ok(tree)
    }

    /// Parses the raw output of a scoped configuration query.
    pub fn parse_output(
        &self,
        seed: Node,
        output: &str,
    ) -> Result<Node, Error> {
        let lines = self.framing.body_lines(output);
        self.parse_lines(seed, lines)
    }
}

// ===== helper functions =====

fn parse_line(
    dispatcher: &Dispatcher<'_>,
    node: &mut Node,
    line: &str,
    path: &DataPath,
) -> Result<(), ParseError> {
    let Some((entry, rest)) = dispatcher.dispatch(line) else {
        Debug::LineIgnored(line).log();
        return Ok(());
    };

    match &entry.handler {
        Handler::Field(field) => {
            parse_field(field, node, rest, &path.child(field.name))
        }
        Handler::Block(block, dispatcher) => match &block.kind {
            BlockKind::Singleton => {
                let child = node.singleton_mut(block.name);
                if rest.is_empty() {
                    return Ok(());
                }
                parse_line(dispatcher, child, rest, &path.child(block.name))
            }
            BlockKind::Repeated { .. } => {
                let key_fields = block.key_fields();
                let mut key = Vec::with_capacity(key_fields.len());
                let mut rest = rest;
                for _ in &key_fields {
                    let (segment, remainder) = split_segment(rest);
                    if segment.is_empty() {
                        return Err(ParseError::MissingKey(
                            path.child(block.name),
                            line.to_owned(),
                        ));
                    }
                    key.push(segment);
                    rest = remainder;
                }

                // Lines of one instance need not be contiguous: merge them
                // into the instance with the same key.
                let instance = node.instance_mut(block.name, &key_fields, &key);
                if rest.is_empty() {
                    return Ok(());
                }
                let instance_path = path.instance(block.name, key.as_slice());
                parse_line(dispatcher, instance, rest, &instance_path)
            }
        },
    }
}

fn parse_field(
    field: &Field,
    node: &mut Node,
    rest: &str,
    path: &DataPath,
) -> Result<(), ParseError> {
    let scalar = match field.kind {
        FieldKind::Bool => Scalar::Bool(true),
        FieldKind::String => Scalar::String(unquote(rest)),
        FieldKind::Int => {
            let value = unquote(rest);
            let number = value
                .parse::<i64>()
                .map_err(|_| ParseError::InvalidNumber(path.clone(), value))?;
            Scalar::Int(number)
        }
        FieldKind::Size => {
            let size = parse_size(&unquote(rest))
                .map_err(|error| ParseError::InvalidSize(path.clone(), error))?;
            Scalar::Int(size)
        }
        FieldKind::StringList(style) | FieldKind::StringSet(style) => {
            let mut values = match node.field(field.name) {
                Value::Known(Scalar::List(values)) => values.clone(),
                _ => vec![],
            };
            // A line of a line-per-value list carries exactly one value.
            match style {
                ListStyle::Lines => values.push(unquote(rest)),
                ListStyle::Inline => values.extend(split_segments(rest)),
            }
            if let FieldKind::StringSet(_) = field.kind {
                values.sort();
                values.dedup();
            }
            Scalar::List(values)
        }
    };

    node.set_field(field.name, Value::Known(scalar));
    if let Some(flag) = field.implies {
        node.set_field(flag, Value::Known(Scalar::Bool(true)));
    }

    Ok(())
}

// Fills in the declared default of every field the device left unset.
fn apply_defaults(block: &Block, node: &mut Node) {
    for field in &block.fields {
        if field.presence == Presence::Computed
            || !node.field(field.name).is_null()
        {
            continue;
        }
        if let Some(default) = &field.default {
            node.set_field(field.name, Value::Known(default.clone()));
        }
    }

    for child in &block.blocks {
        match node.blocks.get_mut(child.name) {
            Some(BlockValue::Singleton(inner)) => apply_defaults(child, inner),
            Some(BlockValue::Repeated(instances)) => {
                for instance in instances {
                    apply_defaults(child, instance);
                }
            }
            _ => (),
        }
    }
}
