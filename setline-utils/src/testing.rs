//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::sync::Once;

use derive_new::new;
use tracing::info;

use crate::session::{ConfigSession, SessionError};
use crate::{CONFIG_OUTPUT_END, CONFIG_OUTPUT_START, DELETE_VERB, SET_VERB};

static INIT: Once = Once::new();

const SHOW_PREFIX: &str = "show configuration ";
const SHOW_SUFFIX: &str = " | display set relative";

/// In-memory device holding a flat set-style configuration database.
///
/// Lines are stored without the `set` verb. Scoped queries of the form
/// `show configuration <address> | display set relative` return the lines
/// under `<address>` with the address stripped, framed by the
/// configuration-output markers.
#[derive(Debug, Default)]
pub struct MockDevice {
    running: Vec<String>,
    candidate: Option<Vec<String>>,
    pending: Vec<String>,
    faults: Faults,
    pub commands: Vec<String>,
    pub transactions: Vec<Transaction>,
}

// Failures the device injects on demand.
#[derive(Debug, Default)]
struct Faults {
    commit: Option<String>,
    config_set: Option<String>,
    silent_drops: Vec<String>,
}

// Committed transaction: the lines loaded since the previous commit.
#[derive(Clone, Debug, Eq, PartialEq, new)]
pub struct Transaction {
    pub lines: Vec<String>,
    pub comment: String,
}

// ===== impl MockDevice =====

impl MockDevice {
    pub fn new() -> MockDevice {
        MockDevice::default()
    }

    // Creates a device with a pre-existing running configuration.
    pub fn with_config<I, L>(lines: I) -> MockDevice
    where
        I: IntoIterator<Item = L>,
        L: AsRef<str>,
    {
        let running = lines
            .into_iter()
            .map(|line| strip_set(line.as_ref()).to_owned())
            .collect();
        MockDevice {
            running,
            ..Default::default()
        }
    }

    pub fn running(&self) -> &[String] {
        &self.running
    }

    // Returns whether a candidate configuration is pending.
    pub fn has_candidate(&self) -> bool {
        self.candidate.is_some()
    }

    // Makes the next commit fail with the given message.
    pub fn fail_next_commit(&mut self, message: &str) {
        self.faults.commit = Some(message.to_owned());
    }

    // Makes the next configuration load fail with the given message.
    pub fn fail_next_config_set(&mut self, message: &str) {
        self.faults.config_set = Some(message.to_owned());
    }

    // Accepts commits but silently discards everything under `address`.
    pub fn drop_on_commit(&mut self, address: &str) {
        self.faults.silent_drops.push(address.to_owned());
    }

    fn show(&self, address: &str) -> String {
        let mut output = format!("\n{CONFIG_OUTPUT_START}\n");
        for line in &self.running {
            match relative(line, address) {
                Some("") => output.push_str(&format!("{SET_VERB}\n")),
                Some(rest) => output.push_str(&format!("{SET_VERB} {rest}\n")),
                None => (),
            }
        }
        output.push_str(CONFIG_OUTPUT_END);
        output.push('\n');
        output
    }
}

impl ConfigSession for MockDevice {
    fn command(&mut self, query: &str) -> Result<String, SessionError> {
        self.commands.push(query.to_owned());
        let address = query
            .strip_prefix(SHOW_PREFIX)
            .and_then(|query| query.strip_suffix(SHOW_SUFFIX))
            .ok_or_else(|| {
                SessionError::Command(format!("syntax error: {query}"))
            })?;
        Ok(self.show(address))
    }

    fn config_set(&mut self, lines: &[String]) -> Result<(), SessionError> {
        if let Some(error) = self.faults.config_set.take() {
            return Err(SessionError::ConfigSet(error));
        }

        let mut candidate =
            self.candidate.take().unwrap_or_else(|| self.running.clone());
        for line in lines {
            let line = line.trim();
            if let Some(path) = verb_arg(line, SET_VERB) {
                if !candidate.iter().any(|existing| existing == path) {
                    candidate.push(path.to_owned());
                }
            } else if let Some(path) = verb_arg(line, DELETE_VERB) {
                candidate.retain(|existing| relative(existing, path).is_none());
            } else {
                return Err(SessionError::ConfigSet(format!(
                    "syntax error: {line}"
                )));
            }
        }
        self.candidate = Some(candidate);
        self.pending.extend(lines.iter().cloned());

        Ok(())
    }

    fn commit(&mut self, comment: &str) -> Result<(), SessionError> {
        if let Some(error) = self.faults.commit.take() {
            return Err(SessionError::Commit(error));
        }

        if let Some(mut candidate) = self.candidate.take() {
            for address in &self.faults.silent_drops {
                candidate.retain(|line| relative(line, address).is_none());
            }
            self.running = candidate;
        }
        let lines = std::mem::take(&mut self.pending);
        self.transactions.push(Transaction::new(lines, comment.to_owned()));

        Ok(())
    }

    fn config_clear(&mut self) -> Result<(), SessionError> {
        self.candidate = None;
        self.pending.clear();
        Ok(())
    }
}

// ===== helper functions =====

fn strip_set(line: &str) -> &str {
    verb_arg(line.trim(), SET_VERB).unwrap_or(line.trim())
}

fn verb_arg<'a>(line: &'a str, verb: &str) -> Option<&'a str> {
    line.strip_prefix(verb)
        .and_then(|rest| rest.strip_prefix(' '))
        .map(str::trim)
}

// Returns the part of `line` under `address`, if any.
fn relative<'a>(line: &'a str, address: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(address)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix(' ')
    }
}

// ===== global functions =====

// Installs a tracing subscriber writing to the test output, once per process.
pub fn setup() {
    INIT.call_once(|| {
        tracing_subscriber::fmt::Subscriber::builder()
            .with_target(false)
            .with_ansi(false)
            .with_test_writer()
            .with_max_level(tracing::Level::TRACE)
            .init();

        info!("starting");
    });
}

// ===== unit tests =====
