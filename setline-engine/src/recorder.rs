//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::io::{BufRead, Write};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use setline_utils::session::{ConfigSession, SessionError};
use tracing::warn;

use crate::config;
use crate::debug::Debug;

/// Session exchange worth recording.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Record {
    Command { query: String },
    ConfigSet { lines: Vec<String> },
    Commit { comment: String },
    Clear,
}

#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct Entry {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub record: Record,
}

/// Session wrapper appending every exchange to a JSONL file.
///
/// Recording is best effort: the first write failure disables the recorder
/// and the session keeps working.
#[derive(Debug)]
pub struct Recorder<S> {
    session: S,
    file: Option<std::fs::File>,
    path: String,
}

// ===== impl Recorder =====

impl<S> Recorder<S>
where
    S: ConfigSession,
{
    // Wraps a session. Nothing is recorded when the recorder is disabled or
    // the file cannot be opened.
    pub fn new(session: S, config: &config::Recorder) -> Recorder<S> {
        let file = config.enabled.then(|| open(&config.path)).flatten();
        Recorder {
            session,
            file,
            path: config.path.clone(),
        }
    }

    pub fn is_recording(&self) -> bool {
        self.file.is_some()
    }

    pub fn into_inner(self) -> S {
        self.session
    }

    fn record(&mut self, record: Record) {
        let Some(file) = &mut self.file else {
            return;
        };

        let entry = Entry {
            timestamp: Utc::now(),
            record,
        };
        let result = serde_json::to_string(&entry)
            .map_err(std::io::Error::from)
            .and_then(|entry| writeln!(file, "{entry}"));
        if let Err(error) = result {
            warn!(%error, "couldn't write to file");
            Debug::RecorderDisabled(&self.path).log();
            self.file = None;
        }
    }
}

impl<S> ConfigSession for Recorder<S>
where
    S: ConfigSession,
{
    fn command(&mut self, query: &str) -> Result<String, SessionError> {
        self.record(Record::Command {
            query: query.to_owned(),
        });
        self.session.command(query)
    }

    fn config_set(&mut self, lines: &[String]) -> Result<(), SessionError> {
        self.record(Record::ConfigSet {
            lines: lines.to_vec(),
        });
        self.session.config_set(lines)
    }

    fn commit(&mut self, comment: &str) -> Result<(), SessionError> {
        self.record(Record::Commit {
            comment: comment.to_owned(),
        });
        self.session.commit(comment)
    }

    fn config_clear(&mut self) -> Result<(), SessionError> {
        self.record(Record::Clear);
        self.session.config_clear()
    }
}

// ===== helper functions =====

fn open(path: &str) -> Option<std::fs::File> {
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
    {
        Ok(file) => Some(file),
        Err(error) => {
            warn!(%error, %path, "couldn't open file");
            None
        }
    }
}

// ===== global functions =====

// Loads the entries of a recorded session. Malformed lines are skipped.
pub fn load<R: BufRead>(reader: R) -> std::io::Result<Vec<Entry>> {
    let mut entries = vec![];
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(entry) => entries.push(entry),
            Err(error) => warn!(%error, "skipping malformed record"),
        }
    }

    Ok(entries)
}

// Re-applies the mutating records of a session. Queries are not replayed.
pub fn replay<S>(session: &mut S, entries: &[Entry]) -> Result<(), SessionError>
where
    S: ConfigSession + ?Sized,
{
    for entry in entries {
        match &entry.record {
            Record::Command { .. } => (),
            Record::ConfigSet { lines } => session.config_set(lines)?,
            Record::Commit { comment } => session.commit(comment)?,
            Record::Clear => session.config_clear()?,
        }
    }

    Ok(())
}
