//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![allow(clippy::derivable_impls)]

use serde::{Deserialize, Serialize};
use setline_utils::{CONFIG_OUTPUT_END, CONFIG_OUTPUT_START, SET_VERB};

use crate::error::Error;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub framing: Framing,
    pub commit: Commit,
    pub checks: Checks,
    pub recorder: Recorder,
}

// Text surrounding the configuration lines of a scoped query.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Framing {
    pub start_marker: String,
    pub end_marker: String,
    pub set_marker: String,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Commit {
    // Prepended to every commit comment.
    pub comment_prefix: String,
    // Re-read the object after each commit.
    pub verify: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Checks {
    // Verify referenced objects exist before creating an object.
    pub dependencies: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Recorder {
    pub enabled: bool,
    pub path: String,
}

// ===== impl Config =====

impl Config {
    pub fn from_toml(config: &str) -> Result<Config, Error> {
        toml::from_str(config).map_err(Error::Config)
    }
}

// ===== impl Framing =====

impl Framing {
    // Returns the configuration lines of a query output.
    //
    // Everything up to the start marker is skipped when the marker is
    // present; the end marker stops the scan. Blank lines are dropped.
    pub fn body_lines<'a>(&self, output: &'a str) -> Vec<&'a str> {
        let mut lines = output.lines().map(str::trim);
        if output.lines().any(|line| line.trim() == self.start_marker) {
            for line in lines.by_ref() {
                if line == self.start_marker {
                    break;
                }
            }
        }
        lines
            .take_while(|line| *line != self.end_marker)
            .filter(|line| !line.is_empty())
            .collect()
    }

    // Strips the leading set marker from a body line.
    //
    // A bare marker stands for the queried address itself and yields an
    // empty line.
    pub fn strip_set<'a>(&self, line: &'a str) -> &'a str {
        if line == self.set_marker {
            return "";
        }
        line.strip_prefix(self.set_marker.as_str())
            .and_then(|rest| rest.strip_prefix(' '))
            .unwrap_or(line)
    }
}

impl Default for Framing {
    fn default() -> Framing {
        Framing {
            start_marker: CONFIG_OUTPUT_START.to_owned(),
            end_marker: CONFIG_OUTPUT_END.to_owned(),
            set_marker: SET_VERB.to_owned(),
        }
    }
}

// ===== impl Commit =====

impl Default for Commit {
    fn default() -> Commit {
        Commit {
            comment_prefix: String::new(),
            verify: true,
        }
    }
}

// ===== impl Checks =====

impl Default for Checks {
    fn default() -> Checks {
        Checks { dependencies: true }
    }
}

// ===== impl Recorder =====

impl Default for Recorder {
    fn default() -> Recorder {
        Recorder {
            enabled: false,
            path: "/var/tmp/setline-session.jsonl".to_owned(),
        }
    }
}
