//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::{debug, debug_span, trace, trace_span};

use crate::driver::ObjectState;

// Engine debug messages.
#[derive(Debug)]
pub enum Debug<'a> {
    Validated(&'a str, usize),
    LinesRendered(&'a str, usize),
    LineIgnored(&'a str),
    ExistenceCheck(&'a str, bool),
    StateTransition(&'a str, ObjectState, ObjectState),
    Commit(&'a str, usize),
    CandidateDiscard(&'a str),
    RecorderDisabled(&'a str),
}

// ===== impl Debug =====

impl Debug<'_> {
    // Log debug message using the tracing API.
    pub(crate) fn log(&self) {
        match self {
            Debug::Validated(block, violations) => {
                trace_span!("engine").in_scope(|| {
                    trace!(%block, %violations, "{}", self);
                });
            }
            Debug::LinesRendered(block, lines) => {
                trace_span!("engine").in_scope(|| {
                    trace!(%block, %lines, "{}", self);
                });
            }
            Debug::LineIgnored(line) => {
                trace_span!("engine").in_scope(|| {
                    trace!(%line, "{}", self);
                });
            }
            Debug::ExistenceCheck(address, exists) => {
                debug_span!("engine").in_scope(|| {
                    debug!(%address, %exists, "{}", self);
                });
            }
            Debug::StateTransition(address, old_state, new_state) => {
                debug_span!("engine").in_scope(|| {
                    debug!(%address, %old_state, %new_state, "{}", self);
                });
            }
            Debug::Commit(comment, lines) => {
                debug_span!("engine").in_scope(|| {
                    debug!(%comment, %lines, "{}", self);
                });
            }
            Debug::CandidateDiscard(reason) => {
                debug_span!("engine")
                    .in_scope(|| debug!(%reason, "{}", self));
            }
            Debug::RecorderDisabled(path) => {
                debug_span!("engine")
                    .in_scope(|| debug!(%path, "{}", self));
            }
        }
    }
}

impl std::fmt::Display for Debug<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Debug::Validated(..) => {
                write!(f, "validation finished")
            }
            Debug::LinesRendered(..) => {
                write!(f, "configuration lines rendered")
            }
            Debug::LineIgnored(..) => {
                write!(f, "ignoring unrecognized line")
            }
            Debug::ExistenceCheck(..) => {
                write!(f, "existence check")
            }
            Debug::StateTransition(..) => {
                write!(f, "object state transition")
            }
            Debug::Commit(..) => {
                write!(f, "committing candidate configuration")
            }
            Debug::CandidateDiscard(..) => {
                write!(f, "discarding candidate configuration")
            }
            Debug::RecorderDisabled(..) => {
                write!(f, "session recorder disabled")
            }
        }
    }
}
