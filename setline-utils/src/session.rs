//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::ops::{Deref, DerefMut};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::warn;

/// Configuration session towards a single device.
///
/// The device accepts only one in-flight configuration transaction, so every
/// mutating sequence (`config_set` followed by `commit` or `config_clear`)
/// must run while the caller holds the session exclusively. Holding a
/// `&mut` to the session is that proof; [`SessionLock`] hands one out.
pub trait ConfigSession {
    // Runs an operational command and returns its raw text output.
    fn command(&mut self, query: &str) -> Result<String, SessionError>;

    // Loads configuration lines into the candidate configuration.
    fn config_set(&mut self, lines: &[String]) -> Result<(), SessionError>;

    // Commits the candidate configuration.
    fn commit(&mut self, comment: &str) -> Result<(), SessionError>;

    // Discards all uncommitted changes from the candidate configuration.
    fn config_clear(&mut self) -> Result<(), SessionError>;
}

// Session errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SessionError {
    Command(String),
    ConfigSet(String),
    Commit(String),
    Clear(String),
}

/// Process-wide critical section around a device session.
///
/// Acquiring the lock yields a guard that dereferences to the session.
/// Nested operations borrow the guard (`&mut *guard`) instead of locking a
/// second time, which makes the critical section re-entrant for the thread
/// that holds it.
#[derive(Debug)]
pub struct SessionLock<S> {
    session: Mutex<S>,
}

#[derive(Debug)]
pub struct SessionGuard<'a, S> {
    guard: MutexGuard<'a, S>,
}

// ===== impl ConfigSession =====

impl<S> ConfigSession for &mut S
where
    S: ConfigSession + ?Sized,
{
    fn command(&mut self, query: &str) -> Result<String, SessionError> {
        (**self).command(query)
    }

    fn config_set(&mut self, lines: &[String]) -> Result<(), SessionError> {
        (**self).config_set(lines)
    }

    fn commit(&mut self, comment: &str) -> Result<(), SessionError> {
        (**self).commit(comment)
    }

    fn config_clear(&mut self) -> Result<(), SessionError> {
        (**self).config_clear()
    }
}

impl<S> ConfigSession for Box<S>
where
    S: ConfigSession + ?Sized,
{
    fn command(&mut self, query: &str) -> Result<String, SessionError> {
        (**self).command(query)
    }

    fn config_set(&mut self, lines: &[String]) -> Result<(), SessionError> {
        (**self).config_set(lines)
    }

    fn commit(&mut self, comment: &str) -> Result<(), SessionError> {
        (**self).commit(comment)
    }

    fn config_clear(&mut self) -> Result<(), SessionError> {
        (**self).config_clear()
    }
}

// ===== impl SessionError =====

impl SessionError {
    pub fn log(&self) {
        match self {
            SessionError::Command(error)
            | SessionError::ConfigSet(error)
            | SessionError::Commit(error)
            | SessionError::Clear(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Command(error) => {
                write!(f, "failed to run command: {error}")
            }
            SessionError::ConfigSet(error) => {
                write!(f, "failed to load configuration: {error}")
            }
            SessionError::Commit(error) => {
                write!(f, "failed to commit configuration: {error}")
            }
            SessionError::Clear(error) => {
                write!(f, "failed to clear candidate configuration: {error}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

// ===== impl SessionLock =====

impl<S> SessionLock<S> {
    pub fn new(session: S) -> SessionLock<S> {
        SessionLock {
            session: Mutex::new(session),
        }
    }

    // Blocks until the session is free.
    //
    // A holder that panicked leaves the device in an unknown candidate state,
    // but the session object itself is still usable, so poisoning is cleared.
    pub fn lock(&self) -> SessionGuard<'_, S> {
        let guard = self.session.lock().unwrap_or_else(PoisonError::into_inner);
        SessionGuard { guard }
    }

    pub fn into_inner(self) -> S {
        self.session
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

// ===== impl SessionGuard =====

impl<S> Deref for SessionGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.guard
    }
}

impl<S> DerefMut for SessionGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.guard
    }
}

// ===== unit tests =====
