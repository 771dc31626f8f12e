//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_utils::session::SessionError;
use setline_utils::units::SizeError;
use tracing::{error, warn};

use crate::driver::ObjectState;
use crate::path::DataPath;
use crate::validate::ConstraintViolation;

// Engine errors.
#[derive(Debug)]
pub enum Error {
    Validation(Vec<ConstraintViolation>),
    Encoding(EncodingError),
    Parse(ParseError),
    Existence(ExistenceError),
    Identity(IdentityError),
    Session(SessionError),
    InvalidTransition(ObjectState, ObjectState),
    Config(toml::de::Error),
}

// Errors rendering a tree into configuration lines.
#[derive(Debug)]
pub enum EncodingError {
    Unresolved(DataPath),
    InvalidNumber(DataPath, String),
    InvalidSize(DataPath, SizeError),
    KindMismatch(DataPath),
    MissingKey(DataPath),
    DuplicateKey(DataPath, String),
    DiscriminantConflict(DataPath, &'static str, String),
    EmptyBlock(DataPath),
}

// Errors parsing device-returned configuration lines.
#[derive(Debug)]
pub enum ParseError {
    InvalidNumber(DataPath, String),
    InvalidSize(DataPath, SizeError),
    MissingKey(DataPath, String),
}

// Disagreements between the expected and the observed device state.
#[derive(Debug)]
pub enum ExistenceError {
    AlreadyExists(String),
    MissingAfterCommit(String),
    PresentAfterDelete(String),
    NotFound(String),
    MissingDependency(String, String),
}

// Errors parsing or building an object identifier.
#[derive(Debug, Eq, PartialEq)]
pub enum IdentityError {
    MissingSegment(&'static str),
    TooManySegments(usize, usize),
    EmptySegment(&'static str),
    SeparatorInValue(&'static str, String),
}

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        match self {
            Error::Validation(violations) => {
                for violation in violations {
                    warn!(
                        kind = ?violation.kind,
                        paths = ?violation.paths,
                        "{}", violation.message
                    );
                }
                warn!(count = violations.len(), "{}", self);
            }
            Error::Encoding(error) => error.log(),
            Error::Parse(error) => error.log(),
            Error::Existence(error) => error.log(),
            Error::Identity(error) => {
                warn!(%error, "{}", self);
            }
            Error::Session(error) => error.log(),
            Error::InvalidTransition(from, to) => {
                error!(?from, ?to, "{}", self);
            }
            Error::Config(error) => {
                warn!(%error, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Validation(violations) => {
                write!(f, "configuration is invalid")?;
                for violation in violations {
                    write!(f, "; {}", violation.message)?;
                }
                Ok(())
            }
            Error::Encoding(error) => error.fmt(f),
            Error::Parse(error) => error.fmt(f),
            Error::Existence(error) => error.fmt(f),
            Error::Identity(error) => {
                write!(f, "invalid object identifier: {error}")
            }
            Error::Session(error) => error.fmt(f),
            Error::InvalidTransition(from, to) => {
                write!(f, "invalid object state transition: {from} -> {to}")
            }
            Error::Config(..) => write!(f, "invalid engine configuration"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Encoding(error) => Some(error),
            Error::Parse(error) => Some(error),
            Error::Existence(error) => Some(error),
            Error::Identity(error) => Some(error),
            Error::Session(error) => Some(error),
            Error::Config(error) => Some(error),
            _ => None,
        }
    }
}

impl From<EncodingError> for Error {
    fn from(error: EncodingError) -> Error {
        Error::Encoding(error)
    }
}

impl From<ParseError> for Error {
    fn from(error: ParseError) -> Error {
        Error::Parse(error)
    }
}

impl From<ExistenceError> for Error {
    fn from(error: ExistenceError) -> Error {
        Error::Existence(error)
    }
}

impl From<IdentityError> for Error {
    fn from(error: IdentityError) -> Error {
        Error::Identity(error)
    }
}

impl From<SessionError> for Error {
    fn from(error: SessionError) -> Error {
        Error::Session(error)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Error {
        Error::Config(error)
    }
}

// ===== impl EncodingError =====

impl EncodingError {
    pub fn log(&self) {
        match self {
            EncodingError::Unresolved(path)
            | EncodingError::KindMismatch(path)
            | EncodingError::MissingKey(path)
            | EncodingError::EmptyBlock(path) => {
                warn!(%path, "{}", self);
            }
            EncodingError::InvalidNumber(path, value) => {
                warn!(%path, %value, "{}", self);
            }
            EncodingError::InvalidSize(path, error) => {
                warn!(%path, %error, "{}", self);
            }
            EncodingError::DuplicateKey(path, key) => {
                warn!(%path, %key, "{}", self);
            }
            EncodingError::DiscriminantConflict(path, discriminant, mode) => {
                error!(%path, %discriminant, %mode, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodingError::Unresolved(path) => {
                write!(f, "{path}: value is not known yet")
            }
            EncodingError::InvalidNumber(path, value) => {
                write!(f, "{path}: invalid number {value:?}")
            }
            EncodingError::InvalidSize(path, error) => {
                write!(f, "{path}: {error}")
            }
            EncodingError::KindMismatch(path) => {
                write!(f, "{path}: value does not match the field type")
            }
            EncodingError::MissingKey(path) => {
                write!(f, "{path}: instance has no key value")
            }
            EncodingError::DuplicateKey(path, key) => {
                write!(f, "{path}: duplicate key {key:?}")
            }
            EncodingError::DiscriminantConflict(path, discriminant, mode) => {
                write!(f, "{path}: not allowed when {discriminant} = {mode:?}")
            }
            EncodingError::EmptyBlock(path) => {
                write!(f, "{path}: block is present but empty")
            }
        }
    }
}

impl std::error::Error for EncodingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EncodingError::InvalidSize(_, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl ParseError =====

impl ParseError {
    pub fn log(&self) {
        match self {
            ParseError::InvalidNumber(path, value) => {
                warn!(%path, %value, "{}", self);
            }
            ParseError::InvalidSize(path, error) => {
                warn!(%path, %error, "{}", self);
            }
            ParseError::MissingKey(path, line) => {
                warn!(%path, %line, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidNumber(path, value) => {
                write!(f, "{path}: failed to parse number {value:?}")
            }
            ParseError::InvalidSize(path, error) => {
                write!(f, "{path}: failed to parse size: {error}")
            }
            ParseError::MissingKey(path, line) => {
                write!(f, "{path}: missing key in line {line:?}")
            }
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::InvalidSize(_, error) => Some(error),
            _ => None,
        }
    }
}

// ===== impl ExistenceError =====

impl ExistenceError {
    pub fn log(&self) {
        match self {
            ExistenceError::AlreadyExists(address)
            | ExistenceError::NotFound(address) => {
                warn!(%address, "{}", self);
            }
            ExistenceError::MissingAfterCommit(address)
            | ExistenceError::PresentAfterDelete(address) => {
                error!(%address, "{}", self);
            }
            ExistenceError::MissingDependency(address, dependency) => {
                warn!(%address, %dependency, "{}", self);
            }
        }
    }
}

impl std::fmt::Display for ExistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExistenceError::AlreadyExists(address) => {
                write!(f, "object already exists: {address}")
            }
            ExistenceError::MissingAfterCommit(address) => {
                write!(
                    f,
                    "commit succeeded but object is missing on the device: {address}"
                )
            }
            ExistenceError::PresentAfterDelete(address) => {
                write!(
                    f,
                    "commit succeeded but object is still present on the device: {address}"
                )
            }
            ExistenceError::NotFound(address) => {
                write!(f, "object not found: {address}")
            }
            ExistenceError::MissingDependency(address, dependency) => {
                write!(f, "{address}: referenced object is missing: {dependency}")
            }
        }
    }
}

impl std::error::Error for ExistenceError {}

// ===== impl IdentityError =====

impl std::fmt::Display for IdentityError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IdentityError::MissingSegment(field) => {
                write!(f, "missing segment for {field}")
            }
            IdentityError::TooManySegments(expected, got) => {
                write!(f, "expected at most {expected} segments, got {got}")
            }
            IdentityError::EmptySegment(field) => {
                write!(f, "empty segment for {field}")
            }
            IdentityError::SeparatorInValue(field, value) => {
                write!(f, "{field} value {value:?} contains the separator")
            }
        }
    }
}

impl std::error::Error for IdentityError {}
