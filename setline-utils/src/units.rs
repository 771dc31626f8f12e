//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

// Size parsing errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SizeError {
    Empty,
    InvalidDigits(String),
    InvalidSuffix(String),
    Overflow(String),
}

// ===== impl SizeError =====

impl std::fmt::Display for SizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SizeError::Empty => write!(f, "empty size value"),
            SizeError::InvalidDigits(value) => {
                write!(f, "invalid size value {value:?}")
            }
            SizeError::InvalidSuffix(value) => {
                write!(f, "invalid size unit in {value:?} (valid units: k, m, g)")
            }
            SizeError::Overflow(value) => {
                write!(f, "size value {value:?} is out of range")
            }
        }
    }
}

impl std::error::Error for SizeError {}

// ===== global functions =====

// Expands a size with an optional unit suffix into a number of bytes.
//
// Units are binary: `k` = 1024, `m` = 1024^2, `g` = 1024^3. Suffixes are
// case-insensitive.
pub fn parse_size(value: &str) -> Result<i64, SizeError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(SizeError::Empty);
    }

    let (digits, exponent) = match value.char_indices().last() {
        Some((idx, ch)) if ch.is_ascii_alphabetic() => {
            let exponent = match ch.to_ascii_lowercase() {
                'k' => 1,
                'm' => 2,
                'g' => 3,
                _ => return Err(SizeError::InvalidSuffix(value.to_owned())),
            };
            (&value[..idx], exponent)
        }
        _ => (value, 0),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(SizeError::InvalidDigits(value.to_owned()));
    }
    let base = digits
        .parse::<i64>()
        .map_err(|_| SizeError::Overflow(value.to_owned()))?;

    1024_i64
        .checked_pow(exponent)
        .and_then(|multiplier| base.checked_mul(multiplier))
        .ok_or_else(|| SizeError::Overflow(value.to_owned()))
}

// ===== unit tests =====
