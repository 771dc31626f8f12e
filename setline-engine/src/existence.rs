//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_utils::session::ConfigSession;

use crate::config::Framing;
use crate::debug::Debug;
use crate::error::Error;

// ===== global functions =====

// Scoped query returning the configuration under `address`, relative to it.
pub fn show_query(address: &str) -> String {
    format!("show configuration {address} | display set relative")
}

// Reads the configuration lines under `address`, framing removed.
pub fn read_lines<S>(
    session: &mut S,
    framing: &Framing,
    address: &str,
) -> Result<Vec<String>, Error>
where
    S: ConfigSession + ?Sized,
{
    let output = session.command(&show_query(address))?;
    let lines = framing
        .body_lines(&output)
        .into_iter()
        .map(str::to_owned)
        .collect();
    Ok(lines)
}

// Returns whether anything is configured at `address`.
//
// A bare set marker (the address alone, without children) counts as
// present.
pub fn exists<S>(
    session: &mut S,
    framing: &Framing,
    address: &str,
) -> Result<bool, Error>
where
    S: ConfigSession + ?Sized,
{
    let exists = !read_lines(session, framing, address)?.is_empty();
    Debug::ExistenceCheck(address, exists).log();
    Ok(exists)
}
