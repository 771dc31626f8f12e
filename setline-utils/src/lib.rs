//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

#![warn(rust_2018_idioms)]

pub mod quote;
pub mod session;
#[cfg(feature = "testing")]
pub mod testing;
pub mod units;

// Markers framing the output of a scoped configuration query.
pub const CONFIG_OUTPUT_START: &str = "<configuration-output>";
pub const CONFIG_OUTPUT_END: &str = "</configuration-output>";

// Verbs prefixing every configuration line.
pub const SET_VERB: &str = "set";
pub const DELETE_VERB: &str = "delete";
