//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_utils::DELETE_VERB;

// ===== global functions =====

// Deleting an address removes its whole subtree, so a single line tears
// down the object.
pub fn render_delete(address: &str) -> Vec<String> {
    vec![format!("{DELETE_VERB} {address}")]
}

// Deletion lines for selected sub-blocks of an object.
pub fn render_delete_blocks(address: &str, tokens: &[&str]) -> Vec<String> {
    tokens
        .iter()
        .map(|token| format!("{DELETE_VERB} {address} {token}"))
        .collect()
}
