//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use setline_utils::SET_VERB;

use crate::identity::{Identity, KeySegment};
use crate::schema::Block;

/// Configuration area handled by the engine.
pub trait Resource {
    // Name used in commit comments.
    const TYPE_NAME: &'static str;

    fn schema() -> &'static Block;

    // Identifier segments, in order.
    fn keys() -> &'static [KeySegment];

    // Configuration path of the object, e.g.
    // `forwarding-options dhcp-relay group g1`.
    fn address(identity: &Identity) -> String;

    // Addresses of objects that must exist before this one is created.
    //
    // References are by name only; the referenced objects are not owned.
    fn dependencies(_identity: &Identity) -> Vec<String> {
        vec![]
    }
}

// ===== global functions =====

// Prefix shared by all set lines of the object at `address`.
pub fn set_prefix(address: &str) -> String {
    format!("{SET_VERB} {address} ")
}
