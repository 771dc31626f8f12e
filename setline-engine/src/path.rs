//
// Copyright (c) The Setline Core Contributors
//
// SPDX-License-Identifier: MIT
//

use itertools::Itertools;
use serde::{Deserialize, Serialize};

// Attribute path of a field or block within a tree, e.g.
// `interface["ge-0/0/0"].service_profile`.
#[derive(Clone, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct DataPath(String);

// ===== impl DataPath =====

impl DataPath {
    pub fn root() -> DataPath {
        DataPath::default()
    }

    #[must_use]
    pub fn child(&self, name: &str) -> DataPath {
        if self.0.is_empty() {
            DataPath(name.to_owned())
        } else {
            DataPath(format!("{}.{}", self.0, name))
        }
    }

    // Path of one repeated-block instance, identified by its key values.
    #[must_use]
    pub fn instance<S: AsRef<str>>(&self, name: &str, key: &[S]) -> DataPath {
        let key = key
            .iter()
            .map(|value| format!("{:?}", value.as_ref()))
            .join(",");
        DataPath(format!("{}[{}]", self.child(name).0, key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for DataPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
