// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Changes awaiting confirmation by a snapshot.

use std::collections::BTreeMap;

use serde_json::Value;

use super::HotTubState;

/// Canonical field to expected value, for commands not yet observed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingChanges {
    entries: BTreeMap<String, Value>,
}

impl PendingChanges {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or overwrites expectations.
    pub fn merge<I, K>(&mut self, expected: I)
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        for (field, value) in expected {
            self.entries.insert(field.into(), value);
        }
    }

    /// Removes every entry the state confirms and returns their keys.
    pub fn reconcile(&mut self, state: &HotTubState) -> Vec<String> {
        let confirmed: Vec<String> = self
            .entries
            .iter()
            .filter(|(field, expected)| state.field(field).as_ref() == Some(*expected))
            .map(|(field, _)| field.clone())
            .collect();
        for field in &confirmed {
            self.entries.remove(field);
        }
        confirmed
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the expected value of a field.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries.get(field)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the pending field names.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}
