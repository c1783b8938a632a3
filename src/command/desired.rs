// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Desired-state delta sent to the command endpoint.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::error::ParseError;
use crate::state::RawSnapshot;

/// Vendor field name to integer value, as the device expects it.
///
/// # Examples
///
/// ```
/// use mspa_lib::command::DesiredState;
///
/// let desired = DesiredState::new()
///     .with("bubble_state", 1)
///     .with("bubble_level", 2);
///
/// assert_eq!(
///     desired.to_payload().unwrap(),
///     r#"{"state":{"desired":{"bubble_level":2,"bubble_state":1}}}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DesiredState(BTreeMap<String, i64>);

impl DesiredState {
    /// Creates an empty delta.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field.
    #[must_use]
    pub fn with(mut self, field: impl Into<String>, value: i64) -> Self {
        self.0.insert(field.into(), value);
        self
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<i64> {
        self.0.get(field).copied()
    }

    /// Iterates over fields in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the delta is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns `true` once every field matches the snapshot.
    #[must_use]
    pub fn is_confirmed_by(&self, snapshot: &RawSnapshot) -> bool {
        self.0
            .iter()
            .all(|(field, value)| snapshot.int(field) == Some(*value))
    }

    /// Encodes the `desired` string of the command request.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Json` if serialization fails.
    pub fn to_payload(&self) -> Result<String, ParseError> {
        Ok(serde_json::to_string(&json!({ "state": { "desired": self } }))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirmation_requires_every_field() {
        let desired = DesiredState::new()
            .with("heater_state", 1)
            .with("temperature_setting", 76);

        let partial = RawSnapshot::from_value(json!({
            "heater_state": 1,
            "temperature_setting": 70
        }))
        .unwrap();
        let full = RawSnapshot::from_value(json!({
            "heater_state": 1,
            "temperature_setting": 76,
            "filter_state": 1
        }))
        .unwrap();

        assert!(!desired.is_confirmed_by(&partial));
        assert!(desired.is_confirmed_by(&full));
    }

    #[test]
    fn missing_field_is_unconfirmed() {
        let desired = DesiredState::new().with("ozone_state", 0);
        assert!(!desired.is_confirmed_by(&RawSnapshot::default()));
    }

    #[test]
    fn payload_is_nested_json_string() {
        let payload = DesiredState::new().with("heater_state", 0).to_payload().unwrap();
        let decoded: serde_json::Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(decoded, json!({"state": {"desired": {"heater_state": 0}}}));
    }
}
