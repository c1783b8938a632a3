// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Raw device snapshot.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::ParseError;

/// Device attributes exactly as the thing-shadow endpoint returned them.
///
/// Temperatures are doubled integers, feature states are `0`/`1`. Only
/// the most recent snapshot is kept around.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawSnapshot(Map<String, Value>);

impl RawSnapshot {
    /// Wraps an attribute map.
    #[must_use]
    pub fn new(attributes: Map<String, Value>) -> Self {
        Self(attributes)
    }

    /// Creates a snapshot from a JSON value.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnexpectedFormat` if the value is not an object.
    pub fn from_value(value: Value) -> Result<Self, ParseError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(ParseError::UnexpectedFormat(format!(
                "device status is not an object: {other}"
            ))),
        }
    }

    /// Returns a raw attribute.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field).filter(|value| !value.is_null())
    }

    /// Returns an attribute as an integer.
    ///
    /// Integral floats and numeric strings are accepted.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn int(&self, field: &str) -> Option<i64> {
        match self.get(field)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    /// Returns an attribute as a number.
    #[must_use]
    pub fn number(&self, field: &str) -> Option<f64> {
        match self.get(field)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns an attribute as text; numbers are formatted.
    #[must_use]
    pub fn text(&self, field: &str) -> Option<String> {
        match self.get(field)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// Returns `true` if the attribute is present and not `null`.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    /// Returns the attribute map.
    #[must_use]
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Returns `true` if no attribute is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawSnapshot {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(value: Value) -> RawSnapshot {
        RawSnapshot::from_value(value).unwrap()
    }

    #[test]
    fn rejects_non_objects() {
        assert!(RawSnapshot::from_value(json!([1, 2])).is_err());
        assert!(RawSnapshot::from_value(json!("x")).is_err());
    }

    #[test]
    fn int_accepts_common_encodings() {
        let raw = snapshot(json!({
            "a": 3,
            "b": 4.0,
            "c": "5",
            "d": 4.5,
            "e": null,
            "f": true
        }));
        assert_eq!(raw.int("a"), Some(3));
        assert_eq!(raw.int("b"), Some(4));
        assert_eq!(raw.int("c"), Some(5));
        assert_eq!(raw.int("d"), None);
        assert_eq!(raw.int("e"), None);
        assert_eq!(raw.int("f"), Some(1));
        assert_eq!(raw.int("missing"), None);
    }

    #[test]
    fn null_counts_as_absent() {
        let raw = snapshot(json!({"is_online": null}));
        assert!(!raw.contains("is_online"));
    }

    #[test]
    fn text_formats_numbers() {
        let raw = snapshot(json!({"v": 12, "s": "A0"}));
        assert_eq!(raw.text("v").as_deref(), Some("12"));
        assert_eq!(raw.text("s").as_deref(), Some("A0"));
    }
}
