// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bubble intensity level.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Bubble intensity level (1-3).
///
/// The vendor requires a level with every bubble on/off change, so the
/// level is carried even when bubbles are turned off.
///
/// # Examples
///
/// ```
/// use mspa_lib::types::BubbleLevel;
///
/// let level = BubbleLevel::new(2).unwrap();
/// assert_eq!(level.value(), 2);
/// assert!(BubbleLevel::new(0).is_err());
/// assert!(BubbleLevel::new(4).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "u8", into = "u8")]
pub struct BubbleLevel(u8);

impl BubbleLevel {
    /// Lowest level.
    pub const MIN: Self = Self(1);

    /// Highest level.
    pub const MAX: Self = Self(3);

    /// Creates a new bubble level.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if `value` is not in 1-3.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if !(Self::MIN.0..=Self::MAX.0).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: u16::from(Self::MIN.0),
                max: u16::from(Self::MAX.0),
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a level from a raw vendor value, falling back to the lowest
    /// level when the value is missing or out of range.
    #[must_use]
    pub fn from_raw(value: Option<&serde_json::Value>) -> Self {
        value
            .and_then(serde_json::Value::as_u64)
            .and_then(|raw| u8::try_from(raw).ok())
            .and_then(|raw| Self::new(raw).ok())
            .unwrap_or_default()
    }

    /// Returns the level value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }
}

impl Default for BubbleLevel {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for BubbleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for BubbleLevel {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BubbleLevel> for u8 {
    fn from(level: BubbleLevel) -> Self {
        level.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_levels() {
        for v in 1..=3 {
            assert_eq!(BubbleLevel::new(v).unwrap().value(), v);
        }
    }

    #[test]
    fn out_of_range_levels() {
        assert_eq!(
            BubbleLevel::new(0).unwrap_err(),
            ValueError::OutOfRange {
                min: 1,
                max: 3,
                actual: 0
            }
        );
        assert!(BubbleLevel::new(4).is_err());
    }

    #[test]
    fn from_raw_defaults_to_one() {
        assert_eq!(BubbleLevel::from_raw(None).value(), 1);
        assert_eq!(BubbleLevel::from_raw(Some(&json!(null))).value(), 1);
        assert_eq!(BubbleLevel::from_raw(Some(&json!(9))).value(), 1);
        assert_eq!(BubbleLevel::from_raw(Some(&json!(3))).value(), 3);
    }

    #[test]
    fn deserialize_rejects_out_of_range() {
        assert!(serde_json::from_value::<BubbleLevel>(json!(2)).is_ok());
        assert!(serde_json::from_value::<BubbleLevel>(json!(5)).is_err());
    }
}
