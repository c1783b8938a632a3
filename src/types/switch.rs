// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Two-valued switch state for hot tub features.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// The on/off state of a hot tub feature.
///
/// The vendor reports feature states as `0`/`1`; the canonical state and
/// every caller-facing API use this two-valued enumeration instead.
///
/// # Examples
///
/// ```
/// use mspa_lib::types::SwitchState;
///
/// assert_eq!("ON".parse::<SwitchState>().unwrap(), SwitchState::On);
/// assert_eq!("off".parse::<SwitchState>().unwrap(), SwitchState::Off);
/// assert!("toggle".parse::<SwitchState>().is_err());
///
/// assert_eq!(SwitchState::On.as_num(), 1);
/// assert_eq!(SwitchState::On.as_str(), "on");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SwitchState {
    /// The feature is off.
    #[default]
    Off,
    /// The feature is on.
    On,
}

impl SwitchState {
    /// Returns the canonical string (`"on"` or `"off"`).
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::On => "on",
        }
    }

    /// Returns the numeric value the vendor protocol expects.
    #[must_use]
    pub const fn as_num(&self) -> i64 {
        match self {
            Self::Off => 0,
            Self::On => 1,
        }
    }

    /// Returns `true` if the switch is on.
    #[must_use]
    pub const fn is_on(&self) -> bool {
        matches!(self, Self::On)
    }

    /// Maps a raw vendor value by truthiness: any non-zero number is on.
    #[must_use]
    pub fn from_raw(value: Option<&serde_json::Value>) -> Self {
        Self::from(super::truthy(value))
    }
}

impl fmt::Display for SwitchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("on") {
            Ok(Self::On)
        } else if s.eq_ignore_ascii_case("off") {
            Ok(Self::Off)
        } else {
            Err(ValueError::InvalidSwitchState(s.to_string()))
        }
    }
}

impl From<bool> for SwitchState {
    fn from(value: bool) -> Self {
        if value { Self::On } else { Self::Off }
    }
}
