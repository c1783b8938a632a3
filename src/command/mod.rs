// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hot tub command definitions.
//!
//! A [`HotTubCommand`] is a validated request. It knows the vendor delta
//! to send ([`HotTubCommand::desired`]), the canonical values a later
//! snapshot must show to confirm it ([`HotTubCommand::expected`]) and the
//! paired command a [`DependencyPolicy`] forces after it.
//!
//! # Available Commands
//!
//! | Command | Vendor fields |
//! |---------|---------------|
//! | [`HotTubCommand::SetFeature`] | `heater_state`, `filter_state`, `jet_state`, `ozone_state`, `uvc_state` |
//! | [`HotTubCommand::SetBubble`] | `bubble_state` + `bubble_level` |
//! | [`HotTubCommand::SetBubbleLevel`] | `bubble_level` |
//! | [`HotTubCommand::SetTemperature`] | `temperature_setting` (doubled) |
//! | [`HotTubCommand::SetTemperatureUnit`] | `temperature_unit` |
//!
//! # Examples
//!
//! ```
//! use mspa_lib::command::{DependencyPolicy, HotTubCommand};
//!
//! let cmd = HotTubCommand::feature("heater", "OFF").unwrap();
//! assert_eq!(cmd.desired().get("heater_state"), Some(0));
//!
//! let follow_up = cmd.dependent(DependencyPolicy::HeaterOffStopsFilter).unwrap();
//! assert_eq!(follow_up.desired().get("filter_state"), Some(0));
//!
//! assert!(HotTubCommand::feature("sauna", "on").is_err());
//! assert!(HotTubCommand::feature("bubble", "on").is_err());
//! ```

mod desired;

pub use desired::DesiredState;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ValueError;
use crate::types::{BubbleLevel, Feature, SwitchState, Temperature, TemperatureUnit};

/// A validated hot tub command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HotTubCommand {
    /// Switch a feature that takes no parameter.
    SetFeature {
        /// The feature. Never [`Feature::Bubble`].
        feature: Feature,
        /// The target state.
        state: SwitchState,
    },
    /// Switch bubbles, always together with a level.
    SetBubble {
        /// The target state.
        state: SwitchState,
        /// The level sent alongside.
        level: BubbleLevel,
    },
    /// Change bubble intensity only.
    SetBubbleLevel(BubbleLevel),
    /// Change the target water temperature.
    SetTemperature(Temperature),
    /// Change the panel temperature unit.
    SetTemperatureUnit(TemperatureUnit),
}

impl HotTubCommand {
    /// Creates a feature switch command.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::FeatureRequiresLevel` for bubbles, which must
    /// go through [`HotTubCommand::bubble`].
    pub fn set_feature(feature: Feature, state: SwitchState) -> Result<Self, ValueError> {
        if feature.requires_level() {
            return Err(ValueError::FeatureRequiresLevel(feature.to_string()));
        }
        Ok(Self::SetFeature { feature, state })
    }

    /// Parses a feature name and an `on`/`off` literal (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnknownFeature`, `ValueError::InvalidSwitchState`
    /// or `ValueError::FeatureRequiresLevel`.
    pub fn feature(name: &str, state: &str) -> Result<Self, ValueError> {
        let feature: Feature = name.parse()?;
        let state: SwitchState = state.parse()?;
        Self::set_feature(feature, state)
    }

    /// Creates a bubble command.
    #[must_use]
    pub const fn bubble(state: SwitchState, level: BubbleLevel) -> Self {
        Self::SetBubble { state, level }
    }

    /// Returns the vendor delta for this command.
    #[must_use]
    pub fn desired(&self) -> DesiredState {
        match self {
            Self::SetFeature { feature, state } => {
                DesiredState::new().with(feature.vendor_field(), state.as_num())
            }
            Self::SetBubble { state, level } => DesiredState::new()
                .with(Feature::Bubble.vendor_field(), state.as_num())
                .with("bubble_level", i64::from(level.value())),
            Self::SetBubbleLevel(level) => {
                DesiredState::new().with("bubble_level", i64::from(level.value()))
            }
            Self::SetTemperature(temperature) => {
                DesiredState::new().with("temperature_setting", temperature.to_raw())
            }
            Self::SetTemperatureUnit(unit) => {
                DesiredState::new().with("temperature_unit", unit.as_num())
            }
        }
    }

    /// Returns the canonical fields and values that confirm this command.
    #[must_use]
    pub fn expected(&self) -> Vec<(&'static str, Value)> {
        match self {
            Self::SetFeature { feature, state } => {
                vec![(feature.canonical_key(), json!(state.as_str()))]
            }
            Self::SetBubble { state, level } => vec![
                (Feature::Bubble.canonical_key(), json!(state.as_str())),
                ("bubble_level", json!(level.value())),
            ],
            Self::SetBubbleLevel(level) => vec![("bubble_level", json!(level.value()))],
            Self::SetTemperature(temperature) => {
                vec![("target_temperature", json!(temperature.celsius()))]
            }
            Self::SetTemperatureUnit(unit) => vec![("temperature_unit", json!(unit.as_num()))],
        }
    }

    /// Returns the command `policy` forces after this one, if any.
    #[must_use]
    pub fn dependent(&self, policy: DependencyPolicy) -> Option<Self> {
        let Self::SetFeature {
            feature,
            state: SwitchState::Off,
        } = self
        else {
            return None;
        };
        let (trigger, paired) = policy.pair()?;
        (*feature == trigger).then_some(Self::SetFeature {
            feature: paired,
            state: SwitchState::Off,
        })
    }
}

impl fmt::Display for HotTubCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetFeature { feature, state } => write!(f, "{feature} {state}"),
            Self::SetBubble { state, level } => write!(f, "bubble {state} (level {level})"),
            Self::SetBubbleLevel(level) => write!(f, "bubble level {level}"),
            Self::SetTemperature(temperature) => write!(f, "temperature {temperature}"),
            Self::SetTemperatureUnit(unit) => write!(f, "temperature unit {unit}"),
        }
    }
}

/// Which feature is forced off when its paired feature is turned off.
///
/// The heater cannot run without water circulating, so the two are
/// coupled one way or the other depending on firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyPolicy {
    /// Turning the heater off also turns the filter off.
    #[default]
    HeaterOffStopsFilter,
    /// Turning the filter off also turns the heater off.
    FilterOffStopsHeater,
    /// No coupling.
    Independent,
}

impl DependencyPolicy {
    /// Returns `(trigger, paired)`.
    #[must_use]
    pub const fn pair(&self) -> Option<(Feature, Feature)> {
        match self {
            Self::HeaterOffStopsFilter => Some((Feature::Heater, Feature::Filter)),
            Self::FilterOffStopsHeater => Some((Feature::Filter, Feature::Heater)),
            Self::Independent => None,
        }
    }
}
