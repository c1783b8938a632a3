// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Canonical hot tub state.
//!
//! [`HotTubState::normalize`] is the only place raw vendor attributes are
//! interpreted. Every other part of the crate reads this record.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use super::RawSnapshot;
use crate::types::{BubbleLevel, Feature, SwitchState, TemperatureUnit};

/// Diagnostic attributes passed through unchanged.
pub const DIAGNOSTIC_FIELDS: [&str; 17] = [
    "wifivertion",
    "otastatus",
    "mcuversion",
    "ConnectType",
    "temperature_unit",
    "auto_inflate",
    "filter_current",
    "safety_lock",
    "heat_time_switch",
    "heat_state",
    "multimcuotainfo",
    "heat_time",
    "filter_life",
    "trdversion",
    "is_online",
    "warning",
    "device_heat_perhour",
];

/// Warning code the device reports for a dirty filter.
const FILTER_DIRTY_WARNING: &str = "A0";

/// Heater operating sub-state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatState {
    /// Not reported.
    #[default]
    Unknown,
    /// Warming up (vendor `2`). A heating transition follows shortly.
    Preheating,
    /// Actively heating (vendor `3`).
    Heating,
    /// Target reached, heater idle (vendor `4`).
    Idle,
    /// Any other vendor value.
    Other(i64),
}

impl HeatState {
    /// Decodes the vendor value.
    #[must_use]
    pub const fn from_raw(raw: Option<i64>) -> Self {
        match raw {
            None => Self::Unknown,
            Some(2) => Self::Preheating,
            Some(3) => Self::Heating,
            Some(4) => Self::Idle,
            Some(other) => Self::Other(other),
        }
    }

    /// Returns the vendor value, if any.
    #[must_use]
    pub const fn as_raw(&self) -> Option<i64> {
        match self {
            Self::Unknown => None,
            Self::Preheating => Some(2),
            Self::Heating => Some(3),
            Self::Idle => Some(4),
            Self::Other(raw) => Some(*raw),
        }
    }

    /// Returns `true` for the short-lived sub-state worth polling quickly.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Preheating)
    }
}

/// What the heater is doing, as a climate widget shows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacAction {
    /// Preheating or heating.
    Heating,
    /// Target reached.
    Idle,
    /// Not heating.
    Off,
}

/// Filter cartridge condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterStatus {
    /// No filter warning.
    #[serde(rename = "OK")]
    Ok,
    /// The device reports warning `A0`.
    Dirty,
}

impl fmt::Display for FilterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "OK",
            Self::Dirty => "Dirty",
        })
    }
}

/// Normalized view of one device snapshot.
///
/// Temperatures are real degrees Celsius (raw / 2), feature states are
/// [`SwitchState`]. The record is a pure function of the snapshot it was
/// built from.
///
/// # Examples
///
/// ```
/// use mspa_lib::state::{HotTubState, RawSnapshot};
/// use mspa_lib::types::SwitchState;
/// use serde_json::json;
///
/// let raw = RawSnapshot::from_value(json!({
///     "water_temperature": 75,
///     "temperature_setting": 76,
///     "heater_state": 1,
///     "filter_state": 0
/// }))
/// .unwrap();
///
/// let state = HotTubState::normalize(&raw);
/// assert_eq!(state.water_temperature, Some(37.5));
/// assert_eq!(state.target_temperature, Some(38.0));
/// assert_eq!(state.heater, SwitchState::On);
/// assert_eq!(state.filter, SwitchState::Off);
/// assert_eq!(state.fault, "OK");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotTubState {
    /// Current water temperature in °C.
    pub water_temperature: Option<f64>,
    /// Target water temperature in °C.
    pub target_temperature: Option<f64>,
    /// Heater state.
    pub heater: SwitchState,
    /// Filter pump state.
    pub filter: SwitchState,
    /// Bubble state.
    pub bubble: SwitchState,
    /// Jet state.
    pub jet: SwitchState,
    /// Ozone state.
    pub ozone: SwitchState,
    /// UV-C state.
    pub uvc: SwitchState,
    /// Bubble intensity; 1 when not reported.
    pub bubble_level: BubbleLevel,
    /// Fault code; `"OK"` when none.
    pub fault: String,
    /// Heater sub-state.
    pub heat_state: HeatState,
    /// Panel unit, if reported.
    pub temperature_unit: Option<TemperatureUnit>,
    /// Cloud connectivity flag, if reported.
    pub is_online: Option<bool>,
    /// Warning code, if any.
    pub warning: Option<String>,
    /// Diagnostic attributes as reported (see [`DIAGNOSTIC_FIELDS`]).
    pub diagnostics: Map<String, Value>,
}

impl HotTubState {
    /// Builds the canonical record from a raw snapshot.
    #[must_use]
    pub fn normalize(raw: &RawSnapshot) -> Self {
        let switch = |feature: Feature| SwitchState::from_raw(raw.get(feature.vendor_field()));

        let diagnostics = DIAGNOSTIC_FIELDS
            .iter()
            .map(|field| ((*field).to_string(), raw.get(field).cloned().unwrap_or(Value::Null)))
            .collect();

        Self {
            water_temperature: raw.number("water_temperature").map(|t| t / 2.0),
            target_temperature: raw.number("temperature_setting").map(|t| t / 2.0),
            heater: switch(Feature::Heater),
            filter: switch(Feature::Filter),
            bubble: switch(Feature::Bubble),
            jet: switch(Feature::Jet),
            ozone: switch(Feature::Ozone),
            uvc: switch(Feature::Uvc),
            bubble_level: BubbleLevel::from_raw(raw.get("bubble_level")),
            fault: raw
                .text("fault")
                .filter(|fault| !fault.is_empty())
                .unwrap_or_else(|| "OK".to_string()),
            heat_state: HeatState::from_raw(raw.int("heat_state")),
            temperature_unit: raw.int("temperature_unit").map(TemperatureUnit::from_num),
            is_online: raw
                .contains("is_online")
                .then(|| crate::types::truthy(raw.get("is_online"))),
            warning: raw.text("warning").filter(|warning| !warning.is_empty()),
            diagnostics,
        }
    }

    /// Returns the state of a feature.
    #[must_use]
    pub const fn feature(&self, feature: Feature) -> SwitchState {
        match feature {
            Feature::Heater => self.heater,
            Feature::Filter => self.filter,
            Feature::Bubble => self.bubble,
            Feature::Jet => self.jet,
            Feature::Ozone => self.ozone,
            Feature::Uvc => self.uvc,
        }
    }

    /// Returns a canonical field by key.
    ///
    /// Feature keys yield `"on"`/`"off"`, temperatures yield °C numbers,
    /// `temperature_unit` yields the vendor number. Diagnostic keys yield
    /// the raw value.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<Value> {
        if let Ok(feature) = key.parse::<Feature>() {
            return Some(json!(self.feature(feature).as_str()));
        }
        match key {
            "water_temperature" => self.water_temperature.map(|t| json!(t)),
            "target_temperature" => self.target_temperature.map(|t| json!(t)),
            "bubble_level" => Some(json!(self.bubble_level.value())),
            "fault" => Some(json!(self.fault)),
            "filter_status" => Some(json!(self.filter_status().to_string())),
            "temperature_unit" => self.temperature_unit.map(|unit| json!(unit.as_num())),
            "heat_state" => self.heat_state.as_raw().map(|raw| json!(raw)),
            "is_online" => self.is_online.map(|online| json!(online)),
            other => self.diagnostics.get(other).filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Returns the canonical record as a flat map.
    #[must_use]
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.diagnostics.clone();
        map.insert("water_temperature".into(), json!(self.water_temperature));
        map.insert("target_temperature".into(), json!(self.target_temperature));
        for feature in Feature::ALL {
            map.insert(
                feature.canonical_key().into(),
                json!(self.feature(feature).as_str()),
            );
        }
        map.insert("bubble_level".into(), json!(self.bubble_level.value()));
        map.insert("fault".into(), json!(self.fault));
        map.insert("filter_status".into(), json!(self.filter_status().to_string()));
        map
    }

    /// Returns the filter condition derived from the warning code.
    #[must_use]
    pub fn filter_status(&self) -> FilterStatus {
        if self.warning.as_deref() == Some(FILTER_DIRTY_WARNING) {
            FilterStatus::Dirty
        } else {
            FilterStatus::Ok
        }
    }

    /// Returns what the heater is doing.
    #[must_use]
    pub const fn hvac_action(&self) -> HvacAction {
        match self.heat_state {
            HeatState::Preheating | HeatState::Heating => HvacAction::Heating,
            HeatState::Idle => HvacAction::Idle,
            HeatState::Unknown | HeatState::Other(_) => HvacAction::Off,
        }
    }
}
