// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Restoration of saved settings after a power cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::command::HotTubCommand;
use crate::state::{HotTubState, SavedState};
use crate::types::{Feature, SwitchState, Temperature, TemperatureUnit};

/// One setting to re-apply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RestoreItem {
    /// Panel unit.
    TemperatureUnit(TemperatureUnit),
    /// Target temperature.
    Temperature(Temperature),
    /// Feature switch.
    Feature(Feature, SwitchState),
}

impl RestoreItem {
    /// Returns the command that re-applies this setting.
    #[must_use]
    pub fn command(&self) -> HotTubCommand {
        match *self {
            Self::TemperatureUnit(unit) => HotTubCommand::SetTemperatureUnit(unit),
            Self::Temperature(temperature) => HotTubCommand::SetTemperature(temperature),
            Self::Feature(feature, state) => HotTubCommand::SetFeature { feature, state },
        }
    }

    /// Returns the canonical key of the restored setting.
    #[must_use]
    pub fn key(&self) -> &'static str {
        match self {
            Self::TemperatureUnit(_) => "temperature_unit",
            Self::Temperature(_) => "target_temperature",
            Self::Feature(feature, _) => feature.canonical_key(),
        }
    }
}

impl fmt::Display for RestoreItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.command())
    }
}

/// Plans the commands that bring `current` back to `saved`.
///
/// Order: unit, temperature, heater, filter, ozone, UV-C. Settings that
/// already match are skipped. The unit target is `host_unit` when set,
/// otherwise the saved unit.
#[must_use]
pub fn plan(
    saved: &SavedState,
    current: &HotTubState,
    host_unit: Option<TemperatureUnit>,
) -> Vec<RestoreItem> {
    let mut items = Vec::new();

    if let Some(unit) = host_unit.or(saved.temperature_unit)
        && current.temperature_unit != Some(unit)
    {
        items.push(RestoreItem::TemperatureUnit(unit));
    }

    if let Some(target) = saved.target_temperature {
        match Temperature::new(target) {
            Ok(temperature) if current.target_temperature != Some(temperature.celsius()) => {
                items.push(RestoreItem::Temperature(temperature));
            }
            Ok(_) => {}
            Err(err) => tracing::debug!(error = %err, "Saved target temperature not restorable"),
        }
    }

    for (feature, state) in [
        (Feature::Heater, saved.heater),
        (Feature::Filter, saved.filter),
        (Feature::Ozone, saved.ozone),
        (Feature::Uvc, saved.uvc),
    ] {
        if current.feature(feature) != state {
            items.push(RestoreItem::Feature(feature, state));
        }
    }

    items
}

/// A restoration command that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreFailure {
    /// Canonical key of the setting.
    pub key: String,
    /// Error message.
    pub error: String,
}

/// Outcome of a restoration batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    /// Keys restored successfully, in order.
    pub succeeded: Vec<String>,
    /// Settings that could not be restored.
    pub failed: Vec<RestoreFailure>,
}

impl RestoreReport {
    /// Returns `true` if nothing failed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Returns the number of attempted items.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}
