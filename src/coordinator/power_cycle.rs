// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Power-cycle detection from consecutive snapshots.

use serde::{Deserialize, Serialize};

use crate::state::HotTubState;
use crate::types::{Feature, TemperatureUnit};

/// Minimum number of reset indicators that must change together.
pub const RESET_THRESHOLD: usize = 2;

/// Features that drop to off when the device reboots.
const RESET_FEATURES: [Feature; 4] = [Feature::Heater, Feature::Filter, Feature::Ozone, Feature::Uvc];

/// How a power restoration was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionSignal {
    /// `is_online` went from false to true.
    OnlineFlag,
    /// Several settings fell back to their reset values at once.
    ResetHeuristic,
}

/// A detected power transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerTransition {
    /// `is_online` went from true to false.
    Lost,
    /// The device came back.
    Restored(DetectionSignal),
}

/// Compares two consecutive states.
///
/// The online flag decides when both states report it. Otherwise the
/// reset heuristic applies, ignoring fields in `expected` since those
/// changes were commanded.
#[must_use]
pub fn detect(
    previous: Option<&HotTubState>,
    current: &HotTubState,
    expected: &[String],
) -> Option<PowerTransition> {
    let previous = previous?;

    if let (Some(was_online), Some(is_online)) = (previous.is_online, current.is_online) {
        return match (was_online, is_online) {
            (true, false) => Some(PowerTransition::Lost),
            (false, true) => Some(PowerTransition::Restored(DetectionSignal::OnlineFlag)),
            _ => None,
        };
    }

    (reset_indicators(previous, current, expected) >= RESET_THRESHOLD)
        .then_some(PowerTransition::Restored(DetectionSignal::ResetHeuristic))
}

/// Counts the reset-indicating fields that changed between two states.
#[must_use]
pub fn reset_indicators(previous: &HotTubState, current: &HotTubState, expected: &[String]) -> usize {
    let commanded = |key: &str| expected.iter().any(|field| field == key);

    let unit_reverted = !commanded("temperature_unit")
        && previous.temperature_unit == Some(TemperatureUnit::Fahrenheit)
        && current.temperature_unit == Some(TemperatureUnit::Celsius);

    let switched_off = RESET_FEATURES
        .iter()
        .filter(|feature| !commanded(feature.canonical_key()))
        .filter(|feature| previous.feature(**feature).is_on() && !current.feature(**feature).is_on())
        .count();

    usize::from(unit_reverted) + switched_off
}
