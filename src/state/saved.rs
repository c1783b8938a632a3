// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Settings remembered across a power loss.

use serde::{Deserialize, Serialize};

use super::HotTubState;
use crate::types::{SwitchState, TemperatureUnit};

/// The subset of state worth restoring after the device loses power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedState {
    /// Heater state.
    pub heater: SwitchState,
    /// Filter state.
    pub filter: SwitchState,
    /// Ozone state.
    pub ozone: SwitchState,
    /// UV-C state.
    pub uvc: SwitchState,
    /// Target temperature in °C.
    pub target_temperature: Option<f64>,
    /// Panel unit.
    pub temperature_unit: Option<TemperatureUnit>,
}

impl SavedState {
    /// Captures the restorable settings of a state.
    #[must_use]
    pub fn capture(state: &HotTubState) -> Self {
        Self {
            heater: state.heater,
            filter: state.filter,
            ozone: state.ozone,
            uvc: state.uvc,
            target_temperature: state.target_temperature,
            temperature_unit: state.temperature_unit,
        }
    }
}
