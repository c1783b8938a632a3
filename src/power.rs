// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Estimated power draw and energy use.
//!
//! The device reports no electrical readings. Draw is estimated from
//! which components the canonical state shows running, using nominal
//! ratings from a [`PowerProfile`].
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, Utc};
//! use mspa_lib::power::{EnergyMeter, PowerProfile};
//! use mspa_lib::state::{HotTubState, RawSnapshot};
//!
//! let raw = RawSnapshot::from_value(serde_json::json!({
//!     "filter_state": 1,
//!     "heater_state": 1,
//!     "heat_state": 3
//! }))
//! .unwrap();
//! let state = HotTubState::normalize(&raw);
//!
//! let draw = PowerProfile::default().estimate(&state);
//! assert_eq!(draw.total(), 1540);
//!
//! let mut meter = EnergyMeter::new();
//! let start = Utc::now();
//! meter.record(start, draw.total());
//! meter.record(start + Duration::hours(1), draw.total());
//! assert!((meter.total_kwh() - 1.54).abs() < 1e-9);
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::state::{HeatState, HotTubState};

/// Nominal component ratings in watts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerProfile {
    /// Filter pump.
    pub pump_watts: u32,
    /// Bubble blower.
    pub bubble_watts: u32,
    /// Heater while preheating.
    pub preheat_watts: u32,
    /// Heater while heating.
    pub heat_watts: u32,
}

impl PowerProfile {
    /// Default filter pump rating.
    pub const DEFAULT_PUMP_WATTS: u32 = 40;
    /// Default bubble blower rating.
    pub const DEFAULT_BUBBLE_WATTS: u32 = 600;
    /// Default heater rating while preheating.
    pub const DEFAULT_PREHEAT_WATTS: u32 = 2000;
    /// Default heater rating while heating.
    pub const DEFAULT_HEAT_WATTS: u32 = 1500;

    /// Creates a profile with default ratings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter pump rating.
    #[must_use]
    pub fn with_pump_watts(mut self, watts: u32) -> Self {
        self.pump_watts = watts;
        self
    }

    /// Sets the bubble blower rating.
    #[must_use]
    pub fn with_bubble_watts(mut self, watts: u32) -> Self {
        self.bubble_watts = watts;
        self
    }

    /// Sets the heater ratings.
    #[must_use]
    pub fn with_heater_watts(mut self, preheat: u32, heat: u32) -> Self {
        self.preheat_watts = preheat;
        self.heat_watts = heat;
        self
    }

    /// Estimates the current draw.
    ///
    /// The heater only counts while switched on and actively preheating
    /// or heating.
    #[must_use]
    pub fn estimate(&self, state: &HotTubState) -> PowerBreakdown {
        let heater = if state.heater.is_on() {
            match state.heat_state {
                HeatState::Preheating => self.preheat_watts,
                HeatState::Heating => self.heat_watts,
                _ => 0,
            }
        } else {
            0
        };

        PowerBreakdown {
            pump: if state.filter.is_on() { self.pump_watts } else { 0 },
            bubble: if state.bubble.is_on() { self.bubble_watts } else { 0 },
            heater,
        }
    }
}

impl Default for PowerProfile {
    fn default() -> Self {
        Self {
            pump_watts: Self::DEFAULT_PUMP_WATTS,
            bubble_watts: Self::DEFAULT_BUBBLE_WATTS,
            preheat_watts: Self::DEFAULT_PREHEAT_WATTS,
            heat_watts: Self::DEFAULT_HEAT_WATTS,
        }
    }
}

/// Estimated draw per component, in watts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerBreakdown {
    /// Filter pump.
    pub pump: u32,
    /// Bubble blower.
    pub bubble: u32,
    /// Heater.
    pub heater: u32,
}

impl PowerBreakdown {
    /// Returns the summed draw.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.pump + self.bubble + self.heater
    }
}

/// Accumulates energy from power samples with the trapezoidal rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EnergyMeter {
    total_kwh: f64,
    last: Option<(DateTime<Utc>, u32)>,
}

impl EnergyMeter {
    /// Creates a meter starting at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a meter resuming from a stored total.
    #[must_use]
    pub fn with_total(total_kwh: f64) -> Self {
        Self {
            total_kwh,
            last: None,
        }
    }

    /// Adds a sample and returns the new total in kWh.
    ///
    /// Samples older than the previous one only reset the reference point.
    pub fn record(&mut self, at: DateTime<Utc>, watts: u32) -> f64 {
        if let Some((then, previous_watts)) = self.last {
            let elapsed = at.signed_duration_since(then);
            if elapsed > chrono::Duration::zero() {
                #[allow(clippy::cast_precision_loss)]
                let hours = elapsed.num_milliseconds() as f64 / 3_600_000.0;
                let average_watts = (f64::from(previous_watts) + f64::from(watts)) / 2.0;
                self.total_kwh += average_watts * hours / 1000.0;
            }
        }
        self.last = Some((at, watts));
        self.total_kwh
    }

    /// Returns the accumulated energy in kWh.
    #[must_use]
    pub fn total_kwh(&self) -> f64 {
        self.total_kwh
    }

    /// Resets the total and the reference sample.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
