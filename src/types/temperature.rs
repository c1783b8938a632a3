// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Target temperature and display unit.
//!
//! The vendor stores every temperature as an integer in half degrees
//! Celsius. [`Temperature`] validates a settable target and converts it to
//! that doubled representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A settable target water temperature in degrees Celsius.
///
/// Values are rounded to the nearest half degree.
///
/// # Examples
///
/// ```
/// use mspa_lib::types::Temperature;
///
/// let target = Temperature::new(37.5).unwrap();
/// assert_eq!(target.to_raw(), 75);
/// assert_eq!(Temperature::from_raw(76).celsius(), 38.0);
/// assert!(Temperature::new(45.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Temperature(f64);

impl Temperature {
    /// Lowest settable target in Celsius.
    pub const MIN_CELSIUS: f64 = 20.0;

    /// Highest settable target in Celsius.
    pub const MAX_CELSIUS: f64 = 40.0;

    /// Creates a validated target temperature.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidTemperature` if the value is not finite
    /// or lies outside 20-40 °C.
    pub fn new(celsius: f64) -> Result<Self, ValueError> {
        if !celsius.is_finite() || !(Self::MIN_CELSIUS..=Self::MAX_CELSIUS).contains(&celsius) {
            return Err(ValueError::InvalidTemperature {
                min: Self::MIN_CELSIUS,
                max: Self::MAX_CELSIUS,
                value: celsius,
            });
        }
        Ok(Self((celsius * 2.0).round() / 2.0))
    }

    /// Creates a target from a Fahrenheit value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidTemperature` if the converted value is
    /// out of range.
    pub fn from_fahrenheit(fahrenheit: f64) -> Result<Self, ValueError> {
        Self::new((fahrenheit - 32.0) * 5.0 / 9.0)
    }

    /// Decodes a doubled vendor value without range checks.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_raw(raw: i64) -> Self {
        Self(raw as f64 / 2.0)
    }

    /// Returns the value in Celsius.
    #[must_use]
    pub const fn celsius(&self) -> f64 {
        self.0
    }

    /// Returns the value in Fahrenheit.
    #[must_use]
    pub fn fahrenheit(&self) -> f64 {
        self.0 * 9.0 / 5.0 + 32.0
    }

    /// Returns the doubled integer the vendor expects.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_raw(&self) -> i64 {
        (self.0 * 2.0).round() as i64
    }
}

impl fmt::Display for Temperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1} °C", self.0)
    }
}

/// Temperature unit shown on the device panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    /// Degrees Celsius (vendor value `0`). The device falls back to this
    /// after losing power.
    #[default]
    Celsius,
    /// Degrees Fahrenheit (vendor value `1`).
    Fahrenheit,
}

impl TemperatureUnit {
    /// Returns the vendor value.
    #[must_use]
    pub const fn as_num(&self) -> i64 {
        match self {
            Self::Celsius => 0,
            Self::Fahrenheit => 1,
        }
    }

    /// Decodes a vendor value; anything non-zero is Fahrenheit.
    #[must_use]
    pub const fn from_num(value: i64) -> Self {
        if value == 0 {
            Self::Celsius
        } else {
            Self::Fahrenheit
        }
    }

    /// Returns the unit symbol.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for TemperatureUnit {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c" | "°c" | "celsius" | "0" => Ok(Self::Celsius),
            "f" | "°f" | "fahrenheit" | "1" => Ok(Self::Fahrenheit),
            _ => Err(ValueError::InvalidTemperatureUnit(s.to_string())),
        }
    }
}
