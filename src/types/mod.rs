// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for hot tub control.
//!
//! Each type validates its value at construction time, so a command built
//! from these types is always accepted by the dispatcher.
//!
//! # Types
//!
//! - [`SwitchState`] - On/Off state of a feature
//! - [`Feature`] - Switchable feature, with its [`FeatureDescriptor`]
//! - [`BubbleLevel`] - Bubble intensity (1-3)
//! - [`Temperature`] - Settable target temperature (20-40 °C)
//! - [`TemperatureUnit`] - Celsius/Fahrenheit panel unit
//! - [`Region`] - Regional API endpoint

mod bubble_level;
mod feature;
mod region;
mod switch;
mod temperature;

pub use bubble_level::BubbleLevel;
pub use feature::{FEATURES, Feature, FeatureDescriptor};
pub use region::Region;
pub use switch::SwitchState;
pub use temperature::{Temperature, TemperatureUnit};

use serde_json::Value;

/// Vendor truthiness: non-zero numbers, `true`, non-empty strings and
/// collections. Missing and `null` are false.
pub(crate) fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}
