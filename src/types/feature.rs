// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Switchable hot tub features and their display metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A switchable feature of the hot tub.
///
/// Each feature maps to one vendor field (`heater_state`, ...) and one
/// canonical state key (`heater`, ...).
///
/// # Examples
///
/// ```
/// use mspa_lib::types::Feature;
///
/// let heater: Feature = "heater".parse().unwrap();
/// assert_eq!(heater.vendor_field(), "heater_state");
/// assert_eq!(heater.canonical_key(), "heater");
/// assert!("sauna".parse::<Feature>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    /// Water heater.
    Heater,
    /// Filter pump.
    Filter,
    /// Air bubbles. Switching requires a level.
    Bubble,
    /// Hydro jets.
    Jet,
    /// Ozone generator.
    Ozone,
    /// UV-C sanitizer.
    Uvc,
}

impl Feature {
    /// All features, in display order.
    pub const ALL: [Self; 6] = [
        Self::Heater,
        Self::Filter,
        Self::Bubble,
        Self::Jet,
        Self::Ozone,
        Self::Uvc,
    ];

    /// Returns the canonical state key for this feature.
    #[must_use]
    pub const fn canonical_key(&self) -> &'static str {
        self.descriptor().name
    }

    /// Returns the vendor field carrying this feature's state.
    #[must_use]
    pub const fn vendor_field(&self) -> &'static str {
        match self {
            Self::Heater => "heater_state",
            Self::Filter => "filter_state",
            Self::Bubble => "bubble_state",
            Self::Jet => "jet_state",
            Self::Ozone => "ozone_state",
            Self::Uvc => "uvc_state",
        }
    }

    /// Returns `true` if switching this feature needs an extra parameter.
    #[must_use]
    pub const fn requires_level(&self) -> bool {
        matches!(self, Self::Bubble)
    }

    /// Returns the display record for this feature.
    #[must_use]
    pub const fn descriptor(&self) -> &'static FeatureDescriptor {
        match self {
            Self::Heater => &FEATURES[0],
            Self::Filter => &FEATURES[1],
            Self::Bubble => &FEATURES[2],
            Self::Jet => &FEATURES[3],
            Self::Ozone => &FEATURES[4],
            Self::Uvc => &FEATURES[5],
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_key())
    }
}

impl FromStr for Feature {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|feature| feature.canonical_key().eq_ignore_ascii_case(s))
            .ok_or_else(|| ValueError::UnknownFeature(s.to_string()))
    }
}

/// Display metadata for one switchable feature.
///
/// A host drives one generic switch handler from this table instead of
/// defining a type per feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDescriptor {
    /// The feature this record describes.
    pub feature: Feature,
    /// Canonical key, also used as the command name.
    pub name: &'static str,
    /// Material Design icon name.
    pub icon: &'static str,
    /// Human-readable name.
    pub display_name: &'static str,
}

/// Display records for all features, in [`Feature::ALL`] order.
pub const FEATURES: [FeatureDescriptor; 6] = [
    FeatureDescriptor {
        feature: Feature::Heater,
        name: "heater",
        icon: "mdi:hot-tub",
        display_name: "Heater",
    },
    FeatureDescriptor {
        feature: Feature::Filter,
        name: "filter",
        icon: "mdi:air-filter",
        display_name: "Filter",
    },
    FeatureDescriptor {
        feature: Feature::Bubble,
        name: "bubble",
        icon: "mdi:chart-bubble",
        display_name: "Bubble",
    },
    FeatureDescriptor {
        feature: Feature::Jet,
        name: "jet",
        icon: "mdi:turbine",
        display_name: "Jet",
    },
    FeatureDescriptor {
        feature: Feature::Ozone,
        name: "ozone",
        icon: "mdi:weather-hazy",
        display_name: "Ozone",
    },
    FeatureDescriptor {
        feature: Feature::Uvc,
        name: "uvc",
        icon: "mdi:weather-sunny-alert",
        display_name: "UVC",
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vendor_field_table() {
        assert_eq!(Feature::Heater.vendor_field(), "heater_state");
        assert_eq!(Feature::Filter.vendor_field(), "filter_state");
        assert_eq!(Feature::Jet.vendor_field(), "jet_state");
        assert_eq!(Feature::Ozone.vendor_field(), "ozone_state");
        assert_eq!(Feature::Uvc.vendor_field(), "uvc_state");
        assert_eq!(Feature::Bubble.vendor_field(), "bubble_state");
    }

    #[test]
    fn descriptor_table_matches_all_order() {
        for (feature, descriptor) in Feature::ALL.iter().zip(FEATURES.iter()) {
            assert_eq!(descriptor.feature, *feature);
            assert_eq!(feature.descriptor(), descriptor);
        }
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("UVC".parse::<Feature>().unwrap(), Feature::Uvc);
        assert_eq!("Filter".parse::<Feature>().unwrap(), Feature::Filter);
    }

    #[test]
    fn parse_unknown_feature() {
        let err = "sauna".parse::<Feature>().unwrap_err();
        assert_eq!(err, ValueError::UnknownFeature("sauna".to_string()));
    }

    #[test]
    fn only_bubble_requires_level() {
        let with_level: Vec<_> = Feature::ALL
            .into_iter()
            .filter(Feature::requires_level)
            .collect();
        assert_eq!(with_level, vec![Feature::Bubble]);
    }
}
