// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor API regions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// One of the three regional vendor endpoints.
///
/// The region is fixed when the client is built.
///
/// # Examples
///
/// ```
/// use mspa_lib::types::Region;
///
/// assert_eq!(Region::parse_or_default("us"), Region::Us);
/// assert_eq!(Region::parse_or_default("mars"), Region::Row);
/// assert_eq!(Region::from_country_code("CA"), Region::Us);
/// assert_eq!(Region::Us.base_url(), "https://api.usiot.the-mspa.com");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Region {
    /// Rest of world.
    #[default]
    #[serde(rename = "ROW")]
    Row,
    /// United States and Canada.
    #[serde(rename = "US")]
    Us,
    /// China.
    #[serde(rename = "CH")]
    Ch,
}

impl Region {
    /// Returns the region code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Row => "ROW",
            Self::Us => "US",
            Self::Ch => "CH",
        }
    }

    /// Returns the API base URL for this region.
    #[must_use]
    pub const fn base_url(&self) -> &'static str {
        match self {
            Self::Row => "https://api.iot.the-mspa.com",
            Self::Us => "https://api.usiot.the-mspa.com",
            Self::Ch => "https://api.mspa.mxchip.com.cn",
        }
    }

    /// Parses a region code, falling back to [`Region::Row`] for anything
    /// unrecognized.
    #[must_use]
    pub fn parse_or_default(code: &str) -> Self {
        code.parse().unwrap_or_else(|_| {
            tracing::debug!(code, "Unknown region code, using ROW");
            Self::default()
        })
    }

    /// Picks a region from an ISO country code.
    #[must_use]
    pub fn from_country_code(country: &str) -> Self {
        match country.trim().to_ascii_uppercase().as_str() {
            "US" | "CA" => Self::Us,
            "CN" => Self::Ch,
            _ => Self::Row,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ROW" => Ok(Self::Row),
            "US" => Ok(Self::Us),
            "CH" => Ok(Self::Ch),
            _ => Err(ValueError::InvalidRegion(s.to_string())),
        }
    }
}
