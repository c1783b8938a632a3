// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device records returned by the device list.

use serde::{Deserialize, Serialize};

use super::wire::string_or_number;

/// A device bound to the account.
///
/// Resolved once at startup; the ids address every device-scoped call.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeviceIdentity {
    /// Vendor device id.
    #[serde(default, deserialize_with = "string_or_number")]
    pub device_id: String,
    /// Vendor product id.
    #[serde(default, deserialize_with = "string_or_number")]
    pub product_id: String,
    /// Product series, e.g. `"Frame"`.
    #[serde(default, rename = "product_series")]
    pub series: Option<String>,
    /// Product model, e.g. `"F-OS061W"`.
    #[serde(default, rename = "product_model")]
    pub model: Option<String>,
    /// Controller software version.
    #[serde(default)]
    pub software_version: Option<String>,
    /// Product picture URL.
    #[serde(default, rename = "url")]
    pub picture_url: Option<String>,
    /// Name the user gave the device in the mobile app.
    #[serde(default, rename = "device_alias")]
    pub alias: Option<String>,
}

impl DeviceIdentity {
    /// Creates an identity from its ids only.
    #[must_use]
    pub fn new(device_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            product_id: product_id.into(),
            ..Self::default()
        }
    }

    /// Returns the alias if set, otherwise `MSpa {series} {model}`.
    #[must_use]
    pub fn display_name(&self) -> String {
        if let Some(alias) = self.alias.as_deref().filter(|a| !a.trim().is_empty()) {
            return alias.to_string();
        }
        let parts: Vec<&str> = [self.series.as_deref(), self.model.as_deref()]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect();
        if parts.is_empty() {
            "MSpa".to_string()
        } else {
            format!("MSpa {}", parts.join(" "))
        }
    }
}
