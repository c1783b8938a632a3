// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request and response bodies of the vendor API.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::DeviceIdentity;

pub(crate) const TOKEN_PATH: &str = "/api/enduser/get_token/";
pub(crate) const DEVICES_PATH: &str = "/api/enduser/devices/";
pub(crate) const SHADOW_PATH: &str = "/api/device/thing_shadow/";
pub(crate) const COMMAND_PATH: &str = "/api/device/command";

/// Message the command endpoint answers with on success.
pub(crate) const SUCCESS_MESSAGE: &str = "SUCCESS";

/// Error code the token endpoint uses for a wrong password.
pub(crate) const WRONG_PASSWORD_CODE: i64 = 16019;

/// Top-level response wrapper shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct Envelope {
    #[serde(default)]
    pub code: Value,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

impl Envelope {
    /// `data` is present and not empty.
    pub fn has_data(&self) -> bool {
        crate::types::truthy(Some(&self.data))
    }

    pub fn is_success(&self) -> bool {
        self.message.as_deref() == Some(SUCCESS_MESSAGE)
    }

    pub fn code(&self) -> Option<i64> {
        match &self.code {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }

    /// The token endpoint refused the credentials outright.
    pub fn is_wrong_password(&self) -> bool {
        self.code() == Some(WRONG_PASSWORD_CODE)
            || self.message().to_lowercase().contains("password")
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct TokenRequest<'a> {
    pub account: &'a str,
    pub app_id: &'a str,
    pub password: &'a str,
    pub brand: &'a str,
    pub registration_id: &'a str,
    pub push_type: &'a str,
    pub lan_code: &'a str,
    pub country: &'a str,
}

impl<'a> TokenRequest<'a> {
    pub fn new(account: &'a str, app_id: &'a str, password: &'a str) -> Self {
        Self {
            account,
            app_id,
            password,
            brand: "",
            registration_id: "",
            push_type: "android",
            lan_code: "EN",
            country: "",
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TokenData {
    #[serde(default)]
    pub token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DeviceList {
    #[serde(default)]
    pub list: Vec<DeviceIdentity>,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeviceRequest<'a> {
    pub device_id: &'a str,
    pub product_id: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CommandRequest<'a> {
    pub device_id: &'a str,
    pub product_id: &'a str,
    /// JSON-encoded `{"state":{"desired":{...}}}`.
    pub desired: String,
}

/// Accepts a string or a number and yields a string.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    })
}
