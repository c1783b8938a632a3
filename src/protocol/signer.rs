// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-request signature headers.
//!
//! Every request carries a fresh nonce, the current Unix timestamp and the
//! uppercase hex MD5 of `app_id,app_secret,nonce,ts`.

use md5::{Digest, Md5};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::header::{
    AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};

use crate::error::ProtocolError;

/// Application identifier of the vendor mobile app.
pub const APP_ID: &str = "e1c8e068f9ca11eba4dc0242ac120002";

/// Application secret of the vendor mobile app.
pub const APP_SECRET: &str = "87025c9ecd18906d27225fe79cb68349";

/// Default nonce length.
pub const NONCE_LENGTH: usize = 32;

const CLIENT_USER_AGENT: &str = "okhttp/4.9.0";
const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";

/// Builds signed header blocks for the vendor protocol.
///
/// # Examples
///
/// ```
/// use mspa_lib::protocol::Signer;
///
/// let signer = Signer::new();
/// let sign = signer.sign("nonce", "1700000000");
/// assert_eq!(sign.len(), 32);
/// assert_eq!(sign, sign.to_uppercase());
/// ```
#[derive(Debug, Clone)]
pub struct Signer {
    app_id: String,
    app_secret: String,
}

impl Signer {
    /// Creates a signer for the vendor mobile app identity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_app(APP_ID, APP_SECRET)
    }

    /// Creates a signer for a custom app identity.
    #[must_use]
    pub fn with_app(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }

    /// Returns the app identifier sent in the `appid` header.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Computes the signature for a nonce and timestamp.
    #[must_use]
    pub fn sign(&self, nonce: &str, timestamp: &str) -> String {
        let raw = format!("{},{},{nonce},{timestamp}", self.app_id, self.app_secret);
        hex::encode_upper(Md5::digest(raw.as_bytes()))
    }

    /// Generates a random alphanumeric nonce.
    #[must_use]
    pub fn nonce(length: usize) -> String {
        rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(length)
            .map(char::from)
            .collect()
    }

    /// Returns the current Unix time in seconds.
    #[must_use]
    pub fn timestamp() -> String {
        chrono::Utc::now().timestamp().to_string()
    }

    /// Builds the full header block for one request.
    ///
    /// `token` is `None` for the token request itself.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::InvalidHeader` if a value contains bytes
    /// not allowed in an HTTP header.
    pub fn headers(&self, token: Option<&str>, lan_code: &str) -> Result<HeaderMap, ProtocolError> {
        let nonce = Self::nonce(NONCE_LENGTH);
        let ts = Self::timestamp();
        let sign = self.sign(&nonce, &ts);

        let authorization = match token {
            Some(token) => format!("token {token}"),
            None => "token".to_string(),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("push_type"),
            HeaderValue::from_static("Android"),
        );
        headers.insert(AUTHORIZATION, value("authorization", &authorization)?);
        headers.insert(HeaderName::from_static("appid"), value("appid", &self.app_id)?);
        headers.insert(HeaderName::from_static("nonce"), value("nonce", &nonce)?);
        headers.insert(HeaderName::from_static("ts"), value("ts", &ts)?);
        headers.insert(HeaderName::from_static("lan_code"), value("lan_code", lan_code)?);
        headers.insert(HeaderName::from_static("sign"), value("sign", &sign)?);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
        headers.insert(USER_AGENT, HeaderValue::from_static(CLIENT_USER_AGENT));
        Ok(headers)
    }
}

impl Default for Signer {
    fn default() -> Self {
        Self::new()
    }
}

fn value(name: &'static str, raw: &str) -> Result<HeaderValue, ProtocolError> {
    HeaderValue::from_str(raw).map_err(|_| ProtocolError::InvalidHeader(name))
}
