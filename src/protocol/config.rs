// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Client configuration.

use std::time::Duration;

use super::{ApiClient, Credentials, TokenStore};
use crate::error::ProtocolError;
use crate::types::Region;

/// Configuration for an [`ApiClient`].
///
/// # Examples
///
/// ```
/// use mspa_lib::protocol::ClientConfig;
/// use mspa_lib::types::Region;
/// use std::time::Duration;
///
/// let config = ClientConfig::new(Region::Us)
///     .with_timeout(Duration::from_secs(10))
///     .with_confirmation(3, Duration::from_secs(2));
///
/// assert_eq!(config.base_url(), "https://api.usiot.the-mspa.com");
/// assert_eq!(config.confirm_attempts(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct ClientConfig {
    region: Region,
    base_url: Option<String>,
    timeout: Duration,
    confirm_attempts: u32,
    confirm_delay: Duration,
    lan_code: String,
    device_id: Option<String>,
}

impl ClientConfig {
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
    /// Default number of status fetches after a command.
    pub const DEFAULT_CONFIRM_ATTEMPTS: u32 = 5;
    /// Default delay before each confirmation fetch.
    pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_secs(3);
    /// Default `lan_code` header.
    pub const DEFAULT_LAN_CODE: &'static str = "de";

    /// Creates a configuration for a region.
    #[must_use]
    pub fn new(region: Region) -> Self {
        Self {
            region,
            base_url: None,
            timeout: Self::DEFAULT_TIMEOUT,
            confirm_attempts: Self::DEFAULT_CONFIRM_ATTEMPTS,
            confirm_delay: Self::DEFAULT_CONFIRM_DELAY,
            lan_code: Self::DEFAULT_LAN_CODE.to_string(),
            device_id: None,
        }
    }

    /// Creates a configuration from a region code; unknown codes select
    /// the default region.
    #[must_use]
    pub fn from_region_code(code: &str) -> Self {
        Self::new(Region::parse_or_default(code))
    }

    /// Overrides the base URL (for proxies and tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into().trim_end_matches('/').to_string());
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets how many times, and how far apart, status is fetched after a
    /// command to confirm it.
    #[must_use]
    pub fn with_confirmation(mut self, attempts: u32, delay: Duration) -> Self {
        self.confirm_attempts = attempts;
        self.confirm_delay = delay;
        self
    }

    /// Sets the `lan_code` header.
    #[must_use]
    pub fn with_lan_code(mut self, lan_code: impl Into<String>) -> Self {
        self.lan_code = lan_code.into();
        self
    }

    /// Selects a device by id instead of the first one on the account.
    #[must_use]
    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    /// Returns the region.
    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Returns the effective base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.region.base_url())
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of confirmation fetches.
    #[must_use]
    pub fn confirm_attempts(&self) -> u32 {
        self.confirm_attempts
    }

    /// Returns the delay before each confirmation fetch.
    #[must_use]
    pub fn confirm_delay(&self) -> Duration {
        self.confirm_delay
    }

    /// Returns the `lan_code` header value.
    #[must_use]
    pub fn lan_code(&self) -> &str {
        &self.lan_code
    }

    /// Returns the selected device id, if any.
    #[must_use]
    pub fn device_id(&self) -> Option<&str> {
        self.device_id.as_deref()
    }

    /// Creates an [`ApiClient`] with its own token store.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn into_client(self, credentials: Credentials) -> Result<ApiClient, ProtocolError> {
        let store = TokenStore::new(&credentials);
        ApiClient::new(self, credentials, store)
    }

    /// Creates an [`ApiClient`] sharing an existing token store.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn into_client_with_store(
        self,
        credentials: Credentials,
        store: TokenStore,
    ) -> Result<ApiClient, ProtocolError> {
        ApiClient::new(self, credentials, store)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(Region::default())
    }
}
