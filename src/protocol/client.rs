// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Signed HTTP client for the vendor cloud API.

use std::sync::OnceLock;
use std::time::Duration;

use parking_lot::Mutex;
use reqwest::{Client, Method};
use serde::Serialize;

use super::credentials::obfuscate_email;
use super::token_store::token_preview;
use super::wire::{
    COMMAND_PATH, CommandRequest, DEVICES_PATH, DeviceList, DeviceRequest, Envelope, SHADOW_PATH,
    TOKEN_PATH, TokenData, TokenRequest,
};
use super::{ClientConfig, CommandReceipt, Credentials, DeviceIdentity, Signer, TokenStore};
use crate::command::DesiredState;
use crate::error::{DeviceError, Error, ParseError, ProtocolError, Result};
use crate::state::RawSnapshot;

// ============================================================================
// ApiClient
// ============================================================================

/// Client for the vendor cloud API.
///
/// Every call is signed with a fresh nonce. A call the API does not
/// accept (no `data`, or a command message other than `SUCCESS`) triggers
/// one re-authentication and exactly one retry; a second refusal is
/// returned to the caller.
///
/// # Examples
///
/// ```no_run
/// use mspa_lib::protocol::{ClientConfig, Credentials};
/// use mspa_lib::types::Region;
///
/// # async fn example() -> mspa_lib::Result<()> {
/// let credentials = Credentials::from_password("me@example.com", "secret");
/// let client = ClientConfig::new(Region::Row).into_client(credentials)?;
///
/// let device = client.discover().await?;
/// println!("found {}", device.display_name());
///
/// let status = client.get_status().await?;
/// println!("{status:?}");
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    lan_code: String,
    credentials: Credentials,
    store: TokenStore,
    signer: Signer,
    confirm_attempts: u32,
    confirm_delay: Duration,
    timeout: Duration,
    wanted_device: Option<String>,
    device: OnceLock<DeviceIdentity>,
    cached_status: Mutex<Option<RawSnapshot>>,
}

impl ApiClient {
    /// Creates a client.
    ///
    /// The token store is bound to `credentials`; a store that held a
    /// token for other credentials is cleared.
    ///
    /// # Errors
    ///
    /// Returns error if the base URL is invalid or the HTTP client cannot
    /// be created.
    pub fn new(
        config: ClientConfig,
        credentials: Credentials,
        store: TokenStore,
    ) -> std::result::Result<Self, ProtocolError> {
        let base_url = config.base_url().to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ProtocolError::InvalidAddress(base_url));
        }

        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(ProtocolError::Http)?;

        store.bind(&credentials);

        Ok(Self {
            http,
            base_url,
            lan_code: config.lan_code().to_string(),
            credentials,
            store,
            signer: Signer::new(),
            confirm_attempts: config.confirm_attempts(),
            confirm_delay: config.confirm_delay(),
            timeout: config.timeout(),
            wanted_device: config.device_id().map(str::to_string),
            device: OnceLock::new(),
            cached_status: Mutex::new(None),
        })
    }

    /// Uses a known device instead of discovering one.
    #[must_use]
    pub fn with_device(self, identity: DeviceIdentity) -> Self {
        // A fresh OnceLock always accepts the first value.
        let _ = self.device.set(identity);
        self
    }

    /// Returns the base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the shared token store.
    #[must_use]
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Returns the device identity, once discovered.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::NotDiscovered` before [`ApiClient::discover`].
    pub fn identity(&self) -> Result<&DeviceIdentity> {
        self.device
            .get()
            .ok_or_else(|| DeviceError::NotDiscovered.into())
    }

    // ------------------------------------------------------------------------
    // Authentication
    // ------------------------------------------------------------------------

    /// Requests a new token and stores it.
    ///
    /// When the response carries no token the previously cached token is
    /// returned instead, which may be empty.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::AuthenticationFailed` if the API rejects the
    /// password, or a transport error.
    pub async fn authenticate(&self) -> Result<String> {
        let _refresh = self.store.lock_refresh().await;
        self.request_token().await
    }

    /// Re-authenticates after `stale` was refused.
    ///
    /// If another client sharing the store already replaced `stale`, the
    /// new token is used without another request.
    async fn reauthenticate(&self, stale: &str) -> Result<String> {
        let _refresh = self.store.lock_refresh().await;

        let current = self.store.get();
        if !current.is_empty() && current != stale {
            tracing::debug!(
                token = %token_preview(&current),
                "Token already refreshed by another client"
            );
            return Ok(current);
        }

        tracing::info!(
            account = %self.credentials.obfuscated_account(),
            "Re-authenticating"
        );
        let token = self.request_token().await?;
        if token.is_empty() {
            return Err(ProtocolError::AuthenticationFailed(
                "no token obtainable for these credentials".to_string(),
            )
            .into());
        }
        Ok(token)
    }

    async fn request_token(&self) -> Result<String> {
        let body = TokenRequest::new(
            self.credentials.account(),
            self.signer.app_id(),
            self.credentials.password_digest(),
        );
        let envelope = self
            .send_signed(Method::POST, TOKEN_PATH, Some(&body), None)
            .await?;

        let data: TokenData = if envelope.data.is_object() {
            serde_json::from_value(envelope.data.clone()).map_err(ParseError::Json)?
        } else {
            TokenData::default()
        };

        if let Some(token) = data.token.filter(|token| !token.is_empty()) {
            tracing::info!(token = %token_preview(&token), "Token received");
            self.store.set(token.clone());
            return Ok(token);
        }

        if envelope.is_wrong_password() {
            tracing::warn!(
                code = ?envelope.code(),
                message = envelope.message(),
                "Password rejected"
            );
            return Err(ProtocolError::AuthenticationFailed(envelope.message().to_string()).into());
        }

        tracing::warn!(
            code = ?envelope.code(),
            message = envelope.message(),
            "No token in response, keeping cached token"
        );
        Ok(self.store.get())
    }

    // ------------------------------------------------------------------------
    // Device calls
    // ------------------------------------------------------------------------

    /// Lists the devices bound to the account.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::EmptyResponse` if the list is still empty
    /// after re-authentication.
    pub async fn get_device_list(&self) -> Result<Vec<DeviceIdentity>> {
        let envelope = self
            .call(Method::GET, DEVICES_PATH, None::<&()>, Envelope::has_data)
            .await?;
        if !envelope.has_data() {
            return Err(ProtocolError::EmptyResponse {
                endpoint: DEVICES_PATH,
            }
            .into());
        }
        let list: DeviceList = serde_json::from_value(envelope.data).map_err(ParseError::Json)?;
        tracing::info!(count = list.list.len(), "Device list received");
        Ok(list.list)
    }

    /// Resolves the device this client talks to.
    ///
    /// The first device on the account is used unless a device id was
    /// configured. The identity is resolved once and then reused.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::NoDevices` or `DeviceError::DeviceNotFound`,
    /// or the error of the device list call.
    pub async fn discover(&self) -> Result<&DeviceIdentity> {
        if let Some(identity) = self.device.get() {
            return Ok(identity);
        }

        let devices = self.get_device_list().await?;
        let identity = match &self.wanted_device {
            Some(id) => devices
                .into_iter()
                .find(|device| &device.device_id == id)
                .ok_or_else(|| DeviceError::DeviceNotFound(id.clone()))?,
            None => devices.into_iter().next().ok_or(DeviceError::NoDevices)?,
        };

        tracing::info!(
            device_id = %identity.device_id,
            product_id = %identity.product_id,
            name = %identity.display_name(),
            "Device discovered"
        );
        Ok(self.device.get_or_init(|| identity))
    }

    /// Fetches the current device snapshot.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::EmptyResponse` if the API still answers
    /// without data after re-authentication.
    pub async fn get_status(&self) -> Result<RawSnapshot> {
        let identity = self.identity()?;
        let body = DeviceRequest {
            device_id: &identity.device_id,
            product_id: &identity.product_id,
        };
        let envelope = self
            .call(Method::POST, SHADOW_PATH, Some(&body), Envelope::has_data)
            .await?;
        if !envelope.has_data() {
            return Err(ProtocolError::EmptyResponse {
                endpoint: SHADOW_PATH,
            }
            .into());
        }
        Ok(RawSnapshot::from_value(envelope.data)?)
    }

    /// Sends a desired-state delta and waits for the device to confirm it.
    ///
    /// After the vendor accepts the command, status is fetched up to the
    /// configured number of times, stopping once every field of `desired`
    /// matches. The last fetched status is kept for
    /// [`ApiClient::take_cached_status`].
    ///
    /// # Errors
    ///
    /// Returns `DeviceError::CommandRejected` if the vendor refuses the
    /// command after re-authentication.
    pub async fn send_command(&self, desired: &DesiredState) -> Result<CommandReceipt> {
        let identity = self.identity()?;
        let body = CommandRequest {
            device_id: &identity.device_id,
            product_id: &identity.product_id,
            desired: desired.to_payload()?,
        };
        tracing::debug!(desired = ?desired, "Sending command");
        self.cached_status.lock().take();

        let envelope = self
            .call(Method::POST, COMMAND_PATH, Some(&body), Envelope::is_success)
            .await?;
        if !envelope.is_success() {
            let message = envelope.message.unwrap_or_else(|| "no message".to_string());
            tracing::warn!(desired = ?desired, message = %message, "Command rejected");
            return Err(DeviceError::CommandRejected(message).into());
        }

        let (confirmed, attempts) = self.confirm(desired).await;
        Ok(CommandReceipt {
            message: envelope.message.unwrap_or_default(),
            confirmed,
            attempts,
        })
    }

    /// Takes the status fetched while confirming the last command.
    pub fn take_cached_status(&self) -> Option<RawSnapshot> {
        self.cached_status.lock().take()
    }

    async fn confirm(&self, desired: &DesiredState) -> (bool, u32) {
        let mut attempts = 0;
        while attempts < self.confirm_attempts {
            attempts += 1;
            tokio::time::sleep(self.confirm_delay).await;

            match self.get_status().await {
                Ok(status) => {
                    let confirmed = desired.is_confirmed_by(&status);
                    *self.cached_status.lock() = Some(status);
                    if confirmed {
                        tracing::debug!(attempts, "Command confirmed");
                        return (true, attempts);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, attempts, "Status fetch failed while confirming command");
                    return (false, attempts);
                }
            }
        }
        tracing::debug!(attempts, "Command not confirmed yet");
        (false, attempts)
    }

    // ------------------------------------------------------------------------
    // Transport
    // ------------------------------------------------------------------------

    /// Sends a request, re-authenticating and retrying once if `accepted`
    /// rejects the first answer. Returns the last answer either way.
    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &'static str,
        body: Option<&B>,
        accepted: fn(&Envelope) -> bool,
    ) -> Result<Envelope> {
        let token = self.store.get();
        let first = self
            .send_signed(method.clone(), path, body, Some(&token))
            .await?;
        if accepted(&first) {
            return Ok(first);
        }

        tracing::info!(
            endpoint = path,
            message = first.message(),
            "Request not accepted, retrying after re-authentication"
        );
        let token = self.reauthenticate(&token).await?;
        self.send_signed(method, path, body, Some(&token)).await
    }

    async fn send_signed<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &'static str,
        body: Option<&B>,
        token: Option<&str>,
    ) -> Result<Envelope> {
        let url = format!("{}{path}", self.base_url);
        let headers = self.signer.headers(token, &self.lan_code)?;

        tracing::debug!(url = %url, method = %method, "Sending MSpa request");

        let mut request = self.http.request(method, &url).headers(headers);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        tracing::debug!(
            status = status.as_u16(),
            body = %self.redact(&text),
            "Received MSpa response"
        );

        if status.is_server_error() {
            return Err(status_error(status).into());
        }

        match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => Ok(envelope),
            Err(_) if !status.is_success() => Err(status_error(status).into()),
            Err(err) => Err(Error::Parse(ParseError::Json(err))),
        }
    }

    fn transport_error(&self, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            #[allow(clippy::cast_possible_truncation)]
            let millis = self.timeout.as_millis() as u64;
            ProtocolError::Timeout(millis)
        } else if err.is_connect() {
            ProtocolError::ConnectionFailed(err.to_string())
        } else {
            ProtocolError::Http(err)
        }
    }

    fn redact(&self, body: &str) -> String {
        let account = self.credentials.account();
        if account.is_empty() {
            return body.to_string();
        }
        body.replace(account, &obfuscate_email(account))
    }
}

fn status_error(status: reqwest::StatusCode) -> ProtocolError {
    ProtocolError::Status {
        status: status.as_u16(),
        reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
    }
}
