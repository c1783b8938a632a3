// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `mspa_lib` library.
//!
//! The hierarchy separates the four failure classes a caller has to treat
//! differently:
//!
//! - [`ValueError`]: a request was malformed (unknown feature, bad literal,
//!   out-of-range level). Never retried, never coerced.
//! - [`ProtocolError`]: the vendor API could not be reached or refused to
//!   authenticate. Use [`Error::is_transient`] to tell network hiccups from
//!   authentication failures.
//! - [`ParseError`]: the vendor answered with something unexpected.
//! - [`DeviceError`]: the vendor explicitly rejected a command, or no device
//!   is bound to the account.

use thiserror::Error;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred during protocol communication.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Error occurred while parsing a response.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Error occurred during device operations.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),
}

impl Error {
    /// Returns `true` for failures worth retrying at the poll-cycle level.
    ///
    /// Timeouts, connection failures and server-side (5xx) errors are
    /// transient. Authentication failures, rejected commands and
    /// validation errors are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Protocol(err) => err.is_transient(),
            Self::Value(_) | Self::Parse(_) | Self::Device(_) => false,
        }
    }

    /// Returns `true` if this is an authentication failure.
    #[must_use]
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Self::Protocol(ProtocolError::AuthenticationFailed(_)))
    }

    /// Returns `true` if the vendor rejected a command.
    #[must_use]
    pub fn is_command_rejected(&self) -> bool {
        matches!(self, Self::Device(DeviceError::CommandRejected(_)))
    }
}

/// Errors related to value validation and constraints.
///
/// These are programming errors on the caller's side: the request is
/// refused before anything is sent to the device.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A switch literal other than `on`/`off` was provided.
    #[error("invalid switch state: {0} (expected 'on' or 'off')")]
    InvalidSwitchState(String),

    /// The feature name is not part of the fixed feature table.
    #[error("unknown feature: {0}")]
    UnknownFeature(String),

    /// The feature cannot be switched without an accompanying parameter.
    #[error("feature {0} requires a level; use the bubble command instead")]
    FeatureRequiresLevel(String),

    /// A target temperature is outside the device's settable range.
    #[error("temperature {value} is out of range [{min}, {max}]")]
    InvalidTemperature {
        /// Lowest settable temperature.
        min: f64,
        /// Highest settable temperature.
        max: f64,
        /// The rejected value.
        value: f64,
    },

    /// An unknown temperature unit was provided.
    #[error("invalid temperature unit: {0}")]
    InvalidTemperatureUnit(String),

    /// An unknown region code was provided.
    #[error("invalid region: {0}")]
    InvalidRegion(String),
}

/// Errors related to communication with the vendor cloud API.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("HTTP {status}: {reason}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The canonical reason phrase.
        reason: String,
    },

    /// Connection to the API failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Request timed out.
    #[error("request timed out after {0} ms")]
    Timeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A request header could not be encoded.
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),

    /// No token could be obtained for the configured credentials.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The API kept answering without a `data` payload after re-authentication.
    #[error("empty response from {endpoint} after re-authentication")]
    EmptyResponse {
        /// The endpoint path that returned nothing.
        endpoint: &'static str,
    },
}

impl ProtocolError {
    /// Returns `true` for timeouts, connection failures and 5xx answers.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            Self::Status { status, .. } => *status >= 500,
            Self::ConnectionFailed(_) | Self::Timeout(_) => true,
            Self::InvalidAddress(_)
            | Self::InvalidHeader(_)
            | Self::AuthenticationFailed(_)
            | Self::EmptyResponse { .. } => false,
        }
    }
}

/// Errors related to parsing vendor responses.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Expected field is missing from the response.
    #[error("missing field in response: {0}")]
    MissingField(String),

    /// Unexpected response format.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The vendor rejected the command, even after re-authentication.
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// The account has no device bound to it.
    #[error("no devices found for this account")]
    NoDevices,

    /// The requested device id is not bound to the account.
    #[error("device {0} not found for this account")]
    DeviceNotFound(String),

    /// Device-scoped calls were made before discovery.
    #[error("device has not been discovered yet")]
    NotDiscovered,
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
