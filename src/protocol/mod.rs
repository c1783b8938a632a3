// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vendor cloud protocol.
//!
//! - [`Signer`]: per-request nonce, timestamp and signature headers
//! - [`TokenStore`]: shared session token with serialized refresh
//! - [`ApiClient`]: signed calls with a single retry after re-authentication
//! - [`HotTubApi`]: the seam the coordinator polls and commands through
//!
//! # Regions
//!
//! | Code | Base URL |
//! |------|----------|
//! | `ROW` | `https://api.iot.the-mspa.com` |
//! | `US` | `https://api.usiot.the-mspa.com` |
//! | `CH` | `https://api.mspa.mxchip.com.cn` |

mod client;
mod config;
mod credentials;
mod identity;
mod signer;
mod token_store;
mod wire;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::Credentials;
pub use identity::DeviceIdentity;
pub use signer::{APP_ID, APP_SECRET, NONCE_LENGTH, Signer};
pub use token_store::TokenStore;

use std::future::Future;

use crate::command::DesiredState;
use crate::error::Result;
use crate::state::RawSnapshot;

/// Outcome of an accepted command.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandReceipt {
    /// Message of the command response.
    pub message: String,
    /// Whether a confirmation fetch showed every desired field.
    pub confirmed: bool,
    /// Number of confirmation fetches made.
    pub attempts: u32,
}

/// Operations the coordinator needs from the vendor API.
///
/// [`ApiClient`] is the production implementation; tests substitute a
/// scripted fake.
pub trait HotTubApi: Send + Sync {
    /// Fetches a fresh device snapshot.
    fn fetch_status(&self) -> impl Future<Output = Result<RawSnapshot>> + Send;

    /// Sends a desired-state delta; returns once the vendor accepted it.
    fn send_command(
        &self,
        desired: &DesiredState,
    ) -> impl Future<Output = Result<CommandReceipt>> + Send;

    /// Takes a snapshot fetched as a side effect of the last command.
    fn take_cached_status(&self) -> Option<RawSnapshot>;
}

impl HotTubApi for ApiClient {
    fn fetch_status(&self) -> impl Future<Output = Result<RawSnapshot>> + Send {
        self.get_status()
    }

    fn send_command(
        &self,
        desired: &DesiredState,
    ) -> impl Future<Output = Result<CommandReceipt>> + Send {
        ApiClient::send_command(self, desired)
    }

    fn take_cached_status(&self) -> Option<RawSnapshot> {
        ApiClient::take_cached_status(self)
    }
}
