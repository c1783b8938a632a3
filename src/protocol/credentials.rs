// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Account credentials for the vendor cloud.

use std::fmt;

use md5::Md5;
use sha2::{Digest, Sha256};

/// Account identifier and password digest.
///
/// The vendor never sees the plain password: the token endpoint expects
/// the lowercase hex MD5 of it. Credentials are immutable once built.
///
/// # Examples
///
/// ```
/// use mspa_lib::protocol::Credentials;
///
/// let creds = Credentials::from_password(" user@example.com ", "secret");
/// assert_eq!(creds.account(), "user@example.com");
/// assert_eq!(creds.password_digest(), "5ebe2294ecd0e0f08eab7690d2a6ee69");
/// assert_eq!(creds.obfuscated_account(), "use***@example.com");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    account: String,
    password_digest: String,
}

impl Credentials {
    /// Creates credentials from an already hashed password.
    #[must_use]
    pub fn new(account: impl Into<String>, password_digest: impl Into<String>) -> Self {
        Self {
            account: account.into().trim().to_string(),
            password_digest: password_digest.into().trim().to_string(),
        }
    }

    /// Creates credentials from a plain password.
    ///
    /// Both fields are trimmed before hashing.
    #[must_use]
    pub fn from_password(account: impl Into<String>, password: &str) -> Self {
        let digest = Md5::digest(password.trim().as_bytes());
        Self::new(account, hex::encode(digest))
    }

    /// Returns the account identifier.
    #[must_use]
    pub fn account(&self) -> &str {
        &self.account
    }

    /// Returns the password digest sent to the token endpoint.
    #[must_use]
    pub fn password_digest(&self) -> &str {
        &self.password_digest
    }

    /// Returns a stable fingerprint identifying this credential set.
    ///
    /// SHA-256 hex of `account:digest`. Never reversible to the password.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.account.as_bytes());
        hasher.update(b":");
        hasher.update(self.password_digest.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Returns the account in a form safe for logs (`abc***@domain`).
    #[must_use]
    pub fn obfuscated_account(&self) -> String {
        obfuscate_email(&self.account)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.obfuscated_account())
            .field("password_digest", &"***")
            .finish()
    }
}

/// Masks an e-mail address down to its first three characters and domain.
pub(crate) fn obfuscate_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() => {
            let prefix: String = local.chars().take(3).collect();
            format!("{prefix}***@{domain}")
        }
        _ => "***".to_string(),
    }
}
