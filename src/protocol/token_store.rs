// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Shared session token cache.

use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};

use super::Credentials;

#[derive(Debug)]
struct Slot {
    fingerprint: String,
    token: String,
}

#[derive(Debug)]
struct Inner {
    slot: RwLock<Slot>,
    refresh: Mutex<()>,
}

/// Process-wide cache for the session token of one credential set.
///
/// Cloning the store shares it: every [`ApiClient`](super::ApiClient)
/// built on a clone reads and refreshes the same token. Refreshes are
/// serialized, so two clients hitting an expired token at the same time
/// trigger a single re-authentication.
///
/// The store remembers the fingerprint of the credentials it was created
/// for. Binding it to different credentials discards the cached token.
///
/// # Examples
///
/// ```
/// use mspa_lib::protocol::{Credentials, TokenStore};
///
/// let creds = Credentials::new("me@example.com", "digest");
/// let store = TokenStore::new(&creds);
/// assert_eq!(store.get(), "");
///
/// store.set("abc");
/// assert_eq!(store.clone().get(), "abc");
///
/// let other = Credentials::new("you@example.com", "digest");
/// assert!(store.bind(&other));
/// assert_eq!(store.get(), "");
/// ```
#[derive(Debug, Clone)]
pub struct TokenStore {
    inner: Arc<Inner>,
}

impl TokenStore {
    /// Creates an empty store for a credential set.
    #[must_use]
    pub fn new(credentials: &Credentials) -> Self {
        Self::with_token(credentials, String::new())
    }

    /// Creates a store seeded with a previously persisted token.
    #[must_use]
    pub fn with_token(credentials: &Credentials, token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                slot: RwLock::new(Slot {
                    fingerprint: credentials.fingerprint(),
                    token: token.into(),
                }),
                refresh: Mutex::new(()),
            }),
        }
    }

    /// Returns the cached token, or an empty string if there is none.
    #[must_use]
    pub fn get(&self) -> String {
        self.inner.slot.read().token.clone()
    }

    /// Replaces the cached token.
    pub fn set(&self, token: impl Into<String>) {
        self.inner.slot.write().token = token.into();
    }

    /// Drops the cached token.
    pub fn clear(&self) {
        self.inner.slot.write().token.clear();
    }

    /// Returns `true` if this store holds tokens for `credentials`.
    #[must_use]
    pub fn is_for(&self, credentials: &Credentials) -> bool {
        self.inner.slot.read().fingerprint == credentials.fingerprint()
    }

    /// Binds the store to `credentials`.
    ///
    /// Returns `true` if the credentials differ from the previous ones, in
    /// which case the cached token was discarded.
    pub fn bind(&self, credentials: &Credentials) -> bool {
        let fingerprint = credentials.fingerprint();
        let mut slot = self.inner.slot.write();
        if slot.fingerprint == fingerprint {
            return false;
        }
        tracing::info!(
            account = %credentials.obfuscated_account(),
            "Credentials changed, discarding cached token"
        );
        slot.fingerprint = fingerprint;
        slot.token.clear();
        true
    }

    /// Waits for exclusive right to refresh the token.
    pub(crate) async fn lock_refresh(&self) -> MutexGuard<'_, ()> {
        self.inner.refresh.lock().await
    }
}

/// Returns the first characters of a token for logging.
pub(crate) fn token_preview(token: &str) -> String {
    if token.is_empty() {
        return "<none>".to_string();
    }
    let prefix: String = token.chars().take(6).collect();
    format!("{prefix}...")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials::new("me@example.com", "digest")
    }

    #[test]
    fn empty_by_default() {
        assert_eq!(TokenStore::new(&creds()).get(), "");
    }

    #[test]
    fn set_replaces_unconditionally() {
        let store = TokenStore::with_token(&creds(), "first");
        store.set("second");
        assert_eq!(store.get(), "second");
        store.clear();
        assert_eq!(store.get(), "");
    }

    #[test]
    fn clones_share_the_token() {
        let store = TokenStore::new(&creds());
        let clone = store.clone();
        clone.set("shared");
        assert_eq!(store.get(), "shared");
    }

    #[test]
    fn bind_same_credentials_keeps_token() {
        let store = TokenStore::with_token(&creds(), "keep");
        assert!(store.is_for(&creds()));
        assert!(!store.bind(&creds()));
        assert_eq!(store.get(), "keep");
    }

    #[test]
    fn bind_other_credentials_discards_token() {
        let store = TokenStore::with_token(&creds(), "leak");
        let other = Credentials::new("other@example.com", "digest");
        assert!(!store.is_for(&other));
        assert!(store.bind(&other));
        assert_eq!(store.get(), "");
        assert!(store.is_for(&other));
    }

    #[test]
    fn preview_truncates() {
        assert_eq!(token_preview("abcdefghijkl"), "abcdef...");
        assert_eq!(token_preview(""), "<none>");
    }

    #[tokio::test]
    async fn refresh_lock_is_exclusive() {
        let store = TokenStore::new(&creds());
        let guard = store.lock_refresh().await;
        assert!(store.inner.refresh.try_lock().is_err());
        drop(guard);
        assert!(store.inner.refresh.try_lock().is_ok());
    }
}
