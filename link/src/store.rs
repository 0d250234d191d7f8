//! Credential storage abstraction for warden clients.
//!
//! Provides a trait-based system for persisting the session token pair
//! across different storage backends (browser cookies, files, in-memory
//! stores for tests). The store is an opaque key-value surface with
//! per-entry expiry: read, write and delete only. Both the session state
//! machine and the refresh coordinator go through it, under fixed key
//! names, so the two always agree on storage location.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use crate::error::{Result, WardenLinkError};

/// Storage key of the access token
pub const ACCESS_TOKEN_KEY: &str = "warden.token";

/// Storage key of the refresh token
pub const REFRESH_TOKEN_KEY: &str = "warden.refreshToken";

/// How long a persisted token pair stays readable (30 days)
pub fn token_ttl() -> Duration {
    Duration::days(30)
}

/// Trait for credential storage backends.
///
/// Implementations can keep entries in memory, in a cookie jar, or in a
/// file. Entries expire: a `get` after the entry's TTL has elapsed returns
/// `Ok(None)`.
///
/// The store is shared by the session state machine and the refresh
/// coordinator behind one `Arc`, so methods take `&self`; implementations
/// lock internally.
pub trait TokenStore: Send + Sync {
    /// Read a value, or `Ok(None)` if absent or expired
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value with an expiry relative to now, overwriting any
    /// previous entry under the same key
    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Delete an entry. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<()>;
}

/// The persisted session token pair.
///
/// Owned exclusively by the token store; in-memory components never hold
/// tokens beyond the current call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionTokens {
    /// Short-lived access token
    pub access_token: String,
    /// Longer-lived refresh token
    pub refresh_token: String,
}

impl SessionTokens {
    /// Persist both tokens under the fixed key names with the standard
    /// 30-day expiry
    pub fn persist(&self, store: &dyn TokenStore) -> Result<()> {
        store.set(ACCESS_TOKEN_KEY, &self.access_token, token_ttl())?;
        store.set(REFRESH_TOKEN_KEY, &self.refresh_token, token_ttl())?;
        Ok(())
    }

    /// Remove both tokens from the store
    pub fn clear(store: &dyn TokenStore) -> Result<()> {
        store.delete(ACCESS_TOKEN_KEY)?;
        store.delete(REFRESH_TOKEN_KEY)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct StoredEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-memory token store.
///
/// Does NOT persist across restarts. Useful for unit tests and for
/// short-lived processes that bootstrap a session from scratch every run.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, StoredEntry>>,
}

impl MemoryTokenStore {
    /// Create a new empty in-memory store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WardenLinkError::StorageError("token store lock poisoned".into()))?;

        match entries.get(key) {
            Some(entry) if entry.expires_at > Utc::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                // Expired entries are dropped on first read
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WardenLinkError::StorageError("token store lock poisoned".into()))?;

        entries.insert(
            key.to_string(),
            StoredEntry {
                value: value.to_string(),
                expires_at: Utc::now() + ttl,
            },
        );
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| WardenLinkError::StorageError("token store lock poisoned".into()))?;

        entries.remove(key);
        Ok(())
    }
}
