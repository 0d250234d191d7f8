//! File-based token storage for the CLI.
//!
//! Persists the session token pair in TOML format with secure file
//! permissions (0600 on Unix), so a restarted CLI can bootstrap the
//! session from disk the way a browser bootstraps from cookies.
//!
//! # File Location
//!
//! - Windows: `~/.warden/credentials.toml`
//! - Linux/macOS: `~/.config/warden/credentials.toml`
//!
//! # File Format
//!
//! ```toml
//! [instances.local.entries."warden.token"]
//! value = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."
//! expires_at = "2026-09-04T12:00:00Z"
//!
//! [instances.local.entries."warden.refreshToken"]
//! value = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9..."
//! expires_at = "2026-09-04T12:00:00Z"
//! ```
//!
//! Only tokens are stored, never passwords. Entries past their expiry
//! read back as absent.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use warden_link::{Result, TokenStore, WardenLinkError};

/// File-backed implementation of [`TokenStore`].
///
/// Keyed by a named instance, so one credentials file can hold sessions
/// against several servers.
#[derive(Debug)]
pub struct FileTokenStore {
    /// Path to the credentials file
    file_path: PathBuf,

    /// Instance whose entries this store reads and writes
    instance: String,

    /// In-memory cache of the whole file
    cache: Mutex<CredentialsFile>,
}

/// Stored entry format for TOML serialization
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct StoredEntry {
    /// Token value
    value: String,
    /// Expiry in RFC3339 format
    expires_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct InstanceEntries {
    #[serde(default)]
    entries: HashMap<String, StoredEntry>,
}

/// Top-level TOML structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct CredentialsFile {
    #[serde(default)]
    instances: HashMap<String, InstanceEntries>,
}

impl FileTokenStore {
    /// Default credentials file path
    /// - Windows: `~/.warden/credentials.toml`
    /// - Linux/macOS: `~/.config/warden/credentials.toml`
    pub fn default_path() -> PathBuf {
        #[cfg(target_os = "windows")]
        {
            if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".warden").join("credentials.toml")
            } else {
                PathBuf::from(".warden").join("credentials.toml")
            }
        }

        #[cfg(not(target_os = "windows"))]
        {
            if let Some(config_dir) = dirs::config_dir() {
                config_dir.join("warden").join("credentials.toml")
            } else if let Some(home_dir) = dirs::home_dir() {
                home_dir.join(".config").join("warden").join("credentials.toml")
            } else {
                PathBuf::from(".warden").join("credentials.toml")
            }
        }
    }

    /// Create a store for `instance` at the default location
    pub fn new(instance: impl Into<String>) -> Result<Self> {
        Self::with_path(Self::default_path(), instance)
    }

    /// Create a store for `instance` at a custom location
    pub fn with_path(file_path: PathBuf, instance: impl Into<String>) -> Result<Self> {
        let store = Self {
            file_path,
            instance: instance.into(),
            cache: Mutex::new(CredentialsFile::default()),
        };
        store.load_from_disk()?;
        Ok(store)
    }

    /// Get the file path used by this store
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load_from_disk(&self) -> Result<()> {
        let mut cache = self.lock_cache();

        if !self.file_path.exists() {
            *cache = CredentialsFile::default();
            return Ok(());
        }

        let contents = fs::read_to_string(&self.file_path).map_err(|e| {
            WardenLinkError::StorageError(format!(
                "cannot read credentials file '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        *cache = toml::from_str(&contents).map_err(|e| {
            WardenLinkError::StorageError(format!(
                "corrupted credentials file '{}': {} (delete it and sign in again)",
                self.file_path.display(),
                e
            ))
        })?;
        Ok(())
    }

    fn save_to_disk(&self, cache: &CredentialsFile) -> Result<()> {
        let contents = toml::to_string_pretty(cache).map_err(|e| {
            WardenLinkError::StorageError(format!("failed to serialize credentials: {}", e))
        })?;

        if let Some(parent) = self.file_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                WardenLinkError::StorageError(format!(
                    "failed to create credentials directory '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        fs::write(&self.file_path, contents).map_err(|e| {
            WardenLinkError::StorageError(format!(
                "failed to write credentials file '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        // Owner read/write only on Unix
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = fs::Permissions::from_mode(0o600);
            fs::set_permissions(&self.file_path, permissions).map_err(|e| {
                WardenLinkError::StorageError(format!(
                    "failed to set file permissions for '{}': {}",
                    self.file_path.display(),
                    e
                ))
            })?;
        }

        Ok(())
    }

    fn lock_cache(&self) -> std::sync::MutexGuard<'_, CredentialsFile> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut cache = self.lock_cache();

        let entry = match cache
            .instances
            .get(&self.instance)
            .and_then(|instance| instance.entries.get(key))
        {
            Some(entry) => entry.clone(),
            None => return Ok(None),
        };

        let expires_at = DateTime::parse_from_rfc3339(&entry.expires_at)
            .map(|t| t.with_timezone(&Utc))
            .map_err(|e| {
                WardenLinkError::StorageError(format!("invalid expiry timestamp: {}", e))
            })?;

        if expires_at > Utc::now() {
            Ok(Some(entry.value))
        } else {
            // Drop the expired entry so it stops being re-parsed
            if let Some(instance) = cache.instances.get_mut(&self.instance) {
                instance.entries.remove(key);
            }
            self.save_to_disk(&cache)?;
            Ok(None)
        }
    }

    fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut cache = self.lock_cache();

        cache
            .instances
            .entry(self.instance.clone())
            .or_default()
            .entries
            .insert(
                key.to_string(),
                StoredEntry {
                    value: value.to_string(),
                    expires_at: (Utc::now() + ttl).to_rfc3339(),
                },
            );

        self.save_to_disk(&cache)
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut cache = self.lock_cache();

        if let Some(instance) = cache.instances.get_mut(&self.instance) {
            instance.entries.remove(key);
        }

        self.save_to_disk(&cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use warden_link::store::{token_ttl, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    fn create_temp_store() -> (FileTokenStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("credentials.toml");
        let store = FileTokenStore::with_path(file_path, "local").unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_file_store_basic_operations() {
        let (store, _temp_dir) = create_temp_store();

        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "acc-1", token_ttl()).unwrap();
        assert_eq!(
            store.get(ACCESS_TOKEN_KEY).unwrap(),
            Some("acc-1".to_string())
        );

        store.delete(ACCESS_TOKEN_KEY).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("credentials.toml");

        {
            let store = FileTokenStore::with_path(file_path.clone(), "local").unwrap();
            store.set(ACCESS_TOKEN_KEY, "acc-1", token_ttl()).unwrap();
            store.set(REFRESH_TOKEN_KEY, "ref-1", token_ttl()).unwrap();
        }

        assert!(file_path.exists());

        {
            let store = FileTokenStore::with_path(file_path, "local").unwrap();
            assert_eq!(
                store.get(ACCESS_TOKEN_KEY).unwrap(),
                Some("acc-1".to_string())
            );
            assert_eq!(
                store.get(REFRESH_TOKEN_KEY).unwrap(),
                Some("ref-1".to_string())
            );
        }
    }

    #[test]
    fn test_file_store_instances_are_isolated() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("credentials.toml");

        let local = FileTokenStore::with_path(file_path.clone(), "local").unwrap();
        local.set(ACCESS_TOKEN_KEY, "local-token", token_ttl()).unwrap();

        let production = FileTokenStore::with_path(file_path, "production").unwrap();
        assert_eq!(production.get(ACCESS_TOKEN_KEY).unwrap(), None);

        production
            .set(ACCESS_TOKEN_KEY, "production-token", token_ttl())
            .unwrap();
        assert_eq!(
            production.get(ACCESS_TOKEN_KEY).unwrap(),
            Some("production-token".to_string())
        );
    }

    #[test]
    fn test_file_store_expired_entries_read_back_absent() {
        let (store, _temp_dir) = create_temp_store();

        store
            .set(ACCESS_TOKEN_KEY, "short-lived", Duration::zero())
            .unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    #[cfg(unix)]
    fn test_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let (store, _temp_dir) = create_temp_store();
        store.set(ACCESS_TOKEN_KEY, "acc-1", token_ttl()).unwrap();

        let metadata = fs::metadata(store.path()).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[test]
    fn test_toml_format() {
        let (store, _temp_dir) = create_temp_store();

        store.set(ACCESS_TOKEN_KEY, "acc-1", token_ttl()).unwrap();
        store.set(REFRESH_TOKEN_KEY, "ref-1", token_ttl()).unwrap();

        let contents = fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains("[instances.local.entries"));
        assert!(contents.contains("value = \"acc-1\""));
        assert!(contents.contains("value = \"ref-1\""));
        assert!(contents.contains("expires_at"));
    }
}
