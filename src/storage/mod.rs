//! Persistent key-value storage
//!
//! Session pointers, thread lists and message bodies are stored as JSON
//! strings under keys produced by [`build_key`]. [`SledStore`] keeps them
//! in an embedded `sled` database; [`MemoryStore`] is used for tests and
//! throwaway sessions.

use crate::error::{GuruError, Result};
use directories::ProjectDirs;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

pub mod keys;
pub use keys::{build_key, Namespace};

/// String key-value persistence
///
/// Implementations are owned by a single process; concurrent writers to
/// the same key are last-write-wins.
pub trait KeyValueStore: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a value; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Read and deserialize a JSON value
///
/// A value that no longer parses is removed from the store and reported
/// as absent, so a corrupted entry never blocks the caller.
pub fn read_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = match store.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Failed to read stored value");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Discarding unparseable stored value");
            if let Err(e) = store.remove(key) {
                tracing::warn!(key = %key, error = %e, "Failed to remove corrupted value");
            }
            None
        }
    }
}

/// Serialize and store a JSON value
pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    store.set(key, &json)
}

/// Embedded on-disk store backed by `sled`
pub struct SledStore {
    db: sled::Db,
    path: PathBuf,
}

impl SledStore {
    /// Open or create a store at `path`
    ///
    /// # Errors
    ///
    /// Returns `GuruError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use kabaddiguru::storage::{KeyValueStore, SledStore};
    ///
    /// # fn main() -> kabaddiguru::error::Result<()> {
    /// let dir = tempfile::tempdir()?;
    /// let store = SledStore::new(dir.path().join("store"))?;
    /// store.set("token", "abc")?;
    /// assert_eq!(store.get("token")?, Some("abc".to_string()));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                GuruError::Storage(format!("Failed to create storage directory: {}", e))
            })?;
        }
        let db = sled::open(&path)
            .map_err(|e| GuruError::Storage(format!("Failed to open database: {}", e)))?;
        tracing::debug!(path = %path.display(), "Opened local store");
        Ok(Self { db, path })
    }

    /// Open the store in the platform data directory
    pub fn open_default() -> Result<Self> {
        let proj_dirs = ProjectDirs::from("com", "kabaddiguru", "kabaddiguru")
            .ok_or_else(|| GuruError::Storage("Could not determine data directory".into()))?;
        Self::new(proj_dirs.data_dir().join("store"))
    }

    /// Location of the database on disk
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for SledStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| GuruError::Storage(format!("Get failed: {}", e)))?;
        match value {
            Some(bytes) => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|e| GuruError::Storage(format!("Stored value is not UTF-8: {}", e)))?;
                Ok(Some(text))
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.db
            .insert(key.as_bytes(), value.as_bytes())
            .map_err(|e| GuruError::Storage(format!("Insert failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| GuruError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.db
            .remove(key.as_bytes())
            .map_err(|e| GuruError::Storage(format!("Remove failed: {}", e)))?;
        self.db
            .flush()
            .map_err(|e| GuruError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }
}

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|_| GuruError::Storage("Memory store lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GuruError::Storage("Memory store lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| GuruError::Storage("Memory store lock poisoned".into()))?;
        entries.remove(key);
        Ok(())
    }
}
