//! Key-value persistence backends.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{PoisonError, RwLock};

use thiserror::Error;
use tracing::debug;

/// Errors from the persistence layer.
///
/// These are treated as best-effort by callers: logged, never propagated to
/// the user.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying I/O failed (disk full, permissions, quota).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// No usable storage location on this platform.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Origin-scoped key-value storage, the `localStorage` of this layer.
///
/// Implementations must be cheap to call from synchronous store methods;
/// values are opaque strings (the stores serialize with `serde_json`).
pub trait KeyValueStorage: Send + Sync {
    /// Read a value. `Ok(None)` when the key has never been set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a key. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// In-memory storage for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    map: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let map = self.map.read().unwrap_or_else(PoisonError::into_inner);
        Ok(map.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut map = self.map.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(key);
        Ok(())
    }
}

/// File-backed storage under the platform's per-user data directory.
///
/// One file per key inside `<data_local_dir>/<namespace>/`.
#[derive(Debug)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create the storage directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Unavailable` when the platform has no local
    /// data directory, or an I/O error if the directory cannot be created.
    pub fn new(namespace: &str) -> Result<Self, StorageError> {
        let base = dirs::data_local_dir()
            .ok_or_else(|| StorageError::Unavailable("no local data directory".to_string()))?;
        let dir = base.join(namespace);
        std::fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "File storage ready");
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys contain dots ("search.history"); keep filenames portable
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        self.dir.join(format!("{name}.json"))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::write(self.path_for(key), value)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_roundtrip() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap(), Some("v".to_string()));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_remove_absent_is_ok() {
        let storage = MemoryStorage::new();
        assert!(storage.remove("never-set").is_ok());
    }

    #[test]
    fn test_file_key_sanitization() {
        let storage = FileStorage {
            dir: PathBuf::from("/tmp/house-test"),
        };
        let path = storage.path_for("search.history");
        assert!(path.ends_with("search_history.json"));
    }
}
