use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::StorageError;

/// Key holding the favorites list
pub const FAVORITES_KEY: &str = "favorites";
/// Key holding the listen history
pub const LISTENED_KEY: &str = "listened";
/// Key holding the color theme
pub const THEME_KEY: &str = "theme";

/// A string key-value medium, shaped like browser local storage
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, `None` if there is none
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`; deleting a missing key is not an error
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Stores every key as `<key>.json` inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir).map_err(|e| StorageError::CreateDirectoryFailed {
            path: dir.to_path_buf(),
            source: e,
        })?;

        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'));

        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;

        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadFailed { path, source: e }),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write next to the target and rename so readers never see half a document
        let partial = path.with_extension("json.partial");

        std::fs::write(&partial, value).map_err(|e| StorageError::WriteFailed {
            path: partial.clone(),
            source: e,
        })?;

        std::fs::rename(&partial, &path).map_err(|e| StorageError::WriteFailed { path, source: e })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;

        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::RemoveFailed { path, source: e }),
        }
    }
}

/// In-process store, optionally limited to a byte quota
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects writes once keys and values exceed `bytes` in total
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            values: Mutex::default(),
            quota: Some(bytes),
        }
    }

    fn values(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values().get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut values = self.values();

        if let Some(quota) = self.quota {
            let used: usize = values
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();

            if used + key.len() + value.len() > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                });
            }
        }

        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values().remove(key);
        Ok(())
    }
}

/// JSON persistence over a [`KeyValueStore`].
///
/// This is the only boundary between the in-memory stores and the durable
/// medium. Faults never propagate: `save` reports `false` and `load` reports
/// `None`, and both log a warning. The shape of the values is not validated
/// beyond what deserialization into `T` demands.
#[derive(Clone)]
pub struct LocalStorage {
    backend: Arc<dyn KeyValueStore>,
}

impl LocalStorage {
    pub fn new(backend: impl KeyValueStore + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    pub fn from_shared(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Storage that lives only as long as the process
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Serialize `value` and store it under `key`
    pub fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value");
                return false;
            }
        };

        match self.backend.write(key, &json) {
            Ok(()) => {
                debug!(key, bytes = json.len(), "saved");
                true
            }
            Err(e) => {
                warn!(key, error = %e, "failed to persist value");
                false
            }
        }
    }

    /// Load and deserialize the value under `key`
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = match self.backend.read(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read value");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "ignoring unparsable value");
                None
            }
        }
    }

    /// Delete whatever is stored under `key`
    pub fn clear(&self, key: &str) -> bool {
        match self.backend.remove(key) {
            Ok(()) => true,
            Err(e) => {
                warn!(key, error = %e, "failed to clear value");
                false
            }
        }
    }

    /// Raw access to the backing store
    pub fn backend(&self) -> &Arc<dyn KeyValueStore> {
        &self.backend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_roundtrips_values() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        store.write("favorites", "[]").unwrap();

        assert_eq!(store.read("favorites").unwrap(), Some("[]".to_string()));
        assert!(dir.path().join("favorites.json").exists());
        assert!(!dir.path().join("favorites.json.partial").exists());
    }

    #[test]
    fn file_store_missing_key_is_none() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert_eq!(store.read("listened").unwrap(), None);
        store.remove("listened").unwrap();
    }

    #[test]
    fn file_store_creates_directory() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("state").join("podshelf");

        FileStore::open(&nested).unwrap();
        assert!(nested.is_dir());
    }

    #[test]
    fn file_store_rejects_path_like_keys() {
        let dir = tempdir().unwrap();
        let store = FileStore::open(dir.path()).unwrap();

        assert!(matches!(
            store.write("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(store.read("").is_err());
    }

    #[test]
    fn memory_store_enforces_quota() {
        let store = MemoryStore::with_quota(16);

        store.write("theme", "\"dark\"").unwrap();
        let err = store.write("favorites", "[1,2,3,4,5,6,7,8]").unwrap_err();

        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        // Overwriting an existing key only counts the new value
        store.write("theme", "\"light\"").unwrap();
    }

    #[test]
    fn save_and_load_json() {
        let storage = LocalStorage::in_memory();

        assert!(storage.save("numbers", &vec![1, 2, 3]));
        assert_eq!(storage.load::<Vec<i32>>("numbers"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn load_returns_none_for_absent_or_garbage() {
        let storage = LocalStorage::in_memory();
        storage.backend().write("broken", "{not json").unwrap();

        assert_eq!(storage.load::<Vec<i32>>("absent"), None);
        assert_eq!(storage.load::<Vec<i32>>("broken"), None);
        // Valid JSON of the wrong shape is also rejected
        storage.backend().write("shape", "\"text\"").unwrap();
        assert_eq!(storage.load::<Vec<i32>>("shape"), None);
    }

    #[test]
    fn save_reports_storage_faults() {
        let storage = LocalStorage::new(MemoryStore::with_quota(8));

        assert!(!storage.save("favorites", &vec!["a long value that does not fit"]));
        assert_eq!(storage.load::<Vec<String>>("favorites"), None);
    }

    #[test]
    fn clear_removes_key() {
        let storage = LocalStorage::in_memory();
        storage.save("theme", "dark");

        assert!(storage.clear("theme"));
        assert_eq!(storage.load::<String>("theme"), None);
    }

    #[test]
    fn clones_share_the_backend() {
        let storage = LocalStorage::in_memory();
        let other = storage.clone();

        storage.save("theme", "light");
        assert_eq!(other.load::<String>("theme"), Some("light".to_string()));
    }
}
