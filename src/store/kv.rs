//! Per-profile key-value store.
//!
//! Values are JSON. The file backend keeps one JSON object on disk and
//! rewrites it atomically on every change, so a companion process reading
//! the same file never sees a torn write.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::error::StoreError;

/// Key-value backend.
pub trait KeyValueStore: Send {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<Value>;

    /// Stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the backend cannot persist the change.
    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the backend cannot persist the change.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// All keys, sorted.
    fn keys(&self) -> Vec<String>;

    /// Persists pending changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] if the backend cannot persist.
    fn flush(&mut self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Writes `bytes` to `path` through a sibling temp file and a rename.
///
/// # Errors
///
/// Returns [`StoreError::Write`] on any I/O failure.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let write_err = |source| StoreError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes).map_err(write_err)?;
    fs::rename(&tmp, path).map_err(write_err)
}

/// Reads a JSON file, treating a missing or undecodable file as absent.
pub fn read_json_lenient<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "store file does not exist yet");
            return None;
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read store file, starting empty");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store file is corrupt, starting empty");
            None
        }
    }
}

// ============================================================================
// Backends
// ============================================================================

/// In-memory backend for tests and dry runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.values.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        self.values.keys().cloned().collect()
    }
}

/// Single JSON-object file backend with write-through persistence.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl FileStore {
    /// File name used inside the data directory.
    pub const FILE_NAME: &'static str = "settings.json";

    /// Opens (or lazily creates) the store at `path`.
    ///
    /// A missing or corrupt file yields an empty store.
    #[must_use]
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = read_json_lenient::<Map<String, Value>>(&path).unwrap_or_default();
        debug!(path = %path.display(), keys = values.len(), "opened key-value store");
        Self { path, values }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(&self.values).map_err(|source| StoreError::Encode {
            key: self.path.display().to_string(),
            source,
        })?;
        write_atomic(&self.path, &bytes)
    }

    /// Persists, or puts `previous` back under `key` when the write fails so
    /// memory never runs ahead of the file.
    fn persist_or_restore(
        &mut self,
        key: &str,
        previous: Option<Value>,
    ) -> Result<(), StoreError> {
        let Err(e) = self.persist() else {
            return Ok(());
        };
        warn!(%key, error = %e, "store write failed, keeping previous value");
        match previous {
            Some(value) => {
                self.values.insert(key.to_string(), value);
            }
            None => {
                self.values.remove(key);
            }
        }
        Err(e)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), StoreError> {
        let previous = self.values.insert(key.to_string(), value);
        self.persist_or_restore(key, previous)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        match self.values.remove(key) {
            Some(previous) => self.persist_or_restore(key, Some(previous)),
            None => Ok(()),
        }
    }

    fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.values.keys().cloned().collect();
        keys.sort();
        keys
    }

    fn flush(&mut self) -> Result<(), StoreError> {
        self.persist()
    }
}

// ============================================================================
// Shared handle
// ============================================================================

/// Cloneable handle to one backend, shared by the registry, the template
/// store and the session.
#[derive(Clone)]
pub struct SharedStore(Arc<Mutex<Box<dyn KeyValueStore>>>);

impl std::fmt::Debug for SharedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedStore").finish_non_exhaustive()
    }
}

impl SharedStore {
    /// Wraps a backend.
    #[must_use]
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self(Arc::new(Mutex::new(Box::new(store))))
    }

    /// A fresh in-memory store.
    #[must_use]
    pub fn memory() -> Self {
        Self::new(MemoryStore::new())
    }

    fn with<R>(&self, f: impl FnOnce(&mut dyn KeyValueStore) -> R) -> R {
        let mut guard = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(guard.as_mut())
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.with(|s| s.get(key))
    }

    /// # Errors
    ///
    /// Propagates backend write failures.
    pub fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
        self.with(|s| s.set(key, value))
    }

    /// # Errors
    ///
    /// Propagates backend write failures.
    pub fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.with(|s| s.remove(key))
    }

    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.with(|s| s.keys())
    }

    /// # Errors
    ///
    /// Propagates backend write failures.
    pub fn flush(&self) -> Result<(), StoreError> {
        self.with(|s| s.flush())
    }

    /// Decodes the value under `key`. Undecodable values are logged and
    /// treated as missing.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(%key, error = %e, "ignoring undecodable stored value");
                None
            }
        }
    }

    /// Encodes and stores `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] or a backend write failure.
    pub fn set_as<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let value = serde_json::to_value(value).map_err(|source| StoreError::Encode {
            key: key.to_string(),
            source,
        })?;
        self.set(key, value)
    }

    #[must_use]
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(|v| v.as_f64())
    }

    #[must_use]
    pub fn get_u32(&self, key: &str) -> Option<u32> {
        self.get(key)
            .and_then(|v| v.as_u64())
            .and_then(|n| u32::try_from(n).ok())
    }

    /// Missing or non-boolean values read as `false`.
    #[must_use]
    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key).and_then(|v| v.as_bool()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let store = SharedStore::memory();
        store.set("a", json!(1.5)).unwrap();
        store.set("b", json!(true)).unwrap();
        assert_eq!(store.get_f64("a"), Some(1.5));
        assert!(store.get_bool("b"));
        assert!(!store.get_bool("missing"));
        assert_eq!(store.keys(), vec!["a", "b"]);

        store.remove("a").unwrap();
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn get_u32_rejects_negative_and_fractional() {
        let store = SharedStore::memory();
        store.set("n", json!(45)).unwrap();
        store.set("neg", json!(-3)).unwrap();
        store.set("frac", json!(2.5)).unwrap();
        assert_eq!(store.get_u32("n"), Some(45));
        assert_eq!(store.get_u32("neg"), None);
        assert_eq!(store.get_u32("frac"), None);
    }

    #[test]
    fn get_as_ignores_wrong_shape() {
        let store = SharedStore::memory();
        store.set("v", json!("not a list")).unwrap();
        assert_eq!(store.get_as::<Vec<u32>>("v"), None);
    }

    #[test]
    fn file_store_persists_across_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(FileStore::FILE_NAME);

        let mut store = FileStore::open(&path);
        store.set("currentProfile", json!(2)).unwrap();
        assert!(path.exists());

        let reopened = FileStore::open(&path);
        assert_eq!(reopened.get("currentProfile"), Some(json!(2)));
        assert!(!dir.path().join("nested").join("settings.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FileStore::FILE_NAME);
        std::fs::write(&path, b"{ definitely not json").unwrap();

        let mut store = FileStore::open(&path);
        assert!(store.keys().is_empty());

        store.set("phaseSettings", json!({"restDuration": 60})).unwrap();
        let reopened = FileStore::open(&path);
        assert_eq!(reopened.keys(), vec!["phaseSettings"]);
    }

    #[test]
    fn failed_write_leaves_values_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FileStore::FILE_NAME);
        let mut store = FileStore::open(&path);
        store.set("kept", json!(1)).unwrap();

        // A directory where the temp file goes makes every write fail.
        std::fs::create_dir(dir.path().join("settings.json.tmp")).unwrap();
        assert!(store.set("kept", json!(2)).is_err());
        assert!(store.set("added", json!(3)).is_err());
        assert!(store.remove("kept").is_err());

        assert_eq!(store.get("kept"), Some(json!(1)));
        assert_eq!(store.get("added"), None);
        assert_eq!(store.keys(), vec!["kept"]);
        assert_eq!(FileStore::open(&path).get("kept"), Some(json!(1)));
    }

    #[test]
    fn unwritable_path_keeps_store_empty() {
        let mut store = FileStore::open("/dev/null/settings.json");
        assert!(store.set("currentProfile", json!(2)).is_err());
        assert_eq!(store.get("currentProfile"), None);
        assert!(store.keys().is_empty());
    }

    #[test]
    fn removing_missing_key_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(FileStore::FILE_NAME);
        let mut store = FileStore::open(&path);
        store.remove("nothing").unwrap();
        assert!(!path.exists());
    }
}
