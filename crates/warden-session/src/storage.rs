//! Key/value persistence for the session triple.
//!
//! The session store doesn't care where its three strings live. A
//! [`Storage`] is anything that can get, set and remove string values by
//! key. Two backends are provided:
//!
//! - [`MemoryStorage`]: process-local, gone on exit. The default.
//! - [`FileStorage`]: a JSON object file, so a session survives a restart.

use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::StorageError;

/// A string key/value store.
///
/// `set_many` and `remove_many` exist so a backend can apply a whole
/// set of changes in one write; the defaults just loop.
pub trait Storage: Send + Sync + 'static {
    /// Reads `key`, or `None` if it isn't set.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Deletes `key`. Deleting a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Writes several keys as one set.
    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// Deletes several keys as one set.
    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key)?;
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// An in-memory [`Storage`].
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        let mut map = lock(&self.entries);
        for (key, value) in entries {
            map.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = lock(&self.entries);
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// A [`Storage`] backed by one JSON object file.
///
/// Every write rewrites the file through a temporary sibling and a
/// rename, so a crash mid-write leaves either the old or the new file,
/// never half of one.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStorage {
    /// Uses `path` as the backing file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<file name>.tmp` beside the target, never the target itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(OsString::from).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn read_all(&self) -> Result<HashMap<String, String>, StorageError> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&text).map_err(|e| StorageError::Corrupt(e.to_string()))
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<(), StorageError> {
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, text)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut HashMap<String, String>),
    ) -> Result<(), StorageError> {
        let _guard = lock(&self.guard);
        let mut entries = self.read_all()?;
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = lock(&self.guard);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key])
    }

    fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|map| {
            for (key, value) in entries {
                map.insert((*key).to_string(), (*value).to_string());
            }
        })
    }

    fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|map| {
            for key in keys {
                map.remove(*key);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_set_get_remove() {
        let storage = MemoryStorage::new();

        storage.set("token", "a.b.c").unwrap();
        assert_eq!(storage.get("token").unwrap().as_deref(), Some("a.b.c"));

        storage.remove("token").unwrap();
        assert_eq!(storage.get("token").unwrap(), None);
        // Removing again is fine.
        storage.remove("token").unwrap();
    }

    #[test]
    fn test_memory_storage_set_many_and_remove_many() {
        let storage = MemoryStorage::new();

        storage.set_many(&[("a", "1"), ("b", "2"), ("c", "3")]).unwrap();
        assert_eq!(storage.len(), 3);

        storage.remove_many(&["a", "b"]).unwrap();
        assert_eq!(storage.len(), 1);
        assert_eq!(storage.get("c").unwrap().as_deref(), Some("3"));
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        FileStorage::new(&path)
            .set_many(&[("token", "a.b.c"), ("authExpiry", "123")])
            .unwrap();

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("a.b.c"));
        assert_eq!(reopened.get("authExpiry").unwrap().as_deref(), Some("123"));
    }

    #[test]
    fn test_file_storage_temp_file_is_distinct_sibling() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("session.tmp");

        let storage = FileStorage::new(&target);
        storage.set("token", "a.b.c").unwrap();
        storage.set("authExpiry", "123").unwrap();

        assert_eq!(storage.temp_path(), dir.path().join("session.tmp.tmp"));
        assert!(!storage.temp_path().exists());
        let reopened = FileStorage::new(&target);
        assert_eq!(reopened.get("token").unwrap().as_deref(), Some("a.b.c"));
        assert_eq!(reopened.get("authExpiry").unwrap().as_deref(), Some("123"));
    }

    #[test]
    fn test_file_storage_write_leaves_tmp_named_sibling_alone() {
        let dir = tempfile::tempdir().unwrap();
        let sibling = dir.path().join("session.tmp");
        fs::write(&sibling, "keep").unwrap();

        FileStorage::new(dir.path().join("session.json"))
            .set("token", "a.b.c")
            .unwrap();

        assert_eq!(fs::read_to_string(&sibling).unwrap(), "keep");
    }

    #[test]
    fn test_file_storage_missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("nested").join("none.json"));

        assert_eq!(storage.get("user").unwrap(), None);
        // Removing from a missing file creates an empty one.
        storage.remove("user").unwrap();
        assert!(storage.path().exists());
    }

    #[test]
    fn test_file_storage_corrupt_file_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "[1, 2, 3]").unwrap();

        let result = FileStorage::new(&path).get("token");

        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }
}
