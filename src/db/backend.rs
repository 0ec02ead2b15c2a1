//! Key-value backends the record store persists into.
//!
//! Two implementations:
//! - `MemoryBackend`: process-local map with an optional byte quota
//!   (behaves like per-tab session storage).
//! - `FileBackend`: one `<key>.json` file per key under a directory
//!   (behaves like origin-scoped local storage, survives restarts).

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use super::StorageError;

/// File suffix for every key stored by `FileBackend`.
const FILE_SUFFIX: &str = ".json";

/// Synchronous string key-value storage.
///
/// Every call is a complete read or write of one key. Implementations give
/// no cross-key atomicity; the record store serializes its own
/// read-modify-write cycles.
pub trait KeyValueBackend: Send + Sync {
    /// Read the value under `key`, `None` when absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Deleting an absent key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// All keys currently present, sorted.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}

/// Keys end up as file names, so keep them to a safe alphabet.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

// ═══════════════════════════════════════════
// MemoryBackend
// ═══════════════════════════════════════════

/// In-memory backend. Optional quota counts key + value bytes.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Backend that refuses writes once stored bytes would exceed `quota_bytes`.
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Bytes currently held (keys + values).
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .map(|entries| entries.iter().map(|(k, v)| k.len() + v.len()).sum())
            .unwrap_or(0)
    }
}

impl KeyValueBackend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        validate_key(key)?;
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;

        if let Some(limit) = self.quota_bytes {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    limit,
                });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(|_| StorageError::LockPoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = self.entries.read().map_err(|_| StorageError::LockPoisoned)?;
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

// ═══════════════════════════════════════════
// FileBackend
// ═══════════════════════════════════════════

/// Directory-backed storage, one JSON file per key.
///
/// Writes land in a hidden temp file first and are renamed into place, so a
/// crash mid-write leaves the previous value readable.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (creating if needed) the storage directory.
    pub fn open(dir: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}{FILE_SUFFIX}")))
    }
}

impl KeyValueBackend for FileBackend {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        let staging = self.dir.join(format!(".{key}{FILE_SUFFIX}.tmp"));
        std::fs::write(&staging, value)?;
        std::fs::rename(&staging, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let name = entry?.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            if let Some(key) = name.strip_suffix(FILE_SUFFIX) {
                keys.push(key.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_missing_key_is_none() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.get("appointments").unwrap(), None);
    }

    #[test]
    fn memory_set_get_remove() {
        let backend = MemoryBackend::new();
        backend.set("notifications", "[]").unwrap();
        assert_eq!(backend.get("notifications").unwrap().as_deref(), Some("[]"));

        backend.remove("notifications").unwrap();
        assert_eq!(backend.get("notifications").unwrap(), None);
        // Removing again is fine
        backend.remove("notifications").unwrap();
    }

    #[test]
    fn memory_quota_rejects_and_keeps_previous_value() {
        let backend = MemoryBackend::with_quota(20);
        backend.set("k", "small").unwrap();

        let err = backend.set("k", "a value that is far too long").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { limit: 20, .. }));
        assert_eq!(backend.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn memory_quota_ignores_value_being_replaced() {
        let backend = MemoryBackend::with_quota(12);
        backend.set("key", "123456789").unwrap();
        // 3 + 9 = 12 again, the old value does not count twice
        backend.set("key", "987654321").unwrap();
        assert_eq!(backend.used_bytes(), 12);
    }

    #[test]
    fn memory_keys_sorted() {
        let backend = MemoryBackend::new();
        backend.set("userProfile", "{}").unwrap();
        backend.set("appointments", "[]").unwrap();
        assert_eq!(backend.keys().unwrap(), vec!["appointments", "userProfile"]);
    }

    #[test]
    fn invalid_keys_rejected() {
        let backend = MemoryBackend::new();
        assert!(matches!(
            backend.set("../escape", "x"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(validate_key("").is_err());
        assert!(validate_key("family_members-2").is_ok());
    }

    #[test]
    fn file_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert_eq!(backend.get("appointments").unwrap(), None);
    }

    #[test]
    fn file_set_get_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();

        backend.set("appointments", "version 1").unwrap();
        backend.set("appointments", "version 2").unwrap();

        assert_eq!(backend.get("appointments").unwrap().as_deref(), Some("version 2"));
        assert!(dir.path().join("appointments.json").exists());
        assert!(!dir.path().join(".appointments.json.tmp").exists());
    }

    #[test]
    fn file_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        FileBackend::open(dir.path())
            .unwrap()
            .set("familyMembers", "[1,2]")
            .unwrap();

        let reopened = FileBackend::open(dir.path()).unwrap();
        assert_eq!(reopened.get("familyMembers").unwrap().as_deref(), Some("[1,2]"));
    }

    #[test]
    fn file_keys_skip_foreign_and_hidden_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.set("notifications", "[]").unwrap();
        backend.set("doctors", "[]").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignore me").unwrap();
        std::fs::write(dir.path().join(".doctors.json.tmp"), "partial").unwrap();

        assert_eq!(backend.keys().unwrap(), vec!["doctors", "notifications"]);
    }

    #[test]
    fn file_remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        backend.remove("never-written").unwrap();
    }

    #[test]
    fn file_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::open(dir.path()).unwrap();
        assert!(matches!(
            backend.get("a/b"),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
