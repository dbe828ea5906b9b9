//! File-backed key-value storage
//!
//! All entries live in one JSON object. Every write rewrites the whole
//! document to a sibling temporary file and renames it into place, so a
//! crash mid-write never leaves a half-written document behind.

use state_kit_core::environment::{KeyValueStore, StorageError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Key-value store persisted as a JSON document
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the document at `path`, starting empty if it does not exist
    ///
    /// # Errors
    ///
    /// - [`StorageError::Io`] if the file exists but cannot be read
    /// - [`StorageError::Corrupt`] if it is not a JSON object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).map_err(|e| {
                StorageError::Corrupt(format!("{}: {e}", path.display()))
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(StorageError::Io(format!("{}: {e}", path.display()))),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened file storage");

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing document
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Apply `change` to a copy of the entries and commit it once the
    /// document is on disk
    fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().map_err(|_| {
            StorageError::Unavailable("file storage lock poisoned".to_string())
        })?;

        let mut next = entries.clone();
        change(&mut next);
        self.write_document(&next)?;

        *entries = next;
        Ok(())
    }

    fn write_document(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(entries)
            .map_err(|e| StorageError::Io(format!("failed to encode document: {e}")))?;

        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)
            .and_then(|()| std::fs::rename(&tmp, &self.path))
            .map_err(|e| StorageError::Io(format!("{}: {e}", self.path.display())))
    }
}

impl KeyValueStore for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().map_err(|_| {
            StorageError::Unavailable("file storage lock poisoned".to_string())
        })?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path().join("state.json")).unwrap();

        assert_eq!(storage.get("anything").unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");

        {
            let storage = FileStorage::open(&path).unwrap();
            storage.set("count", "6").unwrap();
            storage.set("name", r#""Ada""#).unwrap();
            storage.remove("name").unwrap();
        }

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("count").unwrap().as_deref(), Some("6"));
        assert_eq!(reopened.get("name").unwrap(), None);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_corrupt_document() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let result = FileStorage::open(&path);

        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }

    #[test]
    fn test_failed_write_leaves_entries_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("state.json");
        let storage = FileStorage::open(&path).unwrap();

        let result = storage.set("k", "v");

        assert!(matches!(result, Err(StorageError::Io(_))));
        assert_eq!(storage.get("k").unwrap(), None);
    }
}
