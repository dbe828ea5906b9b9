//! In-memory key-value storage

use state_kit_core::environment::{KeyValueStore, StorageError};
use std::collections::HashMap;
use std::sync::RwLock;

/// Process-local key-value store
///
/// With a quota, a write that would push the total size of keys and values
/// past the limit fails with [`StorageError::QuotaExceeded`] and leaves the
/// store unchanged.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: RwLock<HashMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryStorage {
    /// Create an unbounded store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that holds at most `quota_bytes` of keys and values
    #[must_use]
    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            entries: RwLock::default(),
            quota_bytes: Some(quota_bytes),
        }
    }

    /// Total bytes currently stored (keys plus values)
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] if the store's lock is poisoned.
    pub fn used_bytes(&self) -> Result<usize, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(size_of_entries(&entries))
    }
}

fn size_of_entries(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Unavailable("memory storage lock poisoned".to_string())
}

impl KeyValueStore for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.read().map_err(poisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(poisoned)?;

        if let Some(limit) = self.quota_bytes {
            let replaced = entries.get(key).map_or(0, |old| key.len() + old.len());
            let needed = size_of_entries(&entries) - replaced + key.len() + value.len();
            if needed > limit {
                return Err(StorageError::QuotaExceeded { needed, limit });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.write().map_err(poisoned)?;
        entries.remove(key);
        Ok(())
    }
}
