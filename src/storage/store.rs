//! Key-Value Stores
//!
//! String key-value store interface and in-process implementations.

use parking_lot::Mutex;
use std::collections::HashMap;

use crate::error::StorageError;

/// Synchronous string key-value store.
///
/// Mirrors the browser storage contract: writes are visible immediately to
/// every reader of the same store, and there is no locking across keys.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Check whether `key` holds a non-empty value.
    fn contains(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.get(key)?.map(|v| !v.is_empty()).unwrap_or(false))
    }
}

/// In-memory key-value store.
#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl InMemoryStore {
    /// Create new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.values.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.lock().is_empty()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.values.lock().remove(key);
        Ok(())
    }
}

/// Recorded store operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOperation {
    Get(String),
    Set(String, String),
    Remove(String),
}

/// Mock key-value store for testing.
#[derive(Default)]
pub struct MockStore {
    values: Mutex<HashMap<String, String>>,
    history: Mutex<Vec<StoreOperation>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl MockStore {
    /// Create new mock store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate a value without recording history.
    pub fn with_value(self, key: &str, value: &str) -> Self {
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        self
    }

    /// Make every read fail.
    pub fn set_fail_reads(&self, fail: bool) -> &Self {
        *self.fail_reads.lock() = fail;
        self
    }

    /// Make every write and remove fail.
    pub fn set_fail_writes(&self, fail: bool) -> &Self {
        *self.fail_writes.lock() = fail;
        self
    }

    /// Get operation history.
    pub fn get_history(&self) -> Vec<StoreOperation> {
        self.history.lock().clone()
    }

    /// Get keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.values.lock().keys().cloned().collect()
    }
}

impl KeyValueStore for MockStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.history.lock().push(StoreOperation::Get(key.to_string()));
        if *self.fail_reads.lock() {
            return Err(StorageError::ReadFailed {
                key: key.to_string(),
                message: "Mock storage failure".to_string(),
            });
        }
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.history
            .lock()
            .push(StoreOperation::Set(key.to_string(), value.to_string()));
        if *self.fail_writes.lock() {
            return Err(StorageError::WriteFailed {
                key: key.to_string(),
                message: "Mock storage failure".to_string(),
            });
        }
        self.values
            .lock()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.history
            .lock()
            .push(StoreOperation::Remove(key.to_string()));
        if *self.fail_writes.lock() {
            return Err(StorageError::DeleteFailed {
                key: key.to_string(),
                message: "Mock storage failure".to_string(),
            });
        }
        self.values.lock().remove(key);
        Ok(())
    }
}
