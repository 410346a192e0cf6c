//! Session Storage Adapter
//!
//! Routes token reads and writes to the durable or ephemeral store.

use std::sync::Arc;

use crate::error::StorageError;
use crate::storage::{InMemoryStore, KeyValueStore};
use crate::types::{StorageKeys, StorageMode};

/// The pair of stores a session can live in.
#[derive(Clone)]
pub struct SessionStorage {
    durable: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    /// Create adapter over a durable and an ephemeral store.
    pub fn new(durable: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self { durable, ephemeral }
    }

    /// Adapter over two fresh in-memory stores.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()), Arc::new(InMemoryStore::new()))
    }

    /// The store backing `mode`.
    pub fn store(&self, mode: StorageMode) -> &dyn KeyValueStore {
        match mode {
            StorageMode::Durable => self.durable.as_ref(),
            StorageMode::Ephemeral => self.ephemeral.as_ref(),
        }
    }

    pub fn read(&self, mode: StorageMode, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .store(mode)
            .get(key)?
            .filter(|value| !value.is_empty()))
    }

    pub fn write(&self, mode: StorageMode, key: &str, value: &str) -> Result<(), StorageError> {
        self.store(mode).set(key, value)
    }

    pub fn remove(&self, mode: StorageMode, key: &str) -> Result<(), StorageError> {
        self.store(mode).remove(key)
    }

    /// Store that currently holds `key`.
    ///
    /// The durable store wins when it holds the key, so a reload resumes the
    /// mode picked at login without persisting the mode itself.
    pub fn select_store(&self, key: &str) -> Result<StorageMode, StorageError> {
        if self.durable.contains(key)? {
            Ok(StorageMode::Durable)
        } else {
            Ok(StorageMode::Ephemeral)
        }
    }

    /// Read `key` from whichever store holds it.
    pub fn read_current(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mode = self.select_store(key)?;
        self.read(mode, key)
    }

    /// Remove both keys from both stores.
    ///
    /// Every removal is attempted; the first failure is returned.
    pub fn clean(&self, keys: &StorageKeys) -> Result<(), StorageError> {
        let mut first_error = None;

        for mode in [StorageMode::Durable, StorageMode::Ephemeral] {
            for key in [&keys.access_token, &keys.refresh_token] {
                if let Err(e) = self.remove(mode, key) {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for SessionStorage {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage").finish_non_exhaustive()
    }
}
