//! Session Manager Builder
//!
//! Fluent assembly of a session manager with its stores and collaborators.

use std::sync::Arc;

use crate::events::{SessionVerifier, TokenRenewer};
use crate::session::{Clock, SessionManager, SystemClock};
use crate::storage::{KeyValueStore, SessionStorage};
use crate::types::WebAuthConfig;

/// Session manager builder.
pub struct SessionManagerBuilder {
    config: WebAuthConfig,
    storage: SessionStorage,
    clock: Arc<dyn Clock>,
    verifier: Option<Arc<dyn SessionVerifier>>,
    renewer: Option<Arc<dyn TokenRenewer>>,
}

impl SessionManagerBuilder {
    /// Create builder with default configuration and in-memory stores.
    pub fn new() -> Self {
        Self {
            config: WebAuthConfig::default(),
            storage: SessionStorage::in_memory(),
            clock: Arc::new(SystemClock),
            verifier: None,
            renewer: None,
        }
    }

    /// Set configuration.
    pub fn config(mut self, config: WebAuthConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the storage adapter.
    pub fn storage(mut self, storage: SessionStorage) -> Self {
        self.storage = storage;
        self
    }

    /// Set the durable and ephemeral stores.
    pub fn stores(
        mut self,
        durable: Arc<dyn KeyValueStore>,
        ephemeral: Arc<dyn KeyValueStore>,
    ) -> Self {
        self.storage = SessionStorage::new(durable, ephemeral);
        self
    }

    /// Set clock.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Set the `verify` collaborator.
    pub fn verifier<V>(mut self, verifier: V) -> Self
    where
        V: SessionVerifier + 'static,
    {
        self.verifier = Some(Arc::new(verifier));
        self
    }

    /// Set the `renew` collaborator.
    pub fn renewer<R>(mut self, renewer: R) -> Self
    where
        R: TokenRenewer + 'static,
    {
        self.renewer = Some(Arc::new(renewer));
        self
    }

    /// Build the session manager.
    pub fn build(self) -> SessionManager {
        let manager = SessionManager::with_clock(self.config, self.storage, self.clock);
        if let Some(verifier) = self.verifier {
            manager.events().on_verify_shared(verifier);
        }
        if let Some(renewer) = self.renewer {
            manager.events().on_renew_shared(renewer);
        }
        manager
    }
}

impl Default for SessionManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a new session manager builder.
pub fn session_manager() -> SessionManagerBuilder {
    SessionManagerBuilder::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MockRenewer, MockVerifier};
    use crate::storage::InMemoryStore;
    use crate::types::{SessionState, StorageMode};

    #[test]
    fn test_builder_registers_collaborators() {
        let manager = session_manager()
            .verifier(MockVerifier::new())
            .renewer(MockRenewer::new())
            .build();

        assert!(manager.events().has_verifier());
        assert!(manager.events().has_renewer());
        assert_eq!(manager.state(), SessionState::Empty);
        assert!(!manager.is_running());
    }

    #[test]
    fn test_builder_uses_given_stores() {
        let durable = Arc::new(InMemoryStore::new());
        durable.set("auth-key", "stored").unwrap();

        let manager = session_manager()
            .stores(durable.clone(), Arc::new(InMemoryStore::new()))
            .build();

        assert_eq!(manager.access_token().unwrap(), Some("stored".to_string()));
        assert_eq!(manager.storage_mode(), StorageMode::Ephemeral);
    }
}
