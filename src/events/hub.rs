//! Event Hub
//!
//! Name-to-single-callback registry. Registering a callback for a name
//! replaces the previous one.

use futures::FutureExt;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, RenewalFault, VerificationFault, WebAuthError};
use crate::events::{Event, EventKind, SessionContext, SessionVerifier, TokenRenewer};

/// Notification listener.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

#[derive(Default)]
struct Registry {
    verifier: Option<Arc<dyn SessionVerifier>>,
    renewer: Option<Arc<dyn TokenRenewer>>,
    listeners: HashMap<EventKind, Listener>,
}

/// Event hub shared between a session manager and its host.
///
/// Cloning yields a handle to the same registry.
#[derive(Clone, Default)]
pub struct EventHub {
    registry: Arc<RwLock<Registry>>,
}

impl EventHub {
    /// Create empty event hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the listener for a notification.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> &Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.registry
            .write()
            .listeners
            .insert(kind, Arc::new(listener));
        self
    }

    /// Remove the listener for a notification.
    pub fn off(&self, kind: EventKind) -> &Self {
        self.registry.write().listeners.remove(&kind);
        self
    }

    /// Register the `verify` collaborator.
    pub fn on_verify<V>(&self, verifier: V) -> &Self
    where
        V: SessionVerifier + 'static,
    {
        self.registry.write().verifier = Some(Arc::new(verifier));
        self
    }

    /// Register the `renew` collaborator.
    pub fn on_renew<R>(&self, renewer: R) -> &Self
    where
        R: TokenRenewer + 'static,
    {
        self.registry.write().renewer = Some(Arc::new(renewer));
        self
    }

    /// Register an already shared `verify` collaborator.
    pub fn on_verify_shared(&self, verifier: Arc<dyn SessionVerifier>) -> &Self {
        self.registry.write().verifier = Some(verifier);
        self
    }

    /// Register an already shared `renew` collaborator.
    pub fn on_renew_shared(&self, renewer: Arc<dyn TokenRenewer>) -> &Self {
        self.registry.write().renewer = Some(renewer);
        self
    }

    pub fn has_listener(&self, kind: EventKind) -> bool {
        self.registry.read().listeners.contains_key(&kind)
    }

    pub fn has_verifier(&self) -> bool {
        self.registry.read().verifier.is_some()
    }

    pub fn has_renewer(&self) -> bool {
        self.registry.read().renewer.is_some()
    }

    /// Dispatch a notification to its listener.
    ///
    /// Returns whether a listener ran. Unregistered notifications are a
    /// no-op; a panicking listener is logged and swallowed.
    pub fn fire(&self, event: &Event) -> bool {
        let listener = self.registry.read().listeners.get(&event.kind()).cloned();

        let Some(listener) = listener else {
            debug!(event = %event.kind(), "No listener registered");
            return false;
        };

        debug!(event = %event.kind(), "Firing event");
        if std::panic::catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
            warn!(event = %event.kind(), "Event listener panicked");
        }
        true
    }

    /// Call the `verify` collaborator.
    ///
    /// A missing verifier is a configuration error, never an implicit result.
    pub async fn verify(&self, context: SessionContext) -> Result<bool, WebAuthError> {
        let verifier = self
            .registry
            .read()
            .verifier
            .clone()
            .ok_or(ConfigurationError::MissingHandler { event: "verify" })?;

        match AssertUnwindSafe(verifier.verify(context)).catch_unwind().await {
            Ok(Ok(valid)) => Ok(valid),
            Ok(Err(e)) => Err(VerificationFault::Rejected {
                message: e.to_string(),
            }
            .into()),
            Err(_) => Err(VerificationFault::Panicked.into()),
        }
    }

    /// Call the `renew` collaborator.
    ///
    /// An empty or missing token is reported as [`RenewalFault::EmptyToken`].
    pub async fn renew(&self, context: SessionContext) -> Result<String, WebAuthError> {
        let renewer = self
            .registry
            .read()
            .renewer
            .clone()
            .ok_or(ConfigurationError::MissingHandler { event: "renew" })?;

        match AssertUnwindSafe(renewer.renew(context)).catch_unwind().await {
            Ok(Ok(Some(token))) if !token.is_empty() => Ok(token),
            Ok(Ok(_)) => Err(RenewalFault::EmptyToken.into()),
            Ok(Err(e)) => Err(RenewalFault::Rejected {
                message: e.to_string(),
            }
            .into()),
            Err(_) => Err(RenewalFault::Panicked.into()),
        }
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        f.debug_struct("EventHub")
            .field("verifier", &registry.verifier.is_some())
            .field("renewer", &registry.renewer.is_some())
            .field("listeners", &registry.listeners.keys().collect::<Vec<_>>())
            .finish()
    }
}
