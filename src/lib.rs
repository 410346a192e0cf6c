//! Web Auth
//!
//! Client-side access/refresh token lifecycle manager.
//!
//! # Features
//!
//! - Structural decoding of compact tokens (payload and `exp` only, no signature check)
//! - Durable ("remember me") and ephemeral token storage with mode resume
//! - Host-supplied `verify` and `renew` collaborators
//! - Expiration observer with clock skew tolerance
//! - Automatic renewal with bounded retries and linear backoff
//! - Lifecycle notifications: `expired`, `renewed`, `ready`, `empty`, `error`, `logout`, `load`
//!
//! # Example
//!
//! ```rust,ignore
//! use web_auth::{
//!     renewer_fn, session_manager, verifier_fn, web_auth_config, BoxError, EventKind, SessionContext,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = web_auth_config()
//!         .access_token_key("app-token")
//!         .refresh_token_key("app-token-refresh")
//!         .attempts(3)
//!         .build()?;
//!
//!     let manager = session_manager()
//!         .config(config)
//!         .verifier(verifier_fn(|ctx: SessionContext| async move {
//!             let _authorization = ctx.bearer();
//!             Ok::<bool, BoxError>(true)
//!         }))
//!         .renewer(renewer_fn(|ctx: SessionContext| async move {
//!             let _refresh = ctx.refresh_token().map(String::from);
//!             Ok::<Option<String>, BoxError>(Some("new-access-token".to_string()))
//!         }))
//!         .build();
//!
//!     manager
//!         .on(EventKind::Ready, |_| println!("session ready"))
//!         .on(EventKind::Expired, |event| println!("expired: {:?}", event.expired_token()));
//!
//!     manager.set(Some("access.jwt.token"), Some("refresh.jwt.token"), true).await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: tokens, payloads, expiration, session state and configuration
//! - `error`: error hierarchy
//! - `token`: payload and expiration decoding
//! - `storage`: key-value stores and the durable/ephemeral adapter
//! - `events`: notifications, host collaborators and the event hub
//! - `session`: the lifecycle state machine
//! - `builders`: fluent builders for configuration and managers

pub mod builders;
pub mod error;
pub mod events;
pub mod session;
pub mod storage;
pub mod token;
pub mod types;

// Re-export builders
pub use builders::{session_manager, web_auth_config, SessionManagerBuilder, WebAuthConfigBuilder};

// Re-export errors
pub use error::{
    BoxError, ConfigurationError, DecodeError, RenewalFault, StorageError, VerificationFault,
    WebAuthError, WebAuthResult,
};

// Re-export types
pub use types::{
    // Config
    StorageKeys, WebAuthConfig, DEFAULT_ACCESS_TOKEN_KEY, DEFAULT_REFRESH_TOKEN_KEY,
    // State
    SessionState,
    // Token
    Expiration, Payload, StorageMode, TokenKind,
};

// Re-export token codec
pub use token::{decode, decode_expiration, encode_unsigned, expiration_instant};

// Re-export storage
pub use storage::{InMemoryStore, KeyValueStore, MockStore, SessionStorage, StoreOperation};

// Re-export events
pub use events::{
    renewer_fn, verifier_fn, Event, EventHub, EventKind, FnRenewer, FnVerifier, Listener,
    MockRenewer, MockVerifier, SessionContext, SessionVerifier, TokenRenewer,
};

// Re-export session
pub use session::{Clock, MockClock, SessionManager, Step, SystemClock, WakeUp};
