//! Events
//!
//! Host-facing callbacks of the session lifecycle.
//!
//! This module provides:
//!
//! - **Events**: typed notifications (`expired`, `renewed`, `ready`, `empty`, `error`, `logout`, `load`)
//! - **Collaborators**: the mandatory `verify` and `renew` host callbacks
//! - **Event Hub**: single-callback-per-name registry and dispatch

pub mod event;
pub mod handlers;
pub mod hub;

pub use event::{Event, EventKind};
pub use handlers::{
    renewer_fn, verifier_fn, FnRenewer, FnVerifier, MockRenewer, MockVerifier, SessionContext,
    SessionVerifier, TokenRenewer,
};
pub use hub::{EventHub, Listener};
