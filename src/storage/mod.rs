//! Token Storage
//!
//! Key-value stores and the adapter that keeps a session in exactly one of
//! them.
//!
//! This module provides:
//!
//! - **Key-Value Stores**: the `KeyValueStore` contract with in-memory and mock implementations
//! - **Session Storage**: durable/ephemeral routing, mode detection and cleanup

pub mod adapter;
pub mod store;

pub use adapter::SessionStorage;
pub use store::{InMemoryStore, KeyValueStore, MockStore, StoreOperation};
