//! Builders
//!
//! Fluent builder patterns for configuration and session managers.

pub mod config;
pub mod manager;

pub use config::{web_auth_config, WebAuthConfigBuilder};
pub use manager::{session_manager, SessionManagerBuilder};
