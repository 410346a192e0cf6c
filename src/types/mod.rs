//! Web Auth Types
//!
//! Core types for the session lifecycle.

pub mod config;
pub mod state;
pub mod token;

pub use config::*;
pub use state::*;
pub use token::*;
