//! Session Lifecycle
//!
//! The token lifecycle state machine and its scheduling primitives.
//!
//! This module provides:
//!
//! - **Session Manager**: entry, verification, observer, renewal and termination
//! - **Wake-ups**: the single pending transition of a session
//! - **Clock**: wall-clock source for expiry checks

pub mod clock;
pub mod manager;
pub mod schedule;

pub use clock::{Clock, MockClock, SystemClock};
pub use manager::SessionManager;
pub use schedule::{Step, WakeUp};
