//! Wake-up Descriptors
//!
//! The next scheduled transition of a session.

use std::time::Duration;

/// Which transition runs at the next wake-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    /// Re-check the stored access token.
    Observe,
    /// Call the host renewer.
    Renew,
}

/// Single pending timer of a session: what runs, when, and which attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WakeUp {
    pub step: Step,
    pub after: Duration,
    pub attempt: u32,
}

impl WakeUp {
    /// Observer pass after `after`.
    pub fn observe(after: Duration) -> Self {
        Self {
            step: Step::Observe,
            after,
            attempt: 1,
        }
    }

    /// Renewal `attempt` after `after`.
    pub fn renew(attempt: u32, after: Duration) -> Self {
        Self {
            step: Step::Renew,
            after,
            attempt,
        }
    }

    /// Renewal attempt without delay.
    pub fn renew_now() -> Self {
        Self::renew(1, Duration::ZERO)
    }
}
