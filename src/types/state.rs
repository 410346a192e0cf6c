//! Session State
//!
//! Phases of the token lifecycle state machine.

use serde::Serialize;

/// Lifecycle phase of a session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No tokens.
    Empty,
    /// Waiting for the host `verify` callback.
    Verifying,
    /// Token valid, observer running.
    Ready,
    /// Waiting for (or backing off between) host `renew` calls.
    Renewing,
    /// A token expired and no automatic recovery is possible.
    Expired,
    /// Verification or renewal failed with nothing left to try.
    Faulted,
    /// Logged out and cleaned up.
    Stopped,
}

impl SessionState {
    /// Whether the state accepts no further automatic transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Expired | SessionState::Faulted | SessionState::Stopped
        )
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Empty => "empty",
            SessionState::Verifying => "verifying",
            SessionState::Ready => "ready",
            SessionState::Renewing => "renewing",
            SessionState::Expired => "expired",
            SessionState::Faulted => "faulted",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
