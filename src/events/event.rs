//! Event Types
//!
//! Notifications emitted by the session lifecycle.

use std::str::FromStr;
use std::sync::Arc;

use crate::error::{ConfigurationError, WebAuthError};
use crate::types::TokenKind;

/// Notification event names.
///
/// `verify` and `renew` are not notifications: they are mandatory host
/// collaborators registered through [`EventHub::on_verify`] and
/// [`EventHub::on_renew`].
///
/// [`EventHub::on_verify`]: crate::events::EventHub::on_verify
/// [`EventHub::on_renew`]: crate::events::EventHub::on_renew
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventKind {
    Expired,
    Renewed,
    Ready,
    Empty,
    Error,
    Logout,
    Load,
}

impl EventKind {
    /// All notification kinds.
    pub const ALL: [EventKind; 7] = [
        EventKind::Expired,
        EventKind::Renewed,
        EventKind::Ready,
        EventKind::Empty,
        EventKind::Error,
        EventKind::Logout,
        EventKind::Load,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Expired => "expired",
            EventKind::Renewed => "renewed",
            EventKind::Ready => "ready",
            EventKind::Empty => "empty",
            EventKind::Error => "error",
            EventKind::Logout => "logout",
            EventKind::Load => "load",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = ConfigurationError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == name)
            .ok_or_else(|| ConfigurationError::InvalidConfig {
                message: format!("unknown event name: {}", name),
            })
    }
}

/// A lifecycle notification.
#[derive(Clone, Debug)]
pub enum Event {
    /// A token expired.
    Expired(TokenKind),
    /// A new access token was obtained and persisted.
    Renewed,
    /// The session was verified (fires once per entry).
    Ready,
    /// No access token could be resolved.
    Empty,
    /// An unrecoverable failure.
    Error(Arc<WebAuthError>),
    /// The session was terminated and cleaned up.
    Logout,
    /// The observer saw a valid token for the first time after entry.
    Load,
}

impl Event {
    /// Create error event.
    pub fn error(error: impl Into<WebAuthError>) -> Self {
        Event::Error(Arc::new(error.into()))
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Event::Expired(_) => EventKind::Expired,
            Event::Renewed => EventKind::Renewed,
            Event::Ready => EventKind::Ready,
            Event::Empty => EventKind::Empty,
            Event::Error(_) => EventKind::Error,
            Event::Logout => EventKind::Logout,
            Event::Load => EventKind::Load,
        }
    }

    /// Token carried by an `expired` event.
    pub fn expired_token(&self) -> Option<TokenKind> {
        match self {
            Event::Expired(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Error carried by an `error` event.
    pub fn as_error(&self) -> Option<&WebAuthError> {
        match self {
            Event::Error(error) => Some(error.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    #[test]
    fn test_event_kind_names_round_trip() {
        for kind in EventKind::ALL {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_collaborator_names_are_not_notifications() {
        assert!("verify".parse::<EventKind>().is_err());
        assert!("renew".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_event_accessors() {
        let event = Event::Expired(TokenKind::RefreshToken);
        assert_eq!(event.kind(), EventKind::Expired);
        assert_eq!(event.expired_token(), Some(TokenKind::RefreshToken));

        let event = Event::error(DecodeError::MissingPayload);
        assert_eq!(event.kind(), EventKind::Error);
        assert_eq!(event.as_error().map(|e| e.error_code()), Some("WEB_AUTH_DECODE"));
    }
}
