//! Token Types
//!
//! Token identity, decoded payloads and expiration instants.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Which of the two session tokens an operation refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    #[serde(rename = "accessToken")]
    AccessToken,
    #[serde(rename = "refreshToken")]
    RefreshToken,
}

impl TokenKind {
    /// Name used in `expired` notifications.
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::AccessToken => "accessToken",
            TokenKind::RefreshToken => "refreshToken",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which key-value store holds the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    /// Survives browser restarts ("remember me").
    Durable,
    /// Scoped to the current tab/session.
    Ephemeral,
}

impl StorageMode {
    /// Map a `remember` flag to a storage mode.
    pub fn from_remember(remember: bool) -> Self {
        if remember {
            StorageMode::Durable
        } else {
            StorageMode::Ephemeral
        }
    }

    /// Whether this mode corresponds to `remember = true`.
    pub fn is_remembered(&self) -> bool {
        matches!(self, StorageMode::Durable)
    }
}

/// Absolute expiration of a token, in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Expiration {
    /// Expires at the given instant.
    At(i64),
    /// No `exp` claim: the token never expires.
    Never,
}

impl Expiration {
    /// Check expiry against `now_ms`, with `delay_ms` of tolerated skew.
    ///
    /// The delay is subtracted from "now", so a positive delay keeps a token
    /// valid slightly past its nominal expiry.
    pub fn is_expired(&self, now_ms: i64, delay_ms: i64) -> bool {
        match self {
            Expiration::At(at) => now_ms.saturating_sub(delay_ms) >= *at,
            Expiration::Never => false,
        }
    }

    /// Milliseconds left before expiry, `None` for non-expiring tokens.
    pub fn remaining_ms(&self, now_ms: i64) -> Option<i64> {
        match self {
            Expiration::At(at) => Some((at - now_ms).max(0)),
            Expiration::Never => None,
        }
    }

    /// Expiration as a UTC timestamp.
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Expiration::At(at) => Utc.timestamp_millis_opt(*at).single(),
            Expiration::Never => None,
        }
    }
}

/// Decoded token payload: the claims object of the middle segment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Wrap a claims object.
    pub fn new(claims: Map<String, Value>) -> Self {
        Self(claims)
    }

    /// Get a claim by name.
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// Raw `exp` claim, if present.
    pub fn exp(&self) -> Option<&Value> {
        self.0.get("exp")
    }

    /// Subject claim.
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// All claims.
    pub fn claims(&self) -> &Map<String, Value> {
        &self.0
    }
}
