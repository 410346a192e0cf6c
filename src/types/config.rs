//! Configuration Types
//!
//! Session manager configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default storage key of the access token.
pub const DEFAULT_ACCESS_TOKEN_KEY: &str = "auth-key";

/// Default storage key of the refresh token.
pub const DEFAULT_REFRESH_TOKEN_KEY: &str = "auth-key-refresh";

/// Storage key names of the two tokens.
///
/// Two managers sharing an origin must use distinct keys or they will
/// overwrite each other's tokens.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageKeys {
    /// Key of the access token.
    pub access_token: String,
    /// Key of the refresh token.
    pub refresh_token: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access_token: DEFAULT_ACCESS_TOKEN_KEY.to_string(),
            refresh_token: DEFAULT_REFRESH_TOKEN_KEY.to_string(),
        }
    }
}

/// Session manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebAuthConfig {
    /// Storage key names.
    pub keys: StorageKeys,
    /// Maximum renewal attempts before giving up.
    pub attempts: u32,
    /// Clock skew tolerance subtracted from "now" before expiry checks.
    #[serde(with = "duration_ms")]
    pub delay: Duration,
    /// Observer cadence.
    #[serde(with = "duration_ms")]
    pub observer_interval: Duration,
    /// Base of the linear renewal backoff (`base * (attempt + 1)`).
    #[serde(with = "duration_ms")]
    pub backoff_base: Duration,
}

impl Default for WebAuthConfig {
    fn default() -> Self {
        Self {
            keys: StorageKeys::default(),
            attempts: 3,
            delay: Duration::ZERO,
            observer_interval: Duration::from_secs(1),
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl WebAuthConfig {
    /// Backoff before renewal attempt `attempt + 1`.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_base.saturating_mul(attempt.saturating_add(1))
    }

    /// Skew delay in milliseconds.
    pub fn delay_ms(&self) -> i64 {
        i64::try_from(self.delay.as_millis()).unwrap_or(i64::MAX)
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebAuthConfig::default();
        assert_eq!(config.keys.access_token, "auth-key");
        assert_eq!(config.keys.refresh_token, "auth-key-refresh");
        assert_eq!(config.attempts, 3);
        assert_eq!(config.delay, Duration::ZERO);
        assert_eq!(config.observer_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_linear_backoff() {
        let config = WebAuthConfig::default();
        assert_eq!(config.backoff_for(1), Duration::from_millis(2000));
        assert_eq!(config.backoff_for(2), Duration::from_millis(3000));
    }

    #[test]
    fn test_deserialize_partial() {
        let json = r#"{
            "keys": { "accessToken": "app-access", "refreshToken": "app-refresh" },
            "attempts": 5,
            "delay": 250
        }"#;

        let config: WebAuthConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.keys.access_token, "app-access");
        assert_eq!(config.attempts, 5);
        assert_eq!(config.delay, Duration::from_millis(250));
        assert_eq!(config.delay_ms(), 250);
        // Unspecified fields fall back to defaults
        assert_eq!(config.backoff_base, Duration::from_secs(1));
    }
}
