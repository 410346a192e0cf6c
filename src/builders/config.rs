//! Configuration Builder
//!
//! Fluent builder for session manager configuration.

use std::time::Duration;

use crate::error::{ConfigurationError, WebAuthError};
use crate::types::{StorageKeys, WebAuthConfig};

/// Session manager configuration builder.
#[derive(Default)]
pub struct WebAuthConfigBuilder {
    access_token_key: Option<String>,
    refresh_token_key: Option<String>,
    attempts: Option<u32>,
    delay: Option<Duration>,
    observer_interval: Option<Duration>,
    backoff_base: Option<Duration>,
}

impl WebAuthConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set storage key of the access token.
    pub fn access_token_key(mut self, key: impl Into<String>) -> Self {
        self.access_token_key = Some(key.into());
        self
    }

    /// Set storage key of the refresh token.
    pub fn refresh_token_key(mut self, key: impl Into<String>) -> Self {
        self.refresh_token_key = Some(key.into());
        self
    }

    /// Set both storage keys.
    pub fn keys(mut self, keys: StorageKeys) -> Self {
        self.access_token_key = Some(keys.access_token);
        self.refresh_token_key = Some(keys.refresh_token);
        self
    }

    /// Set maximum renewal attempts.
    pub fn attempts(mut self, attempts: u32) -> Self {
        self.attempts = Some(attempts);
        self
    }

    /// Set clock skew tolerance.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Set observer cadence.
    pub fn observer_interval(mut self, interval: Duration) -> Self {
        self.observer_interval = Some(interval);
        self
    }

    /// Set base of the linear renewal backoff.
    pub fn backoff_base(mut self, base: Duration) -> Self {
        self.backoff_base = Some(base);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<WebAuthConfig, WebAuthError> {
        let defaults = WebAuthConfig::default();

        let keys = StorageKeys {
            access_token: self
                .access_token_key
                .unwrap_or(defaults.keys.access_token),
            refresh_token: self
                .refresh_token_key
                .unwrap_or(defaults.keys.refresh_token),
        };

        if keys.access_token.is_empty() {
            return Err(invalid("access token key must not be empty"));
        }
        if keys.refresh_token.is_empty() {
            return Err(invalid("refresh token key must not be empty"));
        }
        if keys.access_token == keys.refresh_token {
            return Err(invalid("access and refresh token keys must differ"));
        }

        let attempts = self.attempts.unwrap_or(defaults.attempts);
        if attempts == 0 {
            return Err(invalid("attempts must be at least 1"));
        }

        let observer_interval = self.observer_interval.unwrap_or(defaults.observer_interval);
        if observer_interval.is_zero() {
            return Err(invalid("observer interval must be positive"));
        }

        Ok(WebAuthConfig {
            keys,
            attempts,
            delay: self.delay.unwrap_or(defaults.delay),
            observer_interval,
            backoff_base: self.backoff_base.unwrap_or(defaults.backoff_base),
        })
    }
}

fn invalid(message: &str) -> WebAuthError {
    WebAuthError::Configuration(ConfigurationError::InvalidConfig {
        message: message.to_string(),
    })
}

/// Create a new session manager configuration builder.
pub fn web_auth_config() -> WebAuthConfigBuilder {
    WebAuthConfigBuilder::new()
}
