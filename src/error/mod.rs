//! Web Auth Error Types
//!
//! Error hierarchy for the token lifecycle. Lifecycle outcomes are delivered
//! through the `error` event; only configuration faults are returned to the
//! caller.

use thiserror::Error;

/// Error type returned by host-supplied callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Root error type for the session lifecycle.
#[derive(Error, Debug)]
pub enum WebAuthError {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Verification fault: {0}")]
    Verification(#[from] VerificationFault),

    #[error("Renewal fault: {0}")]
    Renewal(#[from] RenewalFault),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl WebAuthError {
    /// Get error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Decode(_) => "WEB_AUTH_DECODE",
            Self::Configuration(_) => "WEB_AUTH_CONFIG",
            Self::Verification(_) => "WEB_AUTH_VERIFY",
            Self::Renewal(_) => "WEB_AUTH_RENEW",
            Self::Storage(_) => "WEB_AUTH_STORAGE",
        }
    }

    /// Check if the lifecycle retries after this error.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Renewal(e) => e.is_retryable(),
            _ => false,
        }
    }

    /// Check if error is a programmer error rather than a session outcome.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

/// Malformed token structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Token has no payload segment")]
    MissingPayload,

    #[error("Payload segment is not valid base64url: {message}")]
    InvalidBase64 { message: String },

    #[error("Payload is not valid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Payload is not a JSON object (found {found})")]
    NotAnObject { found: &'static str },

    #[error("Invalid exp claim: {message}")]
    InvalidExpiration { message: String },
}

/// Configuration error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No handler registered for mandatory event: {event}")]
    MissingHandler { event: &'static str },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },
}

/// Host `verify` callback failure.
#[derive(Error, Debug)]
pub enum VerificationFault {
    #[error("Verifier rejected: {message}")]
    Rejected { message: String },

    #[error("Verifier panicked")]
    Panicked,
}

/// Host `renew` callback failure.
#[derive(Error, Debug)]
pub enum RenewalFault {
    #[error("Renewer rejected: {message}")]
    Rejected { message: String },

    #[error("Renewer returned no access token")]
    EmptyToken,

    #[error("Renewed access token is malformed: {0}")]
    InvalidToken(DecodeError),

    #[error("Renewer panicked")]
    Panicked,

    #[error("No refresh token available")]
    NoRefreshToken,

    #[error("Renewal failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl RenewalFault {
    /// Check if another attempt may follow this failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::NoRefreshToken | Self::Exhausted { .. })
    }
}

/// Key-value store failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("Read failed for {key}: {message}")]
    ReadFailed { key: String, message: String },

    #[error("Write failed for {key}: {message}")]
    WriteFailed { key: String, message: String },

    #[error("Delete failed for {key}: {message}")]
    DeleteFailed { key: String, message: String },
}

/// Result type for lifecycle operations.
pub type WebAuthResult<T> = Result<T, WebAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let error = WebAuthError::from(DecodeError::MissingPayload);
        assert_eq!(error.error_code(), "WEB_AUTH_DECODE");

        let error = WebAuthError::from(ConfigurationError::MissingHandler { event: "verify" });
        assert_eq!(error.error_code(), "WEB_AUTH_CONFIG");
        assert!(error.is_configuration());
    }

    #[test]
    fn test_is_retryable() {
        assert!(WebAuthError::from(RenewalFault::EmptyToken).is_retryable());
        assert!(WebAuthError::from(RenewalFault::Panicked).is_retryable());
        assert!(!WebAuthError::from(RenewalFault::Exhausted {
            attempts: 3,
            last_error: "Renewer returned no access token".to_string(),
        }).is_retryable());
        assert!(!WebAuthError::from(RenewalFault::NoRefreshToken).is_retryable());
        assert!(!WebAuthError::from(DecodeError::MissingPayload).is_retryable());
    }

    #[test]
    fn test_display_includes_source() {
        let error = WebAuthError::from(ConfigurationError::MissingHandler { event: "renew" });
        assert_eq!(
            error.to_string(),
            "Configuration error: No handler registered for mandatory event: renew"
        );
    }
}
