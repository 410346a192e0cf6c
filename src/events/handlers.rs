//! Host Collaborators
//!
//! The `verify` and `renew` callbacks supplied by the host application.

use async_trait::async_trait;
use parking_lot::Mutex;
use secrecy::{ExposeSecret, SecretString};
use std::collections::VecDeque;
use std::future::Future;

use crate::error::{BoxError, WebAuthError};
use crate::events::{Event, EventHub};
use crate::types::TokenKind;

/// Tokens handed to a host callback.
///
/// Also lets a custom verifier or renewer report `expired` or `error` on its
/// own, for hosts that want to notify before returning.
#[derive(Clone)]
pub struct SessionContext {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    events: EventHub,
}

impl SessionContext {
    pub(crate) fn new(access_token: &str, refresh_token: Option<&str>, events: EventHub) -> Self {
        Self {
            access_token: SecretString::new(access_token.to_string()),
            refresh_token: refresh_token.map(|t| SecretString::new(t.to_string())),
            events,
        }
    }

    /// Current access token.
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// Current refresh token, if the session has one.
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|t| t.expose_secret().as_str())
    }

    /// Format the access token as an Authorization header value.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.access_token.expose_secret())
    }

    /// Fire the `expired` event.
    pub fn expired(&self, kind: TokenKind) {
        self.events.fire(&Event::Expired(kind));
    }

    /// Fire the `error` event.
    pub fn error(&self, error: impl Into<WebAuthError>) {
        self.events.fire(&Event::error(error));
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Host verification callback: is this session still trusted by the backend?
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, context: SessionContext) -> Result<bool, BoxError>;
}

/// Host renewal callback: exchange the refresh token for a new access token.
///
/// `Ok(None)` or an empty string counts as a failed attempt.
#[async_trait]
pub trait TokenRenewer: Send + Sync {
    async fn renew(&self, context: SessionContext) -> Result<Option<String>, BoxError>;
}

/// Verifier backed by an async closure.
pub struct FnVerifier<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> SessionVerifier for FnVerifier<F>
where
    F: Fn(SessionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    async fn verify(&self, context: SessionContext) -> Result<bool, BoxError> {
        (self.f)(context).await
    }
}

/// Wrap an async closure as a [`SessionVerifier`].
pub fn verifier_fn<F, Fut>(f: F) -> FnVerifier<F>
where
    F: Fn(SessionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, BoxError>> + Send + 'static,
{
    FnVerifier { f }
}

/// Renewer backed by an async closure.
pub struct FnRenewer<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> TokenRenewer for FnRenewer<F>
where
    F: Fn(SessionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    async fn renew(&self, context: SessionContext) -> Result<Option<String>, BoxError> {
        (self.f)(context).await
    }
}

/// Wrap an async closure as a [`TokenRenewer`].
pub fn renewer_fn<F, Fut>(f: F) -> FnRenewer<F>
where
    F: Fn(SessionContext) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<String>, BoxError>> + Send + 'static,
{
    FnRenewer { f }
}

/// Mock verifier for testing.
///
/// Returns queued responses first, then the default response.
pub struct MockVerifier {
    responses: Mutex<VecDeque<Result<bool, String>>>,
    default_response: Mutex<Result<bool, String>>,
    history: Mutex<Vec<(String, Option<String>)>>,
}

impl MockVerifier {
    /// Create mock verifier that accepts every session.
    pub fn new() -> Self {
        Self::with_default(Ok(true))
    }

    /// Create mock verifier with a default response.
    pub fn with_default(response: Result<bool, String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(response),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next call.
    pub fn push_response(&self, response: Result<bool, String>) -> &Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Get (access, refresh) tokens of every call.
    pub fn get_history(&self) -> Vec<(String, Option<String>)> {
        self.history.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().len()
    }
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionVerifier for MockVerifier {
    async fn verify(&self, context: SessionContext) -> Result<bool, BoxError> {
        self.history.lock().push((
            context.access_token().to_string(),
            context.refresh_token().map(String::from),
        ));

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_response.lock().clone());

        response.map_err(BoxError::from)
    }
}

/// Mock renewer for testing.
///
/// Returns queued responses first, then the default response.
pub struct MockRenewer {
    responses: Mutex<VecDeque<Result<Option<String>, String>>>,
    default_response: Mutex<Result<Option<String>, String>>,
    history: Mutex<Vec<(String, Option<String>)>>,
}

impl MockRenewer {
    /// Create mock renewer that always fails with an empty response.
    pub fn new() -> Self {
        Self::with_default(Ok(None))
    }

    /// Create mock renewer with a default response.
    pub fn with_default(response: Result<Option<String>, String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            default_response: Mutex::new(response),
            history: Mutex::new(Vec::new()),
        }
    }

    /// Queue a response for the next call.
    pub fn push_response(&self, response: Result<Option<String>, String>) -> &Self {
        self.responses.lock().push_back(response);
        self
    }

    /// Get (access, refresh) tokens of every call.
    pub fn get_history(&self) -> Vec<(String, Option<String>)> {
        self.history.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.history.lock().len()
    }
}

impl Default for MockRenewer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TokenRenewer for MockRenewer {
    async fn renew(&self, context: SessionContext) -> Result<Option<String>, BoxError> {
        self.history.lock().push((
            context.access_token().to_string(),
            context.refresh_token().map(String::from),
        ));

        let response = self
            .responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.default_response.lock().clone());

        response.map_err(BoxError::from)
    }
}
