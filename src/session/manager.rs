//! Session Manager
//!
//! Token lifecycle state machine: accept, persist, verify, observe, renew,
//! expire and terminate.
//!
//! A manager owns at most one pending wake-up. Public entry points run the
//! lifecycle inline until the first non-zero wait, then hand the remaining
//! schedule to a single background driver task. Every entry bumps a
//! generation counter; steps belonging to an older generation no-op.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::error::{ConfigurationError, RenewalFault, StorageError, WebAuthError, WebAuthResult};
use crate::events::{Event, EventHub, EventKind, SessionContext, SessionVerifier, TokenRenewer};
use crate::session::{Clock, Step, SystemClock, WakeUp};
use crate::storage::SessionStorage;
use crate::token::{decode, decode_expiration};
use crate::types::{Expiration, Payload, SessionState, StorageMode, TokenKind, WebAuthConfig};

const MIN_OBSERVER_INTERVAL: Duration = Duration::from_millis(1);

#[derive(Debug)]
struct Lifecycle {
    state: SessionState,
    running: bool,
    mode: StorageMode,
    attempt: u32,
    generation: u64,
    ready_fired: bool,
    load_fired: bool,
    access_expiry_notified: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self {
            state: SessionState::Empty,
            running: false,
            mode: StorageMode::Ephemeral,
            attempt: 0,
            generation: 0,
            ready_fired: false,
            load_fired: false,
            access_expiry_notified: false,
        }
    }
}

struct Inner {
    config: WebAuthConfig,
    storage: SessionStorage,
    events: EventHub,
    clock: Arc<dyn Clock>,
    lifecycle: Mutex<Lifecycle>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Client-side session manager.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl SessionManager {
    /// Create session manager over the given stores.
    pub fn new(config: WebAuthConfig, storage: SessionStorage) -> Self {
        Self::with_clock(config, storage, Arc::new(SystemClock))
    }

    /// Create session manager with a custom clock.
    pub fn with_clock(config: WebAuthConfig, storage: SessionStorage, clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                storage,
                events: EventHub::new(),
                clock,
                lifecycle: Mutex::new(Lifecycle::default()),
                driver: Mutex::new(None),
            }),
        }
    }

    /// Create session manager over two fresh in-memory stores.
    pub fn in_memory(config: WebAuthConfig) -> Self {
        Self::new(config, SessionStorage::in_memory())
    }

    /// Register a notification listener. Replaces any previous listener.
    pub fn on<F>(&self, kind: EventKind, listener: F) -> &Self
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener);
        self
    }

    /// Register the `verify` collaborator.
    pub fn on_verify<V>(&self, verifier: V) -> &Self
    where
        V: SessionVerifier + 'static,
    {
        self.inner.events.on_verify(verifier);
        self
    }

    /// Register the `renew` collaborator.
    pub fn on_renew<R>(&self, renewer: R) -> &Self
    where
        R: TokenRenewer + 'static,
    {
        self.inner.events.on_renew(renewer);
        self
    }

    /// Start a session.
    ///
    /// Tokens missing from the arguments are resumed from storage. When no
    /// access token can be found, `empty` fires and the manager is left
    /// untouched. Lifecycle outcomes are reported through events; only a
    /// missing mandatory collaborator is returned as an error.
    #[instrument(skip_all, fields(remember = remember))]
    pub async fn set(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        remember: bool,
    ) -> WebAuthResult<()> {
        let inner = &self.inner;

        let resolved = match inner.resolve(access_token, refresh_token, remember) {
            Ok(resolved) => resolved,
            Err(e) => {
                let generation = inner.begin();
                inner.report(e, generation, SessionState::Faulted);
                return Ok(());
            }
        };

        // Nothing to start: the current session, if any, is left as is.
        let Some((access, refresh, mode)) = resolved else {
            debug!("No access token to resume");
            inner.fire(Event::Empty);
            return Ok(());
        };

        let generation = inner.begin();
        if !inner.events.has_verifier() {
            inner.halt(generation, SessionState::Faulted);
            return Err(ConfigurationError::MissingHandler { event: "verify" }.into());
        }

        let access_expiration = match decode_expiration(&access) {
            Ok(expiration) => expiration,
            Err(e) => {
                warn!(token = %TokenKind::AccessToken, error = %e, "Rejecting malformed token");
                inner.report(e, generation, SessionState::Faulted);
                return Ok(());
            }
        };
        if let Some(refresh) = refresh.as_deref() {
            if let Err(e) = decode_expiration(refresh) {
                warn!(token = %TokenKind::RefreshToken, error = %e, "Rejecting malformed token");
                inner.report(e, generation, SessionState::Faulted);
                return Ok(());
            }
        }

        if let Err(e) = inner.persist(mode, &access, refresh.as_deref()) {
            inner.report(e, generation, SessionState::Faulted);
            return Ok(());
        }
        {
            let mut lifecycle = inner.lifecycle.lock();
            lifecycle.mode = mode;
            lifecycle.ready_fired = false;
            lifecycle.load_fired = false;
            lifecycle.access_expiry_notified = false;
        }
        info!(mode = ?mode, has_refresh = refresh.is_some(), "Session tokens stored");

        let first = if inner.is_expired(&access_expiration) {
            debug!("Access token expired at entry");
            inner.notify_access_expired(generation);
            if refresh.is_none() {
                inner.halt(generation, SessionState::Expired);
                return Ok(());
            }
            Some(WakeUp::renew_now())
        } else {
            match inner
                .verify_step(&access, refresh.as_deref(), generation)
                .await
            {
                Ok(next) => next,
                Err(e) => {
                    inner.halt(generation, SessionState::Faulted);
                    return Err(e);
                }
            }
        };

        match first {
            Some(next) => inner.run(next, generation).await,
            None => Ok(()),
        }
    }

    /// Alias of [`SessionManager::set`].
    pub async fn login(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        remember: bool,
    ) -> WebAuthResult<()> {
        self.set(access_token, refresh_token, remember).await
    }

    /// Resume the session persisted by a previous login.
    pub async fn resume(&self) -> WebAuthResult<()> {
        self.set(None, None, false).await
    }

    /// Start the observer on the stored tokens.
    #[instrument(skip_all)]
    pub async fn observer(&self) -> WebAuthResult<()> {
        let generation = self.inner.begin();
        self.inner
            .run(WakeUp::observe(Duration::ZERO), generation)
            .await
    }

    /// Force a renewal regardless of current validity, then resume observing.
    #[instrument(skip_all)]
    pub async fn renew(&self) -> WebAuthResult<()> {
        let generation = self.inner.begin();
        self.inner.run(WakeUp::renew_now(), generation).await
    }

    /// Terminate the session and remove both tokens from both stores.
    ///
    /// Idempotent: `logout` fires only for the first call.
    #[instrument(skip_all)]
    pub fn logout(&self) {
        let was_stopped = {
            let mut driver = self.inner.driver.lock();
            if let Some(handle) = driver.take() {
                handle.abort();
            }
            let mut lifecycle = self.inner.lifecycle.lock();
            lifecycle.generation += 1;
            lifecycle.running = false;
            lifecycle.attempt = 0;
            let was_stopped = lifecycle.state == SessionState::Stopped;
            lifecycle.state = SessionState::Stopped;
            was_stopped
        };

        if let Err(e) = self.inner.storage.clean(&self.inner.config.keys) {
            warn!(error = %e, "Failed to clean session storage");
            self.inner.fire(Event::error(e));
        }

        if !was_stopped {
            info!("Session stopped");
            self.inner.fire(Event::Logout);
        }
    }

    /// Alias of [`SessionManager::logout`].
    pub fn stop(&self) {
        self.logout()
    }

    /// Remove both tokens from both stores without stopping the session.
    pub fn clean(&self) -> WebAuthResult<()> {
        Ok(self.inner.storage.clean(&self.inner.config.keys)?)
    }

    /// Stored access token.
    pub fn access_token(&self) -> WebAuthResult<Option<String>> {
        self.stored(TokenKind::AccessToken)
    }

    /// Stored refresh token.
    pub fn refresh_token(&self) -> WebAuthResult<Option<String>> {
        self.stored(TokenKind::RefreshToken)
    }

    /// Decoded payload of a stored token.
    pub fn payload(&self, kind: TokenKind) -> WebAuthResult<Option<Payload>> {
        match self.stored(kind)? {
            Some(token) => Ok(Some(decode(&token)?)),
            None => Ok(None),
        }
    }

    /// Expiration of a stored token.
    pub fn expiration(&self, kind: TokenKind) -> WebAuthResult<Option<Expiration>> {
        match self.stored(kind)? {
            Some(token) => Ok(Some(decode_expiration(&token)?)),
            None => Ok(None),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lifecycle.lock().state
    }

    pub fn is_running(&self) -> bool {
        self.inner.lifecycle.lock().running
    }

    pub fn storage_mode(&self) -> StorageMode {
        self.inner.lifecycle.lock().mode
    }

    /// Current renewal attempt, zero outside renewal.
    pub fn attempt(&self) -> u32 {
        self.inner.lifecycle.lock().attempt
    }

    pub fn config(&self) -> &WebAuthConfig {
        &self.inner.config
    }

    pub fn events(&self) -> &EventHub {
        &self.inner.events
    }

    fn stored(&self, kind: TokenKind) -> WebAuthResult<Option<String>> {
        let key = self.inner.key(kind);
        Ok(self.inner.storage.read_current(key)?)
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let lifecycle = self.inner.lifecycle.lock();
        f.debug_struct("SessionManager")
            .field("state", &lifecycle.state)
            .field("running", &lifecycle.running)
            .field("mode", &lifecycle.mode)
            .field("attempt", &lifecycle.attempt)
            .finish_non_exhaustive()
    }
}

impl Inner {
    fn key(&self, kind: TokenKind) -> &str {
        match kind {
            TokenKind::AccessToken => &self.config.keys.access_token,
            TokenKind::RefreshToken => &self.config.keys.refresh_token,
        }
    }

    fn observer_interval(&self) -> Duration {
        self.config.observer_interval.max(MIN_OBSERVER_INTERVAL)
    }

    fn is_expired(&self, expiration: &Expiration) -> bool {
        expiration.is_expired(self.clock.now_ms(), self.config.delay_ms())
    }

    fn fire(&self, event: Event) {
        self.events.fire(&event);
    }

    /// Cancel the pending wake-up and open a new generation.
    fn begin(&self) -> u64 {
        let mut driver = self.driver.lock();
        if let Some(handle) = driver.take() {
            handle.abort();
        }
        let mut lifecycle = self.lifecycle.lock();
        lifecycle.generation += 1;
        lifecycle.running = true;
        lifecycle.attempt = 0;
        lifecycle.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        let lifecycle = self.lifecycle.lock();
        lifecycle.running && lifecycle.generation == generation
    }

    fn set_state(&self, generation: u64, state: SessionState) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation == generation {
            lifecycle.state = state;
        }
    }

    /// Stop scheduling and settle in `state`.
    fn halt(&self, generation: u64, state: SessionState) {
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation == generation {
            if state.is_terminal() {
                info!(state = %state, "Session halted");
            } else {
                debug!(state = %state, "Session halted");
            }
            lifecycle.state = state;
            lifecycle.running = false;
            lifecycle.attempt = 0;
        }
    }

    /// Fire `error` and halt.
    fn report(&self, error: impl Into<WebAuthError>, generation: u64, state: SessionState) {
        let error = error.into();
        warn!(code = error.error_code(), error = %error, "Session fault");
        self.halt(generation, state);
        self.fire(Event::error(error));
    }

    /// Store currently holding the access token.
    ///
    /// Another context sharing the stores may have moved the session since
    /// the last pass.
    fn current_mode(&self, generation: u64) -> Result<StorageMode, StorageError> {
        let mode = self.storage.select_store(&self.config.keys.access_token)?;
        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.generation == generation && lifecycle.mode != mode {
            debug!(from = ?lifecycle.mode, to = ?mode, "Session moved to another store");
            lifecycle.mode = mode;
        }
        Ok(mode)
    }

    /// Resolve tokens and store for a new entry.
    ///
    /// Explicit tokens go to the store picked by `remember`. Otherwise the
    /// access token is resumed from whichever store holds it, regardless of
    /// `remember`, and the refresh token from the argument or that same store.
    fn resolve(
        &self,
        access_token: Option<&str>,
        refresh_token: Option<&str>,
        remember: bool,
    ) -> Result<Option<(String, Option<String>, StorageMode)>, StorageError> {
        let refresh_token = refresh_token.filter(|t| !t.is_empty()).map(String::from);

        if let Some(access) = access_token.filter(|t| !t.is_empty()) {
            let mode = StorageMode::from_remember(remember);
            return Ok(Some((access.to_string(), refresh_token, mode)));
        }

        let mode = self.storage.select_store(&self.config.keys.access_token)?;
        let Some(access) = self.storage.read(mode, &self.config.keys.access_token)? else {
            return Ok(None);
        };
        let refresh = match refresh_token {
            Some(refresh) => Some(refresh),
            None => self.storage.read(mode, &self.config.keys.refresh_token)?,
        };
        Ok(Some((access, refresh, mode)))
    }

    /// Write both tokens to `mode`, leaving no copy in the other store.
    fn persist(
        &self,
        mode: StorageMode,
        access: &str,
        refresh: Option<&str>,
    ) -> Result<(), StorageError> {
        self.storage.clean(&self.config.keys)?;
        self.storage
            .write(mode, &self.config.keys.access_token, access)?;
        if let Some(refresh) = refresh {
            self.storage
                .write(mode, &self.config.keys.refresh_token, refresh)?;
        }
        Ok(())
    }

    fn notify_access_expired(&self, generation: u64) {
        let notify = {
            let mut lifecycle = self.lifecycle.lock();
            let notify = lifecycle.generation == generation && !lifecycle.access_expiry_notified;
            if notify {
                lifecycle.access_expiry_notified = true;
            }
            notify
        };
        if notify {
            self.fire(Event::Expired(TokenKind::AccessToken));
        }
    }

    fn mark_ready(&self, generation: u64) {
        let fire_ready = {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.generation != generation {
                return;
            }
            lifecycle.state = SessionState::Ready;
            !std::mem::replace(&mut lifecycle.ready_fired, true)
        };
        if fire_ready {
            self.fire(Event::Ready);
        }
    }

    fn mark_loaded(&self, generation: u64) {
        let fire_load = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.generation == generation
                && !std::mem::replace(&mut lifecycle.load_fired, true)
        };
        if fire_load {
            self.fire(Event::Load);
        }
    }

    /// Run steps inline until the first non-zero wait, then hand over to the
    /// driver.
    async fn run(self: &Arc<Self>, mut next: WakeUp, generation: u64) -> WebAuthResult<()> {
        loop {
            if !self.is_current(generation) {
                return Ok(());
            }
            if !next.after.is_zero() {
                self.install(next, generation);
                return Ok(());
            }
            match self.step(next, generation).await {
                Ok(Some(wake)) => next = wake,
                Ok(None) => return Ok(()),
                Err(e) => {
                    self.halt(generation, SessionState::Faulted);
                    return Err(e);
                }
            }
        }
    }

    /// Replace the pending wake-up.
    fn install(self: &Arc<Self>, next: WakeUp, generation: u64) {
        let mut driver = self.driver.lock();
        if !self.is_current(generation) {
            return;
        }
        debug!(
            step = ?next.step,
            after_ms = next.after.as_millis() as u64,
            attempt = next.attempt,
            "Scheduling wake-up"
        );
        let handle = tokio::spawn(Self::drive(Arc::downgrade(self), next, generation));
        if let Some(previous) = driver.replace(handle) {
            previous.abort();
        }
    }

    /// Background driver. Holds only a weak handle so dropping the last
    /// manager ends the session.
    async fn drive(inner: Weak<Self>, mut next: WakeUp, generation: u64) {
        loop {
            tokio::time::sleep(next.after).await;

            let Some(inner) = inner.upgrade() else {
                return;
            };
            if !inner.is_current(generation) {
                return;
            }

            match inner.step(next, generation).await {
                Ok(Some(wake)) => next = wake,
                Ok(None) => return,
                Err(e) => {
                    inner.report(e, generation, SessionState::Faulted);
                    return;
                }
            }
        }
    }

    async fn step(&self, wake: WakeUp, generation: u64) -> WebAuthResult<Option<WakeUp>> {
        match wake.step {
            Step::Observe => Ok(self.observe_step(generation)),
            Step::Renew => self.renew_step(wake.attempt, generation).await,
        }
    }

    async fn verify_step(
        &self,
        access: &str,
        refresh: Option<&str>,
        generation: u64,
    ) -> WebAuthResult<Option<WakeUp>> {
        self.set_state(generation, SessionState::Verifying);
        let context = SessionContext::new(access, refresh, self.events.clone());
        let outcome = self.events.verify(context).await;

        if !self.is_current(generation) {
            return Ok(None);
        }

        match outcome {
            Ok(true) => {
                info!("Session verified");
                self.mark_ready(generation);
                Ok(Some(WakeUp::observe(Duration::ZERO)))
            }
            Ok(false) => {
                debug!("Verifier rejected session");
                self.notify_access_expired(generation);
                if refresh.is_some() {
                    self.set_state(generation, SessionState::Renewing);
                    Ok(Some(WakeUp::renew_now()))
                } else {
                    self.halt(generation, SessionState::Expired);
                    Ok(None)
                }
            }
            Err(e) if e.is_configuration() => Err(e),
            Err(e) => {
                warn!(error = %e, "Verification fault");
                self.fire(Event::error(e));
                if refresh.is_some() {
                    self.set_state(generation, SessionState::Renewing);
                    Ok(Some(WakeUp::renew_now()))
                } else {
                    self.halt(generation, SessionState::Faulted);
                    Ok(None)
                }
            }
        }
    }

    /// One observer pass over the stored access token.
    fn observe_step(&self, generation: u64) -> Option<WakeUp> {
        let access = self.current_mode(generation).and_then(|mode| {
            Ok((mode, self.storage.read(mode, &self.config.keys.access_token)?))
        });
        let (mode, access) = match access {
            Ok(access) => access,
            Err(e) => {
                self.report(e, generation, SessionState::Faulted);
                return None;
            }
        };
        let Some(access) = access else {
            debug!("Access token no longer stored");
            self.halt(generation, SessionState::Empty);
            self.fire(Event::Empty);
            return None;
        };

        let expiration = match decode_expiration(&access) {
            Ok(expiration) => expiration,
            Err(e) => {
                self.report(e, generation, SessionState::Faulted);
                return None;
            }
        };

        if !self.is_expired(&expiration) {
            self.mark_ready(generation);
            self.mark_loaded(generation);
            return Some(WakeUp::observe(self.observer_interval()));
        }

        let has_refresh = match self.storage.read(mode, &self.config.keys.refresh_token) {
            Ok(refresh) => refresh.is_some(),
            Err(e) => {
                self.report(e, generation, SessionState::Faulted);
                return None;
            }
        };

        if has_refresh {
            debug!("Access token expired, renewing");
            self.set_state(generation, SessionState::Renewing);
            Some(WakeUp::renew_now())
        } else {
            info!("Access token expired without refresh token");
            self.notify_access_expired(generation);
            self.halt(generation, SessionState::Expired);
            None
        }
    }

    /// One renewal attempt.
    async fn renew_step(&self, attempt: u32, generation: u64) -> WebAuthResult<Option<WakeUp>> {
        {
            let mut lifecycle = self.lifecycle.lock();
            if lifecycle.generation == generation {
                lifecycle.state = SessionState::Renewing;
                lifecycle.attempt = attempt;
            }
        }
        let keys = &self.config.keys;

        let tokens = self.current_mode(generation).and_then(|mode| {
            let access = self.storage.read(mode, &keys.access_token)?;
            Ok((mode, access, self.storage.read(mode, &keys.refresh_token)?))
        });
        let (mode, access, refresh) = match tokens {
            Ok(tokens) => tokens,
            Err(e) => {
                self.report(e, generation, SessionState::Faulted);
                return Ok(None);
            }
        };
        let Some(access) = access else {
            debug!("Access token no longer stored");
            self.halt(generation, SessionState::Empty);
            self.fire(Event::Empty);
            return Ok(None);
        };
        let Some(refresh) = refresh else {
            self.report(RenewalFault::NoRefreshToken, generation, SessionState::Faulted);
            return Ok(None);
        };

        match decode_expiration(&refresh) {
            Ok(expiration) if self.is_expired(&expiration) => {
                info!("Refresh token expired");
                self.halt(generation, SessionState::Expired);
                self.fire(Event::Expired(TokenKind::RefreshToken));
                return Ok(None);
            }
            Ok(_) => {}
            Err(e) => {
                self.report(e, generation, SessionState::Faulted);
                return Ok(None);
            }
        }

        debug!(attempt, "Requesting new access token");
        let context = SessionContext::new(&access, Some(&refresh), self.events.clone());
        let outcome = self.events.renew(context).await;

        if !self.is_current(generation) {
            return Ok(None);
        }

        let fault: WebAuthError = match outcome {
            Ok(token) => match decode_expiration(&token) {
                Ok(_) => match self.storage.write(mode, &keys.access_token, &token) {
                    Ok(()) => {
                        info!(attempt, "Access token renewed");
                        {
                            let mut lifecycle = self.lifecycle.lock();
                            if lifecycle.generation == generation {
                                lifecycle.state = SessionState::Ready;
                                lifecycle.attempt = 0;
                                lifecycle.access_expiry_notified = false;
                            }
                        }
                        self.fire(Event::Renewed);
                        return Ok(Some(WakeUp::observe(self.observer_interval())));
                    }
                    Err(e) => e.into(),
                },
                Err(e) => RenewalFault::InvalidToken(e).into(),
            },
            Err(e) if e.is_configuration() => return Err(e),
            Err(e) => e,
        };

        warn!(attempt, max_attempts = self.config.attempts, error = %fault, "Renewal attempt failed");

        if attempt >= self.config.attempts {
            let exhausted = RenewalFault::Exhausted {
                attempts: attempt,
                last_error: fault.to_string(),
            };
            self.report(exhausted, generation, SessionState::Faulted);
            return Ok(None);
        }

        if attempt == 1 {
            self.notify_access_expired(generation);
        }
        Ok(Some(WakeUp::renew(
            attempt + 1,
            self.config.backoff_for(attempt),
        )))
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = self.driver.get_mut().take() {
            handle.abort();
        }
    }
}
