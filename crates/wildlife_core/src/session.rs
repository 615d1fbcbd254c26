//! crates/wildlife_core/src/session.rs
//!
//! Owns the bearer token and the authenticated user for the lifetime of the client.
//!
//! Every transition bumps an epoch. A restore remembers the epoch it started
//! under and drops its outcome if the session has moved on in the meantime. A
//! login is only overtaken by logout or a newer login, and no restore starts
//! while one is pending. A 401 ends the session only if the rejected token is
//! still the one in use.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::{BearerToken, Credentials, NewAccount, UserSummary};
use crate::failure::{Failure, Operation};
use crate::ports::{AuthApi, PortError, PortResult, TokenDecoder, TokenStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Anonymous,
    /// A stored token is being confirmed with the server.
    Restoring,
    Authenticated,
}

/// What presentation sees: `(authenticated, user, error)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<UserSummary>,
    pub failure: Option<Failure>,
}

impl SessionSnapshot {
    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated
    }
}

struct ActiveToken {
    token: BearerToken,
    expires_at: DateTime<Utc>,
}

struct SessionState {
    epoch: u64,
    phase: SessionPhase,
    active: Option<ActiveToken>,
    user: Option<UserSummary>,
    failure: Option<Failure>,
    /// Epoch of the login waiting on the network, if any. Only logout or a
    /// newer login supersede it.
    pending_login: Option<u64>,
}

impl SessionState {
    fn anonymous() -> Self {
        Self {
            epoch: 0,
            phase: SessionPhase::Anonymous,
            active: None,
            user: None,
            failure: None,
            pending_login: None,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            user: self.user.clone(),
            failure: self.failure.clone(),
        }
    }

    fn reset(&mut self, failure: Option<Failure>) {
        self.epoch += 1;
        self.phase = SessionPhase::Anonymous;
        self.active = None;
        self.user = None;
        self.failure = failure;
    }
}

//=========================================================================================
// SessionManager
//=========================================================================================

pub struct SessionManager {
    auth: Arc<dyn AuthApi>,
    decoder: Arc<dyn TokenDecoder>,
    store: Arc<dyn TokenStore>,
    state: Mutex<SessionState>,
    published: watch::Sender<SessionSnapshot>,
}

impl SessionManager {
    pub fn new(
        auth: Arc<dyn AuthApi>,
        decoder: Arc<dyn TokenDecoder>,
        store: Arc<dyn TokenStore>,
    ) -> Self {
        let state = SessionState::anonymous();
        let (published, _) = watch::channel(state.snapshot());
        Self {
            auth,
            decoder,
            store,
            state: Mutex::new(state),
            published,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.published.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.published.subscribe()
    }

    fn publish(&self, state: &SessionState) {
        self.published.send_replace(state.snapshot());
    }

    fn discard_stored_token(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear the stored token");
        }
    }

    /// Start-up validation of a previously stored token.
    ///
    /// Expiry is checked locally first; an expired or undecodable token is
    /// discarded without any network call. Only an unexpired token is confirmed
    /// with the "who am I" call.
    pub async fn restore(&self) -> SessionSnapshot {
        let (epoch, token, expires_at) = {
            let mut state = self.state.lock().await;
            if state.phase != SessionPhase::Anonymous {
                debug!(phase = ?state.phase, "Session already established; skipping restore");
                return state.snapshot();
            }
            if state.pending_login.is_some() {
                debug!("Login in progress; skipping restore");
                return state.snapshot();
            }

            let stored = match self.store.load() {
                Ok(Some(stored)) => stored,
                Ok(None) => {
                    debug!("No stored token; starting anonymous");
                    return state.snapshot();
                }
                Err(e) => {
                    warn!(error = %e, "Could not read the stored token");
                    return state.snapshot();
                }
            };

            let decoded = match self.decoder.decode(&stored) {
                Ok(decoded) => decoded,
                Err(e) => {
                    warn!(error = %e, "Discarding a stored token that could not be decoded");
                    self.discard_stored_token();
                    return state.snapshot();
                }
            };

            if decoded.is_expired_at(Utc::now()) {
                info!(expired_at = %decoded.expires_at, "Discarding an expired stored token");
                self.discard_stored_token();
                return state.snapshot();
            }

            state.epoch += 1;
            state.phase = SessionPhase::Restoring;
            state.failure = None;
            self.publish(&state);
            (state.epoch, BearerToken::new(stored), decoded.expires_at)
        };

        info!("Confirming the stored session with the server");
        let result = self.auth.fetch_current_user(&token).await;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            debug!("Restore outcome discarded; the session changed while it was pending");
            return state.snapshot();
        }

        match result {
            Ok(user) => {
                info!(user_id = user.id, username = %user.username, "Session restored");
                state.phase = SessionPhase::Authenticated;
                state.active = Some(ActiveToken { token, expires_at });
                state.user = Some(user);
            }
            Err(e) => {
                warn!(error = %e, "Stored session was rejected; discarding the token");
                self.discard_stored_token();
                state.reset(None);
            }
        }
        self.publish(&state);
        state.snapshot()
    }

    /// Exchanges credentials for a token. Nothing is stored unless the whole
    /// exchange succeeds and the issued token decodes.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserSummary, Failure> {
        let epoch = {
            let mut state = self.state.lock().await;
            state.epoch += 1;
            if state.phase == SessionPhase::Restoring {
                debug!("Login supersedes the pending restore");
                state.phase = SessionPhase::Anonymous;
            }
            state.failure = None;
            state.pending_login = Some(state.epoch);
            self.publish(&state);
            state.epoch
        };

        info!(email = %credentials.email, "Logging in");
        let outcome = match self.auth.exchange_credentials(credentials).await {
            Ok(issued) => self
                .decoder
                .decode(issued.token.expose())
                .and_then(|decoded| {
                    if decoded.is_expired_at(Utc::now()) {
                        Err(PortError::Decode("issued token is already expired".to_string()))
                    } else {
                        Ok(decoded)
                    }
                })
                .map(|decoded| (issued, decoded)),
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        if state.pending_login != Some(epoch) {
            debug!("Login outcome discarded; a logout or a newer login overtook it");
            return Err(Failure::superseded());
        }
        state.pending_login = None;

        match outcome {
            Ok((issued, decoded)) => {
                if let Err(e) = self.store.save(issued.token.expose()) {
                    warn!(error = %e, "Could not persist the token; the session will not survive a restart");
                }
                info!(user_id = issued.user.id, username = %issued.user.username, "Logged in");
                state.phase = SessionPhase::Authenticated;
                state.active = Some(ActiveToken {
                    token: issued.token,
                    expires_at: decoded.expires_at,
                });
                state.user = Some(issued.user.clone());
                state.failure = None;
                self.publish(&state);
                Ok(issued.user)
            }
            Err(e) => {
                let failure = Failure::classify(Operation::Login, &e);
                warn!(error = %e, kind = ?failure.kind, "Login failed");
                state.failure = Some(failure.clone());
                self.publish(&state);
                Err(failure)
            }
        }
    }

    /// Creates an account. Does not log in and never touches session state.
    pub async fn register(&self, account: &NewAccount) -> Result<(), Failure> {
        info!(username = %account.username, email = %account.email, "Registering account");
        self.auth.create_account(account).await.map_err(|e| {
            let failure = Failure::classify(Operation::Register, &e);
            warn!(error = %e, kind = ?failure.kind, "Registration failed");
            failure
        })
    }

    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        self.discard_stored_token();
        state.reset(None);
        state.pending_login = None;
        self.publish(&state);
        info!("Logged out");
    }

    /// The bearer token for the next request, read atomically with the phase.
    /// `None` unless the session is authenticated and its token unexpired.
    pub async fn authorization(&self) -> Option<BearerToken> {
        self.authorize().await.1
    }

    async fn authorize(&self) -> (u64, Option<BearerToken>) {
        let mut state = self.state.lock().await;
        let expired = match (state.phase, &state.active) {
            (SessionPhase::Authenticated, Some(active)) => active.expires_at <= Utc::now(),
            _ => return (state.epoch, None),
        };

        if expired {
            info!("Token expired; ending the session");
            self.discard_stored_token();
            state.reset(Some(Failure::session_expired()));
            self.publish(&state);
            return (state.epoch, None);
        }

        let token = state.active.as_ref().map(|active| active.token.clone());
        (state.epoch, token)
    }

    /// Runs `call` with the current authorization. A 401 for a request that
    /// carried the still-current token ends the session.
    pub async fn authorized<T, F, Fut>(&self, call: F) -> PortResult<T>
    where
        F: FnOnce(Option<BearerToken>) -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        self.authorized_in_epoch(call).await.1
    }

    async fn authorized_in_epoch<T, F, Fut>(&self, call: F) -> (u64, PortResult<T>)
    where
        F: FnOnce(Option<BearerToken>) -> Fut,
        Fut: Future<Output = PortResult<T>>,
    {
        let (epoch, token) = self.authorize().await;
        let attached = token.clone();
        let result = call(token).await;
        if let (Some(rejected), Err(PortError::Unauthorized)) = (attached, &result) {
            self.invalidate(&rejected).await;
        }
        (epoch, result)
    }

    /// Ends the session if `rejected` is still the token in use. A 401 for a
    /// token that has since been replaced or dropped changes nothing.
    async fn invalidate(&self, rejected: &BearerToken) {
        let mut state = self.state.lock().await;
        let current = state.phase == SessionPhase::Authenticated
            && state.active.as_ref().is_some_and(|active| &active.token == rejected);
        if !current {
            debug!("Ignoring a 401 for a token no longer in use");
            return;
        }
        warn!("Server rejected the session token; logging out");
        self.discard_stored_token();
        state.reset(Some(Failure::session_expired()));
        self.publish(&state);
    }

    /// Re-reads the authenticated user from the server.
    pub async fn refresh_user(&self) -> Result<UserSummary, Failure> {
        let auth = Arc::clone(&self.auth);
        let (epoch, result) = self
            .authorized_in_epoch(move |token| async move {
                match token {
                    Some(token) => auth.fetch_current_user(&token).await,
                    None => Err(PortError::Unauthorized),
                }
            })
            .await;

        match result {
            Ok(user) => {
                let mut state = self.state.lock().await;
                if state.epoch == epoch && state.phase == SessionPhase::Authenticated {
                    state.user = Some(user.clone());
                    self.publish(&state);
                }
                Ok(user)
            }
            Err(e) => Err(Failure::classify(Operation::CurrentUser, &e)),
        }
    }
}
