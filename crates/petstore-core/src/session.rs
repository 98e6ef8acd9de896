//! Authentication state machine.
//!
//! Two states: [`SessionState::Unauthenticated`] and
//! [`SessionState::Authenticated`]. Credentials are checked against a fixed
//! configured pair when one exists, otherwise against the remote login
//! endpoint. Every transition is written through to the [`KeyValueStore`] so
//! the next process start restores it.

use crate::api::PetstoreApi;
use crate::config::{FixedCredentials, StorageKeys, UiConfig};
use crate::models::{NewUser, SignupRequest};
use crate::storage::KeyValueStore;
use crate::{PetstoreError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Current authentication state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { token: String, username: String },
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated { .. })
    }
}

/// Owns the session for one running client.
pub struct SessionManager {
    credentials: Option<FixedCredentials>,
    api: PetstoreApi,
    store: Arc<dyn KeyValueStore>,
    state: SessionState,
}

impl SessionManager {
    /// Create a manager, restoring any session persisted in `store`.
    ///
    /// A session is restored only when both token and username are present.
    pub fn new(
        credentials: Option<FixedCredentials>,
        api: PetstoreApi,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let state = match (read(&*store, StorageKeys::TOKEN), read(&*store, StorageKeys::USERNAME)) {
            (Some(token), Some(username)) => SessionState::Authenticated { token, username },
            _ => SessionState::Unauthenticated,
        };
        Self {
            credentials,
            api,
            store,
            state,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Bearer token of the current session.
    pub fn token(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { token, .. } => Some(token),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn username(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { username, .. } => Some(username),
            SessionState::Unauthenticated => None,
        }
    }

    /// Whether a fixed credential pair replaces remote login and sign-up.
    pub fn is_fixed_credential_mode(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn api(&self) -> &PetstoreApi {
        &self.api
    }

    /// Authenticate with a username and password.
    ///
    /// In fixed-credential mode the pair must match exactly (case-sensitive);
    /// a mismatch leaves the state unchanged. Otherwise the remote login
    /// endpoint decides and its error is propagated as-is.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        let token = match &self.credentials {
            Some(fixed) => {
                if username != fixed.username || password != fixed.password {
                    warn!("Rejected login for {} against fixed credentials", username);
                    return Err(PetstoreError::InvalidCredentials);
                }
                UiConfig::LOCAL_SESSION_TOKEN.to_string()
            }
            None => self.api.login(username, password).await?.token,
        };

        self.transition(SessionState::Authenticated {
            token,
            username: username.to_string(),
        });
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Create a remote account, then log in with it.
    ///
    /// Unavailable in fixed-credential mode.
    pub async fn signup(&mut self, request: &SignupRequest) -> Result<()> {
        if self.is_fixed_credential_mode() {
            return Err(PetstoreError::SignupUnavailable);
        }
        self.api.create_user(&NewUser::from_signup(request)).await?;
        info!("Created account {}", request.username);
        self.login(&request.username, &request.password).await
    }

    /// Drop the session unconditionally.
    ///
    /// Cached reads are dropped too; they were fetched with this session's token.
    pub fn logout(&mut self) {
        if let Some(username) = self.username() {
            info!("Logging out {}", username);
        }
        self.api.http().clear_cache();
        self.transition(SessionState::Unauthenticated);
    }

    fn transition(&mut self, next: SessionState) {
        let (token, username) = match &next {
            SessionState::Authenticated { token, username } => {
                (Some(token.as_str()), Some(username.as_str()))
            }
            SessionState::Unauthenticated => (None, None),
        };
        for (key, value) in [(StorageKeys::TOKEN, token), (StorageKeys::USERNAME, username)] {
            if let Err(e) = self.store.put(key, value) {
                warn!("Failed to persist session key {}: {}", key, e);
            }
        }
        self.state = next;
    }
}

fn read(store: &dyn KeyValueStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!("Failed to read session key {}: {}", key, e);
            None
        }
    }
}
