//! Login sessions.
//!
//! A [`Session`] is an explicit value: created by [`SessionManager::login`],
//! passed to whoever needs the bearer token or client id, and destroyed by
//! [`SessionManager::logout`]. It is persisted in the key-value store so that
//! a later invocation can [`restore`](SessionManager::restore) it.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{info, instrument};

use resto_core::{ClientId, Role};

use crate::gateway::{GatewayClient, GatewayError};
use crate::store::{KeyValueStore, StoreError, keys};

/// Errors that can occur while managing a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Username or password left blank.
    #[error("Username and password are required")]
    MissingCredentials,

    /// The auth service rejected the credentials.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// No session is stored.
    #[error("Not logged in")]
    NotLoggedIn,

    /// The operation needs another role.
    #[error("This operation requires the {required} role (logged in as {actual})")]
    WrongRole { required: Role, actual: Role },

    /// The session carries no client identity.
    #[error("Session has no client id")]
    MissingClientId,

    /// The stored session cannot be decoded.
    #[error("Stored session is corrupt: {0}")]
    Corrupt(String),

    /// Gateway call failed.
    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// An authenticated session.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct Session {
    username: String,
    role: Role,
    token: SecretString,
    client_id: Option<ClientId>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .field("client_id", &self.client_id)
            .finish()
    }
}

impl Session {
    /// Build a session from its parts.
    #[must_use]
    pub const fn new(
        username: String,
        role: Role,
        token: SecretString,
        client_id: Option<ClientId>,
    ) -> Self {
        Self {
            username,
            role,
            token,
            client_id,
        }
    }

    /// Login name.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Granted role.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.role
    }

    /// Bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// Client identity, if the user is a client of the platform.
    #[must_use]
    pub const fn client_id(&self) -> Option<&ClientId> {
        self.client_id.as_ref()
    }

    /// Fail unless the session has `required` role.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::WrongRole`] on mismatch.
    pub fn require_role(&self, required: Role) -> Result<(), SessionError> {
        if self.role == required {
            Ok(())
        } else {
            Err(SessionError::WrongRole {
                required,
                actual: self.role,
            })
        }
    }

    /// The session's client id.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingClientId`] when the login carried none.
    pub fn require_client_id(&self) -> Result<&ClientId, SessionError> {
        self.client_id.as_ref().ok_or(SessionError::MissingClientId)
    }
}

/// Creates, persists, restores and clears sessions.
pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
}

impl SessionManager {
    /// Create a manager persisting to `store`.
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Log in through the gateway and persist the resulting session.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::MissingCredentials`] for blank input (no
    /// request is sent), [`SessionError::InvalidCredentials`] when the auth
    /// service answers 401, or the underlying gateway/store error.
    #[instrument(skip(self, gateway, password))]
    pub async fn login(
        &self,
        gateway: &GatewayClient,
        username: &str,
        password: SecretString,
    ) -> Result<Session, SessionError> {
        let username = username.trim();
        if username.is_empty() || password.expose_secret().trim().is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let response = gateway
            .login(username, &password)
            .await
            .map_err(|e| match e {
                GatewayError::Unauthorized(_) => SessionError::InvalidCredentials,
                other => SessionError::Gateway(other),
            })?;

        if response.token.is_empty() {
            return Err(SessionError::InvalidCredentials);
        }

        let session = Session::new(
            username.to_owned(),
            response.role,
            SecretString::from(response.token),
            response.client_id,
        );
        self.persist(&session)?;

        info!(role = %session.role, "Logged in");
        Ok(session)
    }

    /// Load the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Corrupt`] when the stored values cannot be
    /// decoded, or the store error.
    pub fn restore(&self) -> Result<Option<Session>, SessionError> {
        let Some(token) = self.store.get(keys::TOKEN)? else {
            return Ok(None);
        };
        let role = self
            .store
            .get(keys::ROLE)?
            .ok_or_else(|| SessionError::Corrupt("missing role".to_string()))?
            .parse::<Role>()
            .map_err(SessionError::Corrupt)?;
        let username = self.store.get(keys::USERNAME)?.unwrap_or_default();
        let client_id = self
            .store
            .get(keys::CLIENT_ID)?
            .map(|raw| ClientId::parse(&raw))
            .transpose()
            .map_err(|e| SessionError::Corrupt(e.to_string()))?;

        Ok(Some(Session::new(
            username,
            role,
            SecretString::from(token),
            client_id,
        )))
    }

    /// Load the stored session or fail.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotLoggedIn`] when no session is stored.
    pub fn current(&self) -> Result<Session, SessionError> {
        self.restore()?.ok_or(SessionError::NotLoggedIn)
    }

    /// Forget the session and the cached agent id.
    ///
    /// The cached agent is tied to the logged-in client; keeping it would let
    /// the next user's fast path adopt someone else's agent.
    ///
    /// # Errors
    ///
    /// Returns the store error.
    pub fn logout(&self) -> Result<(), SessionError> {
        for key in [
            keys::TOKEN,
            keys::ROLE,
            keys::USERNAME,
            keys::CLIENT_ID,
            keys::AGENT_ID,
        ] {
            self.store.remove(key)?;
        }
        info!("Logged out");
        Ok(())
    }

    fn persist(&self, session: &Session) -> Result<(), SessionError> {
        self.store.set(keys::TOKEN, session.token.expose_secret())?;
        self.store.set(keys::ROLE, &session.role.to_string())?;
        self.store.set(keys::USERNAME, &session.username)?;
        match &session.client_id {
            Some(client_id) => self.store.set(keys::CLIENT_ID, client_id.as_str())?,
            None => self.store.remove(keys::CLIENT_ID)?,
        }
        Ok(())
    }
}
