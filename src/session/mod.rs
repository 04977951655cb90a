//! Client-held session: the bearer token plus profile fields from login.
//!
//! Consumers receive a [`SessionStore`] instead of reading storage directly,
//! so the login/logout lifecycle is explicit and testable.

mod keyring_store;

pub use keyring_store::KeyringSessionStore;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::auth::{self, Claims, Role};

/// A logged-in session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub token: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub user_id: Option<i64>,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            username: None,
            role: None,
            user_id: None,
        }
    }

    /// Claims decoded from the token, recomputed on every call.
    pub fn claims(&self) -> Option<Claims> {
        auth::parse(&self.token)
    }

    /// Role from the token claims. The stored `role` field is informational.
    pub fn role(&self) -> Option<Role> {
        self.claims().and_then(|claims| claims.role)
    }

    /// User id from the profile, falling back to the token claims.
    pub fn resolved_user_id(&self) -> Option<i64> {
        self.user_id
            .or_else(|| self.claims().and_then(|claims| claims.resolved_user_id()))
    }

    /// Username from the profile, falling back to the token claims.
    pub fn display_name(&self) -> Option<String> {
        self.username.clone().or_else(|| {
            self.claims()
                .and_then(|claims| claims.display_name().map(str::to_string))
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionStoreError {
    #[error("Token store unavailable: {0}")]
    Unavailable(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Crypto error: {0}")]
    Crypto(String),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Profile encode error: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("App dir error: {0}")]
    AppDir(#[from] crate::app_dirs::AppDirError),
}

/// Where the session lives between invocations.
pub trait SessionStore: Send + Sync {
    /// Current session, or `None` when logged out or unreadable.
    fn get(&self) -> Option<Session>;
    /// Replace the stored session.
    fn set(&self, session: Session) -> Result<(), SessionStoreError>;
    /// Forget the session.
    fn clear(&self) -> Result<(), SessionStoreError>;

    /// Raw bearer token of the current session.
    fn token(&self) -> Option<String> {
        self.get().map(|session| session.token)
    }
}

/// In-process store, used by tests and embedders without persistent storage.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session: Session) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Option<Session> {
        self.session
            .lock()
            .unwrap_or_else(|err| err.into_inner())
            .clone()
    }

    fn set(&self, session: Session) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap_or_else(|err| err.into_inner()) = Some(session);
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionStoreError> {
        *self.session.lock().unwrap_or_else(|err| err.into_inner()) = None;
        Ok(())
    }
}
