pub mod claims;
pub mod listeners;
pub mod rest;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AdminError;

pub use listeners::{SessionCallback, SessionListeners, Subscription};
pub use rest::RestAuth;

/// Identity attached to a session by the auth service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Proof of authenticated identity issued by the remote auth service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<SessionUser>,
}

impl Session {
    /// Build from raw tokens; expiry is read from the access token's `exp` claim when present
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        let access_token = access_token.into();
        let expires_at = claims::expiry(&access_token);
        Self {
            access_token,
            refresh_token,
            expires_at,
            user: None,
        }
    }

    pub fn with_expiry(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn with_user(mut self, user: SessionUser) -> Self {
        self.user = Some(user);
        self
    }

    pub fn email(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.email.as_deref())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Why a session-change notification fired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    SignedIn,
    SignedOut,
    TokenRefreshed,
}

/// The remote auth service as seen by the session layer
#[async_trait]
pub trait AuthService: Send + Sync {
    /// The current session, if any. Expired sessions are refreshed or reported as absent.
    async fn current_session(&self) -> Result<Option<Session>, AdminError>;

    /// Register a callback fired on every session change. Dropping the returned
    /// subscription unregisters it.
    fn on_session_change(&self, callback: SessionCallback) -> Subscription;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdminError>;

    async fn sign_out(&self) -> Result<(), AdminError>;
}
