use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{AuthService, Session, SessionCallback, SessionEvent, SessionListeners, SessionUser, Subscription};
use crate::backend::{check_response, Backend};
use crate::error::AdminError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    #[serde(default)]
    user: Option<SessionUser>,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        let explicit_expiry = self
            .expires_at
            .and_then(|at| DateTime::from_timestamp(at, 0))
            .or_else(|| self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)));

        let mut session = Session::new(self.access_token, self.refresh_token);
        if let Some(at) = explicit_expiry {
            session = session.with_expiry(at);
        }
        if let Some(user) = self.user {
            session = session.with_user(user);
        }
        session
    }
}

/// Password auth against the backend's token endpoint (`/auth/v1/token`)
#[derive(Clone)]
pub struct RestAuth {
    backend: Backend,
    listeners: SessionListeners,
}

impl RestAuth {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            listeners: SessionListeners::new(),
        }
    }

    /// Adopt a previously issued session (e.g. one persisted by the CLI)
    pub fn restore(&self, session: Session) {
        self.backend.set_session(Some(session.clone()));
        self.listeners.notify(SessionEvent::SignedIn, Some(&session));
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    async fn request_token(&self, grant_type: &str, body: Value) -> Result<Session, AdminError> {
        let url = self.backend.endpoint().auth_url("token");
        let request = self
            .backend
            .http()
            .post(url)
            .query(&[("grant_type", grant_type)])
            .header("apikey", &self.backend.endpoint().anon_key)
            .json(&body);

        let response = check_response(request.send().await?).await?;
        Ok(response.json::<TokenResponse>().await?.into_session())
    }

    fn replace_session(&self, event: SessionEvent, session: Option<Session>) {
        self.backend.set_session(session.clone());
        self.listeners.notify(event, session.as_ref());
    }
}

#[async_trait]
impl AuthService for RestAuth {
    async fn current_session(&self) -> Result<Option<Session>, AdminError> {
        let session = match self.backend.session() {
            None => return Ok(None),
            Some(session) if !session.is_expired() => return Ok(Some(session)),
            Some(session) => session,
        };

        let Some(refresh_token) = session.refresh_token.clone() else {
            info!("session expired without a refresh token");
            self.replace_session(SessionEvent::SignedOut, None);
            return Ok(None);
        };

        match self.request_token("refresh_token", json!({ "refresh_token": refresh_token })).await {
            Ok(refreshed) => {
                info!("session token refreshed");
                self.replace_session(SessionEvent::TokenRefreshed, Some(refreshed.clone()));
                Ok(Some(refreshed))
            }
            // Unreachable backend: keep the stored session so a later call can retry the refresh
            Err(e) if e.is_transient() => {
                warn!("session refresh could not reach the backend: {}", e);
                Err(e)
            }
            Err(e) => {
                warn!("session refresh rejected: {}", e);
                self.replace_session(SessionEvent::SignedOut, None);
                Err(e)
            }
        }
    }

    fn on_session_change(&self, callback: SessionCallback) -> Subscription {
        self.listeners.subscribe(callback)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Session, AdminError> {
        let missing: Vec<String> = [("email", email), ("password", password)]
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(field, _)| field.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(AdminError::validation("Email and password are required", missing));
        }

        let session = self
            .request_token("password", json!({ "email": email, "password": password }))
            .await?;
        info!("signed in as {}", session.email().unwrap_or(email));
        self.replace_session(SessionEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AdminError> {
        if self.backend.session().is_some() {
            let url = self.backend.endpoint().auth_url("logout");
            let request = self.backend.authorize(self.backend.http().post(url));
            // The local session is dropped even when the backend call fails
            match request.send().await.map_err(AdminError::from) {
                Ok(response) => {
                    if let Err(e) = check_response(response).await {
                        warn!("remote sign-out failed: {}", e);
                    }
                }
                Err(e) => warn!("remote sign-out failed: {}", e),
            }
        }
        self.replace_session(SessionEvent::SignedOut, None);
        info!("signed out");
        Ok(())
    }
}
