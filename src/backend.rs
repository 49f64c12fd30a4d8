//! Shared HTTP plumbing for the hosted backend.
//!
//! A [`Backend`] is cloned into the table, auth and storage clients so they share
//! one connection pool and one session slot: whatever session the auth client
//! holds is the bearer used for table and storage requests.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::{RequestBuilder, Response};
use serde::Deserialize;

use crate::auth::Session;
use crate::error::AdminError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendEndpoint {
    pub url: String,
    pub anon_key: String,
}

impl BackendEndpoint {
    pub fn new(url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.into(),
        }
    }

    /// Validate `url` as an absolute http(s) URL before building the endpoint
    pub fn parse(url: &str, anon_key: impl Into<String>) -> Result<Self, AdminError> {
        let parsed = url::Url::parse(url.trim())
            .map_err(|e| AdminError::config(format!("Invalid backend URL '{}': {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AdminError::config(format!(
                "Backend URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }
        Ok(Self::new(parsed.as_str(), anon_key))
    }

    pub fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.url, table)
    }

    pub fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.url, path.trim_start_matches('/'))
    }

    pub fn storage_url(&self, path: &str) -> String {
        format!("{}/storage/v1/{}", self.url, path.trim_start_matches('/'))
    }
}

#[derive(Clone)]
pub struct Backend {
    http: reqwest::Client,
    endpoint: BackendEndpoint,
    session: Arc<RwLock<Option<Session>>>,
}

impl Backend {
    pub fn new(endpoint: BackendEndpoint, timeout: Duration) -> Result<Self, AdminError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AdminError::config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            endpoint,
            session: Arc::new(RwLock::new(None)),
        })
    }

    pub fn endpoint(&self) -> &BackendEndpoint {
        &self.endpoint
    }

    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Attach the api key and the bearer: the session token when signed in, else the anon key
    pub fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let bearer = self
            .session()
            .map(|s| s.access_token)
            .unwrap_or_else(|| self.endpoint.anon_key.clone());
        request
            .header("apikey", &self.endpoint.anon_key)
            .bearer_auth(bearer)
    }

    pub fn session(&self) -> Option<Session> {
        match self.session.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_session(&self, session: Option<Session>) {
        match self.session.write() {
            Ok(mut guard) => *guard = session,
            Err(poisoned) => *poisoned.into_inner() = session,
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendErrorBody {
    message: Option<String>,
    msg: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

/// Pass successful responses through; turn everything else into `AdminError::Remote`
pub async fn check_response(response: Response) -> Result<Response, AdminError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<BackendErrorBody>(&body)
        .ok()
        .and_then(|b| b.message.or(b.error_description).or(b.msg).or(b.error))
        .unwrap_or(body);

    Err(AdminError::remote(format!("{} {}", status.as_u16(), detail.trim())))
}
