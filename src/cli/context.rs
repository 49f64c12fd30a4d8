use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::auth::{AuthService, RestAuth, Session};
use crate::backend::Backend;
use crate::cli::config as cli_config;
use crate::config::config;
use crate::error::AdminError;
use crate::managers::TestimonialsManager;
use crate::resource::{ResourceController, ResourceSpec};
use crate::session::SessionProvider;
use crate::store::{RestStorage, RestStore};

/// How the gate resolved the session for this invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCheck {
    Admitted(Session),
    /// The backend no longer holds a session: never signed in, signed out or refresh rejected
    SignedOut,
    /// Redirected while a stored session is still held, e.g. the refresh could not reach the backend
    Unverified,
}

/// Backend clients for one CLI invocation, with any saved session restored
pub struct AdminContext {
    pub backend: Backend,
    pub auth: Arc<RestAuth>,
    pub timeout: Duration,
    restored: Option<Session>,
}

impl AdminContext {
    pub fn connect() -> anyhow::Result<Self> {
        let config = config();
        let timeout = config.request_timeout();
        let backend = Backend::new(config.backend_endpoint()?, timeout)?;
        let restored = cli_config::load_session()?.map(|stored| stored.session);
        Ok(Self::with_backend(backend, timeout, restored))
    }

    pub fn with_backend(backend: Backend, timeout: Duration, restored: Option<Session>) -> Self {
        let auth = Arc::new(RestAuth::new(backend.clone()));
        if let Some(session) = &restored {
            debug!("restoring saved session for {:?}", session.email());
            auth.restore(session.clone());
        }

        Self {
            backend,
            auth,
            timeout,
            restored,
        }
    }

    /// Run the session gate once
    pub async fn check_session(&self) -> SessionCheck {
        let provider = SessionProvider::mount(self.auth.clone() as Arc<dyn AuthService>, self.timeout);
        let mut gate = provider.gate(&config().admin.login_route);

        match gate.admit().await {
            Ok(session) => SessionCheck::Admitted(session),
            Err(redirect) => {
                debug!("session gate redirected to {}", redirect.to);
                if self.backend.session().is_some() {
                    SessionCheck::Unverified
                } else {
                    SessionCheck::SignedOut
                }
            }
        }
    }

    /// Resolve the session through the gate. A refreshed token is written back
    /// to disk; the saved session is forgotten only once the backend dropped it.
    pub async fn require_session(&self) -> anyhow::Result<Session> {
        match self.check_session().await {
            SessionCheck::Admitted(session) => {
                if self.restored.as_ref() != Some(&session) {
                    cli_config::save_session(&session)?;
                }
                Ok(session)
            }
            SessionCheck::SignedOut => {
                cli_config::clear_session()?;
                Err(anyhow::Error::new(AdminError::AuthRequired)
                    .context("Not signed in; run `portfolio-admin auth login <email>`"))
            }
            SessionCheck::Unverified => {
                warn!("could not verify the saved session; keeping it for the next attempt");
                Err(anyhow::Error::new(AdminError::AuthRequired)
                    .context("Could not verify the saved session; check the backend connection and retry"))
            }
        }
    }

    pub fn controller(&self, spec: &'static ResourceSpec) -> ResourceController {
        ResourceController::new(spec, Arc::new(RestStore::new(self.backend.clone())), self.timeout)
    }

    pub fn testimonials(&self) -> TestimonialsManager {
        let backend = &config().backend;
        let bucket = RestStorage::new(self.backend.clone(), backend.storage_bucket.clone());
        TestimonialsManager::new(Arc::new(bucket), backend.testimonials_prefix.clone(), self.timeout)
    }
}
