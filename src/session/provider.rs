use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::gate::SessionGate;
use crate::auth::{AuthService, Session, Subscription};
use crate::error::AdminError;

/// What is currently known about the session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Checking,
    Authenticated(Session),
    Unauthenticated,
}

impl SessionState {
    /// Present and unexpired sessions authenticate; anything else does not
    pub fn from_session(session: Option<Session>) -> Self {
        match session {
            Some(session) if !session.is_expired() => SessionState::Authenticated(session),
            _ => SessionState::Unauthenticated,
        }
    }

    pub fn is_checking(&self) -> bool {
        matches!(self, SessionState::Checking)
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            SessionState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Read-only view of the provider's session state, cheap to clone and hand to
/// anything that needs to know who is signed in.
#[derive(Clone)]
pub struct SessionContext {
    rx: watch::Receiver<SessionState>,
}

impl SessionContext {
    pub fn state(&self) -> SessionState {
        self.rx.borrow().clone()
    }

    pub fn session(&self) -> Option<Session> {
        self.rx.borrow().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.rx.borrow().is_authenticated()
    }

    /// Wait until the state leaves `Checking`. If the provider goes away first
    /// the answer is `Unauthenticated`.
    pub async fn resolved(&mut self) -> SessionState {
        let resolved = match self.rx.wait_for(|state| !state.is_checking()).await {
            Ok(state) => Some(state.clone()),
            Err(_) => None,
        };
        resolved.unwrap_or(SessionState::Unauthenticated)
    }

    /// The current session or `AuthRequired`
    pub fn require_session(&self) -> Result<Session, AdminError> {
        match self.session() {
            Some(session) if !session.is_expired() => Ok(session),
            _ => Err(AdminError::AuthRequired),
        }
    }

    /// Wait for sign-in/sign-out/refresh notifications
    pub async fn changed(&mut self) -> Result<SessionState, AdminError> {
        self.rx
            .changed()
            .await
            .map_err(|_| AdminError::AuthRequired)?;
        Ok(self.state())
    }
}

/// Root-level owner of the session subscription.
///
/// Mounting registers one session-change callback and starts one session
/// query; everything else reads the resulting [`SessionContext`]. Dropping the
/// provider releases the callback and cancels a pending query, after which the
/// context no longer changes.
pub struct SessionProvider {
    context: SessionContext,
    active: Arc<AtomicBool>,
    subscription: Option<Subscription>,
    initial_check: Option<JoinHandle<()>>,
}

impl SessionProvider {
    /// Must be called from within a tokio runtime.
    pub fn mount(auth: Arc<dyn AuthService>, timeout: Duration) -> Self {
        let (tx, rx) = watch::channel(SessionState::Checking);
        let tx = Arc::new(tx);
        let active = Arc::new(AtomicBool::new(true));

        // Subscribe before querying so a sign-in racing the query is not lost
        let subscription = {
            let tx = tx.clone();
            let active = active.clone();
            auth.on_session_change(Arc::new(move |event, session| {
                if !active.load(Ordering::SeqCst) {
                    return;
                }
                let next = SessionState::from_session(session.cloned());
                debug!("session change {:?}: authenticated={}", event, next.is_authenticated());
                tx.send_replace(next);
            }))
        };

        let initial_check = {
            let active = active.clone();
            tokio::spawn(async move {
                let state = match tokio::time::timeout(timeout, auth.current_session()).await {
                    Ok(Ok(session)) => SessionState::from_session(session),
                    Ok(Err(e)) => {
                        warn!("session query failed, treating as signed out: {}", e);
                        SessionState::Unauthenticated
                    }
                    Err(_) => {
                        warn!("session query timed out after {:?}, treating as signed out", timeout);
                        SessionState::Unauthenticated
                    }
                };
                // A notification that arrived meanwhile is newer than this answer
                tx.send_if_modified(|current| {
                    if active.load(Ordering::SeqCst) && current.is_checking() {
                        *current = state;
                        true
                    } else {
                        false
                    }
                });
            })
        };

        Self {
            context: SessionContext { rx },
            active,
            subscription: Some(subscription),
            initial_check: Some(initial_check),
        }
    }

    pub fn context(&self) -> SessionContext {
        self.context.clone()
    }

    pub fn gate(&self, login_route: impl Into<String>) -> SessionGate {
        SessionGate::new(self.context(), login_route)
    }

    pub fn is_mounted(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SessionProvider {
    fn drop(&mut self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(handle) = self.initial_check.take() {
            handle.abort();
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            debug!("session provider unmounted");
        }
    }
}
