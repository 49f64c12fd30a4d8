use super::provider::{SessionContext, SessionState};
use crate::auth::Session;

/// Navigation issued when an unauthenticated visitor hits a protected route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub to: String,
    /// Replace the current history entry rather than pushing a new one
    pub replace: bool,
}

/// What a protected route shows for the current session state
#[derive(Debug, Clone, PartialEq)]
pub enum GateView<T = ()> {
    Loading,
    Protected(T),
    Redirect(Redirect),
}

impl<T> GateView<T> {
    pub fn is_protected(&self) -> bool {
        matches!(self, GateView::Protected(_))
    }
}

/// Guards protected content behind an authenticated session
#[derive(Clone)]
pub struct SessionGate {
    context: SessionContext,
    login_route: String,
}

impl SessionGate {
    pub fn new(context: SessionContext, login_route: impl Into<String>) -> Self {
        Self {
            context,
            login_route: login_route.into(),
        }
    }

    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    fn redirect(&self) -> Redirect {
        Redirect {
            to: self.login_route.clone(),
            replace: true,
        }
    }

    pub fn view(&self) -> GateView {
        self.render(|_| ())
    }

    /// Produce the protected subtree only when a live session exists. The
    /// closure is never invoked while checking or signed out.
    pub fn render<T>(&self, subtree: impl FnOnce(&Session) -> T) -> GateView<T> {
        match self.context.state() {
            SessionState::Checking => GateView::Loading,
            SessionState::Authenticated(session) if !session.is_expired() => {
                GateView::Protected(subtree(&session))
            }
            _ => GateView::Redirect(self.redirect()),
        }
    }

    /// Wait out the initial check, then admit or redirect
    pub async fn admit(&mut self) -> Result<Session, Redirect> {
        match self.context.resolved().await {
            SessionState::Authenticated(session) if !session.is_expired() => Ok(session),
            _ => Err(self.redirect()),
        }
    }
}
