mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;

use portfolio_site::auth::{AuthService, RestAuth, Session, SessionEvent};
use portfolio_site::backend::{Backend, BackendEndpoint};
use portfolio_site::cli::{AdminContext, SessionCheck};
use portfolio_site::error::AdminError;
use portfolio_site::session::{SessionProvider, SessionState};

use common::{TestBackend, ADMIN_EMAIL, ADMIN_PASSWORD, ANON_KEY};

const TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn password_sign_in_issues_session() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = RestAuth::new(server.client()?);

    let session = auth.sign_in_with_password(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    assert_eq!(session.email(), Some(ADMIN_EMAIL));
    assert!(session.refresh_token.is_some());
    assert!(session.expires_at.is_some_and(|at| at > Utc::now()));

    let current = auth.current_session().await?;
    assert_eq!(current.map(|s| s.access_token), Some(session.access_token));
    Ok(())
}

#[tokio::test]
async fn wrong_password_is_rejected() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = RestAuth::new(server.client()?);

    let err = auth.sign_in_with_password(ADMIN_EMAIL, "nope").await.unwrap_err();
    match err {
        AdminError::Remote(message) => assert!(message.contains("Invalid login credentials"), "{}", message),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(auth.current_session().await?.is_none());
    Ok(())
}

#[tokio::test]
async fn blank_credentials_never_reach_the_backend() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = RestAuth::new(server.client()?);

    let err = auth.sign_in_with_password(" ", "").await.unwrap_err();
    assert!(err.is_validation());
    assert_eq!(server.fake.requests("POST", "/auth/v1/token"), 0);
    Ok(())
}

#[tokio::test]
async fn listeners_see_sign_in_and_sign_out() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = RestAuth::new(server.client()?);

    let events: Arc<Mutex<Vec<SessionEvent>>> = Arc::default();
    let subscription = {
        let events = events.clone();
        auth.on_session_change(Arc::new(move |event, _| events.lock().unwrap().push(event)))
    };

    auth.sign_in_with_password(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    auth.sign_out().await?;
    assert_eq!(*events.lock().unwrap(), vec![SessionEvent::SignedIn, SessionEvent::SignedOut]);
    assert_eq!(server.fake.requests("POST", "/auth/v1/logout"), 1);

    subscription.unsubscribe();
    assert_eq!(auth.listener_count(), 0);
    Ok(())
}

#[tokio::test]
async fn expired_session_is_refreshed() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = RestAuth::new(server.client()?);
    let issued = auth.sign_in_with_password(ADMIN_EMAIL, ADMIN_PASSWORD).await?;

    let stale = Session::new("expired-token", issued.refresh_token.clone())
        .with_expiry(Utc::now() - chrono::Duration::minutes(5));
    auth.restore(stale);

    let refreshed = auth.current_session().await?.expect("refreshed session");
    assert_ne!(refreshed.access_token, "expired-token");
    assert!(!refreshed.is_expired());
    Ok(())
}

#[tokio::test]
async fn expired_session_with_revoked_refresh_token_signs_out() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = Arc::new(RestAuth::new(server.client()?));
    auth.restore(
        Session::new("expired-token", Some("never-issued".into())).with_expiry(Utc::now() - chrono::Duration::minutes(5)),
    );

    let provider = SessionProvider::mount(auth.clone(), TIMEOUT);
    let mut context = provider.context();
    assert_eq!(context.resolved().await, SessionState::Unauthenticated);
    Ok(())
}

#[tokio::test]
async fn gate_follows_the_live_session() -> Result<()> {
    let server = TestBackend::start().await?;
    let auth = Arc::new(RestAuth::new(server.client()?));

    let provider = SessionProvider::mount(auth.clone(), TIMEOUT);
    let mut gate = provider.gate("/admin/login");
    let redirect = gate.admit().await.unwrap_err();
    assert_eq!(redirect.to, "/admin/login");

    auth.sign_in_with_password(ADMIN_EMAIL, ADMIN_PASSWORD).await?;
    let session = gate.admit().await.expect("admitted after sign-in");
    assert_eq!(session.email(), Some(ADMIN_EMAIL));

    auth.sign_out().await?;
    assert!(gate.admit().await.is_err());

    provider.unmount();
    assert_eq!(auth.listener_count(), 0);
    Ok(())
}

fn expired_with_refresh(refresh_token: &str) -> Session {
    Session::new("expired-token", Some(refresh_token.into())).with_expiry(Utc::now() - chrono::Duration::minutes(5))
}

/// A backend client aimed at a port nothing listens on
fn unreachable_backend() -> Result<Backend> {
    let port = portpicker::pick_unused_port().expect("free port");
    let endpoint = BackendEndpoint::new(format!("http://127.0.0.1:{}", port), ANON_KEY);
    Ok(Backend::new(endpoint, Duration::from_secs(2))?)
}

#[tokio::test]
async fn unreachable_refresh_keeps_the_stored_session() -> Result<()> {
    let backend = unreachable_backend()?;
    let auth = RestAuth::new(backend.clone());
    auth.restore(expired_with_refresh("still-valid"));

    let err = auth.current_session().await.unwrap_err();
    assert!(err.is_transient(), "{err:?}");
    assert_eq!(
        backend.session().and_then(|s| s.refresh_token),
        Some("still-valid".to_string())
    );
    Ok(())
}

#[tokio::test]
async fn unverified_session_is_not_signed_out() -> Result<()> {
    let backend = unreachable_backend()?;
    let context = AdminContext::with_backend(backend.clone(), TIMEOUT, Some(expired_with_refresh("still-valid")));

    assert_eq!(context.check_session().await, SessionCheck::Unverified);
    assert!(backend.session().is_some());
    Ok(())
}

#[tokio::test]
async fn rejected_refresh_is_signed_out() -> Result<()> {
    let server = TestBackend::start().await?;
    let backend = server.client()?;
    let context = AdminContext::with_backend(backend.clone(), TIMEOUT, Some(expired_with_refresh("never-issued")));

    assert_eq!(context.check_session().await, SessionCheck::SignedOut);
    assert!(backend.session().is_none());
    Ok(())
}

#[tokio::test]
async fn restored_session_is_admitted() -> Result<()> {
    let server = TestBackend::start().await?;
    let issued = RestAuth::new(server.client()?)
        .sign_in_with_password(ADMIN_EMAIL, ADMIN_PASSWORD)
        .await?;

    let context = AdminContext::with_backend(server.client()?, TIMEOUT, Some(issued.clone()));
    assert_eq!(context.check_session().await, SessionCheck::Admitted(issued));
    Ok(())
}
