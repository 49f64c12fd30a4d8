use std::sync::Arc;

use axum::http::HeaderValue;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;

use portfolio_site::api::{self, AppState};
use portfolio_site::backend::Backend;
use portfolio_site::config::config;
use portfolio_site::is_production;
use portfolio_site::store::RestStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up PORTFOLIO_BACKEND_URL and friends
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = config();
    tracing::info!("Starting portfolio site in {:?} mode", config.environment);

    let endpoint = config.backend_endpoint()?;
    let backend = Backend::new(endpoint, config.request_timeout())?;
    let state = AppState::new(Arc::new(RestStore::new(backend)), config.request_timeout());

    let mut app = api::router(state).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));
    if config.server.enable_cors {
        app = app.layer(cors_layer(&config.server.cors_origins));
    }

    let bind_addr = format!("0.0.0.0:{}", config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {}: {}", bind_addr, e))?;

    tracing::info!("Portfolio site listening on http://{}", bind_addr);
    if !is_production!() {
        println!("🚀 Portfolio site listening on http://{}", bind_addr);
    }

    axum::serve(listener, app).await?;
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
