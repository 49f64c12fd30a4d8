//! Public read API served by the `portfolio-site` binary.

pub mod public;
pub mod response;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};

use crate::filter::Filter;
use crate::managers;
use crate::store::{with_timeout, RemoteStore};

pub use response::{ApiResponse, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RemoteStore>,
    pub timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<dyn RemoteStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/public/:resource", get(public::list))
        .route("/api/contact", post(public::contact))
        .with_state(state)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    let resources: Vec<&str> = managers::public_resources().map(|spec| spec.name).collect();

    Json(json!({
        "success": true,
        "data": {
            "name": "Portfolio Site API",
            "version": version,
            "description": "Public content API for the portfolio site",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "content": "/api/public/:resource?lang=en|ar (public)",
                "contact": "/api/contact (public, POST)",
            },
            "resources": resources,
        }
    }))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let check = async {
        let mut filter = Filter::new(managers::STATS.table)?;
        filter.limit(1, None)?;
        state.store.select(&filter).await
    };

    match with_timeout(state.timeout, check).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "backend": "ok"
                }
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "error": "backend unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "backend_error": e.to_string()
                }
            })),
        ),
    }
}
