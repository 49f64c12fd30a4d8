use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use tracing::info;

use super::response::{ApiResponse, ApiResult};
use super::AppState;
use crate::config::config;
use crate::error::ApiError;
use crate::managers::{self, MessageStatus, MESSAGES};
use crate::store::record::{ContentRecord, Language};
use crate::store::with_timeout;

#[derive(Debug, Default, Deserialize)]
pub struct PublicQuery {
    /// `en` or `ar`; defaults to the configured language
    pub lang: Option<String>,
    pub limit: Option<i32>,
}

/// GET /api/public/:resource - Published rows of a public table
pub async fn list(
    State(state): State<AppState>,
    Path(resource): Path<String>,
    Query(query): Query<PublicQuery>,
) -> ApiResult<Vec<ContentRecord>> {
    let spec = managers::lookup(&resource)?;
    if !spec.public {
        return Err(ApiError::not_found(format!("Unknown resource '{}'", resource)));
    }

    let mut filter = spec.base_filter()?;

    // Only tables whose rows carry a language are split by it
    if spec.blank().get("language").is_some() {
        let language: Language = query
            .lang
            .as_deref()
            .unwrap_or(config().public.default_language.as_str())
            .parse()?;
        filter.where_eq("language", language.as_str())?;
    }
    if let Some(limit) = query.limit {
        filter.limit(limit, None)?;
    }

    let records = with_timeout(state.timeout, state.store.select(&filter)).await?;
    Ok(ApiResponse::success(records))
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactSubmission {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.'),
        None => false,
    }
}

/// POST /api/contact - Store a contact-form submission as unread
pub async fn contact(
    State(state): State<AppState>,
    Json(body): Json<ContactSubmission>,
) -> ApiResult<Value> {
    let mut record = ContentRecord::new();
    record
        .set("name", body.name.trim())
        .set("email", body.email.trim())
        .set("subject", body.subject.trim())
        .set("message", body.message.trim());
    MESSAGES.validate(&record)?;

    if !looks_like_email(body.email.trim()) {
        let mut field_errors = HashMap::new();
        field_errors.insert("email".to_string(), "Invalid email address".to_string());
        return Err(ApiError::validation_error("Please enter a valid email address", Some(field_errors)));
    }

    record.set("status", MessageStatus::Unread.as_str());
    let saved = with_timeout(state.timeout, state.store.insert(MESSAGES.table, &record)).await?;
    info!("contact submission {} received", saved.id().unwrap_or_default());

    Ok(ApiResponse::created(json!({ "id": saved.id() })))
}
