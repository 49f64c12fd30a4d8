// Error types for the admin library and the public HTTP surface
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

use crate::filter::error::FilterError;
use crate::store::record::RecordError;

/// Errors raised by controllers, the session layer and the remote clients
#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    /// Missing required form fields, caught before any remote call
    #[error("{message}")]
    Validation { message: String, missing: Vec<String> },

    /// A remote store, storage or auth call failed
    #[error("Remote error: {0}")]
    Remote(String),

    /// No session is present for a protected action
    #[error("Authentication required")]
    AuthRequired,

    /// The backend could not be reached (connect failure or transport timeout)
    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("A save is already in progress")]
    SaveInFlight,

    #[error("No record is open for editing")]
    NoActiveForm,

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Filter(#[from] FilterError),
}

impl AdminError {
    pub fn remote(message: impl Into<String>) -> Self {
        AdminError::Remote(message.into())
    }

    pub fn config(message: impl Into<String>) -> Self {
        AdminError::Config(message.into())
    }

    pub fn validation(message: impl Into<String>, missing: Vec<String>) -> Self {
        AdminError::Validation { message: message.into(), missing }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AdminError::Validation { .. } | AdminError::Record(_))
    }

    /// Failures that say nothing about the request itself; retrying may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AdminError::Unreachable(_) | AdminError::Timeout(_))
    }
}

impl From<reqwest::Error> for AdminError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() {
            AdminError::Unreachable(err.to_string())
        } else {
            AdminError::Remote(err.to_string())
        }
    }
}

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },

    // 401 Unauthorized
    Unauthorized(String),

    // 404 Not Found
    NotFound(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 502 Bad Gateway (backend issues)
    BadGateway(String),

    // 504 Gateway Timeout
    GatewayTimeout(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::NotFound(_) => 404,
            ApiError::InternalServerError(_) => 500,
            ApiError::BadGateway(_) => 502,
            ApiError::GatewayTimeout(_) => 504,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::Unauthorized(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::BadGateway(msg) => msg,
            ApiError::GatewayTimeout(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "success": false,
                    "error": message,
                    "error_code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "success": false,
                    "error": self.message(),
                    "error_code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::BadGateway(_) => "BAD_GATEWAY",
            ApiError::GatewayTimeout(_) => "GATEWAY_TIMEOUT",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::BadGateway(message.into())
    }
}

impl From<AdminError> for ApiError {
    fn from(err: AdminError) -> Self {
        match err {
            AdminError::Validation { message, missing } => {
                let field_errors = missing
                    .into_iter()
                    .map(|field| (field, "This field is required".to_string()))
                    .collect::<HashMap<_, _>>();
                ApiError::validation_error(message, Some(field_errors))
            }
            AdminError::Record(e) => ApiError::bad_request(e.to_string()),
            AdminError::Filter(e) => ApiError::bad_request(e.to_string()),
            AdminError::UnknownResource(name) => ApiError::not_found(format!("Unknown resource '{}'", name)),
            AdminError::AuthRequired => ApiError::unauthorized("Authentication required"),
            AdminError::Timeout(after) => {
                tracing::error!("Backend request timed out after {:?}", after);
                ApiError::GatewayTimeout("Backend did not respond in time".to_string())
            }
            AdminError::Unreachable(msg) => {
                tracing::error!("Backend unreachable: {}", msg);
                ApiError::bad_gateway("Backend request failed")
            }
            AdminError::Remote(msg) => {
                // Don't expose backend error details to clients
                tracing::error!("Backend error: {}", msg);
                ApiError::bad_gateway("Backend request failed")
            }
            other => {
                tracing::error!("Internal error: {}", other);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        }
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<RecordError> for ApiError {
    fn from(err: RecordError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
