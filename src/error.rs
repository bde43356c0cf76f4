// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::store::StoreError;

/// HTTP API error with a status code, a client-safe message and, for the
/// change screens, where the client should go next
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden { message: String, redirect_to: Option<String> },

    // 404 Not Found
    NotFound { message: String, redirect_to: Option<String> },

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::InternalServerError(msg)
            | ApiError::ServiceUnavailable(msg) => msg,
            ApiError::Forbidden { message, .. } | ApiError::NotFound { message, .. } => message,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden { .. } => "FORBIDDEN",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    pub fn redirect_to(&self) -> Option<&str> {
        match self {
            ApiError::Forbidden { redirect_to, .. } | ApiError::NotFound { redirect_to, .. } => redirect_to.as_deref(),
            _ => None,
        }
    }

    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "success": false,
            "error": self.message(),
            "code": self.error_code(),
        });
        if let Some(target) = self.redirect_to() {
            body["redirect_to"] = json!(target);
        }
        body
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        ApiError::Forbidden { message: message.into(), redirect_to: Some(redirect_to.into()) }
    }

    pub fn not_found(message: impl Into<String>, redirect_to: impl Into<String>) -> Self {
        ApiError::NotFound { message: message.into(), redirect_to: Some(redirect_to.into()) }
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InvalidIdentifier(msg) | StoreError::UnknownTable(msg) => {
                ApiError::bad_request(format!("Unsupported item type: {}", msg))
            }
            StoreError::Rejected(msg) => {
                // Rejections are normally turned into revert outcomes before reaching here
                tracing::warn!("Unhandled store rejection: {}", msg);
                ApiError::internal_server_error("The change could not be applied")
            }
            StoreError::CorruptVersion { id, reason } => {
                tracing::error!("Corrupt version {}: {}", id, reason);
                ApiError::internal_server_error("Version record is unreadable")
            }
            e @ (StoreError::ConfigMissing(_) | StoreError::InvalidDatabaseUrl | StoreError::Seed(_)) => {
                tracing::error!("Store misconfigured: {}", e);
                ApiError::service_unavailable("Version store is not configured")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::service_unavailable("Version store temporarily unavailable")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}
