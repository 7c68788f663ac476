use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers sent next to the human message.

/// Stable error code constants.
pub mod error_code {
    pub const MALFORMED: &str = "MALFORMED";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const PERMISSION_DENIED: &str = "PERMISSION_DENIED";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const UPSTREAM_ERROR: &str = "UPSTREAM_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// HTTP-facing error type.
///
/// Each variant maps to a stable error code (see [`error_code`]) and an
/// HTTP status code. Webhook callers read the `error` field, so the JSON
/// body always carries it:
///
/// ```json
/// {"error": "Missing playerId", "code": "PERMISSION_DENIED"}
/// ```
///
/// Store and platform failures are reported as 400 with the underlying
/// message, which is what existing game clients expect.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Request body is not a JSON object. HTTP 422.
    #[error("{0}")]
    Malformed(String),

    /// Input data is invalid. HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Missing identity or wrong shared secret. HTTP 403.
    #[error("{0}")]
    PermissionDenied(String),

    /// No record matched on an explicit read/delete. HTTP 400.
    #[error("{0}")]
    NotFound(String),

    /// Record already exists. HTTP 409.
    #[error("{0}")]
    Conflict(String),

    /// Storage backend failure. HTTP 400.
    #[error("{0}")]
    Storage(String),

    /// Membership platform failure. HTTP 400.
    #[error("{0}")]
    Upstream(String),

    /// Unexpected internal error. HTTP 500.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::Malformed(_) => error_code::MALFORMED,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::PermissionDenied(_) => error_code::PERMISSION_DENIED,
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Storage(_) => error_code::STORAGE_ERROR,
            ServiceError::Upstream(_) => error_code::UPSTREAM_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Malformed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Storage(_) => StatusCode::BAD_REQUEST,
            ServiceError::Upstream(_) => StatusCode::BAD_REQUEST,
            ServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.error_code(),
        });
        (status, axum::Json(body)).into_response()
    }
}
