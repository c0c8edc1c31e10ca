//! Error types and HTTP error response handling.
//!
//! Two layers of errors live here:
//!
//! - [`StoreError`]: everything the storage boundary can report. The
//!   transfer engine returns these unchanged. It never swallows,
//!   downgrades, or retries an error.
//! - [`AppError`]: what HTTP handlers return, converted into JSON responses
//!   with appropriate status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Errors surfaced by the storage boundary.
///
/// Every failure inside a unit of work aborts the whole transaction; the
/// variant describes why. Serialization failures that a strict isolation
/// level may raise arrive as [`StoreError::Failure`]; retrying is a caller
/// policy decision, never taken by the engine.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced account does not exist.
    #[error("account not found")]
    NotFound,

    /// Store-level integrity failure (foreign key, unique, or check
    /// constraint).
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// Any other transaction or connection error.
    #[error("store failure: {0}")]
    Failure(String),
}

/// Map sqlx errors onto the storage error kinds.
///
/// - `RowNotFound` becomes `NotFound`
/// - foreign key / unique / check violations become `ConstraintViolation`
/// - everything else (connection loss, serialization failure, ...) becomes
///   `Failure`
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            other => {
                if let Some(db_err) = other.as_database_error() {
                    if db_err.is_foreign_key_violation()
                        || db_err.is_unique_violation()
                        || db_err.is_check_violation()
                    {
                        return StoreError::ConstraintViolation(db_err.message().to_string());
                    }
                }
                StoreError::Failure(other.to_string())
            }
        }
    }
}

/// Application-wide error type returned by HTTP handlers.
///
/// Each variant maps to a specific HTTP status code and error message.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Requested account does not exist.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("account not found")]
    AccountNotFound,

    /// Request body or parameters are invalid (non-positive amount,
    /// identical accounts, currency mismatch, ...).
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("invalid request")]
    InvalidRequest(String),

    /// The storage layer rejected or failed the operation.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
///
/// # Status Code Mapping
///
/// - `AccountNotFound` / `Store(NotFound)` → 404 Not Found
/// - `InvalidRequest` → 400 Bad Request
/// - `Store(ConstraintViolation)` → 409 Conflict
/// - `Store(Failure)` → 500 Internal Server Error (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::AccountNotFound | AppError::Store(StoreError::NotFound) => (
                StatusCode::NOT_FOUND,
                "account_not_found",
                "account not found".to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Store(StoreError::ConstraintViolation(ref msg)) => {
                (StatusCode::CONFLICT, "constraint_violation", msg.clone())
            }
            AppError::Store(StoreError::Failure(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
