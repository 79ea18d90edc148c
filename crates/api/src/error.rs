use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use signoff_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`]; storage errors are translated by the workflow layer
/// before they reach a handler. Implements [`IntoResponse`] to produce
/// consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `signoff_core`.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Core(core) = &self;
        let (status, code, message) = match core {
            CoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", core.to_string()),
            CoreError::Expired(msg) => (StatusCode::GONE, "EXPIRED", msg.clone()),
            CoreError::AlreadyConsumed(msg) => (StatusCode::GONE, "ALREADY_CONSUMED", msg.clone()),
            CoreError::AlreadySigned(msg) => {
                (StatusCode::BAD_REQUEST, "ALREADY_SIGNED", msg.clone())
            }
            CoreError::InvalidState(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_STATE", msg.clone())
            }
            CoreError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            CoreError::TransientConflict(msg) => {
                (StatusCode::CONFLICT, "TRANSIENT_CONFLICT", msg.clone())
            }
            CoreError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", msg.clone()),
            CoreError::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", msg.clone()),
            CoreError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal core error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
