use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use mansei_core::error::CoreError;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce the `{ "success": false, ... }`
/// JSON bodies the endpoints promise.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `mansei_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Core(core) => match core {
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    json!({
                        "success": false,
                        "error": format!("{entity} with id {id} not found"),
                    }),
                ),
                CoreError::Validation(msg) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "success": false, "error": msg }),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    internal_body()
                }
            },
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "success": false, "error": msg }),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                internal_body()
            }
        };

        (status, axum::Json(body)).into_response()
    }
}

/// Sanitized 500 body: `error` is generic, `message` stays generic too so
/// internals never leak to a caller.
fn internal_body() -> (StatusCode, serde_json::Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "success": false,
            "error": "Internal server error",
            "message": "An internal error occurred",
        }),
    )
}
