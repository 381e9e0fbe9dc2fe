use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use portcullis_core::error::CoreError;
use portcullis_core::types::format_countdown;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for guard errors and adds HTTP-specific variants.
/// Implements [`IntoResponse`] to produce consistent JSON error responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A guard error from `portcullis_core`.
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
                CoreError::InvalidCredentials { attempts_remaining } => (
                    StatusCode::UNAUTHORIZED,
                    json!({
                        "error": format!(
                            "Invalid credentials. {attempts_remaining} attempts remaining."
                        ),
                        "code": "INVALID_CREDENTIALS",
                        "attempts_remaining": attempts_remaining,
                    }),
                ),
                CoreError::LockedOut { remaining_ms } => (
                    StatusCode::LOCKED,
                    json!({
                        "error": format!(
                            "Account locked. Try again in {}.",
                            format_countdown(*remaining_ms)
                        ),
                        "code": "LOCKED_OUT",
                        "retry_after_ms": remaining_ms,
                    }),
                ),
                CoreError::ProviderUnavailable(msg) => {
                    tracing::error!(error = %msg, "Identity provider unavailable");
                    (
                        StatusCode::BAD_GATEWAY,
                        json!({
                            "error": "An unexpected error occurred",
                            "code": "PROVIDER_UNAVAILABLE",
                        }),
                    )
                }
                CoreError::NoSession => (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "No active session", "code": "NO_SESSION" }),
                ),
                CoreError::SessionExpired => (
                    StatusCode::UNAUTHORIZED,
                    json!({ "error": "Session expired", "code": "SESSION_EXPIRED" }),
                ),
                CoreError::Internal(msg) => {
                    tracing::error!(error = %msg, "Internal core error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({
                            "error": "An internal error occurred",
                            "code": "INTERNAL_ERROR",
                        }),
                    )
                }
            },

            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": msg, "code": "BAD_REQUEST" }),
            ),
            AppError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "An internal error occurred",
                        "code": "INTERNAL_ERROR",
                    }),
                )
            }
        };

        (status, axum::Json(body)).into_response()
    }
}
