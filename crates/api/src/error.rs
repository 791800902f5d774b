use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use champi_core::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`CoreError`] for domain errors and implements [`IntoResponse`]
/// to produce consistent JSON error bodies. The body key is `detail`, the
/// contract the frontend reads on failure.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A domain-level error from `champi_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// An internal error with a human-readable message.
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match &self {
            AppError::Core(core) => match core {
                CoreError::InvalidImageData(msg) => (
                    StatusCode::BAD_REQUEST,
                    "INVALID_IMAGE_DATA",
                    msg.clone(),
                ),
                // The whole upload fails as one unit; the original cause
                // text rides along for the caller.
                CoreError::StorageWriteFailed(msg) => (
                    StatusCode::BAD_REQUEST,
                    "STORAGE_WRITE_FAILED",
                    msg.clone(),
                ),
                CoreError::NotFound { entity, id } => (
                    StatusCode::NOT_FOUND,
                    "NOT_FOUND",
                    format!("{entity} '{id}' not found"),
                ),
                CoreError::ExportFailed(msg) => {
                    tracing::error!(error = %msg, "Export failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "EXPORT_FAILED",
                        "An internal error occurred".to_string(),
                    )
                }
            },

            AppError::InternalError(msg) => {
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = json!({
            "detail": detail,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}
