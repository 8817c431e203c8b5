//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
///
/// Every failure is reported to clients as an opaque internal error; the
/// detail only goes to the log.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The datastore read failed.
    #[error("store error: {0}")]
    Store(#[from] poembot_store::StoreError),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: &'static str,
    message: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self, "Internal server error");

        let body = ErrorResponse {
            error: ErrorBody {
                code: "internal_error",
                message: "An internal error occurred",
            },
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
