//! Error types for the gateway.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced to callers by the gateway.
///
/// Unsupported methods and malformed backend bodies are not errors: the
/// former is a 405 proxy result produced without a backend call, the
/// latter degrades to relaying the raw response text.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Backend unreachable: {0}")]
    BackendUnreachable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::BackendUnreachable(_) => (StatusCode::BAD_GATEWAY, "backend_unreachable"),
            Error::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
