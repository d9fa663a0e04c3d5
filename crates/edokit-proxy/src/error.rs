//! Error types for the development proxy.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Result type alias for proxy operations.
pub type Result<T> = std::result::Result<T, ProxyError>;

/// Errors surfaced by the development proxy.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// An outbound HTTP request could not complete.
    #[error("Network error: {0}")]
    Network(String),

    /// The token endpoint replied with something that is not JSON.
    #[error("Malformed token reply: {0}")]
    MalformedReply(String),

    /// A static path resolved outside the site root.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Static file not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A local file read failed.
    #[error("Read error: {0}")]
    Io(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(e: reqwest::Error) -> Self {
        ProxyError::Network(e.to_string())
    }
}

/// JSON error body returned to HTTP callers.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Short machine-readable code.
    pub error: String,
    /// Human-readable detail.
    pub detail: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ProxyError::Network(_) => (StatusCode::BAD_GATEWAY, "bad_gateway"),
            ProxyError::MalformedReply(_) => (StatusCode::BAD_GATEWAY, "bad_gateway"),
            ProxyError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            ProxyError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            ProxyError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "read_error"),
        };

        let detail = self.to_string();

        if status.is_server_error() {
            tracing::error!(status = %status, error, detail = %detail, "Proxy error");
        } else {
            tracing::warn!(status = %status, error, detail = %detail, "Proxy error");
        }

        let body = ErrorBody {
            error: error.to_string(),
            detail,
        };

        (status, Json(body)).into_response()
    }
}
