//! Client error types.

use thiserror::Error;

/// Client error type.
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The API returned a non-success status.
    #[error("API error ({status}) on {path}: {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Request path, relative to the proxy prefix.
        path: String,
        /// Response body, truncated.
        body: String,
    },

    /// Authentication could not be resolved.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The host channel closed before delivering a token.
    #[error("Host channel closed before a token arrived")]
    ChannelClosed,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Check for an API error with a specific status.
    pub fn is_status(&self, code: u16) -> bool {
        matches!(self, Error::Api { status, .. } if *status == code)
    }

    /// Check if this is an authentication problem.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_) | Error::ChannelClosed) || self.is_status(401)
    }

    /// Check if the API reported a server-side failure.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Api { status, .. } if *status >= 500)
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;
