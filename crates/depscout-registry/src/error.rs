//! Error types for depscout-registry

use thiserror::Error;

/// Result type alias for registry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for registry operations
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP transport failed (DNS, connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body was not JSON
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Registry locator is not a valid URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Registry answered outside the 2xx range
    #[error("Registry returned status {status} for {url}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// Registry answered 2xx but the body lacks the expected keys
    #[error("Malformed registry response from {url}: {reason}")]
    MalformedResponse {
        /// Requested URL
        url: String,
        /// Which key was missing or mistyped
        reason: String,
    },

    /// Rate limit exceeded (HTTP 429)
    #[error("Rate limit exceeded for URL: {0}")]
    RateLimitExceeded(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a new generic error
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Whether the registry simply could not be reached or refused the request.
    ///
    /// These failures degrade to an empty checksum. Everything else means the
    /// registry answered with something unexpected and must be reported.
    pub fn is_unreachable(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::InvalidUrl(_) | Self::Status { .. } | Self::RateLimitExceeded(_)
        )
    }
}
