//! Error types for the backend API client

use thiserror::Error;

/// Result type alias for backend API calls.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can occur when talking to the backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// HTTP request failed before a response arrived
    #[error("Request failed: {0}")]
    Request(String),

    /// Response body could not be decoded
    #[error("Response parsing failed: {0}")]
    Decode(String),

    /// Backend rejected the bearer token (HTTP 401)
    #[error("Session expired - please sign in again")]
    Unauthorized,

    /// Backend returned a non-success status
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Client could not be constructed from the given settings
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),
}

impl ApiError {
    /// Whether this error means the stored session is no longer valid
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    /// HTTP status code, when the backend answered at all
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized => Some(401),
            Self::Api { status, .. } => Some(*status),
            Self::Request(_) | Self::Decode(_) | Self::InvalidConfig(_) => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}
