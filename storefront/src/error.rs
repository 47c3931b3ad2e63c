//! Error types for the storefront.
//!
//! Request failures never escape a reducer as `Err`: they are folded into an
//! [`ApiFailure`] carried by the rejected action, and slices render the
//! message inline.

use cyclecare_api::ApiError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of the persistent key-value store.
///
/// Callers of [`crate::storage::KeyValueStore`] never see these; stores log
/// them and behave as if the key were absent.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file does not hold a JSON object of strings.
    #[error("Storage file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Failures of the external phone/OTP identity provider.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// The provider refused to send a code to this number.
    #[error("Could not send a code to {phone}")]
    SendFailed {
        /// Number the code was requested for
        phone: String,
    },

    /// The one-time code did not match the challenge.
    #[error("The code you entered is incorrect")]
    InvalidCode,

    /// The challenge is unknown or already used.
    #[error("This code has expired, request a new one")]
    ChallengeExpired,

    /// No provider is configured in this execution context.
    #[error("Phone sign-in is not available here")]
    Unavailable,
}

/// Broad category of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// No response (DNS, connect, timeout).
    Network,
    /// The session token was rejected.
    Unauthorized,
    /// The backend answered with an error status.
    Rejected,
    /// The response body did not have the expected shape.
    Decode,
    /// The identity provider refused the request.
    Identity,
    /// Local misconfiguration.
    Config,
}

/// A failed request as carried by rejected actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Message suitable for inline display.
    pub message: String,
}

impl ApiFailure {
    /// Build a failure from its parts.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Whether the session must be dropped.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.kind == FailureKind::Unauthorized
    }
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ApiError> for ApiFailure {
    fn from(error: ApiError) -> Self {
        let kind = match &error {
            ApiError::Request(_) => FailureKind::Network,
            ApiError::Unauthorized => FailureKind::Unauthorized,
            ApiError::Api { .. } => FailureKind::Rejected,
            ApiError::Decode(_) => FailureKind::Decode,
            ApiError::InvalidConfig(_) => FailureKind::Config,
        };
        let message = match error {
            // The backend's own wording is what the customer should see
            ApiError::Api { message, .. } if !message.is_empty() => message,
            other => other.to_string(),
        };
        Self { kind, message }
    }
}

impl From<IdentityError> for ApiFailure {
    fn from(error: IdentityError) -> Self {
        Self::new(FailureKind::Identity, error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_session_failure() {
        let failure = ApiFailure::from(ApiError::Unauthorized);
        assert!(failure.is_unauthorized());
    }

    #[test]
    fn backend_message_is_kept_verbatim() {
        let failure = ApiFailure::from(ApiError::Api {
            status: 422,
            message: "Pincode not serviceable".to_string(),
        });
        assert_eq!(failure.kind, FailureKind::Rejected);
        assert_eq!(failure.message, "Pincode not serviceable");
    }

    #[test]
    fn identity_errors_are_identity_failures() {
        let failure = ApiFailure::from(IdentityError::InvalidCode);
        assert_eq!(failure.kind, FailureKind::Identity);
        assert!(!failure.is_unauthorized());
    }
}
