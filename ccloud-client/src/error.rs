//! Client error types using thiserror 2.0.
//!
//! Keeps the failure modes callers have to tell apart as separate variants:
//! transport failures, 401, exhausted rate-limit retries, unexpected status
//! codes, decode failures and configuration problems.

use ccloud_common::PlatformError;
use reqwest::StatusCode;
use thiserror::Error;

/// Confluent Cloud client errors.
#[derive(Error, Debug)]
pub enum CloudError {
    /// Transport-level failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered 401
    #[error("Unauthorized")]
    Unauthorized,

    /// The server answered with a status the operation does not accept
    #[error("{operation} failed. response status: {status}")]
    UnexpectedStatus {
        /// Operation that was attempted
        operation: &'static str,
        /// Status returned by the server
        status: StatusCode,
    },

    /// Response or request body could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A URL segment could not be parsed or resolved
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The token endpoint refused to issue a token
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Obtaining a fresh bearer token failed
    #[error("Token refresh failed: {0}")]
    TokenRefresh(#[source] Box<CloudError>),

    /// The issued token could not be decoded
    #[error("Invalid access token: {0}")]
    InvalidToken(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A value does not belong to a closed set of wire values
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// The requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lookup expected at most one match
    #[error("Expected at most one match, found {0}")]
    AmbiguousMatch(usize),

    /// A cache entry holds a value of another type
    #[error("Cache entry {0} holds a value of a different type")]
    CacheTypeMismatch(String),

    /// Platform error
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

/// Result type for client operations.
pub type CloudResult<T> = Result<T, CloudError>;

impl CloudError {
    /// Create an unexpected status error.
    #[must_use]
    pub const fn unexpected_status(operation: &'static str, status: StatusCode) -> Self {
        Self::UnexpectedStatus { operation, status }
    }

    /// Create an authentication failed error.
    #[must_use]
    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    /// Create an invalid token error.
    #[must_use]
    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Create an invalid value error.
    #[must_use]
    pub fn invalid_value(msg: impl Into<String>) -> Self {
        Self::InvalidValue(msg.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Check if the server answered 401, directly or while refreshing a token.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Unauthorized => true,
            Self::TokenRefresh(inner) => inner.is_unauthorized(),
            _ => false,
        }
    }

    /// Check if every scheduled attempt was rate limited.
    #[must_use]
    pub fn is_retries_exhausted(&self) -> bool {
        match self {
            Self::Platform(err) => err.is_retries_exhausted(),
            Self::TokenRefresh(inner) => inner.is_retries_exhausted(),
            _ => false,
        }
    }

    /// Status code carried by an unexpected status error.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::UnexpectedStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_display() {
        let err = CloudError::unexpected_status("api key creation", StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_string(),
            "api key creation failed. response status: 400 Bad Request"
        );
        assert_eq!(CloudError::Unauthorized.to_string(), "Unauthorized");
    }

    #[test]
    fn test_unauthorized_through_refresh() {
        let err = CloudError::TokenRefresh(Box::new(CloudError::Unauthorized));
        assert!(err.is_unauthorized());
        assert!(!CloudError::auth_failed("bad key").is_unauthorized());
    }

    #[test]
    fn test_retries_exhausted_from_platform() {
        let err: CloudError = PlatformError::retries_exhausted(7, Duration::from_millis(6300)).into();
        assert!(err.is_retries_exhausted());
        assert!(!err.is_unauthorized());
        assert_eq!(err.status(), None);
    }
}
