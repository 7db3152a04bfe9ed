//! Centralized error types for the shared plumbing.
//!
//! Client crates embed [`PlatformError`] in their own error enums so that
//! transport and retry failures keep a single representation.

use std::time::Duration;
use thiserror::Error;

/// Common error type for platform operations.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Every scheduled attempt was rate limited
    #[error("Exhausted retries after {attempts} attempts ({}ms waited)", .waited.as_millis())]
    RetriesExhausted {
        /// Number of attempts made
        attempts: usize,
        /// Total time spent waiting between attempts
        waited: Duration,
    },

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl PlatformError {
    /// Check if this error came from the transport layer.
    ///
    /// # Examples
    ///
    /// ```
    /// use ccloud_common::PlatformError;
    ///
    /// let err = PlatformError::internal("tracing init failed");
    /// assert!(!err.is_transport());
    /// ```
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    /// Check if this error signals an exhausted retry schedule.
    #[must_use]
    pub const fn is_retries_exhausted(&self) -> bool {
        matches!(self, Self::RetriesExhausted { .. })
    }

    /// Create a retries exhausted error.
    #[must_use]
    pub const fn retries_exhausted(attempts: usize, waited: Duration) -> Self {
        Self::RetriesExhausted { attempts, waited }
    }

    /// Create an internal error with the given message.
    #[must_use]
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
