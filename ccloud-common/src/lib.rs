//! Shared library for cross-cutting concerns in the Confluent Cloud Rust clients.
//!
//! This crate provides centralized implementations for:
//! - Error types shared by every client crate
//! - HTTP client configuration and building
//! - Retry policy with a fixed exponential backoff schedule
//! - Tracing subscriber initialisation

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod retry;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{HttpConfig, build_http_client};
pub use retry::{RecordingSleeper, RetryConfig, RetryPolicy, RetryState, Sleeper, TokioSleeper};
pub use tracing_config::{TracingConfig, init_tracing};
