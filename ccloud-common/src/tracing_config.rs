//! Tracing subscriber setup for programs embedding the cloud clients.
//!
//! Client operations open `#[instrument]` spans and log token refreshes,
//! rate-limit backoff and exhausted retries. The filter built here keeps
//! those at the configured level while HTTP stack crates stay at `warn`.
//! `RUST_LOG` overrides it entirely.

use crate::PlatformError;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const CLIENT_TARGETS: [&str; 2] = ["ccloud_client", "ccloud_common"];

/// Tracing configuration.
#[derive(Debug, Clone)]
pub struct TracingConfig {
    /// Name recorded on startup, e.g. the embedding provider
    pub service_name: String,
    /// Level for the client crates when `RUST_LOG` is unset
    pub log_level: String,
    /// Whether to output JSON format
    pub json_output: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            service_name: "ccloud-client".to_string(),
            log_level: "info".to_string(),
            json_output: false,
        }
    }
}

impl TracingConfig {
    /// Set the service name.
    #[must_use]
    pub fn with_service_name(mut self, name: impl Into<String>) -> Self {
        self.service_name = name.into();
        self
    }

    /// Set the level for the client crates.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON output.
    #[must_use]
    pub const fn with_json_output(mut self) -> Self {
        self.json_output = true;
        self
    }

    /// Filter directive used when `RUST_LOG` is unset.
    #[must_use]
    pub fn filter_directive(&self) -> String {
        CLIENT_TARGETS
            .iter()
            .fold("warn".to_string(), |directive, target| {
                format!("{directive},{target}={}", self.log_level)
            })
    }
}

/// Install the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if the level is not a valid filter or a global
/// subscriber is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), PlatformError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(config.filter_directive())
            .map_err(|e| PlatformError::internal(format!("invalid log level: {e}")))?,
    };

    let installed = if config.json_output {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };
    installed.map_err(|e| PlatformError::internal(format!("tracing init failed: {e}")))?;

    tracing::info!(service = %config.service_name, "Tracing initialised");
    Ok(())
}
