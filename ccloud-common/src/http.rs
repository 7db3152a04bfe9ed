//! Connection settings for the control plane and cluster REST gateways.
//!
//! Every call carries either the long-lived API secret (basic auth) or a
//! bearer token, so clients refuse plain `http://` URLs unless told
//! otherwise. The request timeout bounds a single attempt; rate-limit
//! backoff waits come on top of it.

use crate::error::PlatformError;
use reqwest::{Client, ClientBuilder};
use std::time::Duration;

/// User agent sent with every request unless overridden.
pub const DEFAULT_USER_AGENT: &str = concat!("ccloud-client-rs/", env!("CARGO_PKG_VERSION"));

/// Connection settings shared by every request of one client.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-attempt timeout (default: 30s)
    pub timeout: Duration,
    /// TCP and TLS connect timeout (default: 10s)
    pub connect_timeout: Duration,
    /// How long an idle gateway connection is kept (default: 90s)
    pub pool_idle_timeout: Duration,
    /// Idle connections kept per gateway host (default: 10)
    pub pool_max_idle_per_host: usize,
    /// User agent string
    pub user_agent: String,
    /// Reject non-`https` URLs before sending credentials (default: true)
    pub https_only: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            https_only: true,
        }
    }
}

impl HttpConfig {
    /// Set the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set connection pool limits.
    #[must_use]
    pub const fn with_pool_config(mut self, idle_timeout: Duration, max_idle: usize) -> Self {
        self.pool_idle_timeout = idle_timeout;
        self.pool_max_idle_per_host = max_idle;
        self
    }

    /// Allow or refuse plain `http://` URLs. Only local mock servers need this.
    #[must_use]
    pub const fn with_https_only(mut self, https_only: bool) -> Self {
        self.https_only = https_only;
        self
    }
}

/// Build the pooled client used for control-plane and gateway calls.
///
/// TLS goes through rustls.
///
/// # Errors
///
/// Returns [`PlatformError::Http`] if the client cannot be built.
///
/// # Examples
///
/// ```
/// use ccloud_common::{HttpConfig, build_http_client};
/// use std::time::Duration;
///
/// let config = HttpConfig::default().with_timeout(Duration::from_secs(60));
/// assert!(build_http_client(&config).is_ok());
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, PlatformError> {
    let client = ClientBuilder::new()
        .timeout(config.timeout)
        .connect_timeout(config.connect_timeout)
        .pool_idle_timeout(config.pool_idle_timeout)
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .user_agent(&config.user_agent)
        .https_only(config.https_only)
        .use_rustls_tls()
        .build()?;
    Ok(client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HttpConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.user_agent.starts_with("ccloud-client-rs/"));
        assert!(config.https_only);
    }

    #[test]
    fn test_config_builder() {
        let config = HttpConfig::default()
            .with_timeout(Duration::from_secs(5))
            .with_pool_config(Duration::from_secs(1), 2)
            .with_user_agent("terraform-provider-confluentacl")
            .with_https_only(false);

        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.pool_max_idle_per_host, 2);
        assert_eq!(config.user_agent, "terraform-provider-confluentacl");
        assert!(!config.https_only);
    }

    #[tokio::test]
    async fn test_plain_http_refused_by_default() {
        let client = build_http_client(&HttpConfig::default()).unwrap();
        let err = client
            .get("http://127.0.0.1:9/api/access_tokens")
            .send()
            .await
            .unwrap_err();
        assert!(err.is_builder());
    }
}
