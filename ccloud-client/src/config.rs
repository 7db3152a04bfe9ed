//! Client configuration.
//!
//! Credentials come from the environment unless given explicitly; an explicit
//! value always wins. Both must end up non-empty before a client is built.

use crate::error::{CloudError, CloudResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use ccloud_common::{HttpConfig, RetryConfig};
use chrono::TimeDelta;
use secrecy::{ExposeSecret, SecretString};
use std::{env, fmt};

/// Environment variable holding the cloud API key.
pub const API_KEY_ENV: &str = "CONFLUENT_CLOUD_API_KEY";

/// Environment variable holding the cloud API secret.
pub const API_SECRET_ENV: &str = "CONFLUENT_CLOUD_API_SECRET";

/// Default control-plane base URL.
pub const DEFAULT_BASE_URL: &str = "https://confluent.cloud/api/";

/// Long-lived cloud API key and secret.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    /// Create credentials from a key and secret.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// The API key.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// `Authorization` header value for HTTP basic auth.
    #[must_use]
    pub fn basic_auth_header(&self) -> SecretString {
        let pair = format!("{}:{}", self.api_key, self.api_secret.expose_secret());
        SecretString::from(format!("Basic {}", STANDARD.encode(pair)))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Cloud client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// API key and secret
    pub credentials: Credentials,
    /// Control-plane base URL
    pub base_url: String,
    /// A cached token is reused only while it has more than this left
    pub token_refresh_margin: TimeDelta,
    /// HTTP client settings
    pub http: HttpConfig,
    /// Rate-limit retry schedule
    pub retry: RetryConfig,
}

impl ClientConfig {
    /// Create a new configuration from explicit credentials.
    #[must_use]
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
            base_url: DEFAULT_BASE_URL.to_string(),
            token_refresh_margin: TimeDelta::minutes(5),
            http: HttpConfig::default(),
            retry: RetryConfig::default(),
        }
    }

    /// Load credentials from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing or empty.
    pub fn from_env() -> CloudResult<Self> {
        Self::resolve(None, None)
    }

    /// Resolve credentials, letting explicit values override the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if either credential is missing or empty.
    pub fn resolve(api_key: Option<String>, api_secret: Option<String>) -> CloudResult<Self> {
        Self::resolve_with(api_key, api_secret, |name| env::var(name).ok())
    }

    /// Resolve credentials against a custom variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error naming every credential that is missing or empty.
    pub fn resolve_with<F>(
        api_key: Option<String>,
        api_secret: Option<String>,
        lookup: F,
    ) -> CloudResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = api_key.or_else(|| lookup(API_KEY_ENV)).unwrap_or_default();
        let api_secret = api_secret
            .or_else(|| lookup(API_SECRET_ENV))
            .unwrap_or_default();

        let missing: Vec<&str> = [(API_KEY_ENV, &api_key), (API_SECRET_ENV, &api_secret)]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect();
        if !missing.is_empty() {
            return Err(CloudError::invalid_config(format!(
                "missing cloud credentials: {}",
                missing.join(", ")
            )));
        }

        Ok(Self::new(api_key, api_secret))
    }

    /// Set the control-plane base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the token refresh margin.
    #[must_use]
    pub const fn with_token_refresh_margin(mut self, margin: TimeDelta) -> Self {
        self.token_refresh_margin = margin;
        self
    }

    /// Set the HTTP client settings.
    #[must_use]
    pub fn with_http_config(mut self, http: HttpConfig) -> Self {
        self.http = http;
        self
    }

    /// Set the rate-limit retry schedule.
    #[must_use]
    pub const fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ClientConfig::new("key", "secret");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.token_refresh_margin, TimeDelta::minutes(5));
        assert_eq!(config.retry.max_attempts, 7);
    }

    #[test]
    fn test_resolve_from_environment() {
        let lookup = lookup_from(&[(API_KEY_ENV, "env-key"), (API_SECRET_ENV, "env-secret")]);
        let config = ClientConfig::resolve_with(None, None, lookup).unwrap();
        assert_eq!(config.credentials.api_key(), "env-key");
    }

    #[test]
    fn test_explicit_values_override_environment() {
        let lookup = lookup_from(&[(API_KEY_ENV, "env-key"), (API_SECRET_ENV, "env-secret")]);
        let config =
            ClientConfig::resolve_with(Some("explicit-key".to_string()), None, lookup).unwrap();
        assert_eq!(config.credentials.api_key(), "explicit-key");
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = ClientConfig::resolve_with(None, None, lookup_from(&[])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains(API_KEY_ENV));
        assert!(msg.contains(API_SECRET_ENV));

        let lookup = lookup_from(&[(API_KEY_ENV, "env-key")]);
        let err =
            ClientConfig::resolve_with(None, Some(String::new()), lookup).unwrap_err();
        assert!(matches!(err, CloudError::InvalidConfig(_)));
        assert!(!err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn test_basic_auth_header() {
        let credentials = Credentials::new("key", "secret");
        assert_eq!(
            credentials.basic_auth_header().expose_secret(),
            "Basic a2V5OnNlY3JldA=="
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ClientConfig::new("visible-key", "hidden-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("visible-key"));
        assert!(!debug.contains("hidden-secret"));
    }
}
