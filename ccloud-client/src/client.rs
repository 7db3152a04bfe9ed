//! Confluent Cloud API client.
//!
//! Owns the credentials, the bearer token cache and the value cache for the
//! lifetime of the client. Resource operations live next to their wire types
//! in the [`acl`](crate::acl), [`api_key`](crate::api_key),
//! [`service_account`](crate::service_account) and
//! [`schema_registry`](crate::schema_registry) modules.

use crate::{
    cache::ValueCache,
    config::ClientConfig,
    error::{CloudError, CloudResult},
    request::{RequestBuilder, Transport, decode_json},
    token::{Clock, SystemClock, TokenCache},
};
use ccloud_common::{RetryPolicy, Sleeper, build_http_client};
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

const ACCESS_TOKEN_ENDPOINT: &str = "access_tokens";

#[derive(Debug, Deserialize)]
struct AccessTokenResponse {
    #[serde(default)]
    token: String,
    #[serde(default)]
    error: String,
}

/// Confluent Cloud client with bearer token caching and rate-limit retries.
#[derive(Debug)]
pub struct CloudClient {
    config: ClientConfig,
    transport: Transport,
    token: TokenCache,
    cache: ValueCache,
}

impl CloudClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: ClientConfig) -> CloudResult<Self> {
        let http = build_http_client(&config.http)?;
        let transport = Transport::new(http, RetryPolicy::new(config.retry.clone()));
        let token = TokenCache::new(config.token_refresh_margin, Arc::new(SystemClock));

        info!(base_url = %config.base_url, api_key = config.credentials.api_key(), "Created cloud client");
        Ok(Self {
            config,
            transport,
            token,
            cache: ValueCache::new(),
        })
    }

    /// Use `sleeper` for rate-limit backoff waits.
    #[must_use]
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        let retry = self.transport.retry_policy().clone().with_sleeper(sleeper);
        self.transport.set_retry_policy(retry);
        self
    }

    /// Use `clock` for token freshness checks.
    ///
    /// Any token cached so far is dropped.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.token = TokenCache::new(self.config.token_refresh_margin, clock);
        self
    }

    /// Client configuration.
    #[must_use]
    pub const fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Builder for a control-plane call, authenticated with the API key and secret.
    pub fn request_builder(&self) -> RequestBuilder {
        RequestBuilder::with_basic_auth(
            self.transport.clone(),
            &self.config.base_url,
            &self.config.credentials,
        )
    }

    /// Builder for a cluster REST call, authenticated with a bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if no valid token can be obtained.
    pub async fn cluster_request_builder(&self, endpoint: &str) -> CloudResult<RequestBuilder> {
        let token = self.access_token().await?;
        Ok(RequestBuilder::with_bearer_auth(
            self.transport.clone(),
            endpoint,
            &token,
        ))
    }

    /// A bearer token with more than the refresh margin left, fetching a new one if needed.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::TokenRefresh`] if a new token cannot be obtained.
    #[instrument(skip(self))]
    pub async fn access_token(&self) -> CloudResult<SecretString> {
        self.token
            .get_or_refresh(|| self.fetch_access_token())
            .await
    }

    /// Expiry of the cached bearer token, if one has been fetched.
    pub async fn token_expiry(&self) -> Option<DateTime<Utc>> {
        self.token.expires_at().await
    }

    pub(crate) const fn cache(&self) -> &ValueCache {
        &self.cache
    }

    async fn fetch_access_token(&self) -> CloudResult<String> {
        let response = self
            .request_builder()
            .endpoint([ACCESS_TOKEN_ENDPOINT])
            .json(&serde_json::json!({}))?
            .post()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(%status, "Access token request rejected");
            return Err(CloudError::auth_failed(format!("Status {status}: {text}")));
        }

        let body: AccessTokenResponse = decode_json(response).await?;
        if body.token.is_empty() {
            let reason = if body.error.is_empty() {
                "empty token".to_string()
            } else {
                body.error
            };
            return Err(CloudError::auth_failed(reason));
        }
        Ok(body.token)
    }
}
