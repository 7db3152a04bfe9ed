//! Request builder for control-plane and cluster REST calls.
//!
//! A [`RequestBuilder`] collects URL segments, method, query parameters and
//! JSON body for exactly one request. Every step consumes the builder and
//! hands it back, so one builder never serves two requests at once.
//!
//! URL segments are resolved in order as RFC 3986 references: a relative
//! segment extends the URL built so far, an absolute one replaces it.

use crate::config::Credentials;
use crate::error::{CloudError, CloudResult};
use ccloud_common::RetryPolicy;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

const APPLICATION_JSON: &str = "application/json";

/// Shared HTTP client and retry policy used to run requests.
#[derive(Debug, Clone)]
pub struct Transport {
    http: Client,
    retry: RetryPolicy,
}

impl Transport {
    /// Create a transport from an HTTP client and a retry policy.
    #[must_use]
    pub const fn new(http: Client, retry: RetryPolicy) -> Self {
        Self { http, retry }
    }

    /// The retry policy applied by [`RequestBuilder::execute_and_retry_on_429`].
    #[must_use]
    pub const fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    pub(crate) fn set_retry_policy(&mut self, retry: RetryPolicy) {
        self.retry = retry;
    }
}

/// Builder for a single authenticated JSON request.
#[derive(Debug, Clone)]
#[must_use]
pub struct RequestBuilder {
    transport: Transport,
    segments: Vec<String>,
    auth_header: SecretString,
    method: Method,
    body: Option<serde_json::Value>,
    query: BTreeMap<String, String>,
}

impl RequestBuilder {
    fn with_auth_header(transport: Transport, base_url: &str, auth_header: SecretString) -> Self {
        Self {
            transport,
            segments: vec![base_url.to_string()],
            auth_header,
            method: Method::GET,
            body: None,
            query: BTreeMap::new(),
        }
    }

    /// Start a request authenticated with HTTP basic auth.
    pub fn with_basic_auth(transport: Transport, base_url: &str, credentials: &Credentials) -> Self {
        Self::with_auth_header(transport, base_url, credentials.basic_auth_header())
    }

    /// Start a request authenticated with a bearer token.
    pub fn with_bearer_auth(transport: Transport, base_url: &str, token: &SecretString) -> Self {
        let header = SecretString::from(format!("Bearer {}", token.expose_secret()));
        Self::with_auth_header(transport, base_url, header)
    }

    /// Append URL segments, each resolved against the URL built so far.
    pub fn endpoint<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments.extend(segments.into_iter().map(Into::into));
        self
    }

    /// Replace the query parameters.
    pub fn query_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Add a single query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Attach a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be serialized.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> CloudResult<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Use the given HTTP method.
    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    /// Use `GET`.
    pub fn get(self) -> Self {
        self.method(Method::GET)
    }

    /// Use `POST`.
    pub fn post(self) -> Self {
        self.method(Method::POST)
    }

    /// Use `PUT`.
    pub fn put(self) -> Self {
        self.method(Method::PUT)
    }

    /// Use `DELETE`.
    pub fn delete(self) -> Self {
        self.method(Method::DELETE)
    }

    /// Resolve the segments and query parameters into the final URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the first segment is not an absolute URL or a
    /// later one cannot be resolved.
    pub fn url(&self) -> CloudResult<Url> {
        let mut segments = self.segments.iter();
        let first = segments
            .next()
            .ok_or_else(|| CloudError::invalid_value("request has no base URL"))?;
        let mut url = Url::parse(first)?;
        for segment in segments {
            url = url.join(segment)?;
        }

        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }
        Ok(url)
    }

    /// Send the request once.
    ///
    /// Only transport failures and 401 are turned into errors; every other
    /// status is handed back for the caller to interpret.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Unauthorized`] on 401, or the transport error.
    pub async fn execute(&self) -> CloudResult<Response> {
        let url = self.url()?;
        debug!(method = %self.method, %url, "Sending request");

        let mut request = self
            .transport
            .http
            .request(self.method.clone(), url)
            .header(ACCEPT, APPLICATION_JSON)
            .header(AUTHORIZATION, self.auth_header.expose_secret());
        if let Some(body) = &self.body {
            request = request
                .header(CONTENT_TYPE, APPLICATION_JSON)
                .body(serde_json::to_vec(body)?);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(method = %self.method, %status, "Received response");

        if status == StatusCode::UNAUTHORIZED {
            return Err(CloudError::Unauthorized);
        }
        Ok(response)
    }

    /// Send the request, backing off and retrying while the server answers 429.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`execute`](Self::execute), or a
    /// retries-exhausted error when every attempt was rate limited.
    pub async fn execute_and_retry_on_429(&self) -> CloudResult<Response> {
        self.transport
            .retry
            .execute(
                move || self.execute(),
                |response: &Response| response.status() == StatusCode::TOO_MANY_REQUESTS,
            )
            .await
    }
}

/// Read a response body as JSON.
///
/// # Errors
///
/// Returns an error if the body cannot be read or is not valid JSON for `T`.
pub async fn decode_json<T: DeserializeOwned>(response: Response) -> CloudResult<T> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Percent-encode `value` as a single relative path segment.
///
/// The result can be appended to an endpoint without `/`, `?` or `#` in the
/// value changing the resolved path or query.
///
/// # Errors
///
/// Returns [`CloudError::InvalidValue`] for empty, `.` and `..` values.
pub fn path_segment(value: &str) -> CloudResult<String> {
    if matches!(value, "" | "." | "..") {
        return Err(CloudError::invalid_value(format!(
            "{value:?} is not a valid path segment"
        )));
    }

    let mut url = Url::parse("https://segment.invalid/")?;
    url.path_segments_mut()
        .map_err(|()| CloudError::invalid_value("cannot encode path segment"))?
        .pop_if_empty()
        .push(value);
    Ok(url.path().trim_start_matches('/').to_string())
}
