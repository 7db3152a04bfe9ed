//! Bearer token cache.
//!
//! Tokens issued by the `access_tokens` endpoint are three dot-separated
//! segments; the middle one is unpadded base64 JSON carrying an `exp` claim in
//! Unix seconds. The cache keeps the current token together with that expiry
//! and hands it out while more than the refresh margin is left.
//!
//! Checking freshness and refreshing happen under one mutex, so at most one
//! refresh runs at a time. Callers queued behind a refresh re-check freshness
//! once they get the lock.

use crate::error::{CloudError, CloudResult};
use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD},
};
use chrono::{DateTime, TimeDelta, Utc};
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex as StdMutex};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Source of the current time.
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current time.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock.
#[derive(Debug)]
pub struct FixedClock {
    now: StdMutex<DateTime<Utc>>,
}

impl FixedClock {
    /// Create a clock stopped at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: StdMutex::new(now),
        }
    }

    /// Move the clock to `now`.
    pub fn set(&self, now: DateTime<Utc>) {
        if let Ok(mut current) = self.now.lock() {
            *current = now;
        }
    }

    /// Move the clock forward by `delta`.
    pub fn advance(&self, delta: TimeDelta) {
        if let Ok(mut current) = self.now.lock() {
            *current += delta;
        }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.now.lock().map(|now| *now).unwrap_or_else(|_| Utc::now())
    }
}

#[derive(Debug, Deserialize)]
struct TokenClaims {
    exp: i64,
}

/// A bearer token and the expiry decoded from its claims.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    token: SecretString,
    expires_at: DateTime<Utc>,
}

impl IssuedToken {
    /// Decode the expiry of a freshly issued token.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::InvalidToken`] if the token does not have three
    /// segments or its claims do not carry a valid `exp`.
    pub fn parse(token: String) -> CloudResult<Self> {
        let expires_at = decode_expiry(&token)?;
        Ok(Self {
            token: SecretString::from(token),
            expires_at,
        })
    }

    /// The token itself.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// When the token expires.
    #[must_use]
    pub const fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether more than `margin` is left before expiry at time `now`.
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>, margin: TimeDelta) -> bool {
        self.expires_at - now > margin
    }
}

/// Decode the `exp` claim of a three-segment token.
///
/// The claims segment is standard unpadded base64; the URL-safe alphabet is
/// accepted as well.
///
/// # Errors
///
/// Returns [`CloudError::InvalidToken`] if the token is malformed.
pub fn decode_expiry(token: &str) -> CloudResult<DateTime<Utc>> {
    let segments: Vec<&str> = token.split('.').collect();
    let [_, claims, _] = segments.as_slice() else {
        return Err(CloudError::invalid_token(format!(
            "expected 3 segments, found {}",
            segments.len()
        )));
    };

    let decoded = STANDARD_NO_PAD
        .decode(claims)
        .or_else(|_| URL_SAFE_NO_PAD.decode(claims))
        .map_err(|e| CloudError::invalid_token(format!("claims are not base64: {e}")))?;
    let claims: TokenClaims = serde_json::from_slice(&decoded)
        .map_err(|e| CloudError::invalid_token(format!("claims are not valid JSON: {e}")))?;

    DateTime::from_timestamp(claims.exp, 0)
        .ok_or_else(|| CloudError::invalid_token(format!("exp {} is out of range", claims.exp)))
}

/// Client-owned cache of the current bearer token.
#[derive(Debug)]
pub struct TokenCache {
    current: Mutex<Option<IssuedToken>>,
    refresh_margin: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl TokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(refresh_margin: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            current: Mutex::new(None),
            refresh_margin,
            clock,
        }
    }

    /// Return the cached token if it is fresh, otherwise fetch and store a new one.
    ///
    /// `refresh` is only invoked on a miss and returns the raw token string.
    /// On any failure the cached value is left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::TokenRefresh`] if `refresh` fails, or
    /// [`CloudError::InvalidToken`] if the new token cannot be decoded.
    pub async fn get_or_refresh<F, Fut>(&self, refresh: F) -> CloudResult<SecretString>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = CloudResult<String>>,
    {
        let mut current = self.current.lock().await;
        let now = self.clock.now();
        if let Some(issued) = (*current)
            .as_ref()
            .filter(|issued| issued.is_fresh(now, self.refresh_margin))
        {
            debug!(expires_at = %issued.expires_at, "Using cached access token");
            return Ok(issued.token.clone());
        }

        let raw = refresh()
            .await
            .map_err(|e| CloudError::TokenRefresh(Box::new(e)))?;
        let issued = IssuedToken::parse(raw)?;
        info!(expires_at = %issued.expires_at, "Refreshed access token");

        let token = issued.token.clone();
        *current = Some(issued);
        Ok(token)
    }

    /// Expiry of the cached token, if any.
    pub async fn expires_at(&self) -> Option<DateTime<Utc>> {
        let current = self.current.lock().await;
        (*current).as_ref().map(IssuedToken::expires_at)
    }
}
