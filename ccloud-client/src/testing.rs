//! Shared fixtures for unit tests.

use crate::{ClientConfig, CloudClient, FixedClock};
use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use ccloud_common::{HttpConfig, RecordingSleeper};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn token_with_exp(exp: i64) -> String {
    let claims = STANDARD_NO_PAD.encode(serde_json::json!({ "exp": exp }).to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{claims}.c2lnbmF0dXJl")
}

pub fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

/// Client pointed at `server` over plain HTTP, with the clock stopped at the epoch and no real backoff.
pub fn test_client(server: &MockServer) -> CloudClient {
    let config = ClientConfig::new("key", "secret")
        .with_base_url(format!("{}/api/", server.uri()))
        .with_http_config(HttpConfig::default().with_https_only(false));
    CloudClient::new(config)
        .unwrap()
        .with_sleeper(Arc::new(RecordingSleeper::new()))
        .with_clock(Arc::new(FixedClock::new(at(0))))
}

pub async fn mount_access_token(server: &MockServer, exp: i64) {
    Mock::given(method("POST"))
        .and(path("/api/access_tokens"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "token": token_with_exp(exp) })),
        )
        .mount(server)
        .await;
}
