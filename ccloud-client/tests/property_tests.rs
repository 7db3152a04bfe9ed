//! Property-based tests for the cloud client.
//!
//! Tests validate:
//! - Token expiry decoding and the refresh margin
//! - URL segment resolution
//! - ACL wire values
//! - Secret non-exposure in debug output

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use ccloud_client::{
    AclOperation, AclPermission, ClientConfig, Credentials, FixedClock, IssuedToken, PatternType,
    RequestBuilder, ResourceType, TokenCache, Transport,
};
use ccloud_common::RetryPolicy;
use chrono::{DateTime, TimeDelta};
use proptest::prelude::*;
use secrecy::ExposeSecret;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

fn token_with_exp(exp: i64) -> String {
    let claims = STANDARD_NO_PAD.encode(serde_json::json!({ "exp": exp }).to_string());
    format!("eyJhbGciOiJIUzI1NiJ9.{claims}.c2lnbmF0dXJl")
}

fn basic_builder(base_url: &str) -> RequestBuilder {
    RequestBuilder::with_basic_auth(
        Transport::new(reqwest::Client::new(), RetryPolicy::with_defaults()),
        base_url,
        &Credentials::new("key", "secret"),
    )
}

fn assert_wire_values<T>(all: &[T]) -> Result<(), TestCaseError>
where
    T: FromStr + ToString + PartialEq + std::fmt::Debug + serde::Serialize,
    <T as FromStr>::Err: std::fmt::Debug,
{
    for value in all {
        let wire = value.to_string();
        prop_assert_eq!(&T::from_str(&wire).unwrap(), value);
        prop_assert_eq!(serde_json::to_value(value).unwrap(), serde_json::json!(wire));
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The stored expiry is exactly the `exp` claim.
    #[test]
    fn prop_expiry_matches_exp_claim(exp in 0i64..4_102_444_800) {
        let issued = IssuedToken::parse(token_with_exp(exp)).unwrap();
        prop_assert_eq!(issued.expires_at().timestamp(), exp);
    }

    /// A cached token is reused iff more than the margin is left.
    #[test]
    fn prop_token_reused_iff_beyond_margin(
        lifetime_secs in 1i64..7_200,
        elapsed_secs in 0i64..7_200,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async {
            let start = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
            let clock = Arc::new(FixedClock::new(start));
            let cache = TokenCache::new(TimeDelta::minutes(5), clock.clone());
            let exp = start.timestamp() + lifetime_secs;
            let refreshes = AtomicUsize::new(0);
            let counter = &refreshes;
            let refresh = || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(token_with_exp(exp))
            };

            cache.get_or_refresh(refresh).await.unwrap();
            clock.advance(TimeDelta::seconds(elapsed_secs));
            let token = cache.get_or_refresh(refresh).await.unwrap();

            let issued = token_with_exp(exp);
            prop_assert_eq!(token.expose_secret(), issued.as_str());
            let fresh_later = lifetime_secs - elapsed_secs > 300;
            let expected = 1 + usize::from(!fresh_later);
            prop_assert_eq!(refreshes.load(Ordering::SeqCst), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Relative segments extend the base path in order.
    #[test]
    fn prop_relative_segments_extend_base(
        segments in prop::collection::vec("[a-z][a-z0-9_-]{0,10}", 1..5),
    ) {
        let joined = segments.join("/");
        let url = basic_builder("https://host/api/").endpoint([joined.clone()]).url().unwrap();
        prop_assert_eq!(url.as_str(), format!("https://host/api/{joined}"));
    }

    /// An absolute segment replaces everything resolved before it.
    #[test]
    fn prop_absolute_segment_overrides_host(
        host in "[a-z]{1,12}\\.example\\.com",
        path in "[a-z]{1,10}",
    ) {
        let url = basic_builder("https://confluent.cloud/api/")
            .endpoint([format!("https://{host}"), path.clone()])
            .url()
            .unwrap();
        prop_assert_eq!(url.as_str(), format!("https://{host}/{path}"));
    }

    /// The API secret never appears in debug output.
    #[test]
    fn prop_secret_not_in_debug(
        key in "[A-Z0-9]{16}",
        secret in "[a-zA-Z0-9+/]{32,64}",
    ) {
        let config = ClientConfig::new(key.clone(), secret.clone());
        let debug = format!("{config:?}");
        prop_assert!(debug.contains(&key));
        prop_assert!(!debug.contains(&secret));
    }
}

#[test]
fn acl_enums_round_trip_through_wire_values() {
    assert_wire_values(ResourceType::ALL).unwrap();
    assert_wire_values(PatternType::ALL).unwrap();
    assert_wire_values(AclOperation::ALL).unwrap();
    assert_wire_values(AclPermission::ALL).unwrap();
}
