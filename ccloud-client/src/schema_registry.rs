//! Schema registry lookup.

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::request::decode_json;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::instrument;

const SCHEMA_REGISTRIES_ENDPOINT: &str = "schema_registries";

/// A schema registry cluster.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SchemaRegistryCluster {
    /// Cluster id, e.g. `lsrc-abc123`
    pub id: String,
    /// REST endpoint
    pub endpoint: String,
}

#[derive(Debug, Deserialize)]
struct SchemaRegistryList {
    #[serde(default)]
    clusters: Vec<SchemaRegistryCluster>,
}

impl CloudClient {
    /// The first schema registry of an environment.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::NotFound`] if the environment has none, or an
    /// error unless the control plane answers 200.
    #[instrument(skip(self))]
    pub async fn first_schema_registry(
        &self,
        environment_id: &str,
    ) -> CloudResult<SchemaRegistryCluster> {
        let response = self
            .request_builder()
            .endpoint([SCHEMA_REGISTRIES_ENDPOINT])
            .query("account_id", environment_id)
            .get()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CloudError::unexpected_status("schema registry read", status));
        }
        let list: SchemaRegistryList = decode_json(response).await?;
        list.clusters.into_iter().next().ok_or_else(|| {
            CloudError::not_found(format!("schema registry in environment {environment_id}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::test_client;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_first_schema_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/schema_registries"))
            .and(query_param("account_id", "env-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "clusters": [
                    { "id": "lsrc-1", "endpoint": "https://psrc-1.confluent.cloud" },
                    { "id": "lsrc-2", "endpoint": "https://psrc-2.confluent.cloud" }
                ]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let registry = test_client(&server)
            .first_schema_registry("env-1")
            .await
            .unwrap();
        assert_eq!(registry.id, "lsrc-1");
        assert_eq!(registry.endpoint, "https://psrc-1.confluent.cloud");
    }

    #[tokio::test]
    async fn test_no_schema_registry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "clusters": [] })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .first_schema_registry("env-1")
            .await
            .unwrap_err();
        assert!(matches!(err, CloudError::NotFound(_)));
    }
}
