//! Cluster API key management.
//!
//! Keys are created, updated and deleted through the internal `api_keys`
//! endpoint and read back through `iam/v2/api-keys`. The control plane
//! answers 403 for keys that do not exist, so read and delete treat 403 as
//! absence.

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::request::{decode_json, path_segment};
use reqwest::StatusCode;
use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{info, instrument};

const API_KEYS_ENDPOINT: &str = "api_keys";

/// A cluster an API key is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalCluster {
    /// Cluster id
    pub id: String,
    /// Cluster type
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl LogicalCluster {
    fn scoped_to(id: &str) -> Vec<Self> {
        vec![Self {
            id: id.to_string(),
            kind: None,
        }]
    }
}

fn secret_from_string<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// A freshly created API key, including its secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    /// Public key
    pub key: String,
    /// Secret, only returned on creation
    #[serde(deserialize_with = "secret_from_string", default = "empty_secret")]
    pub secret: SecretString,
    /// Hash of the secret
    #[serde(default)]
    pub hashed_secret: String,
    /// Hash function used for `hashed_secret`
    #[serde(default)]
    pub hashed_function: String,
    /// SASL mechanism the key is used with
    #[serde(default)]
    pub sasl_mechanism: String,
    /// Numeric id of the owning user
    #[serde(default)]
    pub user_id: u64,
    /// Whether the key is deactivated
    #[serde(rename = "deactived", default)]
    pub deactivated: bool,
    /// Internal numeric id used by update and delete
    pub id: u64,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Clusters the key is scoped to
    #[serde(default)]
    pub logical_clusters: Vec<LogicalCluster>,
    /// Environment id
    #[serde(default)]
    pub account_id: String,
    /// Whether the owner is a service account
    #[serde(default)]
    pub service_account: bool,
}

fn empty_secret() -> SecretString {
    SecretString::from(String::new())
}

#[derive(Debug, Deserialize)]
struct ApiKeyEnvelope {
    api_key: ApiKey,
}

/// Reference to another resource by id.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ResourceRef {
    /// Resource id
    #[serde(default)]
    pub id: String,
}

/// API key description as returned by the IAM v2 API.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct IamApiKeySpec {
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Resource the key grants access to
    #[serde(default)]
    pub resource: ResourceRef,
    /// Owner of the key
    #[serde(default)]
    pub owner: ResourceRef,
}

/// An API key as returned by the IAM v2 API.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct IamApiKey {
    /// Same value as [`ApiKey::key`]
    pub id: String,
    /// Key details
    #[serde(default)]
    pub spec: IamApiKeySpec,
}

/// Parameters for creating an API key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewApiKey {
    /// Numeric id of the owning user, or the caller if unset
    pub user_id: Option<u64>,
    /// Environment id
    pub environment_id: String,
    /// Cluster the key is scoped to
    pub resource_id: String,
    /// Free-form description
    pub description: String,
}

#[derive(Debug, Serialize)]
struct CreateApiKey<'a> {
    account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<u64>,
    #[serde(skip_serializing_if = "str::is_empty")]
    description: &'a str,
    logical_clusters: Vec<LogicalCluster>,
}

#[derive(Debug, Serialize)]
struct UpdateApiKey<'a> {
    id: &'a str,
    account_id: &'a str,
    description: &'a str,
    logical_clusters: Vec<LogicalCluster>,
}

#[derive(Debug, Serialize)]
struct DeleteApiKey<'a> {
    id: &'a str,
    account_id: &'a str,
    logical_clusters: Vec<LogicalCluster>,
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    api_key: T,
}

impl CloudClient {
    /// Create an API key scoped to one cluster.
    ///
    /// # Errors
    ///
    /// Returns an error unless the control plane answers 200 with a key.
    #[instrument(skip(self, request), fields(environment_id = %request.environment_id, resource_id = %request.resource_id))]
    pub async fn create_api_key(&self, request: &NewApiKey) -> CloudResult<ApiKey> {
        let body = Envelope {
            api_key: CreateApiKey {
                account_id: &request.environment_id,
                user_id: request.user_id,
                description: &request.description,
                logical_clusters: LogicalCluster::scoped_to(&request.resource_id),
            },
        };
        let response = self
            .request_builder()
            .endpoint([API_KEYS_ENDPOINT])
            .json(&body)?
            .post()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CloudError::unexpected_status("api key creation", status));
        }
        let created: ApiKeyEnvelope = decode_json(response).await?;
        info!(key = %created.api_key.key, id = created.api_key.id, "Created API key");
        Ok(created.api_key)
    }

    /// Read an API key, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error for any status other than 200 or 403.
    #[instrument(skip(self))]
    pub async fn read_api_key(&self, key: &str) -> CloudResult<Option<IamApiKey>> {
        let response = self
            .request_builder()
            .endpoint([format!("iam/v2/api-keys/{}", path_segment(key)?)])
            .get()
            .execute_and_retry_on_429()
            .await?;

        match response.status() {
            StatusCode::FORBIDDEN => Ok(None),
            StatusCode::OK => Ok(Some(decode_json(response).await?)),
            status => Err(CloudError::unexpected_status("api key read", status)),
        }
    }

    /// Replace the description and scope of an API key.
    ///
    /// # Errors
    ///
    /// Returns an error unless the control plane answers 200.
    #[instrument(skip(self, description))]
    pub async fn update_api_key(
        &self,
        id: &str,
        description: &str,
        environment_id: &str,
        resource_id: &str,
    ) -> CloudResult<()> {
        let body = Envelope {
            api_key: UpdateApiKey {
                id,
                account_id: environment_id,
                description,
                logical_clusters: LogicalCluster::scoped_to(resource_id),
            },
        };
        let response = self
            .request_builder()
            .endpoint([format!("{API_KEYS_ENDPOINT}/{}", path_segment(id)?)])
            .json(&body)?
            .put()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CloudError::unexpected_status("api key update", status));
        }
        Ok(())
    }

    /// Delete an API key. Deleting a key that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error for any status other than 200 or 403.
    #[instrument(skip(self))]
    pub async fn delete_api_key(
        &self,
        id: &str,
        environment_id: &str,
        resource_id: &str,
    ) -> CloudResult<()> {
        let body = Envelope {
            api_key: DeleteApiKey {
                id,
                account_id: environment_id,
                logical_clusters: LogicalCluster::scoped_to(resource_id),
            },
        };
        let response = self
            .request_builder()
            .endpoint([format!("{API_KEYS_ENDPOINT}/{}", path_segment(id)?)])
            .json(&body)?
            .delete()
            .execute_and_retry_on_429()
            .await?;

        match response.status() {
            StatusCode::FORBIDDEN => {
                info!("API key already gone");
                Ok(())
            }
            StatusCode::OK => {
                info!("Deleted API key");
                Ok(())
            }
            status => Err(CloudError::unexpected_status("api key deletion", status)),
        }
    }
}
