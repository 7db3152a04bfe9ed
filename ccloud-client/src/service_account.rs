//! Service account listing.

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::request::decode_json;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const SERVICE_ACCOUNTS_ENDPOINT: &str = "service_accounts";
const SERVICE_ACCOUNTS_CACHE_KEY: &str = "serviceAccounts";

/// A service account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceAccount {
    /// Resource id, e.g. `sa-abc123`
    #[serde(rename = "resource_id")]
    pub id: String,
    /// Numeric user id used in ACL principals
    #[serde(rename = "id")]
    pub user_id: u64,
    /// Display name
    pub service_name: String,
}

#[derive(Debug, Deserialize)]
struct ServiceAccountList {
    #[serde(default)]
    users: Vec<ServiceAccount>,
}

impl CloudClient {
    /// List every service account.
    ///
    /// The first successful listing is cached for the lifetime of the client.
    ///
    /// # Errors
    ///
    /// Returns an error unless the control plane answers 200 with a list.
    #[instrument(skip(self))]
    pub async fn list_service_accounts(&self) -> CloudResult<Vec<ServiceAccount>> {
        self.cache()
            .get_or_try_insert_with(SERVICE_ACCOUNTS_CACHE_KEY, || self.fetch_service_accounts())
            .await
    }

    /// Numeric user id of the service account named `name`.
    ///
    /// If several accounts share the name, the last one listed wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the accounts cannot be listed.
    pub async fn service_account_numeric_id(&self, name: &str) -> CloudResult<Option<u64>> {
        let accounts = self.list_service_accounts().await?;
        Ok(accounts
            .iter()
            .rev()
            .find(|account| account.service_name == name)
            .map(|account| account.user_id))
    }

    async fn fetch_service_accounts(&self) -> CloudResult<Vec<ServiceAccount>> {
        let response = self
            .request_builder()
            .endpoint([SERVICE_ACCOUNTS_ENDPOINT])
            .get()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CloudError::unexpected_status("listing service accounts", status));
        }
        let list: ServiceAccountList = decode_json(response).await?;
        debug!(count = list.users.len(), "Fetched service accounts");
        Ok(list.users)
    }
}
