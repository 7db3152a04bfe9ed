//! Confluent Cloud control-plane client.
//!
//! Authenticates against the Confluent Cloud API with a long-lived API key
//! and secret, exchanges them for short-lived bearer tokens when talking to
//! cluster REST gateways, and retries rate-limited calls on a fixed backoff
//! schedule.
//!
//! ```no_run
//! use ccloud_client::{CloudClient, ClientConfig};
//!
//! # async fn run() -> ccloud_client::CloudResult<()> {
//! let client = CloudClient::new(ClientConfig::from_env()?)?;
//! let accounts = client.list_service_accounts().await?;
//! println!("{} service accounts", accounts.len());
//! # Ok(())
//! # }
//! ```

pub mod acl;
pub mod api_key;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod request;
pub mod schema_registry;
pub mod service_account;
pub mod token;

#[cfg(test)]
mod testing;

pub use acl::{
    AclBinding, AclEntry, AclOperation, AclPermission, PatternType, ResourceType, user_principal,
    validate_cluster_id,
};
pub use api_key::{ApiKey, IamApiKey, LogicalCluster, NewApiKey};
pub use cache::ValueCache;
pub use client::CloudClient;
pub use config::{ClientConfig, Credentials};
pub use error::{CloudError, CloudResult};
pub use request::{RequestBuilder, Transport, path_segment};
pub use schema_registry::SchemaRegistryCluster;
pub use service_account::ServiceAccount;
pub use token::{Clock, FixedClock, IssuedToken, SystemClock, TokenCache};
