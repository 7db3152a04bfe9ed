//! Kafka ACL operations against a cluster REST gateway.
//!
//! ACL calls go to the cluster's own REST endpoint under
//! `kafka/v3/clusters/{cluster_id}/acls` and are authenticated with a bearer
//! token.

use crate::client::CloudClient;
use crate::error::{CloudError, CloudResult};
use crate::request::{decode_json, path_segment};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info, instrument};

const CLUSTER_ID_PREFIX: &str = "lkc-";

/// Closed set of wire values with `as_str`, `Display` and `FromStr`.
macro_rules! wire_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $wire:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $(
                #[doc = concat!("`", $wire, "`")]
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Wire representation.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = CloudError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok(Self::$variant),)+
                    other => Err(CloudError::invalid_value(format!(
                        "unknown {} {other:?}",
                        stringify!($name)
                    ))),
                }
            }
        }
    };
}

wire_enum! {
    /// Kind of resource an ACL applies to.
    ResourceType {
        Any => "ANY",
        Topic => "TOPIC",
        Group => "GROUP",
        Cluster => "CLUSTER",
        TransactionalId => "TRANSACTIONAL_ID",
        DelegationToken => "DELEGATION_TOKEN",
    }
}

wire_enum! {
    /// How the resource name is matched.
    PatternType {
        Any => "ANY",
        Match => "MATCH",
        Literal => "LITERAL",
        Prefixed => "PREFIXED",
    }
}

wire_enum! {
    /// Operation an ACL allows or denies.
    AclOperation {
        Any => "ANY",
        All => "ALL",
        Read => "READ",
        Write => "WRITE",
        Create => "CREATE",
        Delete => "DELETE",
        Alter => "ALTER",
        Describe => "DESCRIBE",
        ClusterAction => "CLUSTER_ACTION",
        DescribeConfigs => "DESCRIBE_CONFIGS",
        AlterConfigs => "ALTER_CONFIGS",
        IdempotentWrite => "IDEMPOTENT_WRITE",
    }
}

wire_enum! {
    /// Whether an ACL allows or denies.
    AclPermission {
        Any => "ANY",
        Deny => "DENY",
        Allow => "ALLOW",
    }
}

/// Principal string for a numeric user id.
#[must_use]
pub fn user_principal(user_id: u64) -> String {
    format!("User:{user_id}")
}

/// An ACL rule, also used as the filter for listing and deleting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclBinding {
    /// Resource kind
    pub resource_type: ResourceType,
    /// Resource name, or `*`
    pub resource_name: String,
    /// How `resource_name` is matched
    pub pattern_type: PatternType,
    /// Principal, e.g. `User:12345`
    pub principal: String,
    /// Host, usually `*`
    pub host: String,
    /// Operation
    pub operation: AclOperation,
    /// Allow or deny
    pub permission: AclPermission,
}

impl AclBinding {
    /// Query parameters selecting exactly this binding.
    #[must_use]
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("principal", self.principal.clone()),
            ("resource_name", self.resource_name.clone()),
            ("resource_type", self.resource_type.to_string()),
            ("pattern_type", self.pattern_type.to_string()),
            ("host", self.host.clone()),
            ("operation", self.operation.to_string()),
            ("permission", self.permission.to_string()),
        ]
    }

    /// Stable identifier of this binding for a cluster and service account.
    ///
    /// ```
    /// use ccloud_client::{AclBinding, AclOperation, AclPermission, PatternType, ResourceType};
    ///
    /// let binding = AclBinding {
    ///     resource_type: ResourceType::Topic,
    ///     resource_name: "orders".to_string(),
    ///     pattern_type: PatternType::Literal,
    ///     principal: "User:42".to_string(),
    ///     host: "*".to_string(),
    ///     operation: AclOperation::Read,
    ///     permission: AclPermission::Allow,
    /// };
    /// assert_eq!(
    ///     binding.id("lkc-1", "billing"),
    ///     "lkc-1/billing/TOPIC#orders#LITERAL#*#READ#ALLOW"
    /// );
    /// ```
    #[must_use]
    pub fn id(&self, cluster_id: &str, service_account_name: &str) -> String {
        format!(
            "{cluster_id}/{service_account_name}/{}#{}#{}#{}#{}#{}",
            self.resource_type,
            self.resource_name,
            self.pattern_type,
            self.host,
            self.operation,
            self.permission
        )
    }
}

/// An ACL as listed by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AclEntry {
    /// Resource kind reported by the gateway
    #[serde(default)]
    pub kind: String,
    /// Cluster the ACL belongs to
    pub cluster_id: String,
    /// The rule itself
    #[serde(flatten)]
    pub binding: AclBinding,
}

#[derive(Debug, Deserialize)]
struct AclList {
    data: Vec<AclEntry>,
}

/// Check that `cluster_id` names a Kafka cluster.
///
/// # Errors
///
/// Returns [`CloudError::InvalidValue`] unless the id starts with `lkc-`
/// followed by at least one character.
pub fn validate_cluster_id(cluster_id: &str) -> CloudResult<()> {
    match cluster_id.strip_prefix(CLUSTER_ID_PREFIX) {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(CloudError::invalid_value(format!(
            "cluster id {cluster_id:?} must start with {CLUSTER_ID_PREFIX}"
        ))),
    }
}

fn acl_path(cluster_id: &str) -> CloudResult<String> {
    validate_cluster_id(cluster_id)?;
    Ok(format!("kafka/v3/clusters/{}/acls", path_segment(cluster_id)?))
}

impl CloudClient {
    /// List every ACL of a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if the cluster id is invalid, no token can be
    /// obtained, or the gateway does not answer 200.
    pub async fn list_acls(&self, endpoint: &str, cluster_id: &str) -> CloudResult<Vec<AclEntry>> {
        self.fetch_acls(endpoint, cluster_id, Vec::new()).await
    }

    /// List the ACLs of a cluster matching `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`list_acls`](Self::list_acls).
    pub async fn list_matching_acls(
        &self,
        endpoint: &str,
        cluster_id: &str,
        filter: &AclBinding,
    ) -> CloudResult<Vec<AclEntry>> {
        self.fetch_acls(endpoint, cluster_id, filter.query_params()).await
    }

    /// The single ACL matching `filter`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::AmbiguousMatch`] if more than one ACL matches.
    pub async fn find_acl(
        &self,
        endpoint: &str,
        cluster_id: &str,
        filter: &AclBinding,
    ) -> CloudResult<Option<AclEntry>> {
        let mut matches = self.list_matching_acls(endpoint, cluster_id, filter).await?;
        match matches.len() {
            0 | 1 => Ok(matches.pop()),
            n => Err(CloudError::AmbiguousMatch(n)),
        }
    }

    /// Create an ACL.
    ///
    /// # Errors
    ///
    /// Returns an error unless the gateway answers 201.
    #[instrument(skip(self, binding), fields(principal = %binding.principal, operation = %binding.operation))]
    pub async fn create_acl(
        &self,
        endpoint: &str,
        cluster_id: &str,
        binding: &AclBinding,
    ) -> CloudResult<()> {
        let path = acl_path(cluster_id)?;
        let response = self
            .cluster_request_builder(endpoint)
            .await?
            .endpoint([path])
            .json(binding)?
            .post()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(CloudError::unexpected_status("ACL creation", status));
        }
        info!(cluster_id, "Created ACL");
        Ok(())
    }

    /// Delete every ACL matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns an error unless the gateway answers 201.
    #[instrument(skip(self, filter), fields(principal = %filter.principal, operation = %filter.operation))]
    pub async fn delete_acls(
        &self,
        endpoint: &str,
        cluster_id: &str,
        filter: &AclBinding,
    ) -> CloudResult<()> {
        let path = acl_path(cluster_id)?;
        let response = self
            .cluster_request_builder(endpoint)
            .await?
            .endpoint([path])
            .query_params(filter.query_params())
            .delete()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::CREATED {
            return Err(CloudError::unexpected_status("ACL deletion", status));
        }
        info!(cluster_id, "Deleted ACLs");
        Ok(())
    }

    #[instrument(skip(self, query))]
    async fn fetch_acls(
        &self,
        endpoint: &str,
        cluster_id: &str,
        query: Vec<(&'static str, String)>,
    ) -> CloudResult<Vec<AclEntry>> {
        let path = acl_path(cluster_id)?;
        let response = self
            .cluster_request_builder(endpoint)
            .await?
            .endpoint([path])
            .query_params(query)
            .get()
            .execute_and_retry_on_429()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(CloudError::unexpected_status("ACL listing", status));
        }
        let list: AclList = decode_json(response).await?;
        debug!(count = list.data.len(), "Listed ACLs");
        Ok(list.data)
    }
}
