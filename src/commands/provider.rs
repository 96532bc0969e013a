//! Seams between the command handlers and the infrastructure provider.
//!
//! The handlers only see these traits; [`crate::aws`] implements them on
//! top of the AWS SDK clients.

use async_trait::async_trait;

use crate::config::CacheClusterSpec;
use crate::error::ProviderError;

/// Error code the provider returns when a cache cluster does not exist.
pub const CACHE_CLUSTER_NOT_FOUND: &str = "CacheClusterNotFound";

#[async_trait]
pub trait ScalingGroups: Send + Sync {
    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: i32,
        honor_cooldown: bool,
    ) -> Result<(), ProviderError>;

    /// Desired capacity of the named group, `None` when the group is not
    /// returned by the provider.
    async fn desired_capacity(&self, group: &str, max_records: i32)
        -> Result<Option<i32>, ProviderError>;
}

#[async_trait]
pub trait CacheClusters: Send + Sync {
    async fn create_cluster(&self, spec: &CacheClusterSpec) -> Result<(), ProviderError>;

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), ProviderError>;

    /// Current status string of the cluster. A missing cluster surfaces as a
    /// [`ProviderError`] carrying [`CACHE_CLUSTER_NOT_FOUND`].
    async fn cluster_status(
        &self,
        cluster_id: &str,
        max_records: i32,
        show_node_info: bool,
    ) -> Result<String, ProviderError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackSummary {
    pub stack_id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppSummary {
    pub app_id: String,
    pub name: String,
    pub revision: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentRequest {
    pub stack_id: String,
    pub app_id: String,
    pub migrate: bool,
    pub comment: String,
}

#[async_trait]
pub trait Deployments: Send + Sync {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProviderError>;

    async fn list_apps(&self, stack_id: &str) -> Result<Vec<AppSummary>, ProviderError>;

    /// Triggers a `deploy` command and returns the new deployment id.
    async fn create_deployment(&self, request: &DeploymentRequest)
        -> Result<String, ProviderError>;
}
