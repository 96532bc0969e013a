//! AWS SDK backed providers: Auto Scaling, ElastiCache and OpsWorks.

use async_trait::async_trait;
use aws_config::{Region, SdkConfig};
use aws_sdk_autoscaling::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_elasticache::types::{AzMode, CacheCluster};
use aws_sdk_opsworks::types::{App, DeploymentCommand, DeploymentCommandName, Stack};
use tracing::{debug, error, info};

use crate::config::CacheClusterSpec;
use crate::error::ProviderError;
use crate::provider::{
    AppSummary, CacheClusters, DeploymentRequest, Deployments, ScalingGroups, StackSummary,
    CACHE_CLUSTER_NOT_FOUND,
};

/// Loads shared SDK configuration from the environment, pinned to `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::from_env()
        .region(Region::new(region.to_string()))
        .load()
        .await
}

fn provider_error<E>(operation: &'static str, err: E) -> ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    error!("{} failed: {}", operation, DisplayErrorContext(&err));
    let mut out = ProviderError::new(
        operation,
        err.message()
            .map(str::to_string)
            .unwrap_or_else(|| DisplayErrorContext(&err).to_string()),
    );
    if let Some(code) = err.code() {
        out = out.with_code(code);
    }
    out
}

fn first_cluster_status(
    clusters: &[CacheCluster],
    cluster_id: &str,
) -> Result<String, ProviderError> {
    clusters
        .first()
        .map(|c| c.cache_cluster_status().unwrap_or("unknown").to_string())
        .ok_or_else(|| {
            ProviderError::new(
                "DescribeCacheClusters",
                format!("Cache cluster {} not found.", cluster_id),
            )
            .with_code(CACHE_CLUSTER_NOT_FOUND)
        })
}

/// Stacks without an id or name cannot be matched and are skipped.
fn stack_summaries(stacks: &[Stack]) -> Vec<StackSummary> {
    stacks
        .iter()
        .filter_map(|stack| {
            Some(StackSummary {
                stack_id: stack.stack_id()?.to_string(),
                name: stack.name()?.to_string(),
            })
        })
        .collect()
}

fn app_summaries(apps: &[App]) -> Vec<AppSummary> {
    apps.iter()
        .filter_map(|app| {
            Some(AppSummary {
                app_id: app.app_id()?.to_string(),
                name: app.name()?.to_string(),
                revision: app
                    .app_source()
                    .and_then(|source| source.revision())
                    .map(str::to_string),
            })
        })
        .collect()
}

fn deploy_command(migrate: bool) -> Result<DeploymentCommand, ProviderError> {
    DeploymentCommand::builder()
        .name(DeploymentCommandName::Deploy)
        .args("migrate", vec![migrate.to_string()])
        .build()
        .map_err(|e| ProviderError::new("CreateDeployment", e.to_string()))
}

pub struct AwsScalingGroups {
    client: aws_sdk_autoscaling::Client,
}

impl AwsScalingGroups {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_autoscaling::Client::new(config),
        }
    }
}

#[async_trait]
impl ScalingGroups for AwsScalingGroups {
    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: i32,
        honor_cooldown: bool,
    ) -> Result<(), ProviderError> {
        let output = self
            .client
            .set_desired_capacity()
            .auto_scaling_group_name(group)
            .desired_capacity(capacity)
            .honor_cooldown(honor_cooldown)
            .send()
            .await
            .map_err(|e| provider_error("SetDesiredCapacity", e))?;
        info!("Set desired capacity of {} to {}: {:?}", group, capacity, output);
        Ok(())
    }

    async fn desired_capacity(
        &self,
        group: &str,
        max_records: i32,
    ) -> Result<Option<i32>, ProviderError> {
        let output = self
            .client
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(group)
            .max_records(max_records)
            .send()
            .await
            .map_err(|e| provider_error("DescribeAutoScalingGroups", e))?;
        debug!("DescribeAutoScalingGroups: {:?}", output);

        Ok(output
            .auto_scaling_groups()
            .first()
            .and_then(|g| g.desired_capacity()))
    }
}

pub struct AwsCacheClusters {
    client: aws_sdk_elasticache::Client,
}

impl AwsCacheClusters {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_elasticache::Client::new(config),
        }
    }
}

#[async_trait]
impl CacheClusters for AwsCacheClusters {
    async fn create_cluster(&self, spec: &CacheClusterSpec) -> Result<(), ProviderError> {
        let output = self
            .client
            .create_cache_cluster()
            .cache_cluster_id(&spec.cluster_id)
            .az_mode(AzMode::from(spec.az_mode.as_str()))
            .auto_minor_version_upgrade(true)
            .cache_node_type(&spec.node_type)
            .cache_subnet_group_name(&spec.subnet_group)
            .engine(&spec.engine)
            .engine_version(&spec.engine_version)
            .num_cache_nodes(spec.num_nodes)
            .port(spec.port)
            .preferred_availability_zone(&spec.preferred_az)
            .set_security_group_ids(Some(spec.security_group_ids.clone()))
            .snapshot_retention_limit(spec.snapshot_retention_limit)
            .send()
            .await
            .map_err(|e| provider_error("CreateCacheCluster", e))?;
        info!("Created cache cluster {}: {:?}", spec.cluster_id, output);
        Ok(())
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), ProviderError> {
        let output = self
            .client
            .delete_cache_cluster()
            .cache_cluster_id(cluster_id)
            .send()
            .await
            .map_err(|e| provider_error("DeleteCacheCluster", e))?;
        info!("Deleted cache cluster {}: {:?}", cluster_id, output);
        Ok(())
    }

    async fn cluster_status(
        &self,
        cluster_id: &str,
        max_records: i32,
        show_node_info: bool,
    ) -> Result<String, ProviderError> {
        let output = self
            .client
            .describe_cache_clusters()
            .cache_cluster_id(cluster_id)
            .max_records(max_records)
            .show_cache_node_info(show_node_info)
            .send()
            .await
            .map_err(|e| provider_error("DescribeCacheClusters", e))?;
        debug!("DescribeCacheClusters: {:?}", output);

        first_cluster_status(output.cache_clusters(), cluster_id)
    }
}

pub struct AwsDeployments {
    client: aws_sdk_opsworks::Client,
}

impl AwsDeployments {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_opsworks::Client::new(config),
        }
    }
}

#[async_trait]
impl Deployments for AwsDeployments {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProviderError> {
        let output = self
            .client
            .describe_stacks()
            .send()
            .await
            .map_err(|e| provider_error("DescribeStacks", e))?;

        Ok(stack_summaries(output.stacks()))
    }

    async fn list_apps(&self, stack_id: &str) -> Result<Vec<AppSummary>, ProviderError> {
        let output = self
            .client
            .describe_apps()
            .stack_id(stack_id)
            .send()
            .await
            .map_err(|e| provider_error("DescribeApps", e))?;

        Ok(app_summaries(output.apps()))
    }

    async fn create_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<String, ProviderError> {
        let command = deploy_command(request.migrate)?;

        let output = self
            .client
            .create_deployment()
            .stack_id(&request.stack_id)
            .app_id(&request.app_id)
            .command(command)
            .comment(&request.comment)
            .send()
            .await
            .map_err(|e| provider_error("CreateDeployment", e))?;
        info!("CreateDeployment: {:?}", output);

        output
            .deployment_id()
            .map(str::to_string)
            .ok_or_else(|| ProviderError::new("CreateDeployment", "response had no deployment id"))
    }
}
