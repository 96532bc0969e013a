//! Recording in-memory providers for handler tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::CacheClusterSpec;
use crate::error::ProviderError;
use crate::provider::{
    AppSummary, CacheClusters, DeploymentRequest, Deployments, ScalingGroups, StackSummary,
};

#[derive(Default)]
pub struct FakeScaling {
    calls: Mutex<Vec<String>>,
    capacity: Option<i32>,
    error: Option<ProviderError>,
}

impl FakeScaling {
    pub fn with_capacity(capacity: Option<i32>) -> Self {
        Self {
            capacity,
            ..Default::default()
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        self.error.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl ScalingGroups for FakeScaling {
    async fn set_desired_capacity(
        &self,
        group: &str,
        capacity: i32,
        honor_cooldown: bool,
    ) -> Result<(), ProviderError> {
        self.record(format!(
            "set_desired_capacity {} {} {}",
            group, capacity, honor_cooldown
        ))
    }

    async fn desired_capacity(
        &self,
        group: &str,
        max_records: i32,
    ) -> Result<Option<i32>, ProviderError> {
        self.record(format!("desired_capacity {} {}", group, max_records))?;
        Ok(self.capacity)
    }
}

#[derive(Default)]
pub struct FakeCache {
    calls: Mutex<Vec<String>>,
    status: Option<String>,
    error: Option<ProviderError>,
}

impl FakeCache {
    pub fn with_status(status: &str) -> Self {
        Self {
            status: Some(status.to_string()),
            ..Default::default()
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(call);
        self.error.clone().map_or(Ok(()), Err)
    }
}

#[async_trait]
impl CacheClusters for FakeCache {
    async fn create_cluster(&self, spec: &CacheClusterSpec) -> Result<(), ProviderError> {
        self.record(format!("create_cluster {}", spec.cluster_id))
    }

    async fn delete_cluster(&self, cluster_id: &str) -> Result<(), ProviderError> {
        self.record(format!("delete_cluster {}", cluster_id))
    }

    async fn cluster_status(
        &self,
        cluster_id: &str,
        max_records: i32,
        show_node_info: bool,
    ) -> Result<String, ProviderError> {
        self.record(format!(
            "cluster_status {} {} {}",
            cluster_id, max_records, show_node_info
        ))?;
        Ok(self.status.clone().unwrap_or_else(|| "available".to_string()))
    }
}

pub struct FakeDeployments {
    calls: Mutex<Vec<String>>,
    stacks: Vec<StackSummary>,
    apps: Vec<AppSummary>,
    list_stacks_error: Option<ProviderError>,
    list_apps_error: Option<ProviderError>,
    create_error: Option<ProviderError>,
}

impl FakeDeployments {
    pub fn new(stacks: Vec<StackSummary>, apps: Vec<AppSummary>) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            stacks,
            apps,
            list_stacks_error: None,
            list_apps_error: None,
            create_error: None,
        }
    }

    pub fn fail_list_stacks(mut self, error: ProviderError) -> Self {
        self.list_stacks_error = Some(error);
        self
    }

    pub fn fail_list_apps(mut self, error: ProviderError) -> Self {
        self.list_apps_error = Some(error);
        self
    }

    pub fn fail_create_deployment(mut self, error: ProviderError) -> Self {
        self.create_error = Some(error);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Deployments for FakeDeployments {
    async fn list_stacks(&self) -> Result<Vec<StackSummary>, ProviderError> {
        self.record("list_stacks".to_string());
        match &self.list_stacks_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.stacks.clone()),
        }
    }

    async fn list_apps(&self, stack_id: &str) -> Result<Vec<AppSummary>, ProviderError> {
        self.record(format!("list_apps {}", stack_id));
        match &self.list_apps_error {
            Some(err) => Err(err.clone()),
            None => Ok(self.apps.clone()),
        }
    }

    async fn create_deployment(
        &self,
        request: &DeploymentRequest,
    ) -> Result<String, ProviderError> {
        self.record(format!(
            "create_deployment {} {} migrate={} {}",
            request.stack_id, request.app_id, request.migrate, request.comment
        ));
        match &self.create_error {
            Some(err) => Err(err.clone()),
            None => Ok("d-1".to_string()),
        }
    }
}
