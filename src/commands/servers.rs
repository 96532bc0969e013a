//! `servers start|stop|status`: lifecycle of the scaling group and the cache
//! cluster behind it.
//!
//! Both resources are driven concurrently and joined. A failure on one side
//! does not undo the other side; the failure response lists every branch
//! that failed.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::ServersConfig;
use crate::error::{render_errors, ProviderError};
use crate::provider::{CacheClusters, ScalingGroups, CACHE_CLUSTER_NOT_FOUND};
use crate::types::{Attachment, Field, SlackResponse};

pub const HELP_TEXT: &str = "Invalid command switch. Valid commands are `stop`, `start`, or `status`";

const DESCRIBE_MAX_RECORDS: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServersAction {
    Start,
    Stop,
    Status,
}

impl ServersAction {
    pub fn parse(command: &str) -> Option<Self> {
        match command.trim().to_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            "status" => Some(Self::Status),
            _ => None,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            Self::Start => "starting",
            Self::Stop => "stopping",
            Self::Status => "getting status of",
        }
    }
}

pub struct ServersHandler {
    config: ServersConfig,
    scaling: Arc<dyn ScalingGroups>,
    cache: Arc<dyn CacheClusters>,
}

impl ServersHandler {
    pub fn new(
        config: ServersConfig,
        scaling: Arc<dyn ScalingGroups>,
        cache: Arc<dyn CacheClusters>,
    ) -> Self {
        Self {
            config,
            scaling,
            cache,
        }
    }

    pub async fn handle(&self, command: &str, user_name: &str) -> SlackResponse {
        let Some(action) = ServersAction::parse(command) else {
            warn!("Invalid servers command: {}", command);
            return SlackResponse::ephemeral(HELP_TEXT);
        };
        info!("Running /servers {:?} for {}", action, user_name);

        let outcome = match action {
            ServersAction::Start => self.start().await.map(|()| self.started(user_name)),
            ServersAction::Stop => self.stop().await.map(|()| self.stopped(user_name)),
            ServersAction::Status => self.status().await.map(|fields| self.report(fields)),
        };

        outcome.unwrap_or_else(|errors| {
            error!("/servers {:?} failed: {:?}", action, errors);
            self.failed(action, &errors)
        })
    }

    async fn start(&self) -> Result<(), Vec<ProviderError>> {
        let (scaled, created) = tokio::join!(
            self.scaling.set_desired_capacity(
                &self.config.scaling_group,
                self.config.running_capacity,
                true,
            ),
            self.cache.create_cluster(&self.config.cache),
        );
        join_outcomes(scaled, created).map(|_| ())
    }

    async fn stop(&self) -> Result<(), Vec<ProviderError>> {
        let (scaled, deleted) = tokio::join!(
            self.scaling
                .set_desired_capacity(&self.config.scaling_group, 0, true),
            self.cache.delete_cluster(&self.config.cache.cluster_id),
        );
        join_outcomes(scaled, deleted).map(|_| ())
    }

    async fn status(&self) -> Result<Vec<Field>, Vec<ProviderError>> {
        let (capacity, cluster) = tokio::join!(
            self.scaling
                .desired_capacity(&self.config.scaling_group, DESCRIBE_MAX_RECORDS),
            self.cache
                .cluster_status(&self.config.cache.cluster_id, DESCRIBE_MAX_RECORDS, true),
        );

        let capacity = capacity.map(|desired| match desired {
            Some(desired) => format!("has desired capacity of {}", desired),
            None => "was not found".to_string(),
        });
        let cluster = match cluster {
            Ok(status) => Ok(format!("cluster status is {}", status)),
            Err(err) if err.code() == Some(CACHE_CLUSTER_NOT_FOUND) => {
                Ok("has not been created".to_string())
            }
            Err(err) => Err(err),
        };

        let (capacity, cluster) = join_outcomes(capacity, cluster)?;
        Ok(vec![
            Field::long(&self.config.scaling_group, capacity),
            Field::long(&self.config.cache.cluster_id, cluster),
        ])
    }

    fn started(&self, user_name: &str) -> SlackResponse {
        SlackResponse::in_channel(format!(
            "{} successfully started servers infrastructure `{}` and `{}`",
            user_name, self.config.cache.cluster_id, self.config.scaling_group
        ))
    }

    fn stopped(&self, user_name: &str) -> SlackResponse {
        SlackResponse::in_channel(format!(
            "{} successfully stopped server infrastructure `{}` and `{}`",
            user_name, self.config.cache.cluster_id, self.config.scaling_group
        ))
    }

    fn report(&self, fields: Vec<Field>) -> SlackResponse {
        SlackResponse::in_channel("Status of server infrastructure").with_attachment(
            Attachment::link("View server dashboard", &self.config.dashboard_url)
                .with_fields(fields),
        )
    }

    fn failed(&self, action: ServersAction, errors: &[ProviderError]) -> SlackResponse {
        SlackResponse::ephemeral(format!(
            "Errors with {} `{}` and `{}`. Please see logs for details:",
            action.verb(),
            self.config.cache.cluster_id,
            self.config.scaling_group
        ))
        .with_attachment(Attachment::text(render_errors(errors)))
    }
}

/// Combines two independent branch results, keeping every error.
fn join_outcomes<A, B>(
    a: Result<A, ProviderError>,
    b: Result<B, ProviderError>,
) -> Result<(A, B), Vec<ProviderError>> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (a, b) => Err(a.err().into_iter().chain(b.err()).collect()),
    }
}
