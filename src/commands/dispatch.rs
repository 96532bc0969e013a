use std::sync::Arc;

use tracing::{info, warn};

use crate::aws::{load_sdk_config, AwsCacheClusters, AwsDeployments, AwsScalingGroups};
use crate::config::AppConfig;
use crate::deploy::DeployHandler;
use crate::router::{DEPLOY, SERVERS};
use crate::servers::ServersHandler;
use crate::types::{Invocation, SlackResponse};

/// Runs routed invocations against the registered command handlers.
pub struct Dispatcher {
    servers: ServersHandler,
    deploy: DeployHandler,
}

impl Dispatcher {
    pub fn new(servers: ServersHandler, deploy: DeployHandler) -> Self {
        Self { servers, deploy }
    }

    /// Wires the handlers to AWS clients in the configured regions.
    pub async fn from_aws(config: AppConfig) -> Self {
        let servers_sdk = load_sdk_config(&config.servers.region).await;
        let deploy_sdk = load_sdk_config(&config.deploy.region).await;

        let servers = ServersHandler::new(
            config.servers,
            Arc::new(AwsScalingGroups::new(&servers_sdk)),
            Arc::new(AwsCacheClusters::new(&servers_sdk)),
        );
        let deploy = DeployHandler::new(config.deploy, Arc::new(AwsDeployments::new(&deploy_sdk)));

        Self::new(servers, deploy)
    }

    pub async fn dispatch(&self, invocation: &Invocation) -> SlackResponse {
        info!(
            "Dispatching {} for {} ({})",
            invocation.command, invocation.user_name, invocation.user_id
        );

        match invocation.command.as_str() {
            name if name == SERVERS.name => {
                self.servers
                    .handle(invocation.arg("command"), &invocation.user_name)
                    .await
            }
            name if name == DEPLOY.name => {
                self.deploy
                    .handle(
                        invocation.arg("stack"),
                        invocation.arg("app"),
                        invocation.arg("migrate"),
                        &invocation.user_name,
                    )
                    .await
            }
            other => {
                warn!("No handler registered for {}", other);
                SlackResponse::ephemeral(format!("Unknown command `{}`", other))
            }
        }
    }
}
