use aws_lambda_events::event::sqs::SqsEvent;
use chrono::{DateTime, Utc};
use infra_commands::{AppConfig, DeferredInvocation, Dispatcher, SlackResponse};
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use tracing::{error, info, warn};

async fn function_handler(
    event: LambdaEvent<SqsEvent>,
    dispatcher: &Dispatcher,
    client: &reqwest::Client,
) -> Result<(), Error> {
    // Failures are logged per record; failing the batch would make SQS
    // redeliver and re-run infrastructure commands.
    for record in event.payload.records {
        let Some(body) = record.body else {
            continue;
        };

        let deferred: DeferredInvocation = match serde_json::from_str(&body) {
            Ok(deferred) => deferred,
            Err(e) => {
                error!("Dropping malformed message {:?}: {}", record.message_id, e);
                continue;
            }
        };

        let Some(response) = process(&deferred, dispatcher, Utc::now()).await else {
            continue;
        };

        if let Err(e) = send_delayed_response(client, &deferred.response_url, &response).await {
            error!(
                "Failed to deliver {} response to {}: {}",
                deferred.invocation.command, deferred.invocation.user_name, e
            );
        }
    }

    Ok(())
}

async fn process(
    deferred: &DeferredInvocation,
    dispatcher: &Dispatcher,
    now: DateTime<Utc>,
) -> Option<SlackResponse> {
    if deferred.is_expired(now) {
        warn!(
            "Skipping {} from {} received at {}: response_url has expired",
            deferred.invocation.command, deferred.invocation.user_name, deferred.received_at
        );
        return None;
    }

    Some(dispatcher.dispatch(&deferred.invocation).await)
}

async fn send_delayed_response(
    client: &reqwest::Client,
    response_url: &str,
    response: &SlackResponse,
) -> Result<(), Error> {
    let resp = client.post(response_url).json(response).send().await?;

    if !resp.status().is_success() {
        let status = resp.status();
        let error_text = resp.text().await.unwrap_or_default();
        return Err(format!("Slack response_url error {}: {}", status, error_text).into());
    }

    info!("Delivered response to Slack");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let config = AppConfig::from_env()?;
    info!("Loaded configuration: {:?}", config);

    let dispatcher = Dispatcher::from_aws(config).await;
    let client = reqwest::Client::new();

    let dispatcher = &dispatcher;
    let client = &client;
    run(service_fn(move |event: LambdaEvent<SqsEvent>| async move {
        function_handler(event, dispatcher, client).await
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::Duration;
    use infra_commands::config::CacheClusterSpec;
    use infra_commands::deploy::DeployHandler;
    use infra_commands::provider::{
        AppSummary, CacheClusters, DeploymentRequest, Deployments, ScalingGroups, StackSummary,
    };
    use infra_commands::servers::{ServersHandler, HELP_TEXT};
    use infra_commands::Invocation;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    /// Fails the test if any provider call is made.
    struct Untouchable;

    #[async_trait]
    impl ScalingGroups for Untouchable {
        async fn set_desired_capacity(
            &self,
            _: &str,
            _: i32,
            _: bool,
        ) -> Result<(), infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }

        async fn desired_capacity(
            &self,
            _: &str,
            _: i32,
        ) -> Result<Option<i32>, infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }
    }

    #[async_trait]
    impl CacheClusters for Untouchable {
        async fn create_cluster(
            &self,
            _: &CacheClusterSpec,
        ) -> Result<(), infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }

        async fn delete_cluster(&self, _: &str) -> Result<(), infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }

        async fn cluster_status(
            &self,
            _: &str,
            _: i32,
            _: bool,
        ) -> Result<String, infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }
    }

    #[async_trait]
    impl Deployments for Untouchable {
        async fn list_stacks(&self) -> Result<Vec<StackSummary>, infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }

        async fn list_apps(
            &self,
            _: &str,
        ) -> Result<Vec<AppSummary>, infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }

        async fn create_deployment(
            &self,
            _: &DeploymentRequest,
        ) -> Result<String, infra_commands::ProviderError> {
            panic!("unexpected provider call")
        }
    }

    fn dispatcher() -> Dispatcher {
        let config = AppConfig::default();
        let provider = Arc::new(Untouchable);
        Dispatcher::new(
            ServersHandler::new(config.servers, provider.clone(), provider.clone()),
            DeployHandler::new(config.deploy, provider),
        )
    }

    fn deferred(command: &str, args: &[(&str, &str)], received_at: DateTime<Utc>) -> DeferredInvocation {
        DeferredInvocation {
            invocation: Invocation {
                command: command.to_string(),
                args: args
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect::<BTreeMap<_, _>>(),
                user_id: "U1".to_string(),
                user_name: "alice".to_string(),
            },
            response_url: "https://hooks.slack.com/commands/x".to_string(),
            received_at,
        }
    }

    #[tokio::test]
    async fn test_expired_message_is_skipped() {
        let now = Utc::now();
        let message = deferred("servers", &[("command", "start")], now - Duration::minutes(45));

        assert_eq!(process(&message, &dispatcher(), now).await, None);
    }

    #[tokio::test]
    async fn test_fresh_message_is_dispatched() {
        let now = Utc::now();
        let message = deferred("servers", &[("command", "progress")], now);

        let response = process(&message, &dispatcher(), now).await;

        assert_eq!(response, Some(SlackResponse::ephemeral(HELP_TEXT)));
    }

    #[tokio::test]
    async fn test_invalid_migrate_never_reaches_provider() {
        let now = Utc::now();
        let message = deferred(
            "deploy",
            &[("stack", "my_stack"), ("app", "my_app"), ("migrate", "invalid")],
            now,
        );

        let response = process(&message, &dispatcher(), now).await.unwrap();

        assert_eq!(
            response.text,
            "Invalid migration switch, please use `true` or `false` instead of invalid"
        );
    }
}
