//! `deploy <stack> <app> [migrate]`: resolves names to OpsWorks ids and
//! triggers a deployment.
//!
//! Each step needs the previous step's result, so the provider calls run
//! strictly one after another and the first failure becomes the response.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::DeployConfig;
use crate::error::{render_errors, ProviderError};
use crate::provider::{AppSummary, DeploymentRequest, Deployments, StackSummary};
use crate::types::{Attachment, SlackResponse};

/// Parses the migration switch. Only `true` and `false` are accepted, in
/// any letter case.
pub fn parse_migrate(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

/// Finds the single entry called `name`. Duplicate names are reported
/// rather than guessed between.
fn find_unique<'a, T>(
    items: &'a [T],
    name: &str,
    name_of: impl Fn(&T) -> &str,
) -> Result<&'a T, usize> {
    let mut matches = items.iter().filter(|item| name_of(item) == name);
    match (matches.next(), matches.count()) {
        (Some(item), 0) => Ok(item),
        (Some(_), more) => Err(more + 1),
        (None, _) => Err(0),
    }
}

pub struct DeployHandler {
    config: DeployConfig,
    deployments: Arc<dyn Deployments>,
}

struct Resolved {
    stack: StackSummary,
    app: AppSummary,
}

impl DeployHandler {
    pub fn new(config: DeployConfig, deployments: Arc<dyn Deployments>) -> Self {
        Self {
            config,
            deployments,
        }
    }

    pub async fn handle(
        &self,
        stack: &str,
        app: &str,
        migrate: &str,
        user_name: &str,
    ) -> SlackResponse {
        let migrate_input = migrate.to_lowercase();
        info!(
            "Running /deploy with the following switches: {} {} {}",
            stack, app, migrate_input
        );

        let Some(migrate) = parse_migrate(&migrate_input) else {
            warn!(
                "Invalid migration switch, please use \"true\" or \"false\". User input was: {}",
                migrate_input
            );
            return SlackResponse::ephemeral(format!(
                "Invalid migration switch, please use `true` or `false` instead of {}",
                migrate_input
            ));
        };

        match self.run(stack, app, migrate, user_name).await {
            Ok(response) => {
                info!("Success with creating deployment");
                response
            }
            Err(response) => {
                warn!("Error with creating deployment");
                response
            }
        }
    }

    async fn run(
        &self,
        stack: &str,
        app: &str,
        migrate: bool,
        user_name: &str,
    ) -> Result<SlackResponse, SlackResponse> {
        let resolved = self.resolve(stack, app).await?;

        let request = DeploymentRequest {
            stack_id: resolved.stack.stack_id.clone(),
            app_id: resolved.app.app_id.clone(),
            migrate,
            comment: format!("triggered from Slack by {}", user_name),
        };

        let deployment_id = self
            .deployments
            .create_deployment(&request)
            .await
            .map_err(|err| {
                error!("Unable to create deployment: {}", err);
                SlackResponse::ephemeral("Unable to create deployment")
            })?;

        let url = self
            .config
            .deployment_url(&resolved.stack.stack_id, &deployment_id);
        let revision = resolved.app.revision.as_deref().unwrap_or("default revision");

        Ok(SlackResponse::in_channel(format!(
            "{} successfully started deployment of `{}` at `{}` on `{}`. Check on status at link below:",
            user_name, app, revision, stack
        ))
        .with_attachment(Attachment {
            text: Some(url.clone()),
            ..Attachment::link("Deployment status", url)
        }))
    }

    async fn resolve(&self, stack: &str, app: &str) -> Result<Resolved, SlackResponse> {
        let stacks = self
            .deployments
            .list_stacks()
            .await
            .map_err(|err| provider_failure("Error describing stacks", err))?;

        let stack = match find_unique(&stacks, stack, |s| s.name.as_str()) {
            Ok(found) => found.clone(),
            Err(0) => {
                warn!("Unable to find requested stack: {}", stack);
                return Err(SlackResponse::ephemeral(format!(
                    "Unable to find requested stack: {}",
                    stack
                )));
            }
            Err(count) => return Err(ambiguous("stack", stack, count)),
        };
        info!("Request stack {} has an ID of {}", stack.name, stack.stack_id);

        let apps = self
            .deployments
            .list_apps(&stack.stack_id)
            .await
            .map_err(|err| provider_failure("Error describing applications", err))?;

        let app = match find_unique(&apps, app, |a| a.name.as_str()) {
            Ok(found) => found.clone(),
            Err(0) => {
                warn!("Unable to find requested app: {}", app);
                return Err(SlackResponse::ephemeral(format!(
                    "Unable to find requested app: {}",
                    app
                )));
            }
            Err(count) => return Err(ambiguous("app", app, count)),
        };
        info!("Request app {} has an ID of {}", app.name, app.app_id);

        Ok(Resolved { stack, app })
    }
}

fn provider_failure(text: &str, err: ProviderError) -> SlackResponse {
    error!("{}: {}", text, err);
    SlackResponse::ephemeral(text).with_attachment(Attachment::text(render_errors(&[err])))
}

fn ambiguous(kind: &str, name: &str, count: usize) -> SlackResponse {
    warn!("{} {} matches {} entries", kind, name, count);
    SlackResponse::ephemeral(format!(
        "Requested {} {} is ambiguous: {} {}s share that name",
        kind, name, count, kind
    ))
}
