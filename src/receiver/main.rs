mod queue;

use chrono::Utc;
use infra_commands::config::required;
use infra_commands::slack;
use infra_commands::types::Attachment;
use infra_commands::{route, DeferredInvocation, Routed, SlackResponse};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use tracing::{error, info, warn};

use queue::{InvocationQueue, SqsQueue};

async fn function_handler(
    event: Request,
    signing_secret: &str,
    queue: &dyn InvocationQueue,
) -> Result<Response<Body>, Error> {
    // Get body as string
    let body_bytes = event.body().to_vec();
    let body_string = match String::from_utf8(body_bytes) {
        Ok(body) => body,
        Err(e) => {
            warn!("Request body is not UTF-8: {}", e);
            return bad_request();
        }
    };

    // Get headers
    let slack_signature = event
        .headers()
        .get("X-Slack-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let slack_timestamp = event
        .headers()
        .get("X-Slack-Request-Timestamp")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    // Verify Slack signature
    if !slack::verify_slack_signature(signing_secret, &body_string, slack_timestamp, slack_signature)? {
        warn!("Rejected request with invalid Slack signature");
        return Ok(Response::builder()
            .status(401)
            .header("Content-Type", "text/plain")
            .body(Body::from("Unauthorized"))?);
    }

    let command = match slack::parse_command_form(&body_string) {
        Ok(command) => command,
        Err(e) => {
            warn!("Malformed slash command form: {}", e);
            return bad_request();
        }
    };

    match route(&command) {
        Routed::Respond(response) => json_response(&response),
        Routed::Invoke(invocation) => {
            if command.response_url.is_empty() {
                warn!("Slash command without response_url: {}", invocation.command);
                return bad_request();
            }

            info!(
                "Accepted {} from {} in #{}",
                invocation.command, command.user_name, command.channel_name
            );
            let queued = queue
                .enqueue(&DeferredInvocation {
                    invocation,
                    response_url: command.response_url.clone(),
                    received_at: Utc::now(),
                })
                .await;
            if let Err(e) = queued {
                error!("Unable to queue command from {}: {}", command.user_name, e);
                return json_response(
                    &SlackResponse::ephemeral("Unable to queue command, please try again")
                        .with_attachment(Attachment::text(e.to_string())),
                );
            }

            // Empty acknowledgement: the processor posts the only visible reply.
            Ok(Response::builder().status(200).body(Body::Empty)?)
        }
    }
}

fn json_response(response: &SlackResponse) -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(200)
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_string(response)?))?)
}

fn bad_request() -> Result<Response<Body>, Error> {
    Ok(Response::builder()
        .status(400)
        .header("Content-Type", "text/plain")
        .body(Body::from("Bad Request"))?)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let env = |name: &str| std::env::var(name).ok();
    let signing_secret = required(env, "SLACK_SIGNING_SECRET")?;
    let queue_url = required(env, "SQS_QUEUE_URL")?;

    let config = aws_config::load_from_env().await;
    let queue = SqsQueue::new(aws_sdk_sqs::Client::new(&config), queue_url);

    let signing_secret = signing_secret.as_str();
    let queue = &queue;
    run(service_fn(move |event: Request| async move {
        function_handler(event, signing_secret, queue).await
    }))
    .await
}
