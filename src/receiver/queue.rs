use async_trait::async_trait;
use infra_commands::DeferredInvocation;
use lambda_http::Error;
use tracing::info;

/// Hands routed invocations to the processor.
#[async_trait]
pub trait InvocationQueue: Send + Sync {
    async fn enqueue(&self, message: &DeferredInvocation) -> Result<(), Error>;
}

pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
    queue_url: String,
}

impl SqsQueue {
    pub fn new(client: aws_sdk_sqs::Client, queue_url: String) -> Self {
        Self { client, queue_url }
    }
}

#[async_trait]
impl InvocationQueue for SqsQueue {
    async fn enqueue(&self, message: &DeferredInvocation) -> Result<(), Error> {
        let message_body = serde_json::to_string(message)?;

        let output = self
            .client
            .send_message()
            .queue_url(&self.queue_url)
            .message_body(message_body)
            .send()
            .await?;

        info!(
            "Queued {} for {} as {:?}",
            message.invocation.command,
            message.invocation.user_name,
            output.message_id()
        );
        Ok(())
    }
}
