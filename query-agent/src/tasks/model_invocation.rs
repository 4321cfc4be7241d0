use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graph_flow::{Context, GraphError, NextAction, Task, TaskResult};
use tracing::{error, info};

use super::context_keys;
use crate::error::AgentError;
use crate::llm::LlmClient;

/// Task that sends the prompt to the language model. Failures are not retried.
pub struct ModelInvocationTask {
    client: Arc<dyn LlmClient>,
    timeout: Option<Duration>,
}

impl ModelInvocationTask {
    pub fn new(client: Arc<dyn LlmClient>, timeout: Option<Duration>) -> Self {
        Self { client, timeout }
    }

    async fn generate(&self, prompt: &str) -> Result<String, AgentError> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.client.generate(prompt))
                .await
                .map_err(|_| AgentError::Timeout(limit))?,
            None => self.client.generate(prompt).await,
        }
    }
}

#[async_trait]
impl Task for ModelInvocationTask {
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let prompt: String = context.require(context_keys::PROMPT)?;

        let raw = self.generate(&prompt).await.map_err(|e| {
            error!(error = %e, "language model call failed");
            GraphError::task_failed(self.id(), e)
        })?;
        info!(response_len = raw.len(), "language model responded");

        context.set(context_keys::RAW_RESPONSE, raw).await?;
        Ok(TaskResult::new(None, NextAction::Continue))
    }
}
