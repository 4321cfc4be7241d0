use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, NextAction, Task, TaskResult};
use tracing::debug;

use super::context_keys;
use crate::prompt::PromptBuilder;
use crate::schema::Entities;

/// Task that renders the instruction prompt from the query and its entities
pub struct PromptConstructionTask {
    builder: Arc<PromptBuilder>,
}

impl PromptConstructionTask {
    pub fn new(builder: Arc<PromptBuilder>) -> Self {
        Self { builder }
    }
}

#[async_trait]
impl Task for PromptConstructionTask {
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let user_query: String = context.require(context_keys::USER_QUERY)?;
        let entities: Entities = context.require(context_keys::ENTITIES)?;

        let prompt = self.builder.build_prompt(&user_query, &entities);
        debug!(prompt_len = prompt.len(), "prompt constructed");

        context.set(context_keys::PROMPT, prompt).await?;
        Ok(TaskResult::new(None, NextAction::Continue))
    }
}
