use async_trait::async_trait;
use graph_flow::{Context, NextAction, Task, TaskResult};
use tracing::info;

use super::context_keys;
use crate::response::{ValidationMode, parse_model_output};
use crate::schema::Interpretation;

/// Final task: strip fences, parse and validate the model output.
///
/// The task response is a one-line outcome: the query type, or the failure
/// marker.
pub struct ResponseParsingTask {
    validation: ValidationMode,
}

impl ResponseParsingTask {
    pub fn new(validation: ValidationMode) -> Self {
        Self { validation }
    }
}

fn outcome(interpretation: &Interpretation) -> String {
    match interpretation {
        Interpretation::Structured(query) => format!("structured: {}", query.query_type),
        Interpretation::Failed(failure) => format!("failed: {}", failure.error),
    }
}

#[async_trait]
impl Task for ResponseParsingTask {
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let raw: String = context.require(context_keys::RAW_RESPONSE)?;

        let interpretation = parse_model_output(&raw, self.validation);
        let outcome = outcome(&interpretation);
        info!(%outcome, "model response parsed");

        context
            .set(context_keys::INTERPRETATION, &interpretation)
            .await?;
        Ok(TaskResult::new(Some(outcome), NextAction::End))
    }
}
