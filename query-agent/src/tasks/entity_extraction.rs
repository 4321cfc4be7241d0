use std::sync::Arc;

use async_trait::async_trait;
use graph_flow::{Context, NextAction, Task, TaskResult};
use tracing::info;

use super::context_keys;
use crate::extractor::EntityExtractor;

/// Task that pulls actors, directors, genres and a title guess out of the query
pub struct EntityExtractionTask {
    extractor: Arc<EntityExtractor>,
}

impl EntityExtractionTask {
    pub fn new(extractor: Arc<EntityExtractor>) -> Self {
        Self { extractor }
    }
}

#[async_trait]
impl Task for EntityExtractionTask {
    async fn run(&self, context: Context) -> graph_flow::Result<TaskResult> {
        let user_query: String = context.require(context_keys::USER_QUERY)?;

        let entities = self.extractor.extract(&user_query);
        info!(
            actors = ?entities.actors,
            directors = ?entities.directors,
            genres = ?entities.genres,
            movie_name = ?entities.movie_name,
            "entities extracted"
        );

        context.set(context_keys::ENTITIES, &entities).await?;
        Ok(TaskResult::new(None, NextAction::Continue))
    }
}
