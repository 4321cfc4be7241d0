use thiserror::Error;

/// Errors raised while building or executing a task graph
#[derive(Debug, Error)]
pub enum GraphError {
    /// A task failed with a typed error the caller may want to recover
    #[error("task {task_id} failed: {source}")]
    TaskFailed {
        task_id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("graph {0} has no start task")]
    NoStartTask(String),

    #[error("graph execution exceeded {0} steps")]
    StepLimitExceeded(usize),
}

impl GraphError {
    /// Wrap a typed error raised inside a task
    pub fn task_failed(
        task_id: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::TaskFailed {
            task_id: task_id.into(),
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
