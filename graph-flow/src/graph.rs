use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::{
    context::Context,
    error::{GraphError, Result},
    task::{NextAction, Task},
};

/// Upper bound on steps in one execution unless overridden by the builder
pub const DEFAULT_MAX_STEPS: usize = 64;

/// An immutable graph of tasks.
///
/// Graphs are built once with [`GraphBuilder`] and can then be shared between
/// any number of concurrent executions. All per-run state lives in the
/// [`Context`] passed to [`Graph::execute`].
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: HashMap<String, String>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl Graph {
    /// Run from the start task until a task ends the flow or no edge remains
    pub async fn execute(&self, context: Context) -> Result<ExecutionResult> {
        let start = self
            .start_task_id
            .clone()
            .ok_or_else(|| GraphError::NoStartTask(self.id.clone()))?;

        let mut current = start;
        let mut visited = Vec::new();
        let mut response = None;

        loop {
            if visited.len() >= self.max_steps {
                return Err(GraphError::StepLimitExceeded(self.max_steps));
            }

            let task = self
                .tasks
                .get(&current)
                .ok_or_else(|| GraphError::TaskNotFound(current.clone()))?;

            debug!(graph_id = %self.id, task_id = %current, "running task");
            let result = task.run(context.clone()).await?;
            visited.push(current.clone());

            if result.response.is_some() {
                response = result.response;
            }

            let next = match result.next_action {
                NextAction::End => None,
                NextAction::Continue => self.next_task(&current),
            };
            match next {
                Some(next_id) => current = next_id,
                None => break,
            }
        }

        Ok(ExecutionResult { response, visited })
    }

    fn next_task(&self, task_id: &str) -> Option<String> {
        self.edges.get(task_id).cloned()
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<(String, String)>,
    start_task_id: Option<String>,
    max_steps: usize,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Add a task. The first task added becomes the start task.
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.start_task_id.is_none() {
            self.start_task_id = Some(task_id.clone());
        }
        self.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.edges.push((from.into(), to.into()));
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Finish the graph, checking that every edge joins two added tasks
    pub fn build(self) -> Result<Graph> {
        let mut edges = HashMap::new();
        for (from, to) in self.edges {
            for id in [&from, &to] {
                if !self.tasks.contains_key(id) {
                    return Err(GraphError::TaskNotFound(id.clone()));
                }
            }
            // first edge wins; later duplicates are ignored
            edges.entry(from).or_insert(to);
        }

        Ok(Graph {
            id: self.id,
            tasks: self.tasks,
            edges,
            start_task_id: self.start_task_id,
            max_steps: self.max_steps,
        })
    }
}

/// Outcome of running a graph to completion
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Last response produced by any task in the run
    pub response: Option<String>,
    /// Ids of the tasks that ran, in order
    pub visited: Vec<String>,
}
