use std::sync::Arc;
use std::time::Duration;

use graph_flow::{Context, Graph, GraphBuilder, GraphError, Task};
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

use crate::config::AgentConfig;
use crate::error::{AgentError, Result};
use crate::extractor::{EntityExtractor, LabelMapping, TitlePolicy};
use crate::llm::{LlmClient, create_llm_client};
use crate::prompt::PromptBuilder;
use crate::recognizer::{EntityRecognizer, PatternRecognizer};
use crate::response::ValidationMode;
use crate::schema::Interpretation;
use crate::tasks::{
    EntityExtractionTask, ModelInvocationTask, PromptConstructionTask, ResponseParsingTask,
    context_keys,
};

const GRAPH_ID: &str = "query_understanding";

/// Settings of the interpreter that do not involve external handles
#[derive(Debug, Clone, Default)]
pub struct InterpreterOptions {
    pub label_mapping: LabelMapping,
    pub title_policy: TitlePolicy,
    pub validation: ValidationMode,
    pub timeout: Option<Duration>,
    pub prompt: PromptBuilder,
}

impl InterpreterOptions {
    /// Options from agent configuration, loading a custom template if one is set
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let prompt = match &config.prompt_template {
            Some(path) => PromptBuilder::from_file(path)?,
            None => PromptBuilder::default(),
        };

        Ok(Self {
            label_mapping: config.label_mapping.clone(),
            title_policy: config.title_policy,
            validation: config.validation,
            timeout: config.timeout,
            prompt,
        })
    }
}

/// Runs the full pipeline: extraction, prompt, model call, parsing.
///
/// The recognizer and model client are injected so tests can substitute
/// fakes. One interpreter can serve any number of concurrent calls; each call
/// gets its own flow context.
pub struct QueryInterpreter {
    graph: Arc<Graph>,
    extractor: Arc<EntityExtractor>,
    prompt: Arc<PromptBuilder>,
}

impl QueryInterpreter {
    pub fn new(
        recognizer: Arc<dyn EntityRecognizer>,
        client: Arc<dyn LlmClient>,
        options: InterpreterOptions,
    ) -> Result<Self> {
        let extractor = Arc::new(
            EntityExtractor::new(recognizer)
                .with_mapping(options.label_mapping)
                .with_title_policy(options.title_policy),
        );
        let prompt = Arc::new(options.prompt);

        let extract_task: Arc<dyn Task> = Arc::new(EntityExtractionTask::new(extractor.clone()));
        let prompt_task: Arc<dyn Task> = Arc::new(PromptConstructionTask::new(prompt.clone()));
        let model_task: Arc<dyn Task> =
            Arc::new(ModelInvocationTask::new(client, options.timeout));
        let parse_task: Arc<dyn Task> = Arc::new(ResponseParsingTask::new(options.validation));

        let extract_id = extract_task.id().to_string();
        let prompt_id = prompt_task.id().to_string();
        let model_id = model_task.id().to_string();
        let parse_id = parse_task.id().to_string();

        let graph = GraphBuilder::new(GRAPH_ID)
            .add_task(extract_task)
            .add_task(prompt_task)
            .add_task(model_task)
            .add_task(parse_task)
            .add_edge(extract_id, prompt_id.clone())
            .add_edge(prompt_id, model_id.clone())
            .add_edge(model_id, parse_id)
            .build()
            .map_err(|e| AgentError::Pipeline(e.to_string()))?;

        Ok(Self {
            graph: Arc::new(graph),
            extractor,
            prompt,
        })
    }

    /// Build the production pipeline from configuration: the rule-based
    /// recognizer plus the configured model provider
    pub fn from_config(config: &AgentConfig) -> Result<Self> {
        let recognizer: Arc<dyn EntityRecognizer> = Arc::new(PatternRecognizer::new()?);
        let client = create_llm_client(config);
        let options = InterpreterOptions::from_config(config)?;

        info!(
            provider = ?config.provider,
            model = %config.model,
            temperature = config.temperature,
            validation = ?config.validation,
            "query interpreter ready"
        );
        Self::new(recognizer, client, options)
    }

    pub fn extractor(&self) -> &EntityExtractor {
        &self.extractor
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompt
    }

    /// Interpret a query.
    ///
    /// Unusable model output is returned as [`Interpretation::Failed`].
    /// Only transport and pipeline problems are errors.
    pub async fn interpret(&self, query: &str) -> Result<Interpretation> {
        let run_id = Uuid::new_v4();
        let span = info_span!("interpret", run_id = %run_id);

        async {
            info!(query_len = query.len(), "interpreting query");

            let context = Context::new();
            context
                .set(context_keys::RUN_ID, run_id.to_string())
                .await
                .map_err(into_agent_error)?;
            context
                .set(context_keys::USER_QUERY, query)
                .await
                .map_err(into_agent_error)?;

            let execution = self
                .graph
                .execute(context.clone())
                .await
                .map_err(into_agent_error)?;
            info!(
                steps = execution.visited.len(),
                outcome = execution.response.as_deref().unwrap_or("none"),
                "pipeline finished"
            );

            context
                .require::<Interpretation>(context_keys::INTERPRETATION)
                .map_err(into_agent_error)
        }
        .instrument(span)
        .await
    }
}

/// Recover the typed error a task failed with, if there is one
fn into_agent_error(err: GraphError) -> AgentError {
    match err {
        GraphError::TaskFailed { source, .. } => match source.downcast::<AgentError>() {
            Ok(agent_error) => *agent_error,
            Err(other) => AgentError::Pipeline(other.to_string()),
        },
        other => AgentError::Pipeline(other.to_string()),
    }
}
