use std::sync::Arc;

use async_trait::async_trait;
use rig::agent::Agent;
use rig::completion::{Chat, CompletionModel};
use rig::prelude::*;
use rig::providers::{gemini, openrouter};
use tracing::info;

use crate::config::{AgentConfig, LlmProvider};
use crate::error::{AgentError, Result};

/// Seam to the generative language model: one prompt in, free text out
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// [`LlmClient`] backed by a rig agent
pub struct RigLlmClient<M: CompletionModel> {
    agent: Agent<M>,
    model: String,
}

impl<M: CompletionModel> RigLlmClient<M> {
    pub fn new(agent: Agent<M>, model: impl Into<String>) -> Self {
        Self {
            agent,
            model: model.into(),
        }
    }
}

#[async_trait]
impl<M> LlmClient for RigLlmClient<M>
where
    M: CompletionModel + 'static,
    Agent<M>: Chat,
{
    async fn generate(&self, prompt: &str) -> Result<String> {
        info!(model = %self.model, prompt_len = prompt.len(), "sending prompt to language model");
        self.agent
            .chat(prompt, vec![])
            .await
            .map_err(|e| AgentError::Transport(e.to_string()))
    }
}

/// Build the configured provider's client
pub fn create_llm_client(config: &AgentConfig) -> Arc<dyn LlmClient> {
    match config.provider {
        LlmProvider::Gemini => {
            let client = gemini::Client::new(&config.api_key);
            let agent = client
                .agent(&config.model)
                .temperature(config.temperature)
                .build();
            Arc::new(RigLlmClient::new(agent, &config.model))
        }
        LlmProvider::OpenRouter => {
            let client = openrouter::Client::new(&config.api_key);
            let agent = client
                .agent(&config.model)
                .temperature(config.temperature)
                .build();
            Arc::new(RigLlmClient::new(agent, &config.model))
        }
    }
}
