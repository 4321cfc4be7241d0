//! Agent configuration from environment variables.
//!
//! The API key has no default: a missing key is a startup error.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::extractor::{LabelMapping, TitlePolicy};
use crate::response::ValidationMode;

pub const DEFAULT_TEMPERATURE: f64 = 0.3;

/// Generative model provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LlmProvider {
    #[default]
    Gemini,
    OpenRouter,
}

impl LlmProvider {
    /// Environment variable holding this provider's API key
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::OpenRouter => "OPENROUTER_API_KEY",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini-2.0-flash",
            Self::OpenRouter => "openai/gpt-4.1-mini",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            _ => Err(ConfigError::InvalidValue {
                key: "LLM_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Everything needed to assemble a query interpreter
#[derive(Clone)]
pub struct AgentConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub model: String,
    pub temperature: f64,
    pub timeout: Option<Duration>,
    pub validation: ValidationMode,
    pub label_mapping: LabelMapping,
    pub title_policy: TitlePolicy,
    pub prompt_template: Option<PathBuf>,
}

impl AgentConfig {
    /// Load from process environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from any key lookup, e.g. a map in tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match var("LLM_PROVIDER") {
            Some(value) => value.parse()?,
            None => LlmProvider::default(),
        };

        let api_key = var(provider.api_key_var())
            .ok_or_else(|| ConfigError::MissingVar(provider.api_key_var().to_string()))?;

        let model = var("LLM_MODEL").unwrap_or_else(|| provider.default_model().to_string());

        let temperature = match var("LLM_TEMPERATURE") {
            Some(value) => parse_temperature(&value)?,
            None => DEFAULT_TEMPERATURE,
        };

        let timeout = match var("LLM_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(value.trim().parse().map_err(|_| {
                ConfigError::InvalidValue {
                    key: "LLM_TIMEOUT_SECS".to_string(),
                    value,
                }
            })?)),
            None => None,
        };

        let validation = match var("QUERY_VALIDATION") {
            Some(value) => value.parse()?,
            None => ValidationMode::default(),
        };

        let label_mapping = match var("ENTITY_LABEL_MAP") {
            Some(value) => value.parse()?,
            None => LabelMapping::default(),
        };

        let title_policy = match var("MOVIE_TITLE_POLICY") {
            Some(value) => value.parse()?,
            None => TitlePolicy::default(),
        };

        Ok(Self {
            provider,
            api_key,
            model,
            temperature,
            timeout,
            validation,
            label_mapping,
            title_policy,
            prompt_template: var("QUERY_PROMPT_TEMPLATE").map(PathBuf::from),
        })
    }
}

fn parse_temperature(value: &str) -> Result<f64, ConfigError> {
    let invalid = || ConfigError::InvalidValue {
        key: "LLM_TEMPERATURE".to_string(),
        value: value.to_string(),
    };
    let temperature: f64 = value.trim().parse().map_err(|_| invalid())?;
    if !(0.0..=2.0).contains(&temperature) {
        return Err(invalid());
    }
    Ok(temperature)
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout", &self.timeout)
            .field("validation", &self.validation)
            .field("label_mapping", &self.label_mapping)
            .field("title_policy", &self.title_policy)
            .field("prompt_template", &self.prompt_template)
            .finish()
    }
}
