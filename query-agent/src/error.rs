use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while reading agent configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    MissingVar(String),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("failed to read prompt template {path}: {source}")]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid prompt template: {0}")]
    InvalidTemplate(String),

    #[error("invalid entity label mapping: {0}")]
    InvalidLabelMapping(String),
}

/// Errors that abort a query interpretation.
///
/// A model response that cannot be parsed is not an error; it is returned as
/// an [`InterpretationFailure`](crate::schema::InterpretationFailure).
#[derive(Debug, Error)]
pub enum AgentError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("language model request failed: {0}")]
    Transport(String),

    #[error("language model did not answer within {0:?}")]
    Timeout(Duration),

    #[error("entity recognizer failed to load: {0}")]
    Recognizer(String),

    #[error("pipeline error: {0}")]
    Pipeline(String),
}

impl AgentError {
    /// True when the model endpoint could not be reached or did not answer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;
