//! Movie query understanding.
//!
//! A free-text movie request goes through four steps: entity extraction,
//! prompt construction, one language model call and response parsing. The
//! steps run as tasks of a `graph_flow` graph driven by [`QueryInterpreter`].

pub mod config;
pub mod error;
pub mod extractor;
pub mod genres;
pub mod interpreter;
pub mod llm;
pub mod prompt;
pub mod recognizer;
pub mod response;
pub mod schema;
pub mod tasks;

pub use config::{AgentConfig, LlmProvider};
pub use error::{AgentError, ConfigError, Result};
pub use extractor::{EntityExtractor, EntityField, LabelMapping, TitlePolicy};
pub use interpreter::{InterpreterOptions, QueryInterpreter};
pub use llm::{LlmClient, RigLlmClient, create_llm_client};
pub use prompt::PromptBuilder;
pub use recognizer::{EntityRecognizer, EntitySpan, PatternRecognizer};
pub use response::{ValidationMode, parse_model_output, strip_code_fences};
pub use schema::{
    CONTRACT_VIOLATION_MARKER, Entities, Interpretation, InterpretationFailure,
    PARSE_FAILURE_MARKER, QueryType, StructuredQuery,
};
