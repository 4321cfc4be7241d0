//! Prompt construction for the query understanding model.

use std::path::Path;

use crate::error::ConfigError;
use crate::schema::{Entities, QueryType};

const QUERY_PLACEHOLDER: &str = "{query}";
const ENTITIES_PLACEHOLDER: &str = "{entities}";
const QUERY_TYPES_PLACEHOLDER: &str = "{query_types}";

pub const DEFAULT_TEMPLATE: &str = r#"You are a movie query understanding agent.
Analyze the following user query and output structured JSON in this format:

{
  "intent": "semantic_search",
  "query_type": "{query_types}",
  "criteria": [list of keywords or themes],
  "movie_name": "<movie name or null>",
  "entities": {"actors": [], "directors": [], "genres": []},
  "themes": [list of inferred ideas like revenge, friendship, dreams]
}

query_type must be exactly one of: {query_types}.

User query: {query}

Entities extracted from the query: {entities}
Return only valid JSON. No text, no explanations, no markdown."#;

/// Renders the instruction prompt sent to the model
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    template: String,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
        }
    }
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom template. It must contain `{query}` and `{entities}`.
    pub fn with_template(template: impl Into<String>) -> Result<Self, ConfigError> {
        let template = template.into();
        for placeholder in [QUERY_PLACEHOLDER, ENTITIES_PLACEHOLDER] {
            if !template.contains(placeholder) {
                return Err(ConfigError::InvalidTemplate(format!(
                    "missing {placeholder} placeholder"
                )));
            }
        }
        Ok(Self { template })
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let template =
            std::fs::read_to_string(path).map_err(|source| ConfigError::TemplateRead {
                path: path.to_path_buf(),
                source,
            })?;
        Self::with_template(template)
    }

    /// Render the prompt. The same inputs always give the same string.
    pub fn build_prompt(&self, query: &str, entities: &Entities) -> String {
        // BTreeSet fields keep this rendering stable
        let entities_json =
            serde_json::to_string_pretty(entities).unwrap_or_else(|_| "{}".to_string());
        let query_types = QueryType::KNOWN
            .iter()
            .map(QueryType::as_str)
            .collect::<Vec<_>>()
            .join(" | ");

        render(
            &self.template,
            &[
                (QUERY_PLACEHOLDER, query),
                (ENTITIES_PLACEHOLDER, &entities_json),
                (QUERY_TYPES_PLACEHOLDER, &query_types),
            ],
        )
    }
}

/// Single pass substitution; inserted values are never scanned again
fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len() + 256);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        match values.iter().find(|(key, _)| tail.starts_with(key)) {
            Some((key, value)) => {
                out.push_str(value);
                rest = &tail[key.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
