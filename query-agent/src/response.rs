//! Turning raw model text into an [`Interpretation`].

use std::str::FromStr;

use tracing::warn;

use crate::error::ConfigError;
use crate::schema::{
    Interpretation, InterpretationFailure, SEMANTIC_SEARCH_INTENT, StructuredQuery,
};

/// How strictly a parsed response is checked against the output contract
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValidationMode {
    /// Anything that deserializes is accepted as is
    #[default]
    Permissive,
    /// Known query_type, semantic_search intent and no blank list entries
    Strict,
}

impl FromStr for ValidationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "permissive" => Ok(Self::Permissive),
            "strict" => Ok(Self::Strict),
            _ => Err(ConfigError::InvalidValue {
                key: "QUERY_VALIDATION".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Remove a markdown code fence wrapping the model output.
///
/// Only a leading "```json" (or bare "```") and a trailing "```" are removed.
/// A fence in the middle of the text, or on one side only, is left alone
/// apart from that side's marker.
pub fn strip_code_fences(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

/// Contract violations of a parsed query; empty when it is valid
pub fn contract_violations(query: &StructuredQuery) -> Vec<String> {
    let mut violations = Vec::new();

    if query.intent != SEMANTIC_SEARCH_INTENT {
        violations.push(format!("unexpected intent '{}'", query.intent));
    }
    if !query.query_type.is_known() {
        violations.push(format!("unknown query_type '{}'", query.query_type));
    }
    if query.criteria.iter().any(|c| c.trim().is_empty()) {
        violations.push("criteria contains an empty entry".to_string());
    }
    if query.themes.iter().any(|t| t.trim().is_empty()) {
        violations.push("themes contains an empty entry".to_string());
    }

    violations
}

/// Strip fences, parse, and apply the validation mode. Never fails: bad
/// output becomes an [`InterpretationFailure`] carrying the cleaned text.
pub fn parse_model_output(raw: &str, mode: ValidationMode) -> Interpretation {
    let cleaned = strip_code_fences(raw);

    let query = match serde_json::from_str::<StructuredQuery>(cleaned) {
        Ok(query) => query,
        Err(e) => {
            warn!(error = %e, "model output is not a structured query");
            return Interpretation::Failed(InterpretationFailure::parse_error(
                cleaned,
                e.to_string(),
            ));
        }
    };

    if mode == ValidationMode::Strict {
        let violations = contract_violations(&query);
        if !violations.is_empty() {
            warn!(?violations, "model output violates the structured query contract");
            return Interpretation::Failed(InterpretationFailure::contract_violation(
                cleaned,
                &violations,
            ));
        }
    }

    Interpretation::Structured(query)
}
