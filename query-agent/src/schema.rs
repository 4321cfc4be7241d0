//! Data types exchanged by the query understanding pipeline.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// The only intent the pipeline produces
pub const SEMANTIC_SEARCH_INTENT: &str = "semantic_search";

/// Error marker used when the model response is not valid JSON of the right shape
pub const PARSE_FAILURE_MARKER: &str = "Failed to parse JSON";

/// Error marker used when strict validation rejects a parsed response
pub const CONTRACT_VIOLATION_MARKER: &str = "Response violates the structured query contract";

/// Treat an explicit `null` the same as a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Movie entities mentioned in a query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default, deserialize_with = "null_as_default")]
    pub actors: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub directors: BTreeSet<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub genres: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_name: Option<String>,
}

impl Entities {
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
            && self.directors.is_empty()
            && self.genres.is_empty()
            && self.movie_name.is_none()
    }
}

/// How the user is asking for movies.
///
/// Values outside the five known kinds are kept as [`QueryType::Other`] so
/// that a permissive caller still sees what the model said.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QueryType {
    PlotBased,
    GenreBased,
    DirectorBased,
    ActorBased,
    Mixed,
    Other(String),
}

impl QueryType {
    pub const KNOWN: [QueryType; 5] = [
        QueryType::PlotBased,
        QueryType::GenreBased,
        QueryType::DirectorBased,
        QueryType::ActorBased,
        QueryType::Mixed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::PlotBased => "plot_based",
            Self::GenreBased => "genre_based",
            Self::DirectorBased => "director_based",
            Self::ActorBased => "actor_based",
            Self::Mixed => "mixed",
            Self::Other(value) => value,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl From<String> for QueryType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "plot_based" => Self::PlotBased,
            "genre_based" => Self::GenreBased,
            "director_based" => Self::DirectorBased,
            "actor_based" => Self::ActorBased,
            "mixed" => Self::Mixed,
            _ => Self::Other(value),
        }
    }
}

impl From<QueryType> for String {
    fn from(value: QueryType) -> Self {
        match value {
            QueryType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_intent() -> String {
    SEMANTIC_SEARCH_INTENT.to_string()
}

/// The structured interpretation of a movie query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredQuery {
    #[serde(default = "default_intent")]
    pub intent: String,
    pub query_type: QueryType,
    pub criteria: Vec<String>,
    #[serde(default)]
    pub movie_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entities: Entities,
    #[serde(default, deserialize_with = "null_as_default")]
    pub themes: Vec<String>,
}

/// Returned in place of a [`StructuredQuery`] when the model output is unusable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterpretationFailure {
    pub error: String,
    pub raw_output: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl InterpretationFailure {
    pub fn parse_error(raw_output: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            error: PARSE_FAILURE_MARKER.to_string(),
            raw_output: raw_output.into(),
            reason: Some(reason.into()),
        }
    }

    pub fn contract_violation(raw_output: impl Into<String>, violations: &[String]) -> Self {
        Self {
            error: CONTRACT_VIOLATION_MARKER.to_string(),
            raw_output: raw_output.into(),
            reason: Some(violations.join("; ")),
        }
    }
}

/// Terminal result of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Interpretation {
    Structured(StructuredQuery),
    Failed(InterpretationFailure),
}

impl Interpretation {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn structured(&self) -> Option<&StructuredQuery> {
        match self {
            Self::Structured(query) => Some(query),
            Self::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&InterpretationFailure> {
        match self {
            Self::Failed(failure) => Some(failure),
            Self::Structured(_) => None,
        }
    }
}
