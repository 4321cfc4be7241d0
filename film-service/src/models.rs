use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Node of the knowledge graph shown by the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResponse {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarMovie {
    pub title: String,
    pub similarity_score: f64,
}

#[derive(Debug, Deserialize)]
pub struct SimilarMoviesParams {
    pub title: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct InterpretRequest {
    pub query: String,
}
