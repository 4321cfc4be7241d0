//! Fixed catalog data served until a graph store and a similarity model
//! are wired in.

use serde_json::json;
use tracing::info;

use crate::models::{GraphResponse, Link, Node, SimilarMovie};

pub const DEFAULT_TOP_K: usize = 5;

pub fn fetch_graph() -> GraphResponse {
    info!("serving stub knowledge graph");

    let nodes = vec![
        Node {
            id: "Inception".to_string(),
            name: "Inception".to_string(),
            kind: "movie".to_string(),
            data: Some(json!({ "title": "Inception", "year": 2010 })),
        },
        Node {
            id: "Sci-Fi".to_string(),
            name: "Sci-Fi".to_string(),
            kind: "genre".to_string(),
            data: None,
        },
        Node {
            id: "Christopher Nolan".to_string(),
            name: "Christopher Nolan".to_string(),
            kind: "director".to_string(),
            data: None,
        },
    ];
    let links = ["Sci-Fi", "Christopher Nolan"]
        .into_iter()
        .map(|target| Link {
            source: "Inception".to_string(),
            target: target.to_string(),
        })
        .collect();

    GraphResponse { nodes, links }
}

/// Movies similar to `title`, best first, at most `top_k` of them
pub fn compute_similar_movies(title: &str, top_k: usize) -> Vec<SimilarMovie> {
    info!(title, top_k, "computing similar movies (stub)");

    [("Interstellar", 0.92), ("Memento", 0.78)]
        .into_iter()
        .take(top_k)
        .map(|(title, similarity_score)| SimilarMovie {
            title: title.to_string(),
            similarity_score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graph_links_point_at_known_nodes() {
        let graph = fetch_graph();
        assert_eq!(graph.nodes.len(), 3);
        for link in &graph.links {
            assert!(graph.nodes.iter().any(|n| n.id == link.source));
            assert!(graph.nodes.iter().any(|n| n.id == link.target));
        }
    }

    #[test]
    fn test_similar_movies_respects_top_k() {
        assert_eq!(compute_similar_movies("Inception", DEFAULT_TOP_K).len(), 2);
        let one = compute_similar_movies("Inception", 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].title, "Interstellar");
        assert!(compute_similar_movies("Inception", 0).is_empty());
    }
}
