use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use graphweave_config::ReadMode;

/// A node as returned by the graph reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Store record id, e.g. `entity:acmecorp`
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Set only on placeholders synthesized in permissive mode
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub missing: bool,
}

impl GraphNode {
    /// Placeholder for an unresolved edge endpoint.
    pub fn missing(id: &str) -> Self {
        let label = id.split_once(':').map(|(_, key)| key).unwrap_or(id);
        Self {
            id: id.to_string(),
            label: label.to_string(),
            node_type: "Missing".to_string(),
            properties: Map::new(),
            source: None,
            missing: true,
        }
    }
}

/// An edge as returned by the graph reader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

/// The visible graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub entities: Vec<GraphNode>,
    pub relationships: Vec<GraphEdge>,
}

/// Result of catalog discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredTables {
    pub node_tables: Vec<String>,
    pub edge_tables: Vec<String>,
}
