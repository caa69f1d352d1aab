//! Graph read policy.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canonical entity table, always treated as a node table
pub const ENTITY_TABLE: &str = "entity";

/// How the graph reader treats edges whose endpoints are not in the node set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadMode {
    /// Hide dangling edges
    #[default]
    Strict,
    /// Keep every edge and synthesize `missing` placeholder nodes
    Permissive,
}

impl FromStr for ReadMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ReadMode::Strict),
            "permissive" => Ok(ReadMode::Permissive),
            other => Err(format!("unknown read mode '{}'", other)),
        }
    }
}

/// Graph reader configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Dangling-edge policy, chosen per deployment
    pub read_mode: ReadMode,
    /// Tables known to hold nodes
    pub node_tables: Vec<String>,
    /// Bookkeeping tables excluded from the graph
    pub system_tables: Vec<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            read_mode: ReadMode::Strict,
            node_tables: vec![ENTITY_TABLE.to_string()],
            system_tables: ["document", "mapping_config", "relationship_def", "_schema_version"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}
