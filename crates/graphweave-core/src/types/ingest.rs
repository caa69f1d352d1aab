use serde::{Deserialize, Serialize};

use super::{Entity, MappingRule, Relationship};

/// Request accepted by the ingestion entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestRequest {
    pub text_content: String,
    #[serde(default)]
    pub file_name: String,
    #[serde(default)]
    pub approved_mapping: Vec<MappingRule>,
    #[serde(default)]
    pub save_to_memory: bool,
}

/// Counters accumulated over one ingestion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestStats {
    /// Entity writes, including self-healed placeholders
    pub entities_inserted: u64,
    /// Edge writes, including NEXT edges
    pub rels_inserted: u64,
    /// Placeholders created for dangling endpoints
    pub implicit_nodes: u64,
    pub rows_processed: u64,
    /// Rows beyond the per-invocation cap
    pub rows_skipped: u64,
    /// Rows whose extraction failed and degraded to empty
    pub rows_degraded: u64,
    /// Individual writes that failed
    pub failed_writes: u64,
}

/// Response returned by the ingestion entrypoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub success: bool,
    pub document_id: String,
    pub stats: IngestStats,
    /// Sample of written entities, capped
    pub entities: Vec<Entity>,
    /// Sample of written relationships, capped
    pub relationships: Vec<Relationship>,
}

/// Error payload for a run that could not start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
}

impl<E: std::fmt::Display> From<&E> for ErrorPayload {
    fn from(error: &E) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_camel_case_fields() {
        let request: IngestRequest = serde_json::from_value(json!({
            "textContent": "a,b\n1,2",
            "fileName": "x.csv",
            "approvedMapping": [
                {"header_column": "b", "relationship_type": "HAS", "target_entity": "Thing"}
            ],
            "saveToMemory": true
        }))
        .unwrap();

        assert_eq!(request.file_name, "x.csv");
        assert_eq!(request.approved_mapping.len(), 1);
        assert!(request.save_to_memory);
    }

    #[test]
    fn stats_serialize_with_interface_names() {
        let stats = IngestStats {
            entities_inserted: 2,
            rels_inserted: 1,
            ..Default::default()
        };
        let value = serde_json::to_value(stats).unwrap();
        assert_eq!(value["entitiesInserted"], 2);
        assert_eq!(value["relsInserted"], 1);
    }
}
