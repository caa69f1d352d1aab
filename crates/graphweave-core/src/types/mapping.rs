use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table holding remembered mappings.
pub const MAPPING_CONFIG_TABLE: &str = "mapping_config";

/// Table holding the learned relationship vocabulary.
pub const RELATIONSHIP_DEF_TABLE: &str = "relationship_def";

const SIGNATURE_SEPARATOR: &str = "|";

/// Binds a source column to a relationship type and the role of its target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    pub header_column: String,
    pub relationship_type: String,
    pub target_entity: String,
}

impl MappingRule {
    pub fn new(
        header_column: impl Into<String>,
        relationship_type: impl Into<String>,
        target_entity: impl Into<String>,
    ) -> Self {
        Self {
            header_column: header_column.into(),
            relationship_type: relationship_type.into(),
            target_entity: target_entity.into(),
        }
    }
}

/// A remembered mapping, keyed by the header signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    pub signature: String,
    pub last_file_name: String,
    pub approved_mapping: Vec<MappingRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A relationship type the system has seen before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipDef {
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub learned_at: Option<DateTime<Utc>>,
}

/// One rule suggested by the schema-proposal step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposedMapping {
    pub header_column: String,
    pub relationship_type: String,
    pub target_entity: String,
    /// True when `relationship_type` is not yet in the vocabulary
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub reason: String,
}

impl From<ProposedMapping> for MappingRule {
    fn from(proposal: ProposedMapping) -> Self {
        MappingRule {
            header_column: proposal.header_column,
            relationship_type: proposal.relationship_type,
            target_entity: proposal.target_entity,
        }
    }
}

/// Exact-match memory key: trimmed header names, sorted, joined with `|`.
pub fn header_signature<S: AsRef<str>>(headers: &[S]) -> String {
    let mut names: Vec<&str> = headers
        .iter()
        .map(|h| h.as_ref().trim())
        .filter(|h| !h.is_empty())
        .collect();
    names.sort_unstable();
    names.join(SIGNATURE_SEPARATOR)
}
