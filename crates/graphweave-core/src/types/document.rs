use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Table holding one record per ingestion run.
pub const DOCUMENT_TABLE: &str = "document";

/// An ingestion run's source file.
///
/// Created once at the start of the run and updated once at the end with the
/// final counts. Entities and edges point at it through `source`; it owns
/// neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub content: String,
    pub file_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub entity_count: u64,
    #[serde(default)]
    pub relationship_count: u64,
}

impl Document {
    /// New document with a random id; file type is taken from the extension.
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        let filename = filename.into();
        let file_type = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase())
            .filter(|ext| !ext.is_empty())
            .unwrap_or_else(|| "text".to_string());

        Self {
            id: uuid::Uuid::new_v4().simple().to_string(),
            filename,
            content: content.into(),
            file_type,
            processed_at: None,
            entity_count: 0,
            relationship_count: 0,
        }
    }
}
