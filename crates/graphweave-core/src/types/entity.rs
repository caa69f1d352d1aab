use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeSet;

use crate::normalize::normalize_label;

/// Table holding every entity node.
pub use graphweave_config::ENTITY_TABLE;

/// Type given to entities the model did not categorize.
pub const DEFAULT_ENTITY_TYPE: &str = "Concept";

/// Type of placeholder nodes synthesized for dangling edge endpoints.
pub const IMPLICIT_ENTITY_TYPE: &str = "Implicit";

/// A graph node.
///
/// `id` is always `normalize_label(label)`; `entity_type`, `label` and
/// `source` are fixed by the first write and later mentions only merge
/// `properties`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(rename = "type")]
    pub entity_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Originating document id (non-owning)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    /// Build an entity whose id is derived from its label.
    pub fn new(label: impl Into<String>, entity_type: Option<&str>) -> Self {
        let label = label.into();
        let entity_type = entity_type
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_ENTITY_TYPE)
            .to_string();

        Self {
            id: normalize_label(&label),
            label,
            entity_type,
            properties: Map::new(),
            source: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Placeholder for an endpoint referenced before it was ever asserted.
    pub fn implicit(reference: impl Into<String>) -> Self {
        Self::new(reference, Some(IMPLICIT_ENTITY_TYPE))
    }

    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn is_implicit(&self) -> bool {
        self.entity_type == IMPLICIT_ENTITY_TYPE
    }
}

/// The entity types that take part in the NEXT chain.
///
/// Matching is case-insensitive; deployments supply their own vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTypes {
    types: BTreeSet<String>,
}

impl EventTypes {
    pub fn new<I, S>(types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            types: types
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    pub fn is_event(&self, entity_type: &str) -> bool {
        self.types.contains(&entity_type.trim().to_lowercase())
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for EventTypes {
    fn default() -> Self {
        Self::new(["Event", "Activity", "Transaction", "Log"])
    }
}

impl From<&graphweave_config::IngestionConfig> for EventTypes {
    fn from(config: &graphweave_config::IngestionConfig) -> Self {
        Self::new(&config.event_types)
    }
}
