use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::normalize::{normalize_label, normalize_relationship_type};

/// Edge type linking successive event-like entities of one run.
pub const NEXT_RELATIONSHIP: &str = "NEXT";

/// Confidence used when the model omits one.
pub const DEFAULT_CONFIDENCE: f64 = 1.0;

/// A directed, typed edge. Endpoints need not exist when the edge is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Source entity key
    pub from: String,
    /// Target entity key
    pub to: String,
    /// Normalized type; doubles as the storage table name
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

impl Relationship {
    /// Build an edge from raw labels and a raw type, normalizing all three.
    pub fn between(from_label: &str, to_label: &str, rel_type: &str) -> Self {
        Self {
            id: None,
            from: normalize_label(from_label),
            to: normalize_label(to_label),
            rel_type: normalize_relationship_type(rel_type),
            properties: Map::new(),
            confidence: DEFAULT_CONFIDENCE,
            source: None,
            created_at: None,
        }
    }

    /// `NEXT` edge between two already-normalized entity keys.
    pub fn next(from_key: &str, to_key: &str) -> Self {
        Self {
            id: None,
            from: from_key.to_string(),
            to: to_key.to_string(),
            rel_type: NEXT_RELATIONSHIP.to_string(),
            properties: Map::new(),
            confidence: DEFAULT_CONFIDENCE,
            source: None,
            created_at: None,
        }
    }

    /// Clamp into `[0.0, 1.0]`; NaN becomes the default.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            DEFAULT_CONFIDENCE
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}
