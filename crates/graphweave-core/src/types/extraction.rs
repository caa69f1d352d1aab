use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// An entity proposed by the extraction model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedEntity {
    #[serde(default, deserialize_with = "lenient_string")]
    pub label: String,
    #[serde(rename = "type", default, deserialize_with = "lenient_optional_string")]
    pub entity_type: Option<String>,
    #[serde(default = "default_confidence", deserialize_with = "lenient_confidence")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "lenient_properties")]
    pub properties: Map<String, Value>,
}

impl ExtractedEntity {
    pub fn new(label: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entity_type: Some(entity_type.into()),
            confidence: default_confidence(),
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }
}

/// A relationship proposed by the extraction model, still in label space.
///
/// Endpoints are optional because the model sometimes omits them; such
/// relationships are skipped by the reconciler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub from: Option<String>,
    #[serde(default, deserialize_with = "lenient_optional_string")]
    pub to: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_string")]
    pub rel_type: String,
    #[serde(default = "default_confidence", deserialize_with = "lenient_confidence")]
    pub confidence: f64,
}

impl ExtractedRelationship {
    pub fn new(from: impl Into<String>, to: impl Into<String>, rel_type: impl Into<String>) -> Self {
        Self {
            from: Some(from.into()),
            to: Some(to.into()),
            rel_type: rel_type.into(),
            confidence: default_confidence(),
        }
    }

    /// Both endpoints present and non-blank.
    pub fn endpoints(&self) -> Option<(&str, &str)> {
        let from = self.from.as_deref().filter(|s| !s.trim().is_empty())?;
        let to = self.to.as_deref().filter(|s| !s.trim().is_empty())?;
        Some((from, to))
    }
}

/// What the extraction boundary returns for one row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

impl ExtractionResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.relationships.is_empty()
    }
}

fn default_confidence() -> f64 {
    1.0
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

// Models return confidences as numbers, numeric strings or nothing at all.
fn lenient_confidence<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let parsed = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(parsed
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0))
        .unwrap_or_else(default_confidence))
}

fn lenient_properties<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Map<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}
