//! Repairing and parsing model JSON output.

use graphweave_core::{ExtractionResult, LlmError, LlmResult};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*(.*?)```").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",(\s*[}\]])").expect("valid regex"));

/// Extract and parse the JSON value in a model response.
///
/// Tolerates markdown code fences, prose around the object, trailing commas
/// and typographic quotes.
pub fn parse_json_payload(raw: &str) -> LlmResult<Value> {
    let unfenced = FENCE
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(raw);

    let candidate = outer_json(unfenced).unwrap_or(unfenced).trim();
    if candidate.is_empty() {
        return Err(LlmError::Parse("empty response".to_string()));
    }

    if let Ok(value) = serde_json::from_str(candidate) {
        return Ok(value);
    }

    let repaired = TRAILING_COMMA
        .replace_all(candidate, "$1")
        .replace(['\u{201C}', '\u{201D}'], "\"");

    serde_json::from_str(&repaired).map_err(|e| LlmError::Parse(e.to_string()))
}

/// Parse an extraction response into entities and relationships.
pub fn parse_extraction(raw: &str) -> LlmResult<ExtractionResult> {
    let value = parse_json_payload(raw)?;
    if !value.is_object() {
        return Err(LlmError::Parse("expected a JSON object".to_string()));
    }
    serde_json::from_value(value).map_err(|e| LlmError::Parse(e.to_string()))
}

// Slice from the first opening brace/bracket to the matching last closer.
fn outer_json(text: &str) -> Option<&str> {
    let start = text.find(['{', '['])?;
    let closer = if text[start..].starts_with('{') { '}' } else { ']' };
    let end = text.rfind(closer)?;
    (end > start).then(|| &text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_code_fences() {
        let raw = "```json\n{\"entities\": [{\"label\": \"Acme\", \"type\": \"Company\"}]}\n```";
        let result = parse_extraction(raw).unwrap();
        assert_eq!(result.entities[0].label, "Acme");
    }

    #[test]
    fn ignores_surrounding_prose() {
        let raw = "Sure! Here is the graph: {\"entities\": [], \"relationships\": []} Hope it helps.";
        assert!(parse_extraction(raw).unwrap().is_empty());
    }

    #[test]
    fn repairs_trailing_commas_and_smart_quotes() {
        let raw = "{\u{201C}entities\u{201D}: [{\"label\": \"Bob\",},],}";
        let result = parse_extraction(raw).unwrap();
        assert_eq!(result.entities[0].label, "Bob");
    }

    #[test]
    fn incomplete_elements_do_not_sink_the_row() {
        let raw = r#"{
            "entities": [{"label": "Login", "type": "Event"}, {"type": "Person"}],
            "relationships": [
                {"from": "Alice", "to": "Login", "type": "PERFORMED"},
                {"from": "Alice", "to": "Login"}
            ]
        }"#;

        let result = parse_extraction(raw).unwrap();
        assert_eq!(result.entities.len(), 2);
        assert_eq!(result.entities[0].label, "Login");
        assert!(result.entities[1].label.is_empty());
        assert_eq!(result.relationships[0].rel_type, "PERFORMED");
        assert!(result.relationships[1].rel_type.is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(parse_extraction("no json here"), Err(LlmError::Parse(_))));
        assert!(matches!(parse_extraction(""), Err(LlmError::Parse(_))));
        assert!(matches!(parse_extraction("[1, 2]"), Err(LlmError::Parse(_))));
    }
}
