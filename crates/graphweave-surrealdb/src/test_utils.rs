//! Scripted extractor for ingestion tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use graphweave_core::{
    ExtractedEntity, ExtractedRelationship, ExtractionResult, Extractor, LlmError, MappingRule,
};

enum Script {
    Respond(ExtractionResult),
    Fail(String),
}

/// Answers each row from the first script entry whose needle the row
/// contains; rows matching nothing extract to an empty result.
#[derive(Default)]
pub struct StubExtractor {
    scripts: Vec<(String, Script)>,
    calls: Mutex<Vec<String>>,
}

impl StubExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, needle: impl Into<String>, result: ExtractionResult) -> Self {
        self.scripts.push((needle.into(), Script::Respond(result)));
        self
    }

    /// Shorthand for a row that yields a single entity.
    pub fn on_entity(self, needle: impl Into<String>, entity: ExtractedEntity) -> Self {
        self.on(
            needle,
            ExtractionResult {
                entities: vec![entity],
                relationships: Vec::new(),
            },
        )
    }

    pub fn on_graph(
        self,
        needle: impl Into<String>,
        entities: Vec<ExtractedEntity>,
        relationships: Vec<ExtractedRelationship>,
    ) -> Self {
        self.on(
            needle,
            ExtractionResult {
                entities,
                relationships,
            },
        )
    }

    /// Rows containing `needle` fail as if the model were unreachable.
    pub fn fail_on(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        self.scripts
            .push((needle.clone(), Script::Fail(format!("scripted failure for '{}'", needle))));
        self
    }

    /// Rows seen so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Extractor for StubExtractor {
    async fn extract(&self, row: &str, _rules: &[MappingRule]) -> Result<ExtractionResult, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(row.to_string());

        match self.scripts.iter().find(|(needle, _)| row.contains(needle.as_str())) {
            Some((_, Script::Respond(result))) => Ok(result.clone()),
            Some((_, Script::Fail(message))) => Err(LlmError::HttpError(message.clone())),
            None => Ok(ExtractionResult::empty()),
        }
    }
}
