use async_trait::async_trait;

use crate::error::LlmError;
use crate::types::{ExtractionResult, MappingRule};

/// The extraction boundary.
///
/// Implementations turn one row (or a whole text blob) into proposed entities
/// and relationships following the approved mapping rules. An `Err` or an
/// empty result both mean "no assertions for this row"; the reconciler never
/// aborts a run because of either.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, row: &str, rules: &[MappingRule]) -> Result<ExtractionResult, LlmError>;
}
