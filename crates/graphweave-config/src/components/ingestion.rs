//! Ingestion run limits.

use serde::{Deserialize, Serialize};

/// Ingestion configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Rows processed per invocation; the rest are reported as skipped
    pub max_rows: usize,
    /// Entity types that take part in the NEXT chain
    pub event_types: Vec<String>,
    /// Extraction calls in flight at once; results are still applied in row order
    pub extraction_concurrency: usize,
    /// Cap on entities and relationships echoed back in the response
    pub sample_limit: usize,
    /// Wall-clock budget for a whole run, enforced by the host
    pub run_timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_rows: 50,
            event_types: ["Event", "Activity", "Transaction", "Log"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            extraction_concurrency: 1,
            sample_limit: 50,
            run_timeout_secs: 300,
        }
    }
}
