//! Top-level configuration and validation.

use serde::{Deserialize, Serialize};

use crate::components::{
    GraphConfig, IngestionConfig, LlmConfig, LoggingConfig, StorageConfig,
};

/// Errors raised while loading or validating configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed in its format
    #[error("Failed to parse config file {path}: {message}")]
    Parse {
        /// Path that failed
        path: String,
        /// Parser message
        message: String,
    },

    /// The file extension is not a supported format
    #[error("Unsupported config format '{0}' (expected .toml, .yaml or .yml)")]
    UnsupportedFormat(String),

    /// A value failed validation
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result alias for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Complete Graphweave configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Graph store connection
    pub storage: StorageConfig,
    /// Extraction model provider
    pub llm: LlmConfig,
    /// Ingestion limits and event vocabulary
    pub ingestion: IngestionConfig,
    /// Graph read policy and table classification
    pub graph: GraphConfig,
    /// Log output
    pub logging: LoggingConfig,
}

impl Config {
    /// Check cross-field invariants that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.namespace must not be empty".into()));
        }
        if self.storage.database.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.database must not be empty".into()));
        }
        if self.storage.connect_attempts == 0 {
            return Err(ConfigError::Invalid("storage.connect_attempts must be at least 1".into()));
        }
        if self.llm.max_attempts == 0 {
            return Err(ConfigError::Invalid("llm.max_attempts must be at least 1".into()));
        }
        if self.ingestion.max_rows == 0 {
            return Err(ConfigError::Invalid("ingestion.max_rows must be at least 1".into()));
        }
        if self.ingestion.extraction_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "ingestion.extraction_concurrency must be at least 1".into(),
            ));
        }
        if self.ingestion.event_types.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid("ingestion.event_types must not be empty".into()));
        }
        if !self.graph.node_tables.iter().any(|t| t == crate::components::ENTITY_TABLE) {
            return Err(ConfigError::Invalid(format!(
                "graph.node_tables must include '{}'",
                crate::components::ENTITY_TABLE
            )));
        }
        Ok(())
    }
}
