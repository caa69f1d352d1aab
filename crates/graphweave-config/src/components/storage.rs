//! Graph store connection settings.

use serde::{Deserialize, Serialize};

/// Storage component configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store endpoint: `mem://`, `rocksdb://<path>` or `ws://<host:port>`
    pub endpoint: String,
    /// Namespace to use after connecting
    pub namespace: String,
    /// Database to use after connecting
    pub database: String,
    /// Root username for remote endpoints
    pub username: Option<String>,
    /// Root password for remote endpoints
    pub password: Option<String>,
    /// Attempts for the initial connection and for reconnects
    pub connect_attempts: u32,
    /// Base delay of the connection backoff, doubled per attempt
    pub retry_base_delay_ms: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: "graphweave".to_string(),
            database: "graph".to_string(),
            username: None,
            password: None,
            connect_attempts: 3,
            retry_base_delay_ms: 200,
        }
    }
}

impl StorageConfig {
    /// In-memory store, for tests and throwaway runs
    pub fn memory(namespace: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            endpoint: "mem://".to_string(),
            namespace: namespace.into(),
            database: database.into(),
            ..Self::default()
        }
    }

    /// Whether the endpoint is an in-memory store
    pub fn is_memory(&self) -> bool {
        let endpoint = self.endpoint.trim();
        endpoint.is_empty() || endpoint == "mem://" || endpoint == "memory" || endpoint == ":memory:"
    }
}
