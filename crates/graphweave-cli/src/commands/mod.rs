pub mod graph;
pub mod ingest;
pub mod mapping;
pub mod propose;
pub mod vocab;

use anyhow::{Context, Result};
use graphweave_config::StorageConfig;
use graphweave_surrealdb::{apply_base_schema, SurrealClient};
use std::path::Path;
use tracing::debug;

/// Connect to the configured store and make sure the base schema exists.
pub async fn open_store(config: &StorageConfig) -> Result<SurrealClient> {
    let client = SurrealClient::connect(config.clone())
        .await
        .with_context(|| format!("Failed to connect to {}", config.endpoint))?;
    apply_base_schema(&client)
        .await
        .context("Failed to apply base schema")?;
    debug!(endpoint = %config.endpoint, "Store ready");
    Ok(client)
}

pub async fn read_input(path: &Path) -> Result<String> {
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

/// Column names from the first record of `text`.
pub fn header_columns(text: &str) -> Vec<String> {
    graphweave_core::header_columns(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn headers_come_from_the_first_line() {
        assert_eq!(header_columns("\nname,company\nAlice,Acme"), vec!["name", "company"]);
        assert!(header_columns("").is_empty());
    }
}
