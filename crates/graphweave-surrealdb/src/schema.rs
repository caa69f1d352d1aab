//! Base schema bootstrap.
//!
//! Applied once per store, tracked through `_schema_version`. Relationship
//! tables are deliberately absent: the unlocker defines them as they appear.

use graphweave_core::NORMALIZER_VERSION;
use serde_json::json;
use tracing::{debug, trace};

use crate::types::{DbError, DbResult};
use crate::SurrealClient;

/// Schema version - increment when schema.surql changes
pub const SCHEMA_VERSION: &str = "v1";

const SCHEMA: &str = include_str!("schema.surql");

/// Apply the base schema if this store has not seen the current version.
///
/// Safe to call on every start; every statement is define-if-not-exists.
pub async fn apply_base_schema(client: &SurrealClient) -> DbResult<()> {
    if schema_version_present(client).await {
        debug!("Schema version {} already present, skipping", SCHEMA_VERSION);
        return Ok(());
    }

    let statements = statements();
    debug!("Applying {} schema statements", statements.len());

    // One round trip when possible, then statement by statement for a
    // precise error
    if client.query(&statements.join(";\n"), &[]).await.is_err() {
        debug!("Batch failed, falling back to individual statement execution");
        for statement in &statements {
            if let Err(e) = client.query(statement, &[]).await {
                if matches!(e, DbError::Conflict(_)) {
                    trace!("Schema element already exists: {}", statement);
                    continue;
                }
                return Err(DbError::Schema(format!(
                    "Failed to apply '{}': {}",
                    statement, e
                )));
            }
        }
    }

    client
        .query(
            "DELETE _schema_version; CREATE _schema_version SET version = $version, normalizer_version = $normalizer, applied_at = time::now()",
            &[
                ("version", json!(SCHEMA_VERSION)),
                ("normalizer", json!(NORMALIZER_VERSION)),
            ],
        )
        .await?;

    debug!("Schema {} applied", SCHEMA_VERSION);
    Ok(())
}

async fn schema_version_present(client: &SurrealClient) -> bool {
    client
        .query(
            "SELECT * FROM _schema_version WHERE version = $version LIMIT 1",
            &[("version", json!(SCHEMA_VERSION))],
        )
        .await
        .map(|r| !r.is_empty())
        .unwrap_or(false)
}

fn statements() -> Vec<String> {
    SCHEMA
        .lines()
        .filter(|line| !line.trim_start().starts_with("--"))
        .collect::<Vec<_>>()
        .join("\n")
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comments_are_stripped() {
        let statements = statements();
        assert!(statements.iter().all(|s| !s.contains("--")));
        assert!(statements.iter().any(|s| s.contains("mapping_config_signature")));
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        apply_base_schema(&client).await.unwrap();
        apply_base_schema(&client).await.unwrap();

        let tables = client.list_tables().await.unwrap();
        for name in ["entity", "document", "mapping_config", "relationship_def", "_schema_version"] {
            assert!(tables.iter().any(|t| t.name == name), "missing table {}", name);
        }

        let versions = client.query("SELECT * FROM _schema_version", &[]).await.unwrap();
        assert_eq!(versions.records.len(), 1);
        assert_eq!(versions.records[0].data["normalizer_version"], NORMALIZER_VERSION);
    }
}
