//! Shared helpers for the SurrealDB integration suites.

#![allow(dead_code)]

use graphweave_config::IngestionConfig;
use graphweave_core::{ExtractedEntity, IngestRequest, MappingRule};
use graphweave_surrealdb::{apply_base_schema, SurrealClient};
use serde_json::{json, Value};

/// Fresh in-memory store with the base schema applied.
pub async fn test_client() -> SurrealClient {
    let client = SurrealClient::new_isolated_memory()
        .await
        .expect("in-memory store");
    apply_base_schema(&client).await.expect("base schema");
    client
}

pub fn request(text: &str, mapping: Vec<MappingRule>, save_to_memory: bool) -> IngestRequest {
    IngestRequest {
        text_content: text.to_string(),
        file_name: "upload.csv".to_string(),
        approved_mapping: mapping,
        save_to_memory,
    }
}

pub fn event(label: &str) -> ExtractedEntity {
    ExtractedEntity::new(label, "Event")
}

pub fn person(label: &str) -> ExtractedEntity {
    ExtractedEntity::new(label, "Person")
}

pub fn config() -> IngestionConfig {
    IngestionConfig::default()
}

/// Every record of `table` as raw JSON.
pub async fn records(client: &SurrealClient, table: &str) -> Vec<Value> {
    client
        .query("SELECT * FROM type::table($tb)", &[("tb", json!(table))])
        .await
        .expect("select")
        .records
        .into_iter()
        .map(|r| {
            let mut value = json!(r.data);
            if let Some(id) = r.id {
                value["id"] = json!(id.0);
            }
            value
        })
        .collect()
}

/// `(in, out)` pairs of an edge table, sorted.
pub async fn edges(client: &SurrealClient, table: &str) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = records(client, table)
        .await
        .into_iter()
        .map(|r| {
            (
                r["in"].as_str().unwrap_or_default().to_string(),
                r["out"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    pairs.sort();
    pairs
}
