use graphweave_core::{
    header_signature, MappingConfig, MappingRule, Storage, StorageError, StorageResult,
    MAPPING_CONFIG_TABLE,
};
use serde_json::json;
use tracing::{debug, info};

/// Remembers approved mappings per file shape.
///
/// The key is the header signature. Records are stored under an id derived
/// from the signature hash, so a second save for the same shape collides on
/// create and is dropped: the first approved mapping wins.
pub struct MappingMemory<'a, S: Storage + ?Sized> {
    store: &'a S,
}

impl<'a, S: Storage + ?Sized> MappingMemory<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Exact-match lookup by header set.
    pub async fn lookup<H: AsRef<str>>(&self, headers: &[H]) -> StorageResult<Option<MappingConfig>> {
        let signature = header_signature(headers);
        if signature.is_empty() {
            return Ok(None);
        }

        let Some(record) = self
            .store
            .select(MAPPING_CONFIG_TABLE, &signature_key(&signature))
            .await?
        else {
            debug!(%signature, "No remembered mapping");
            return Ok(None);
        };

        let config: MappingConfig = serde_json::from_value(json!(record.data))
            .map_err(|e| StorageError::Internal(format!("Corrupt mapping record: {}", e)))?;

        // Hash collisions are not a concern in practice, but a mismatch
        // must never hand back another shape's mapping
        Ok((config.signature == signature).then_some(config))
    }

    /// Remember `mapping` for this header set unless one is already stored.
    ///
    /// Returns whether a new entry was written.
    pub async fn save<H: AsRef<str>>(
        &self,
        headers: &[H],
        mapping: &[MappingRule],
        file_name: &str,
    ) -> StorageResult<bool> {
        let signature = header_signature(headers);
        if signature.is_empty() {
            return Ok(false);
        }

        let content = json!({
            "signature": signature,
            "last_file_name": file_name,
            "approved_mapping": mapping,
            "created_at": chrono::Utc::now(),
        });

        match self
            .store
            .create(MAPPING_CONFIG_TABLE, &signature_key(&signature), content)
            .await
        {
            Ok(_) => {
                info!(%signature, rules = mapping.len(), "Saved mapping to memory");
                Ok(true)
            }
            Err(StorageError::Conflict(_)) => {
                debug!(%signature, "Mapping already remembered, keeping the first one");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Every remembered mapping, ordered by signature.
    pub async fn entries(&self) -> StorageResult<Vec<MappingConfig>> {
        let result = self
            .store
            .query(
                "SELECT * FROM type::table($tb) ORDER BY signature",
                &[("tb", json!(MAPPING_CONFIG_TABLE))],
            )
            .await?;

        Ok(result
            .records
            .into_iter()
            .filter_map(|r| serde_json::from_value(json!(r.data)).ok())
            .collect())
    }
}

fn signature_key(signature: &str) -> String {
    blake3::hash(signature.as_bytes()).to_hex()[..32].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SurrealClient;

    #[test]
    fn keys_are_order_independent_and_safe() {
        let a = signature_key(&header_signature(&["name", "company"]));
        let b = signature_key(&header_signature(&["company", "name"]));
        assert_eq!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[tokio::test]
    async fn first_write_wins() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let memory = MappingMemory::new(&client);
        let headers = ["name", "company"];

        let m1 = vec![MappingRule::new("company", "WORKS_AT", "Company")];
        let m2 = vec![MappingRule::new("company", "EMPLOYED_BY", "Organization")];

        assert!(memory.save(&headers, &m1, "a.csv").await.unwrap());
        assert!(!memory.save(&headers, &m2, "b.csv").await.unwrap());

        let stored = memory.lookup(&["company", "name"]).await.unwrap().unwrap();
        assert_eq!(stored.approved_mapping, m1);
        assert_eq!(stored.last_file_name, "a.csv");
    }

    #[tokio::test]
    async fn lookup_is_exact() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let memory = MappingMemory::new(&client);

        memory
            .save(&["name", "company"], &[MappingRule::new("company", "WORKS_AT", "Company")], "a.csv")
            .await
            .unwrap();

        assert!(memory.lookup(&["name", "company", "city"]).await.unwrap().is_none());
        assert!(memory.lookup(&["Name", "company"]).await.unwrap().is_none());
        assert!(memory.lookup::<&str>(&[]).await.unwrap().is_none());
    }
}
