use graphweave_core::{
    normalize_relationship_type, RelationshipDef, Storage, StorageError, StorageResult,
    RELATIONSHIP_DEF_TABLE,
};
use serde_json::json;
use tracing::{debug, warn};

/// Known relationship types, fed back into mapping proposals.
pub struct VocabularyLearner<'a, S: Storage + ?Sized> {
    store: &'a S,
}

impl<'a, S: Storage + ?Sized> VocabularyLearner<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Record `rel_type` unless it is already known. Best-effort: failures
    /// are logged and swallowed.
    pub async fn learn_if_new(&self, rel_type: &str, description: &str) {
        if let Err(e) = self.try_learn(rel_type, description).await {
            warn!(rel_type, "Failed to learn relationship type: {}", e);
        }
    }

    async fn try_learn(&self, rel_type: &str, description: &str) -> StorageResult<bool> {
        let rel_type = normalize_relationship_type(rel_type);

        if self.store.select(RELATIONSHIP_DEF_TABLE, &rel_type).await?.is_some() {
            return Ok(false);
        }

        let content = json!({
            "type": rel_type,
            "description": description,
            "learned_at": chrono::Utc::now(),
        });

        match self.store.create(RELATIONSHIP_DEF_TABLE, &rel_type, content).await {
            Ok(_) => {
                debug!(%rel_type, "Learned relationship type");
                Ok(true)
            }
            // Lost a race with a concurrent run
            Err(StorageError::Conflict(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Every learned definition, ordered by type.
    pub async fn definitions(&self) -> StorageResult<Vec<RelationshipDef>> {
        let result = self
            .store
            .query(
                "SELECT * FROM type::table($tb) ORDER BY `type`",
                &[("tb", json!(RELATIONSHIP_DEF_TABLE))],
            )
            .await?;

        Ok(result
            .records
            .into_iter()
            .filter_map(|r| serde_json::from_value(json!(r.data)).ok())
            .collect())
    }

    /// Learned type names, for the proposal prompt.
    pub async fn known_relationships(&self) -> StorageResult<Vec<String>> {
        Ok(self
            .definitions()
            .await?
            .into_iter()
            .map(|d| d.rel_type)
            .collect())
    }
}
