//! Row-by-row reconciliation of extraction results into the graph.
//!
//! Rows are applied strictly in input order; only the extraction calls may
//! run ahead (see [`Reconciler::with_concurrency`]). Every write is
//! best-effort: a failed entity or edge is counted and the run moves on,
//! except for permission errors, which end the run.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use graphweave_core::{
    classify, normalize_relationship_type, Entity, ErrorDisposition, EventTypes, ExtractedEntity,
    ExtractedRelationship, ExtractionResult, Extractor, IngestError, IngestStats, MappingRule,
    Relationship, Storage, StorageError, StorageResult, TableCatalog, ENTITY_TABLE,
    NEXT_RELATIONSHIP,
};
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::unlocker::SchemaUnlocker;

/// Default cap on echoed entities and relationships.
pub const DEFAULT_SAMPLE_LIMIT: usize = 50;

/// Result of one reconciliation run.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    pub stats: IngestStats,
    /// Entities written this run, capped
    pub entities: Vec<Entity>,
    /// Edges written this run, capped
    pub relationships: Vec<Relationship>,
}

/// Mutable state of a single run. Owned by [`Reconciler::run`], never shared.
#[derive(Default)]
struct RunState {
    outcome: ReconcileOutcome,
    /// Event cursor carried across rows
    last_event: Option<String>,
    /// Entity keys known to exist in the store
    known: HashSet<String>,
}

pub struct Reconciler<'a, S: Storage + TableCatalog + ?Sized> {
    store: &'a S,
    unlocker: SchemaUnlocker<'a, S>,
    document_id: String,
    event_types: EventTypes,
    concurrency: usize,
    sample_limit: usize,
}

impl<'a, S: Storage + TableCatalog + ?Sized> Reconciler<'a, S> {
    pub fn new(store: &'a S, document_id: impl Into<String>) -> Self {
        Self {
            store,
            unlocker: SchemaUnlocker::new(store),
            document_id: document_id.into(),
            event_types: EventTypes::default(),
            concurrency: 1,
            sample_limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    pub fn with_event_types(mut self, event_types: EventTypes) -> Self {
        self.event_types = event_types;
        self
    }

    /// Extraction calls allowed in flight at once. Results are still applied
    /// in row order.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_sample_limit(mut self, sample_limit: usize) -> Self {
        self.sample_limit = sample_limit;
        self
    }

    /// Extract and apply every row.
    ///
    /// Only a fatal store error (permission denied) is returned as `Err`;
    /// everything else is reflected in the counters.
    #[instrument(skip_all, fields(document = %self.document_id, rows = rows.len()))]
    pub async fn run(
        &self,
        extractor: &dyn Extractor,
        rows: &[String],
        rules: &[MappingRule],
    ) -> Result<ReconcileOutcome, IngestError> {
        let mut state = RunState::default();

        let extractions = stream::iter(rows.iter().enumerate())
            .map(|(index, row)| async move { (index, extractor.extract(row, rules).await) })
            .buffered(self.concurrency);
        let mut extractions = std::pin::pin!(extractions);

        while let Some((index, extraction)) = extractions.next().await {
            let extraction = match extraction {
                Ok(result) => result,
                Err(e) => {
                    warn!(row = index, "Extraction failed, treating row as empty: {}", e);
                    state.outcome.stats.rows_degraded += 1;
                    ExtractionResult::empty()
                }
            };

            self.apply_row(index, extraction, &mut state).await?;
            state.outcome.stats.rows_processed += 1;
        }

        let stats = &state.outcome.stats;
        info!(
            entities = stats.entities_inserted,
            relationships = stats.rels_inserted,
            implicit = stats.implicit_nodes,
            degraded = stats.rows_degraded,
            failed_writes = stats.failed_writes,
            "Reconciliation finished"
        );

        Ok(state.outcome)
    }

    async fn apply_row(
        &self,
        index: usize,
        extraction: ExtractionResult,
        state: &mut RunState,
    ) -> Result<(), IngestError> {
        if extraction.is_empty() {
            debug!(row = index, "No assertions");
            return Ok(());
        }

        let mut current_event = None;

        for extracted in &extraction.entities {
            if extracted.label.trim().is_empty() {
                debug!(row = index, "Skipping entity without a label");
                continue;
            }
            let entity = self.entity_from(extracted);
            let is_event = self.event_types.is_event(&entity.entity_type);

            match self.upsert_entity(&entity).await {
                Ok(()) => {
                    state.outcome.stats.entities_inserted += 1;
                    state.known.insert(entity.id.clone());
                    if is_event {
                        current_event = Some(entity.id.clone());
                    }
                    self.sample_entity(entity, state);
                }
                Err(e) => self.absorb(e, "entity upsert", &mut state.outcome.stats)?,
            }
        }

        for extracted in &extraction.relationships {
            self.apply_relationship(index, extracted, state).await?;
        }

        if let Some(current) = current_event {
            if let Some(last) = state.last_event.take() {
                let next = Relationship::next(&last, &current).with_source(&self.document_id);
                self.write_edge(next, state).await?;
            }
            state.last_event = Some(current);
        }

        Ok(())
    }

    async fn apply_relationship(
        &self,
        index: usize,
        extracted: &ExtractedRelationship,
        state: &mut RunState,
    ) -> Result<(), IngestError> {
        let Some((from_label, to_label)) = extracted.endpoints() else {
            debug!(row = index, rel_type = %extracted.rel_type, "Skipping relationship without endpoints");
            return Ok(());
        };
        if extracted.rel_type.trim().is_empty() {
            debug!(row = index, from = from_label, to = to_label, "Skipping relationship without a type");
            return Ok(());
        }

        let relationship = Relationship::between(from_label, to_label, &extracted.rel_type)
            .with_confidence(extracted.confidence)
            .with_source(&self.document_id);

        self.ensure_endpoint(&relationship.from, from_label, state).await?;
        self.ensure_endpoint(&relationship.to, to_label, state).await?;
        self.write_edge(relationship, state).await
    }

    fn entity_from(&self, extracted: &ExtractedEntity) -> Entity {
        let properties: Map<String, Value> = extracted
            .properties
            .iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Entity::new(extracted.label.trim(), extracted.entity_type.as_deref())
            .with_properties(properties)
            .with_source(&self.document_id)
    }

    /// Create the node, or merge `properties` into the existing one.
    async fn upsert_entity(&self, entity: &Entity) -> StorageResult<()> {
        let now = chrono::Utc::now();
        let content = json!({
            "label": entity.label,
            "type": entity.entity_type,
            "properties": entity.properties,
            "source": entity.source,
            "kind": "node",
            "created_at": now,
            "updated_at": now,
        });

        match self.store.create(ENTITY_TABLE, &entity.id, content).await {
            Ok(_) => Ok(()),
            Err(e) if classify(&e) == ErrorDisposition::Ignorable => {
                debug!(id = %entity.id, "Entity exists, merging properties");
                self.merge_properties(entity).await
            }
            Err(e) => Err(e),
        }
    }

    async fn merge_properties(&self, entity: &Entity) -> StorageResult<()> {
        let existing = self.store.select(ENTITY_TABLE, &entity.id).await?;

        let mut properties = existing
            .and_then(|mut r| r.data.remove("properties"))
            .and_then(|p| match p {
                Value::Object(map) => Some(map),
                _ => None,
            })
            .unwrap_or_default();
        properties.extend(entity.properties.clone());

        let patch = json!({
            "properties": properties,
            "updated_at": chrono::Utc::now(),
        });

        match self.store.merge(ENTITY_TABLE, &entity.id, patch).await? {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound(format!("{}:{}", ENTITY_TABLE, entity.id))),
        }
    }

    /// Create an `Implicit` placeholder for an endpoint nobody asserted.
    async fn ensure_endpoint(
        &self,
        key: &str,
        reference: &str,
        state: &mut RunState,
    ) -> Result<(), IngestError> {
        if state.known.contains(key) {
            return Ok(());
        }

        match self.store.select(ENTITY_TABLE, key).await {
            Ok(Some(_)) => {
                state.known.insert(key.to_string());
                return Ok(());
            }
            Ok(None) => {}
            Err(e) => return self.absorb(e, "endpoint lookup", &mut state.outcome.stats),
        }

        let placeholder = Entity::implicit(reference.trim()).with_source(&self.document_id);
        let now = chrono::Utc::now();
        let content = json!({
            "label": placeholder.label,
            "type": placeholder.entity_type,
            "properties": {},
            "source": placeholder.source,
            "kind": "node",
            "created_at": now,
            "updated_at": now,
        });

        match self.store.create(ENTITY_TABLE, key, content).await {
            Ok(_) => {
                debug!(id = key, "Created implicit node");
                let stats = &mut state.outcome.stats;
                stats.entities_inserted += 1;
                stats.implicit_nodes += 1;
                state.known.insert(key.to_string());
                self.sample_entity(placeholder, state);
                Ok(())
            }
            Err(e) => {
                // Created concurrently by another run
                if e.is_conflict() {
                    state.known.insert(key.to_string());
                }
                self.absorb(e, "implicit node", &mut state.outcome.stats)
            }
        }
    }

    async fn write_edge(
        &self,
        mut relationship: Relationship,
        state: &mut RunState,
    ) -> Result<(), IngestError> {
        let table = normalize_relationship_type(&relationship.rel_type);
        self.unlocker.ensure_writable(&table).await;

        let now = chrono::Utc::now();
        let content = json!({
            "type": relationship.rel_type,
            "from": relationship.from,
            "to": relationship.to,
            "confidence": relationship.confidence,
            "source": relationship.source,
            "properties": relationship.properties,
            "kind": "edge",
            "created_at": now,
        });

        match self
            .store
            .relate(
                &table,
                (ENTITY_TABLE, &relationship.from),
                (ENTITY_TABLE, &relationship.to),
                content,
            )
            .await
        {
            Ok(record) => {
                if table == NEXT_RELATIONSHIP {
                    debug!(from = %relationship.from, to = %relationship.to, "Chained events");
                }
                state.outcome.stats.rels_inserted += 1;
                relationship.id = record.id.map(|id| id.0);
                relationship.created_at = Some(now);
                if state.outcome.relationships.len() < self.sample_limit {
                    state.outcome.relationships.push(relationship);
                }
                Ok(())
            }
            Err(e) => self.absorb(e, "edge write", &mut state.outcome.stats),
        }
    }

    fn sample_entity(&self, entity: Entity, state: &mut RunState) {
        let sample = &mut state.outcome.entities;
        if sample.len() < self.sample_limit && !sample.iter().any(|e| e.id == entity.id) {
            sample.push(entity);
        }
    }

    /// Apply the error classification to a failed write.
    fn absorb(
        &self,
        error: StorageError,
        what: &str,
        stats: &mut IngestStats,
    ) -> Result<(), IngestError> {
        match classify(&error) {
            ErrorDisposition::Fatal => {
                error!("{} failed, aborting run: {}", what, error);
                Err(IngestError::from_storage(error))
            }
            ErrorDisposition::Recoverable => {
                warn!("{} failed: {}", what, error);
                stats.failed_writes += 1;
                Ok(())
            }
            ErrorDisposition::Ignorable => {
                debug!("{}: {}", what, error);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::StubExtractor;
    use crate::SurrealClient;
    use graphweave_core::ExtractedEntity;

    fn rows(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn event_rows_are_chained_in_order() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let extractor = StubExtractor::new()
            .on_entity("e1", ExtractedEntity::new("E1", "Event"))
            .on_entity("e2", ExtractedEntity::new("E2", "Event"))
            .on_entity("e3", ExtractedEntity::new("E3", "Event"));

        let outcome = Reconciler::new(&client, "doc1")
            .run(&extractor, &rows(&["e1", "e2", "e3"]), &[])
            .await
            .unwrap();

        assert_eq!(outcome.stats.entities_inserted, 3);
        assert_eq!(outcome.stats.rels_inserted, 2);

        let pairs: Vec<(String, String)> = outcome
            .relationships
            .iter()
            .map(|r| (r.from.clone(), r.to.clone()))
            .collect();
        assert_eq!(
            pairs,
            vec![("e1".into(), "e2".into()), ("e2".into(), "e3".into())]
        );
    }

    #[tokio::test]
    async fn parallel_extraction_keeps_chain_order() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let labels: Vec<String> = (0..8).map(|i| format!("ev{}", i)).collect();
        let mut extractor = StubExtractor::new();
        for label in &labels {
            extractor = extractor.on_entity(label, ExtractedEntity::new(label, "Log"));
        }

        let outcome = Reconciler::new(&client, "doc1")
            .with_concurrency(4)
            .run(&extractor, &labels, &[])
            .await
            .unwrap();

        assert_eq!(outcome.stats.rels_inserted, 7);
        for (i, rel) in outcome.relationships.iter().enumerate() {
            assert_eq!(rel.from, format!("ev{}", i));
            assert_eq!(rel.to, format!("ev{}", i + 1));
        }
    }

    #[tokio::test]
    async fn repeated_event_chains_to_itself() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let extractor = StubExtractor::new().on_entity("login", ExtractedEntity::new("Login", "Event"));

        let outcome = Reconciler::new(&client, "doc1")
            .run(&extractor, &rows(&["login", "login"]), &[])
            .await
            .unwrap();

        assert_eq!(outcome.stats.entities_inserted, 2);
        assert_eq!(outcome.stats.rels_inserted, 1);
        let next = &outcome.relationships[0];
        assert_eq!((next.from.as_str(), next.to.as_str()), ("login", "login"));
        assert_eq!(next.rel_type, NEXT_RELATIONSHIP);
    }

    #[tokio::test]
    async fn incomplete_assertions_are_skipped_individually() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let extractor = StubExtractor::new().on(
            "row",
            ExtractionResult {
                entities: vec![
                    ExtractedEntity::new("Login", "Event"),
                    ExtractedEntity::new("  ", "Person"),
                ],
                relationships: vec![
                    ExtractedRelationship::new("Alice", "Login", ""),
                    ExtractedRelationship::new("Alice", "Login", "PERFORMED"),
                ],
            },
        );

        let outcome = Reconciler::new(&client, "doc1")
            .run(&extractor, &rows(&["row"]), &[])
            .await
            .unwrap();

        assert_eq!(outcome.stats.entities_inserted, 2);
        assert_eq!(outcome.stats.implicit_nodes, 1);
        assert_eq!(outcome.stats.rels_inserted, 1);
        assert_eq!(outcome.stats.failed_writes, 0);
        assert_eq!(outcome.relationships[0].rel_type, "PERFORMED");
        assert!(Storage::select(&client, ENTITY_TABLE, "unknown")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sample_is_capped() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let labels: Vec<String> = (0..5).map(|i| format!("p{}", i)).collect();
        let mut extractor = StubExtractor::new();
        for label in &labels {
            extractor = extractor.on_entity(label, ExtractedEntity::new(label, "Person"));
        }

        let outcome = Reconciler::new(&client, "doc1")
            .with_sample_limit(2)
            .run(&extractor, &labels, &[])
            .await
            .unwrap();

        assert_eq!(outcome.stats.entities_inserted, 5);
        assert_eq!(outcome.entities.len(), 2);
    }
}
