use graphweave_config::IngestionConfig;
use graphweave_core::{
    classify, read_records, split_rows, Document, ErrorDisposition, EventTypes, Extractor,
    IngestError, IngestRequest, IngestResponse, MappingRule, Storage, StorageError, TableCatalog,
    DOCUMENT_TABLE,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::reconciler::Reconciler;
use crate::memory::{MappingMemory, VocabularyLearner};

const DEFAULT_FILE_NAME: &str = "upload.txt";

/// The ingestion entrypoint.
///
/// Validates the request, resolves the mapping (from the request or from
/// mapping memory), records the Document, runs the reconciler over the capped
/// row batch and writes the final counts back to the Document.
pub struct IngestionService<'a, S: Storage + TableCatalog + ?Sized> {
    store: &'a S,
    extractor: &'a dyn Extractor,
    config: IngestionConfig,
}

impl<'a, S: Storage + TableCatalog + ?Sized> IngestionService<'a, S> {
    pub fn new(store: &'a S, extractor: &'a dyn Extractor, config: IngestionConfig) -> Self {
        Self {
            store,
            extractor,
            config,
        }
    }

    #[instrument(skip_all, fields(file = %request.file_name))]
    pub async fn ingest(&self, request: IngestRequest) -> Result<IngestResponse, IngestError> {
        if request.text_content.trim().is_empty() {
            return Err(IngestError::Validation("textContent is required".to_string()));
        }

        let file_name = match request.file_name.trim() {
            "" => DEFAULT_FILE_NAME,
            name => name,
        };
        let headers = candidate_headers(&request.text_content);
        let rules = self.resolve_rules(&request, &headers).await?;

        let document = Document::new(file_name, request.text_content.as_str());
        self.store
            .create(
                DOCUMENT_TABLE,
                &document.id,
                json!({
                    "filename": document.filename,
                    "content": document.content,
                    "file_type": document.file_type,
                    "entity_count": 0,
                    "relationship_count": 0,
                    "processed_at": chrono::Utc::now(),
                }),
            )
            .await
            .map_err(IngestError::from_storage)?;

        let batch = split_rows(&request.text_content, &rules, self.config.max_rows);
        if batch.skipped > 0 {
            warn!(
                processed = batch.rows.len(),
                skipped = batch.skipped,
                "Row cap reached, remaining rows are not processed"
            );
        }

        let vocabulary = VocabularyLearner::new(self.store);
        for rule in &rules {
            let description = format!("{} -> {}", rule.header_column, rule.target_entity);
            vocabulary
                .learn_if_new(&rule.relationship_type, &description)
                .await;
        }

        if request.save_to_memory && !request.approved_mapping.is_empty() {
            self.remember(&headers, &request.approved_mapping, file_name)
                .await?;
        }

        let mut outcome = Reconciler::new(self.store, document.id.clone())
            .with_event_types(EventTypes::from(&self.config))
            .with_concurrency(self.config.extraction_concurrency)
            .with_sample_limit(self.config.sample_limit)
            .run(self.extractor, &batch.rows, &rules)
            .await?;
        outcome.stats.rows_skipped = batch.skipped as u64;

        let counts = json!({
            "entity_count": outcome.stats.entities_inserted,
            "relationship_count": outcome.stats.rels_inserted,
            "processed_at": chrono::Utc::now(),
        });
        match self.store.merge(DOCUMENT_TABLE, &document.id, counts).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                warn!(document = %document.id, "Document vanished before counts were recorded");
                outcome.stats.failed_writes += 1;
            }
            Err(e) => {
                if classify(&e) == ErrorDisposition::Fatal {
                    return Err(IngestError::from_storage(e));
                }
                warn!(document = %document.id, "Failed to record document counts: {}", e);
                outcome.stats.failed_writes += 1;
            }
        }

        info!(
            document = %document.id,
            entities = outcome.stats.entities_inserted,
            relationships = outcome.stats.rels_inserted,
            "Ingestion complete"
        );

        Ok(IngestResponse {
            success: true,
            document_id: document.id,
            stats: outcome.stats,
            entities: outcome.entities,
            relationships: outcome.relationships,
        })
    }

    /// The request's mapping, else the remembered one for this header set.
    async fn resolve_rules(
        &self,
        request: &IngestRequest,
        headers: &[String],
    ) -> Result<Vec<MappingRule>, IngestError> {
        if !request.approved_mapping.is_empty() || headers.is_empty() {
            return Ok(request.approved_mapping.clone());
        }

        match MappingMemory::new(self.store).lookup(headers).await {
            Ok(Some(remembered)) => {
                info!(
                    signature = %remembered.signature,
                    rules = remembered.approved_mapping.len(),
                    "Using remembered mapping"
                );
                Ok(remembered.approved_mapping)
            }
            Ok(None) => Ok(Vec::new()),
            Err(e) => self.degrade("mapping lookup", e).map(|()| Vec::new()),
        }
    }

    async fn remember(
        &self,
        headers: &[String],
        mapping: &[MappingRule],
        file_name: &str,
    ) -> Result<(), IngestError> {
        if headers.is_empty() {
            debug!("No header line, nothing to remember");
            return Ok(());
        }

        match MappingMemory::new(self.store)
            .save(headers, mapping, file_name)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) => self.degrade("mapping save", e),
        }
    }

    // Memory is optional: carry on without it unless the store refuses us
    fn degrade(&self, what: &str, error: StorageError) -> Result<(), IngestError> {
        if classify(&error) == ErrorDisposition::Fatal {
            return Err(IngestError::from_storage(error));
        }
        warn!("{} failed, continuing without mapping memory: {}", what, error);
        Ok(())
    }
}

/// Column names of the first record, when a data record follows it.
fn candidate_headers(text: &str) -> Vec<String> {
    let records = read_records(text);
    match records.as_slice() {
        [first, _, ..] => first.columns(),
        _ => Vec::new(),
    }
}
