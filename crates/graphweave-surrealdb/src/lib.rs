//! # Graphweave SurrealDB Backend
//!
//! The store side of ingestion, built on SurrealDB through the `any` engine
//! (`mem://`, `rocksdb://`, `ws://`).
//!
//! ## Features
//!
//! - **Injectable client**: one [`SurrealClient`] handle, connected with
//!   retry and reconnected on connection loss, shared by reference
//! - **Dynamic tables**: every relationship type gets its own schemaless
//!   table, unlocked on first use
//! - **Reconciliation**: row-ordered entity upserts, self-healing of dangling
//!   endpoints and the `NEXT` event chain
//! - **Mapping memory**: approved mappings remembered per header signature,
//!   first write wins
//! - **Graph read-back**: catalog-driven discovery with strict or permissive
//!   handling of dangling edges
//!
//! ## Usage
//!
//! ```rust,no_run
//! use graphweave_config::Config;
//! use graphweave_core::IngestRequest;
//! use graphweave_surrealdb::{apply_base_schema, GraphReader, IngestionService, SurrealClient};
//! # use graphweave_core::{ExtractionResult, Extractor, LlmError, MappingRule};
//! # struct NoopExtractor;
//! # #[async_trait::async_trait]
//! # impl Extractor for NoopExtractor {
//! #     async fn extract(&self, _: &str, _: &[MappingRule]) -> Result<ExtractionResult, LlmError> {
//! #         Ok(ExtractionResult::empty())
//! #     }
//! # }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let client = SurrealClient::connect(config.storage.clone()).await?;
//!     apply_base_schema(&client).await?;
//!
//!     let extractor = NoopExtractor;
//!     let service = IngestionService::new(&client, &extractor, config.ingestion.clone());
//!     let response = service
//!         .ingest(IngestRequest {
//!             text_content: "id,action\n1,Login".to_string(),
//!             ..Default::default()
//!         })
//!         .await?;
//!     println!("{} entities written", response.stats.entities_inserted);
//!
//!     let graph = GraphReader::new(&client, config.graph.clone()).read_graph().await?;
//!     println!("{} visible edges", graph.relationships.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod graph;
pub mod ingest;
pub mod memory;
pub mod schema;
pub mod surreal_client;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use graph::{GraphReader, GraphStats};
pub use ingest::{IngestionService, ReconcileOutcome, Reconciler, SchemaUnlocker, DEFAULT_SAMPLE_LIMIT};
pub use memory::{MappingMemory, VocabularyLearner};
pub use schema::{apply_base_schema, SCHEMA_VERSION};
pub use surreal_client::SurrealClient;
pub use types::{DbError, DbResult};

#[cfg(any(test, feature = "test-utils"))]
pub use test_utils::StubExtractor;
