//! # Graphweave Core
//!
//! Storage-agnostic building blocks for turning LLM-proposed entity and
//! relationship assertions into a consistent graph.
//!
//! This crate owns the data model, the identifier normalization rules that
//! entity deduplication depends on, and the traits a store or extraction
//! backend must implement. Concrete backends live in sibling crates
//! (`graphweave-surrealdb`, `graphweave-llm`) and depend on this one, never the
//! other way around.
//!
//! ## Modules
//!
//! - [`normalize`]: label -> entity key and type -> table name rules
//! - [`rows`]: splitting uploaded text into the rows fed to extraction
//! - [`types`]: entities, relationships, documents, mapping memory records
//! - [`traits`]: `Storage`, `TableCatalog`, `Extractor`, `TextGenerationProvider`
//! - [`error`]: error taxonomy and the single error classification function
//! - [`retry`]: exponential backoff shared by the store and LLM layers

#![warn(clippy::all)]

pub mod error;
pub mod normalize;
pub mod retry;
pub mod rows;
pub mod traits;
pub mod types;

pub use error::{classify, ErrorDisposition, IngestError, LlmError, LlmResult, StorageError, StorageResult};
pub use normalize::{normalize_label, normalize_relationship_type, NORMALIZER_VERSION};
pub use retry::{retry_with_backoff, RetryPolicy};
pub use rows::{header_columns, read_records, split_rows, RowBatch, SourceRecord};
pub use traits::{
    ChatCompletionRequest, ChatCompletionResponse, Extractor, LlmMessage, MessageRole, QueryResult,
    Record, RecordId, Storage, TableCatalog, TableInfo, TableKind, TextGenerationProvider,
    TokenUsage,
};
pub use types::*;
