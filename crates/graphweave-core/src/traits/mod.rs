//! Seams between the ingestion engine and its collaborators.
//!
//! Core defines the traits; `graphweave-surrealdb` implements the store side
//! and `graphweave-llm` the model side.

pub mod extraction;
pub mod llm;
pub mod storage;

pub use extraction::Extractor;
pub use llm::{
    ChatCompletionRequest, ChatCompletionResponse, LlmMessage, MessageRole, TextGenerationProvider,
    TokenUsage,
};
pub use storage::{QueryResult, Record, RecordId, Storage, TableCatalog, TableInfo, TableKind};
