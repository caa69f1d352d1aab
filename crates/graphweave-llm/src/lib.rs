//! # Graphweave LLM
//!
//! The model side of ingestion.
//!
//! - [`chat`]: chat-completion providers (OpenAI-compatible, Ollama)
//! - [`extraction`]: the extraction adapter that turns a row into proposed
//!   entities and relationships, plus the mapping proposer used when a file
//!   shape has not been seen before
//!
//! ## Example
//!
//! ```rust,no_run
//! use graphweave_config::LlmConfig;
//! use graphweave_core::{Extractor, MappingRule};
//! use graphweave_llm::{chat::create_chat_provider, LlmExtractor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LlmConfig::default();
//!     let provider = create_chat_provider(&config)?;
//!     let extractor = LlmExtractor::from_config(provider, &config);
//!
//!     let rules = vec![MappingRule::new("company", "WORKS_AT", "Company")];
//!     let result = extractor.extract("Alice,Acme", &rules).await?;
//!     println!("{} entities", result.entities.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

pub mod chat;
pub mod extraction;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

pub use extraction::{parse_extraction, parse_json_payload, LlmExtractor, MappingProposer};

#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockTextProvider;
