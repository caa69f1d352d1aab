//! Extraction adapter and mapping proposer.
//!
//! Everything here sits on the external-collaborator side of the
//! [`Extractor`](graphweave_core::Extractor) boundary: prompts, retries and
//! the repair of whatever JSON the model hands back.

mod adapter;
mod parse;
pub mod prompt;
mod proposal;

pub use adapter::LlmExtractor;
pub use parse::{parse_extraction, parse_json_payload};
pub use proposal::MappingProposer;
