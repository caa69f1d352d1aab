//! Data model for entities, relationships, documents and mapping memory.

mod document;
mod entity;
mod extraction;
mod graph;
mod ingest;
mod mapping;
mod relationship;

pub use document::*;
pub use entity::*;
pub use extraction::*;
pub use graph::*;
pub use ingest::*;
pub use mapping::*;
pub use relationship::*;
