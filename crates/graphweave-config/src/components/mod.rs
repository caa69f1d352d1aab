//! Configuration sections, one per concern.

pub mod graph;
pub mod ingestion;
pub mod llm;
pub mod logging;
pub mod storage;

pub use graph::*;
pub use ingestion::*;
pub use llm::*;
pub use logging::*;
pub use storage::*;
