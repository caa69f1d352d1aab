//! The write path: reconciler, schema unlocker and the ingestion entrypoint.

mod reconciler;
mod service;
mod unlocker;

pub use reconciler::{ReconcileOutcome, Reconciler, DEFAULT_SAMPLE_LIMIT};
pub use service::IngestionService;
pub use unlocker::SchemaUnlocker;
