//! Error taxonomy shared by every Graphweave crate.
//!
//! Ingestion is best-effort and row-partitioned, so most errors are not
//! propagated. [`classify`] is the one place that decides what a storage error
//! means for a running ingestion; callers match on [`ErrorDisposition`]
//! instead of inspecting error messages themselves.

use serde::{Deserialize, Serialize};

/// Common result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Common result type for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

/// Storage operation errors
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum StorageError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Transaction error: {0}")]
    Transaction(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A create hit an existing record or unique index.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl StorageError {
    /// Errors worth retrying at the connection layer.
    pub fn is_transient(&self) -> bool {
        matches!(self, StorageError::Connection(_) | StorageError::Timeout(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StorageError::Conflict(_))
    }
}

/// What a failed store operation means for the ingestion run that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorDisposition {
    /// Every later write would fail the same way; stop the run.
    Fatal,
    /// This record was not written; keep going with the next one.
    Recoverable,
    /// Expected outcome that needs no reaction (e.g. create conflicts).
    Ignorable,
}

/// Classify a storage error for the reconciler's per-row loop.
pub fn classify(error: &StorageError) -> ErrorDisposition {
    match error {
        StorageError::Conflict(_) => ErrorDisposition::Ignorable,
        StorageError::PermissionDenied(_) => ErrorDisposition::Fatal,
        StorageError::Connection(_)
        | StorageError::Timeout(_)
        | StorageError::Query(_)
        | StorageError::Schema(_)
        | StorageError::Transaction(_)
        | StorageError::InvalidOperation(_)
        | StorageError::NotFound(_)
        | StorageError::Internal(_) => ErrorDisposition::Recoverable,
    }
}

/// Errors from LLM providers and the extraction boundary
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Transport failure or server-side (5xx) error
    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse model output: {0}")]
    Parse(String),
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::HttpError(_) | LlmError::RateLimited(_) | LlmError::Timeout(_)
        )
    }
}

/// Run-level ingestion failures.
///
/// Only errors that prevent a run from starting, or that would make every
/// subsequent write fail, surface here.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// Bad request: reported before any store write happens.
    #[error("Invalid ingestion request: {0}")]
    Validation(String),

    /// The store refused access; callers may degrade to read-only.
    #[error("Store permission denied: {0}")]
    Permission(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl IngestError {
    /// Map a storage error raised outside the per-row loop.
    pub fn from_storage(error: StorageError) -> Self {
        match error {
            StorageError::PermissionDenied(msg) => IngestError::Permission(msg),
            other => IngestError::Storage(other),
        }
    }
}
