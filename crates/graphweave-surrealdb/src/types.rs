//! Backend-internal error type.

use graphweave_core::StorageError;

pub type DbResult<T> = Result<T, DbError>;

/// Errors raised by the SurrealDB client before they cross into the
/// storage-agnostic [`StorageError`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum DbError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    Schema(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DbError {
    /// Classify a SurrealDB error message.
    ///
    /// The SDK reports record and unique-index collisions, IAM failures and
    /// dropped connections as plain errors, so the message is all there is.
    pub fn from_surreal(context: &str, error: impl std::fmt::Display) -> Self {
        let message = error.to_string();
        let lower = message.to_lowercase();
        let full = format!("{}: {}", context, message);

        if lower.contains("already exists") || lower.contains("already contains") {
            DbError::Conflict(full)
        } else if lower.contains("not enough permissions")
            || lower.contains("iam error")
            || lower.contains("not allowed")
            || lower.contains("authentication")
        {
            DbError::PermissionDenied(full)
        } else if lower.contains("connection")
            || lower.contains("websocket")
            || lower.contains("broken pipe")
            || lower.contains("not connected")
        {
            DbError::Connection(full)
        } else {
            DbError::Query(full)
        }
    }

    /// Whether the connection layer should retry, per
    /// [`StorageError::is_transient`].
    pub fn is_connection(&self) -> bool {
        StorageError::from(self.clone()).is_transient()
    }
}

impl From<DbError> for StorageError {
    fn from(error: DbError) -> Self {
        match error {
            DbError::Connection(msg) => StorageError::Connection(msg),
            DbError::Query(msg) => StorageError::Query(msg),
            DbError::Schema(msg) => StorageError::Schema(msg),
            DbError::InvalidOperation(msg) => StorageError::InvalidOperation(msg),
            DbError::Conflict(msg) => StorageError::Conflict(msg),
            DbError::PermissionDenied(msg) => StorageError::PermissionDenied(msg),
            DbError::Internal(msg) => StorageError::Internal(msg),
        }
    }
}

/// Check that a table name or record key is safe to splice into SurrealQL.
pub(crate) fn ensure_identifier(kind: &str, value: &str) -> DbResult<()> {
    let valid = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(DbError::InvalidOperation(format!("invalid {} '{}'", kind, value)))
    }
}
