//! Storage abstraction traits
//!
//! [`Storage`] captures the record-level operations the ingestion engine
//! issues: parameterized queries, create-only writes, non-destructive merges
//! and edge creation. [`TableCatalog`] is the registry capability that lets
//! the engine work against a table set that grows with every new relationship
//! type instead of a hardcoded schema.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::StorageResult;

/// Unified storage abstraction
///
/// ## Thread Safety
///
/// Implementations must be Send + Sync so one handle can be shared by
/// reference across concurrent ingestion runs.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Execute a parameterized query and return the last statement's records.
    async fn query(&self, query: &str, params: &[(&str, Value)]) -> StorageResult<QueryResult>;

    /// Create `table:key` with `content`.
    ///
    /// Fails with `StorageError::Conflict` when the record already exists.
    async fn create(&self, table: &str, key: &str, content: Value) -> StorageResult<Record>;

    /// Shallow-merge `patch` into `table:key`. Returns `None` when the record
    /// does not exist.
    async fn merge(&self, table: &str, key: &str, patch: Value) -> StorageResult<Option<Record>>;

    /// Fetch `table:key`.
    async fn select(&self, table: &str, key: &str) -> StorageResult<Option<Record>>;

    /// Append an edge `from -> edge_table -> to`. Endpoints are `(table, key)`
    /// pairs and need not exist.
    async fn relate(
        &self,
        edge_table: &str,
        from: (&str, &str),
        to: (&str, &str),
        content: Value,
    ) -> StorageResult<Record>;
}

/// How the store itself describes a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableKind {
    /// Declared to hold edges only
    Relation,
    /// Declared to hold plain records only
    Normal,
    /// No declaration either way
    Any,
}

/// One entry of the table catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub kind: TableKind,
}

impl TableInfo {
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Table registry capability every store adapter must expose.
#[async_trait]
pub trait TableCatalog: Send + Sync {
    /// Enumerate the tables currently defined in the store.
    async fn list_tables(&self) -> StorageResult<Vec<TableInfo>>;

    /// Define `name` as schemaless with open permissions. Must be idempotent.
    async fn define_open_table(&self, name: &str) -> StorageResult<()>;
}

/// Query result containing records and metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Result records (each record is a map of field names to values)
    pub records: Vec<Record>,

    /// Total count of matching records (if available)
    pub total_count: Option<u64>,

    /// Query execution time in milliseconds
    pub execution_time_ms: Option<u64>,
}

impl QueryResult {
    /// Create a new empty query result
    pub fn empty() -> Self {
        Self {
            records: Vec::new(),
            total_count: Some(0),
            execution_time_ms: None,
        }
    }

    /// Create a query result with records
    pub fn with_records(records: Vec<Record>) -> Self {
        let total_count = records.len() as u64;
        Self {
            records,
            total_count: Some(total_count),
            execution_time_ms: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Database record (row/document)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Optional record identifier
    pub id: Option<RecordId>,

    /// Record field data
    pub data: HashMap<String, Value>,
}

impl Record {
    /// Create a new record without an ID
    pub fn new(data: HashMap<String, Value>) -> Self {
        Self { id: None, data }
    }

    /// Create a new record with an ID
    pub fn with_id(id: RecordId, data: HashMap<String, Value>) -> Self {
        Self { id: Some(id), data }
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

/// Record identifier in `table:key` form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct RecordId(pub String);

impl RecordId {
    pub fn new(table: &str, key: &str) -> Self {
        RecordId(format!("{}:{}", table, key))
    }

    /// Table-name portion of the id.
    pub fn table(&self) -> Option<&str> {
        self.0.split_once(':').map(|(table, _)| table)
    }

    /// Key portion of the id, without the table prefix.
    pub fn key(&self) -> &str {
        self.0.split_once(':').map(|(_, key)| key).unwrap_or(&self.0)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_id_splits_table_and_key() {
        let id = RecordId::new("WORKS_AT", "abc123");
        assert_eq!(id.table(), Some("WORKS_AT"));
        assert_eq!(id.key(), "abc123");

        let bare = RecordId("orphan".to_string());
        assert_eq!(bare.table(), None);
        assert_eq!(bare.key(), "orphan");
    }
}
