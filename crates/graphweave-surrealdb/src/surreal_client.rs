//! SurrealDB client
//!
//! A thin wrapper around the SurrealDB Rust SDK that converts between the
//! SDK's typed values and the storage-agnostic records of `graphweave-core`.
//!
//! ## Supported Backends
//!
//! The client goes through the SDK's `any` engine, so the backend is chosen
//! by the endpoint string:
//!
//! - **Memory** (`mem://`): development and tests
//! - **RocksDB** (`rocksdb://<path>`): persistent single-process storage
//! - **Remote** (`ws://host:port`): a running SurrealDB server
//!
//! ## Usage
//!
//! ```no_run
//! use graphweave_config::StorageConfig;
//! use graphweave_surrealdb::SurrealClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = SurrealClient::connect(StorageConfig::default()).await?;
//!     let result = client.query("SELECT * FROM entity LIMIT 10", &[]).await?;
//!     println!("{} entities", result.records.len());
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphweave_config::StorageConfig;
use graphweave_core::{
    retry_with_backoff, QueryResult, Record, RecordId, RetryPolicy, Storage, StorageResult,
    TableCatalog, TableInfo, TableKind,
};
use serde_json::{json, Map, Value};
use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::types::{ensure_identifier, DbError, DbResult};

/// SurrealDB client handle.
///
/// Cloning is cheap and shares one connection. The handle is owned by the
/// process entry point and passed by reference to every component that
/// touches the store; [`SurrealClient::reconnect`] swaps the underlying
/// connection in place so existing clones pick it up.
#[derive(Clone)]
pub struct SurrealClient {
    inner: Arc<SurrealClientInner>,
}

struct SurrealClientInner {
    db: RwLock<Surreal<Any>>,
    config: StorageConfig,
}

impl std::fmt::Debug for SurrealClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SurrealClient")
            .field("endpoint", &self.inner.config.endpoint)
            .field("namespace", &self.inner.config.namespace)
            .field("database", &self.inner.config.database)
            .finish()
    }
}

impl SurrealClient {
    /// Connect using `config`, retrying transient failures with exponential
    /// backoff.
    pub async fn connect(config: StorageConfig) -> DbResult<Self> {
        let db = retry_with_backoff(
            &Self::retry_policy(&config),
            || Self::open(&config),
            DbError::is_connection,
        )
        .await?;

        info!(
            endpoint = %config.endpoint,
            namespace = %config.namespace,
            database = %config.database,
            "Connected to SurrealDB"
        );

        Ok(Self {
            inner: Arc::new(SurrealClientInner {
                db: RwLock::new(db),
                config,
            }),
        })
    }

    /// In-memory client with the default namespace and database.
    pub async fn new_memory() -> DbResult<Self> {
        let defaults = StorageConfig::default();
        Self::connect(StorageConfig::memory(defaults.namespace, defaults.database)).await
    }

    /// In-memory client in a namespace and database of its own, so tests
    /// running in parallel never see each other's tables.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn new_isolated_memory() -> DbResult<Self> {
        let unique = uuid::Uuid::new_v4().simple().to_string();
        Self::connect(StorageConfig::memory(
            format!("test_{}", &unique[..8]),
            format!("db_{}", unique),
        ))
        .await
    }

    fn retry_policy(config: &StorageConfig) -> RetryPolicy {
        RetryPolicy::new(
            config.connect_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        )
    }

    async fn open(config: &StorageConfig) -> DbResult<Surreal<Any>> {
        let endpoint = if config.is_memory() {
            "mem://"
        } else {
            config.endpoint.trim()
        };

        let db = surrealdb::engine::any::connect(endpoint)
            .await
            .map_err(|e| DbError::Connection(format!("Failed to connect to {}: {}", endpoint, e)))?;

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            db.signin(surrealdb::opt::auth::Root {
                username: username.as_str(),
                password: password.as_str(),
            })
            .await
            .map_err(|e| DbError::PermissionDenied(format!("Sign-in failed: {}", e)))?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                DbError::Connection(format!(
                    "Failed to use namespace '{}' and database '{}': {}",
                    config.namespace, config.database, e
                ))
            })?;

        Ok(db)
    }

    /// Get the client configuration
    pub fn config(&self) -> &StorageConfig {
        &self.inner.config
    }

    /// Whether the store answers right now.
    pub async fn health_check(&self) -> bool {
        let db = self.inner.db.read().await.clone();
        match db.health().await {
            Ok(()) => true,
            Err(e) => {
                warn!("SurrealDB health check failed: {}", e);
                false
            }
        }
    }

    /// Replace the connection with a fresh one.
    ///
    /// In-memory stores are never reconnected: a new `mem://` connection would
    /// be a new, empty database.
    pub async fn reconnect(&self) -> DbResult<()> {
        if self.inner.config.is_memory() {
            return Err(DbError::Connection(
                "in-memory store cannot be reconnected".to_string(),
            ));
        }

        let config = &self.inner.config;
        let db = retry_with_backoff(
            &Self::retry_policy(config),
            || Self::open(config),
            DbError::is_connection,
        )
        .await?;

        *self.inner.db.write().await = db;
        info!(endpoint = %config.endpoint, "Reconnected to SurrealDB");
        Ok(())
    }

    /// Execute SurrealQL with named parameters.
    ///
    /// Returns the records of the last statement. A lost connection to a
    /// remote store is retried once through [`SurrealClient::reconnect`].
    pub async fn query(&self, sql: &str, params: &[(&str, Value)]) -> DbResult<QueryResult> {
        match self.execute(sql, params).await {
            Err(e) if e.is_connection() && !self.inner.config.is_memory() => {
                warn!("Query failed on a lost connection, reconnecting: {}", e);
                self.reconnect().await?;
                self.execute(sql, params).await
            }
            other => other,
        }
    }

    async fn execute(&self, sql: &str, params: &[(&str, Value)]) -> DbResult<QueryResult> {
        let start = std::time::Instant::now();
        let db = self.inner.db.read().await.clone();

        let mut query = db.query(sql);
        for (name, value) in params {
            query = query.bind((name.to_string(), value.clone()));
        }

        let response = query
            .await
            .map_err(|e| DbError::from_surreal("Query execution failed", e))?;

        let mut response = response
            .check()
            .map_err(|e| DbError::from_surreal("Query returned error", e))?;

        let statements = response.num_statements();
        if statements == 0 {
            return Ok(QueryResult::empty());
        }

        let surreal_value: surrealdb::Value = response
            .take(statements - 1)
            .map_err(|e| DbError::Query(format!("Failed to extract query results: {}", e)))?;

        // The SDK value serializes externally tagged ({"Strand": "x"}, ...)
        let tagged = serde_json::to_value(&surreal_value)
            .map_err(|e| DbError::Internal(format!("Failed to serialize SurrealDB value: {}", e)))?;

        let records: Vec<Record> = match unwrap_surreal_value(tagged) {
            Value::Array(items) => items.into_iter().filter_map(value_to_record).collect(),
            other => value_to_record(other).into_iter().collect(),
        };

        let mut result = QueryResult::with_records(records);
        result.execution_time_ms = Some(start.elapsed().as_millis() as u64);
        Ok(result)
    }

    /// Enumerate tables and their declared kind from `INFO FOR DB`.
    pub async fn list_tables(&self) -> DbResult<Vec<TableInfo>> {
        let result = self.query("INFO FOR DB", &[]).await?;

        let Some(Value::Object(tables)) = result
            .records
            .into_iter()
            .next()
            .and_then(|mut r| r.data.remove("tables"))
        else {
            return Ok(Vec::new());
        };

        let mut infos: Vec<TableInfo> = tables
            .into_iter()
            .map(|(name, definition)| {
                let kind = table_kind(definition.as_str().unwrap_or_default());
                TableInfo::new(name, kind)
            })
            .collect();
        infos.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(infos)
    }

    /// `DEFINE TABLE IF NOT EXISTS <name> SCHEMALESS PERMISSIONS FULL`
    pub async fn define_open_table(&self, name: &str) -> DbResult<()> {
        ensure_identifier("table", name)?;
        let sql = format!(
            "DEFINE TABLE IF NOT EXISTS `{}` SCHEMALESS PERMISSIONS FULL",
            name
        );
        self.query(&sql, &[]).await?;
        debug!(table = name, "Table defined as open");
        Ok(())
    }

    /// Number of records in `table`.
    pub async fn count(&self, table: &str) -> DbResult<u64> {
        let result = self
            .query(
                "SELECT count() AS count FROM type::table($tb) GROUP ALL",
                &[("tb", json!(table))],
            )
            .await?;

        Ok(result
            .records
            .first()
            .and_then(|r| r.data.get("count"))
            .and_then(Value::as_u64)
            .unwrap_or(0))
    }

    async fn first_record(&self, sql: &str, params: &[(&str, Value)]) -> DbResult<Option<Record>> {
        Ok(self.query(sql, params).await?.records.into_iter().next())
    }
}

fn table_kind(definition: &str) -> TableKind {
    let upper = definition.to_uppercase();
    if upper.contains("TYPE RELATION") {
        TableKind::Relation
    } else if upper.contains("TYPE NORMAL") {
        TableKind::Normal
    } else {
        TableKind::Any
    }
}

/// Strip SurrealDB's type tags from a serialized value.
///
/// `{"Number": {"Int": 30}}` becomes `30`, `{"Strand": "Alice"}` becomes
/// `"Alice"`, `{"Thing": {"tb": "entity", "id": {"String": "acme"}}}` becomes
/// `"entity:acme"`, and so on recursively.
fn unwrap_surreal_value(value: Value) -> Value {
    match value {
        Value::Object(mut obj) if obj.len() == 1 => {
            let Some((tag, inner)) = obj.iter_mut().next().map(|(k, v)| (k.clone(), v.take())) else {
                return Value::Object(obj);
            };

            match tag.as_str() {
                "Strand" | "String" | "Datetime" | "Uuid" | "Duration" | "Bool" => inner,
                "Number" => match inner {
                    Value::Object(mut num) => num
                        .remove("Int")
                        .or_else(|| num.remove("Float"))
                        .or_else(|| {
                            num.remove("Decimal").map(|d| match d.as_str().map(str::parse::<f64>) {
                                Some(Ok(f)) => json!(f),
                                _ => d,
                            })
                        })
                        .unwrap_or(Value::Object(num)),
                    other => other,
                },
                "Array" => match inner {
                    Value::Array(items) => {
                        Value::Array(items.into_iter().map(unwrap_surreal_value).collect())
                    }
                    other => unwrap_surreal_value(other),
                },
                "Object" => match inner {
                    Value::Object(fields) => Value::Object(
                        fields
                            .into_iter()
                            .map(|(k, v)| (k, unwrap_surreal_value(v)))
                            .collect(),
                    ),
                    other => other,
                },
                "Thing" => unwrap_thing(inner),
                _ => {
                    let mut restored = Map::new();
                    restored.insert(tag, unwrap_surreal_value(inner));
                    Value::Object(restored)
                }
            }
        }
        // Unit variants serialize as bare strings
        Value::String(s) if s == "None" || s == "Null" => Value::Null,
        other => other,
    }
}

fn unwrap_thing(thing: Value) -> Value {
    let Value::Object(mut thing) = thing else {
        return thing;
    };

    let table = thing
        .remove("tb")
        .and_then(|v| v.as_str().map(String::from))
        .unwrap_or_default();
    let key = match thing.remove("id").map(unwrap_surreal_value) {
        Some(Value::String(s)) => s,
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
        None => String::new(),
    };

    Value::String(format!("{}:{}", table, key))
}

fn value_to_record(value: Value) -> Option<Record> {
    let mut data = match value {
        Value::Null => return None,
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    };

    let id = data
        .remove("id")
        .and_then(|id| id.as_str().map(|s| RecordId(s.to_string())));

    Some(Record {
        id,
        data: data.into_iter().collect(),
    })
}

// ==============================================================================
// STORAGE TRAIT IMPLEMENTATION (Dependency Inversion)
// ==============================================================================

#[async_trait]
impl Storage for SurrealClient {
    async fn query(&self, query: &str, params: &[(&str, Value)]) -> StorageResult<QueryResult> {
        Ok(SurrealClient::query(self, query, params).await?)
    }

    async fn create(&self, table: &str, key: &str, content: Value) -> StorageResult<Record> {
        ensure_identifier("table", table)?;
        ensure_identifier("key", key)?;

        self.first_record(
            "CREATE type::thing($tb, $key) CONTENT $content",
            &[("tb", json!(table)), ("key", json!(key)), ("content", content)],
        )
        .await?
        .ok_or_else(|| DbError::Internal(format!("CREATE {}:{} returned nothing", table, key)).into())
    }

    async fn merge(&self, table: &str, key: &str, patch: Value) -> StorageResult<Option<Record>> {
        ensure_identifier("table", table)?;
        ensure_identifier("key", key)?;

        Ok(self
            .first_record(
                "UPDATE type::thing($tb, $key) MERGE $patch",
                &[("tb", json!(table)), ("key", json!(key)), ("patch", patch)],
            )
            .await?)
    }

    async fn select(&self, table: &str, key: &str) -> StorageResult<Option<Record>> {
        ensure_identifier("table", table)?;
        ensure_identifier("key", key)?;

        Ok(self
            .first_record(
                "SELECT * FROM type::thing($tb, $key)",
                &[("tb", json!(table)), ("key", json!(key))],
            )
            .await?)
    }

    async fn relate(
        &self,
        edge_table: &str,
        from: (&str, &str),
        to: (&str, &str),
        content: Value,
    ) -> StorageResult<Record> {
        ensure_identifier("table", edge_table)?;
        for (table, key) in [from, to] {
            ensure_identifier("table", table)?;
            ensure_identifier("key", key)?;
        }

        // The edge table cannot be a parameter; it was validated above
        let sql = format!(
            "LET $src = type::thing($from_tb, $from_key);\n\
             LET $dst = type::thing($to_tb, $to_key);\n\
             RELATE $src->`{}`->$dst CONTENT $content",
            edge_table
        );

        self.first_record(
            &sql,
            &[
                ("from_tb", json!(from.0)),
                ("from_key", json!(from.1)),
                ("to_tb", json!(to.0)),
                ("to_key", json!(to.1)),
                ("content", content),
            ],
        )
        .await?
        .ok_or_else(|| DbError::Internal(format!("RELATE into {} returned nothing", edge_table)).into())
    }
}

#[async_trait]
impl TableCatalog for SurrealClient {
    async fn list_tables(&self) -> StorageResult<Vec<TableInfo>> {
        Ok(SurrealClient::list_tables(self).await?)
    }

    async fn define_open_table(&self, name: &str) -> StorageResult<()> {
        Ok(SurrealClient::define_open_table(self, name).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::StorageError;

    #[test]
    fn unwraps_tagged_values() {
        let tagged = json!({"Array": [{"Object": {
            "id": {"Thing": {"tb": "entity", "id": {"String": "acme"}}},
            "label": {"Strand": "Acme"},
            "count": {"Number": {"Int": 3}},
            "score": {"Number": {"Float": 0.5}},
            "ok": {"Bool": true},
            "tags": {"Array": [{"Strand": "a"}]},
            "gone": "None",
            "nested": {"Object": {"Number": {"Strand": "not a tag here"}}}
        }}]});

        let plain = unwrap_surreal_value(tagged);
        let record = &plain[0];
        assert_eq!(record["id"], "entity:acme");
        assert_eq!(record["label"], "Acme");
        assert_eq!(record["count"], 3);
        assert_eq!(record["score"], 0.5);
        assert_eq!(record["ok"], true);
        assert_eq!(record["tags"][0], "a");
        assert!(record["gone"].is_null());
        assert_eq!(record["nested"]["Number"], "not a tag here");
    }

    #[test]
    fn table_kinds_come_from_definitions() {
        assert_eq!(
            table_kind("DEFINE TABLE WORKS_AT TYPE RELATION IN entity OUT entity SCHEMALESS"),
            TableKind::Relation
        );
        assert_eq!(table_kind("DEFINE TABLE entity TYPE NORMAL SCHEMALESS"), TableKind::Normal);
        assert_eq!(table_kind("DEFINE TABLE x TYPE ANY SCHEMALESS PERMISSIONS FULL"), TableKind::Any);
    }

    #[tokio::test]
    async fn test_create_memory_client() {
        let client = SurrealClient::new_memory().await.unwrap();
        assert_eq!(client.config().namespace, "graphweave");
        assert!(client.health_check().await);
    }

    #[tokio::test]
    async fn test_simple_query() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();

        client
            .query("CREATE test:1 SET name = 'Alice', age = 30", &[])
            .await
            .unwrap();

        let result = client.query("SELECT * FROM test:1", &[]).await.unwrap();

        assert_eq!(result.records.len(), 1);
        let record = &result.records[0];
        assert_eq!(record.get_str("name"), Some("Alice"));
        assert_eq!(record.data.get("age").and_then(|v| v.as_i64()), Some(30));
    }

    #[tokio::test]
    async fn test_last_statement_wins() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let result = client
            .query(
                "LET $x = $name; CREATE person:bob SET name = $x",
                &[("name", json!("Bob"))],
            )
            .await
            .unwrap();
        assert_eq!(result.records[0].get_str("name"), Some("Bob"));
    }

    #[tokio::test]
    async fn test_create_twice_conflicts() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();

        let created = Storage::create(&client, "entity", "acme", json!({"label": "Acme"}))
            .await
            .unwrap();
        assert_eq!(created.id, Some(RecordId::new("entity", "acme")));

        let err = Storage::create(&client, "entity", "acme", json!({"label": "ACME"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_merge_and_select() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();

        assert!(Storage::merge(&client, "entity", "ghost", json!({"x": 1}))
            .await
            .unwrap()
            .is_none());

        Storage::create(&client, "entity", "bob", json!({"label": "Bob", "type": "Person"}))
            .await
            .unwrap();
        Storage::merge(&client, "entity", "bob", json!({"properties": {"age": 41}}))
            .await
            .unwrap();

        let record = Storage::select(&client, "entity", "bob").await.unwrap().unwrap();
        assert_eq!(record.get_str("type"), Some("Person"));
        assert_eq!(record.data["properties"]["age"], 41);
    }

    #[tokio::test]
    async fn test_relate_to_missing_endpoints() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();

        let edge = Storage::relate(
            &client,
            "WORKS_AT",
            ("entity", "alice"),
            ("entity", "acme"),
            json!({"confidence": 0.9}),
        )
        .await
        .unwrap();

        assert_eq!(edge.get_str("in"), Some("entity:alice"));
        assert_eq!(edge.get_str("out"), Some("entity:acme"));
        assert_eq!(edge.id.as_ref().and_then(|id| id.table()), Some("WORKS_AT"));
    }

    #[tokio::test]
    async fn test_rejects_unsafe_identifiers() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        let err = Storage::relate(
            &client,
            "X`; REMOVE TABLE entity; --",
            ("entity", "a"),
            ("entity", "b"),
            json!({}),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StorageError::InvalidOperation(_)));
    }

    #[tokio::test]
    async fn test_catalog_lists_defined_tables() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        client.define_open_table("PURCHASED").await.unwrap();
        client.define_open_table("PURCHASED").await.unwrap();

        let tables = SurrealClient::list_tables(&client).await.unwrap();
        assert!(tables.iter().any(|t| t.name == "PURCHASED"));
        assert_eq!(client.count("PURCHASED").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_memory_store_is_not_reconnected() {
        let client = SurrealClient::new_isolated_memory().await.unwrap();
        assert!(client.reconnect().await.is_err());
    }
}
