//! Reads the graph back out of a store whose table set is not fixed.
//!
//! Every relationship type lives in its own table, so the reader starts from
//! the store catalog on every call. Tables are split into node and edge
//! candidates; individual records are then classified by shape, which keeps
//! the reader correct for tables the catalog cannot describe.

use std::collections::{BTreeMap, HashSet};

use graphweave_config::GraphConfig;
use graphweave_core::{
    DiscoveredTables, GraphEdge, GraphNode, GraphSnapshot, ReadMode, Record, Storage,
    StorageResult, TableCatalog, TableKind, DEFAULT_CONFIDENCE, DEFAULT_ENTITY_TYPE, ENTITY_TABLE,
};
use serde::Serialize;
use serde_json::{json, Map, Value};
use tracing::{debug, instrument, trace};

const ENTITY_PREFIX: &str = "entity:";

/// Per-table record counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphStats {
    pub node_tables: BTreeMap<String, u64>,
    pub edge_tables: BTreeMap<String, u64>,
    pub total_nodes: u64,
    pub total_edges: u64,
}

pub struct GraphReader<'a, S: Storage + TableCatalog + ?Sized> {
    store: &'a S,
    config: GraphConfig,
}

impl<'a, S: Storage + TableCatalog + ?Sized> GraphReader<'a, S> {
    pub fn new(store: &'a S, config: GraphConfig) -> Self {
        Self { store, config }
    }

    /// Split the catalog into node tables and edge candidates.
    ///
    /// System tables are dropped. The entity table and the configured node
    /// tables are always nodes, as is anything the store declares `NORMAL`;
    /// every other table is an edge candidate.
    pub async fn discover_tables(&self) -> StorageResult<DiscoveredTables> {
        let system: HashSet<&str> = self.config.system_tables.iter().map(String::as_str).collect();
        let configured: HashSet<&str> = self
            .config
            .node_tables
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(ENTITY_TABLE))
            .collect();

        let mut node_tables = vec![ENTITY_TABLE.to_string()];
        let mut edge_tables = Vec::new();

        for table in self.store.list_tables().await? {
            if system.contains(table.name.as_str()) || table.name == ENTITY_TABLE {
                continue;
            }
            if configured.contains(table.name.as_str()) || table.kind == TableKind::Normal {
                node_tables.push(table.name);
            } else {
                edge_tables.push(table.name);
            }
        }

        node_tables.sort();
        node_tables.dedup();
        edge_tables.sort();

        debug!(
            nodes = node_tables.len(),
            edges = edge_tables.len(),
            "Discovered graph tables"
        );
        Ok(DiscoveredTables {
            node_tables,
            edge_tables,
        })
    }

    /// Read the graph with the deployment's configured read mode.
    pub async fn read_graph(&self) -> StorageResult<GraphSnapshot> {
        self.read_graph_with_mode(self.config.read_mode).await
    }

    #[instrument(skip(self))]
    pub async fn read_graph_with_mode(&self, mode: ReadMode) -> StorageResult<GraphSnapshot> {
        let tables = self.discover_tables().await?;

        let mut entities = Vec::new();
        let mut relationships = Vec::new();

        for table in &tables.node_tables {
            for record in self.select_all(table).await?.records {
                if is_edge_record(&record) {
                    relationships.extend(to_edge(table, record));
                } else {
                    entities.push(to_node(table, record));
                }
            }
        }

        for table in &tables.edge_tables {
            for record in self.select_all(table).await?.records {
                if is_edge_record(&record) {
                    relationships.extend(to_edge(table, record));
                } else if record.get_str("kind") == Some("node") {
                    entities.push(to_node(table, record));
                } else {
                    trace!(table = %table, "Skipping record with no endpoints");
                }
            }
        }

        let snapshot = resolve_endpoints(entities, relationships, mode);
        debug!(
            entities = snapshot.entities.len(),
            relationships = snapshot.relationships.len(),
            ?mode,
            "Graph read"
        );
        Ok(snapshot)
    }

    /// Record counts for every discovered table.
    pub async fn stats(&self) -> StorageResult<GraphStats> {
        let tables = self.discover_tables().await?;
        let mut stats = GraphStats::default();

        for table in tables.node_tables {
            let count = self.count(&table).await?;
            stats.total_nodes += count;
            stats.node_tables.insert(table, count);
        }
        for table in tables.edge_tables {
            let count = self.count(&table).await?;
            stats.total_edges += count;
            stats.edge_tables.insert(table, count);
        }

        Ok(stats)
    }

    async fn select_all(&self, table: &str) -> StorageResult<graphweave_core::QueryResult> {
        self.store
            .query("SELECT * FROM type::table($tb)", &[("tb", json!(table))])
            .await
    }

    async fn count(&self, table: &str) -> StorageResult<u64> {
        let result = self
            .store
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
}

/// Store-native endpoints or an explicit edge tag.
fn is_edge_record(record: &Record) -> bool {
    (record.data.contains_key("in") && record.data.contains_key("out"))
        || record.get_str("kind") == Some("edge")
}

fn to_node(table: &str, mut record: Record) -> GraphNode {
    let id = record
        .id
        .as_ref()
        .map(|id| id.0.clone())
        .unwrap_or_else(|| format!("{}:unknown", table));
    let key = id.split_once(':').map(|(_, key)| key).unwrap_or(&id).to_string();

    let label = take_string(&mut record, "label").unwrap_or(key);
    let node_type =
        take_string(&mut record, "type").unwrap_or_else(|| DEFAULT_ENTITY_TYPE.to_string());

    GraphNode {
        id,
        label,
        node_type,
        properties: take_object(&mut record, "properties"),
        source: take_string(&mut record, "source"),
        missing: false,
    }
}

/// Convert an edge record; `None` when an endpoint cannot be recovered.
fn to_edge(table: &str, mut record: Record) -> Option<GraphEdge> {
    let from = endpoint(&mut record, "in", "from")?;
    let to = endpoint(&mut record, "out", "to")?;

    // Per-type tables may not repeat the type on each record
    let edge_type = take_string(&mut record, "type")
        .or_else(|| record.id.as_ref().and_then(|id| id.table()).map(str::to_string))
        .unwrap_or_else(|| table.to_string());

    let confidence = record
        .data
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(DEFAULT_CONFIDENCE);

    Some(GraphEdge {
        id: record
            .id
            .as_ref()
            .map(|id| id.0.clone())
            .unwrap_or_default(),
        from,
        to,
        edge_type,
        confidence,
        source: take_string(&mut record, "source"),
        properties: take_object(&mut record, "properties"),
    })
}

/// Prefer the store-native pointer; fall back to a bare key field.
fn endpoint(record: &mut Record, native: &str, field: &str) -> Option<String> {
    if let Some(id) = take_string(record, native) {
        return Some(id);
    }
    take_string(record, field).map(|key| {
        if key.contains(':') {
            key
        } else {
            format!("{}{}", ENTITY_PREFIX, key)
        }
    })
}

fn resolve_endpoints(
    mut entities: Vec<GraphNode>,
    relationships: Vec<GraphEdge>,
    mode: ReadMode,
) -> GraphSnapshot {
    let mut known: HashSet<String> = entities.iter().map(|n| n.id.clone()).collect();

    let relationships = match mode {
        ReadMode::Strict => {
            let before = relationships.len();
            let visible: Vec<GraphEdge> = relationships
                .into_iter()
                .filter(|e| known.contains(&e.from) && known.contains(&e.to))
                .collect();
            if visible.len() < before {
                debug!(hidden = before - visible.len(), "Hiding dangling edges");
            }
            visible
        }
        ReadMode::Permissive => {
            for edge in &relationships {
                for id in [&edge.from, &edge.to] {
                    if known.insert(id.clone()) {
                        entities.push(GraphNode::missing(id));
                    }
                }
            }
            relationships
        }
    };

    GraphSnapshot {
        entities,
        relationships,
    }
}

fn take_string(record: &mut Record, field: &str) -> Option<String> {
    match record.data.remove(field)? {
        Value::String(s) if !s.trim().is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn take_object(record: &mut Record, field: &str) -> Map<String, Value> {
    match record.data.remove(field) {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::RecordId;
    use std::collections::HashMap;

    fn record(id: &str, data: Value) -> Record {
        let data: HashMap<String, Value> = match data {
            Value::Object(map) => map.into_iter().collect(),
            _ => HashMap::new(),
        };
        Record::with_id(RecordId(id.to_string()), data)
    }

    fn node(id: &str) -> GraphNode {
        to_node("entity", record(id, json!({"label": id, "type": "Person"})))
    }

    fn edge(from: &str, to: &str) -> GraphEdge {
        to_edge("KNOWS", record("KNOWS:1", json!({"in": from, "out": to}))).unwrap()
    }

    #[test]
    fn edge_type_falls_back_to_table_name() {
        let e = to_edge(
            "WORKS_AT",
            record("WORKS_AT:abc", json!({"in": "entity:alice", "out": "entity:acme"})),
        )
        .unwrap();
        assert_eq!(e.edge_type, "WORKS_AT");
        assert_eq!(e.confidence, DEFAULT_CONFIDENCE);

        let typed = to_edge(
            "WORKS_AT",
            record("WORKS_AT:abc", json!({"in": "entity:a", "out": "entity:b", "type": "EMPLOYED_BY"})),
        )
        .unwrap();
        assert_eq!(typed.edge_type, "EMPLOYED_BY");
    }

    #[test]
    fn bare_endpoint_keys_are_prefixed() {
        let e = to_edge(
            "NEXT",
            record("NEXT:1", json!({"from": "login", "to": "purchase", "kind": "edge"})),
        )
        .unwrap();
        assert_eq!(e.from, "entity:login");
        assert_eq!(e.to, "entity:purchase");
    }

    #[test]
    fn edges_without_endpoints_are_dropped() {
        assert!(to_edge("X", record("X:1", json!({"kind": "edge", "in": "entity:a"}))).is_none());
    }

    #[test]
    fn node_defaults() {
        let n = to_node("entity", record("entity:acme", json!({})));
        assert_eq!(n.label, "acme");
        assert_eq!(n.node_type, DEFAULT_ENTITY_TYPE);
        assert!(!n.missing);
    }

    #[test]
    fn strict_mode_hides_dangling_edges() {
        let snapshot = resolve_endpoints(
            vec![node("entity:a"), node("entity:b")],
            vec![edge("entity:a", "entity:b"), edge("entity:a", "entity:ghost")],
            ReadMode::Strict,
        );
        assert_eq!(snapshot.relationships.len(), 1);
        assert_eq!(snapshot.entities.len(), 2);
    }

    #[test]
    fn permissive_mode_synthesizes_missing_nodes_once() {
        let snapshot = resolve_endpoints(
            vec![node("entity:a")],
            vec![edge("entity:a", "entity:ghost"), edge("entity:ghost", "entity:a")],
            ReadMode::Permissive,
        );
        assert_eq!(snapshot.relationships.len(), 2);
        let missing: Vec<_> = snapshot.entities.iter().filter(|n| n.missing).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].id, "entity:ghost");
    }
}
