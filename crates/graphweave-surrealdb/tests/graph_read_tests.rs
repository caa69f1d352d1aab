//! Graph read-back over catalog-discovered tables.

mod common;

use std::collections::HashSet;

use common::{config, event, person, request, test_client};
use graphweave_config::GraphConfig;
use graphweave_core::{ExtractedRelationship, ReadMode, Storage};
use graphweave_surrealdb::{GraphReader, IngestionService, StubExtractor, SurrealClient};
use serde_json::json;

async fn seeded_client() -> SurrealClient {
    let client = test_client().await;
    let stub = StubExtractor::new()
        .on_graph(
            "Alice",
            vec![person("Alice")],
            vec![ExtractedRelationship::new("Alice", "Acme", "WORKS_AT")],
        )
        .on_entity("Login", event("Login"))
        .on_entity("Logout", event("Logout"));
    IngestionService::new(&client, &stub, config())
        .ingest(request("Alice,Acme\nLogin\nLogout", vec![], false))
        .await
        .unwrap();
    client
}

/// An edge whose target was never written.
async fn add_dangling_edge(client: &SurrealClient) {
    client
        .relate(
            "KNOWS",
            ("entity", "alice"),
            ("entity", "ghost"),
            json!({"kind": "edge", "confidence": 0.4}),
        )
        .await
        .unwrap();
}

fn graph_config(mode: ReadMode) -> GraphConfig {
    GraphConfig {
        read_mode: mode,
        ..GraphConfig::default()
    }
}

#[tokio::test]
async fn test_discovery_excludes_system_tables() {
    let client = seeded_client().await;
    let reader = GraphReader::new(&client, GraphConfig::default());

    let tables = reader.discover_tables().await.unwrap();

    assert_eq!(tables.node_tables, vec!["entity"]);
    assert_eq!(tables.edge_tables, vec!["NEXT", "WORKS_AT"]);
}

#[tokio::test]
async fn test_strict_read_returns_a_closed_graph() {
    let client = seeded_client().await;
    add_dangling_edge(&client).await;
    let reader = GraphReader::new(&client, graph_config(ReadMode::Strict));

    let graph = reader.read_graph().await.unwrap();

    let ids: HashSet<&str> = graph.entities.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(graph.entities.len(), 4);
    assert_eq!(graph.relationships.len(), 2);
    for edge in &graph.relationships {
        assert!(ids.contains(edge.from.as_str()), "dangling from: {}", edge.from);
        assert!(ids.contains(edge.to.as_str()), "dangling to: {}", edge.to);
    }
    assert!(graph.relationships.iter().all(|e| e.edge_type != "KNOWS"));
}

#[tokio::test]
async fn test_permissive_read_marks_missing_endpoints() {
    let client = seeded_client().await;
    add_dangling_edge(&client).await;
    let reader = GraphReader::new(&client, graph_config(ReadMode::Permissive));

    let graph = reader.read_graph().await.unwrap();

    assert_eq!(graph.relationships.len(), 3);
    let knows = graph
        .relationships
        .iter()
        .find(|e| e.edge_type == "KNOWS")
        .expect("dangling edge kept");
    assert_eq!(knows.from, "entity:alice");
    assert_eq!(knows.to, "entity:ghost");
    assert_eq!(knows.confidence, 0.4);

    let ghost = graph
        .entities
        .iter()
        .find(|n| n.id == "entity:ghost")
        .expect("placeholder node");
    assert!(ghost.missing);
    assert_eq!(graph.entities.iter().filter(|n| n.missing).count(), 1);
}

#[tokio::test]
async fn test_mode_can_be_chosen_per_read() {
    let client = seeded_client().await;
    add_dangling_edge(&client).await;
    let reader = GraphReader::new(&client, graph_config(ReadMode::Strict));

    let strict = reader.read_graph().await.unwrap();
    let permissive = reader
        .read_graph_with_mode(ReadMode::Permissive)
        .await
        .unwrap();

    assert_eq!(strict.relationships.len() + 1, permissive.relationships.len());
}

#[tokio::test]
async fn test_self_healed_edges_survive_strict_reads() {
    let client = seeded_client().await;
    let reader = GraphReader::new(&client, GraphConfig::default());

    let graph = reader.read_graph().await.unwrap();

    let acme = graph
        .entities
        .iter()
        .find(|n| n.id == "entity:acme")
        .expect("implicit node");
    assert_eq!(acme.node_type, "Implicit");
    assert!(!acme.missing);

    let works_at = graph
        .relationships
        .iter()
        .find(|e| e.edge_type == "WORKS_AT")
        .expect("WORKS_AT edge");
    assert_eq!(works_at.from, "entity:alice");
    assert_eq!(works_at.to, "entity:acme");
    assert_eq!(works_at.confidence, 1.0);
}

#[tokio::test]
async fn test_unknown_tables_are_classified_by_record_shape() {
    let client = test_client().await;
    client
        .create("person", "dana", json!({"label": "Dana", "type": "Person", "kind": "node"}))
        .await
        .unwrap();
    client
        .create("entity", "erin", json!({"label": "Erin", "type": "Person"}))
        .await
        .unwrap();
    client
        .relate("MENTORS", ("person", "dana"), ("entity", "erin"), json!({}))
        .await
        .unwrap();

    let graph = GraphReader::new(&client, GraphConfig::default())
        .read_graph()
        .await
        .unwrap();

    let ids: HashSet<&str> = graph.entities.iter().map(|n| n.id.as_str()).collect();
    assert!(ids.contains("person:dana"));
    assert!(ids.contains("entity:erin"));
    assert_eq!(graph.relationships.len(), 1);
    assert_eq!(graph.relationships[0].edge_type, "MENTORS");
}

#[tokio::test]
async fn test_stats_count_every_table() {
    let client = seeded_client().await;
    let stats = GraphReader::new(&client, GraphConfig::default())
        .stats()
        .await
        .unwrap();

    assert_eq!(stats.node_tables.get("entity"), Some(&4));
    assert_eq!(stats.edge_tables.get("WORKS_AT"), Some(&1));
    assert_eq!(stats.edge_tables.get("NEXT"), Some(&1));
    assert_eq!(stats.total_nodes, 4);
    assert_eq!(stats.total_edges, 2);
}

#[tokio::test]
async fn test_empty_store_reads_empty() {
    let client = test_client().await;
    let graph = GraphReader::new(&client, GraphConfig::default())
        .read_graph()
        .await
        .unwrap();

    assert!(graph.entities.is_empty());
    assert!(graph.relationships.is_empty());
}
