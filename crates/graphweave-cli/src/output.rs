//! Table and JSON rendering for command results.

use anyhow::Result;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use graphweave_core::{
    GraphSnapshot, IngestResponse, MappingConfig, ProposedMapping, RelationshipDef,
};
use graphweave_surrealdb::GraphStats;
use serde::Serialize;

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

fn table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

pub fn ingest_summary(response: &IngestResponse) -> String {
    let stats = &response.stats;
    let mut counts = table(vec!["Metric", "Value"]);
    for (name, value) in [
        ("Entities inserted", stats.entities_inserted),
        ("Relationships inserted", stats.rels_inserted),
        ("Implicit nodes", stats.implicit_nodes),
        ("Rows processed", stats.rows_processed),
        ("Rows skipped (cap)", stats.rows_skipped),
        ("Rows degraded", stats.rows_degraded),
        ("Failed writes", stats.failed_writes),
    ] {
        counts.add_row(vec![Cell::new(name), Cell::new(value)]);
    }

    let mut out = format!("Document {}\n{}", response.document_id, counts);

    if !response.relationships.is_empty() {
        let mut edges = table(vec!["From", "Type", "To", "Confidence"]);
        for rel in &response.relationships {
            edges.add_row(vec![
                Cell::new(&rel.from),
                Cell::new(&rel.rel_type),
                Cell::new(&rel.to),
                Cell::new(format!("{:.2}", rel.confidence)),
            ]);
        }
        out.push_str(&format!("\n\nSample relationships\n{}", edges));
    }

    out
}

pub fn graph(snapshot: &GraphSnapshot) -> String {
    let mut nodes = table(vec!["Id", "Label", "Type"]);
    for node in &snapshot.entities {
        let node_type = if node.missing {
            format!("{} (missing)", node.node_type)
        } else {
            node.node_type.clone()
        };
        nodes.add_row(vec![Cell::new(&node.id), Cell::new(&node.label), Cell::new(node_type)]);
    }

    let mut edges = table(vec!["From", "Type", "To", "Confidence"]);
    for edge in &snapshot.relationships {
        edges.add_row(vec![
            Cell::new(&edge.from),
            Cell::new(&edge.edge_type),
            Cell::new(&edge.to),
            Cell::new(format!("{:.2}", edge.confidence)),
        ]);
    }

    format!(
        "Entities ({})\n{}\n\nRelationships ({})\n{}",
        snapshot.entities.len(),
        nodes,
        snapshot.relationships.len(),
        edges
    )
}

pub fn graph_stats(stats: &GraphStats) -> String {
    let mut counts = table(vec!["Table", "Kind", "Records"]);
    for (name, count) in &stats.node_tables {
        counts.add_row(vec![Cell::new(name), Cell::new("node"), Cell::new(count)]);
    }
    for (name, count) in &stats.edge_tables {
        counts.add_row(vec![Cell::new(name), Cell::new("edge"), Cell::new(count)]);
    }
    format!(
        "{}\n{} nodes, {} edges",
        counts, stats.total_nodes, stats.total_edges
    )
}

pub fn proposals(proposals: &[ProposedMapping]) -> String {
    let mut rows = table(vec!["Column", "Relationship", "Target", "New", "Reason"]);
    for p in proposals {
        rows.add_row(vec![
            Cell::new(&p.header_column),
            Cell::new(&p.relationship_type),
            Cell::new(&p.target_entity),
            Cell::new(if p.is_new { "yes" } else { "" }),
            Cell::new(&p.reason),
        ]);
    }
    rows.to_string()
}

pub fn mappings(configs: &[MappingConfig]) -> String {
    let mut rows = table(vec!["Signature", "Rules", "Last file"]);
    for config in configs {
        let rules = config
            .approved_mapping
            .iter()
            .map(|r| format!("{} -> {} -> {}", r.header_column, r.relationship_type, r.target_entity))
            .collect::<Vec<_>>()
            .join("\n");
        rows.add_row(vec![
            Cell::new(&config.signature),
            Cell::new(rules),
            Cell::new(&config.last_file_name),
        ]);
    }
    rows.to_string()
}

pub fn vocabulary(defs: &[RelationshipDef]) -> String {
    let mut rows = table(vec!["Type", "Description", "Learned"]);
    for def in defs {
        rows.add_row(vec![
            Cell::new(&def.rel_type),
            Cell::new(&def.description),
            Cell::new(
                def.learned_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
        ]);
    }
    rows.to_string()
}
