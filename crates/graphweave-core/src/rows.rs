//! Splitting uploaded text into extraction rows.
//!
//! Uploads are read as CSV: quoted fields may hold commas and line breaks
//! without splitting a record. Free text reads as one single-field record per
//! line, so the same path serves both.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::types::MappingRule;

/// One record of the upload, with its source text kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    /// The record as it appeared in the upload, without its line terminator
    pub text: String,
    /// Parsed fields
    pub fields: Vec<String>,
}

impl SourceRecord {
    /// Trimmed, non-empty field values with surrounding quotes removed.
    pub fn columns(&self) -> Vec<String> {
        self.fields
            .iter()
            .map(|f| f.trim().trim_matches('"').trim().to_string())
            .filter(|f| !f.is_empty())
            .collect()
    }

    fn is_blank(&self) -> bool {
        self.fields.iter().all(|f| f.trim().is_empty())
    }
}

/// Read every non-blank record of `text` in input order.
pub fn read_records(text: &str) -> Vec<SourceRecord> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => {
                warn!("Skipping unreadable record at byte {}: {}", start, e);
                continue;
            }
        }
        let end = reader.position().byte() as usize;

        let fields: Vec<String> = record.iter().map(str::to_string).collect();
        let text = text
            .get(start..end)
            .map(|raw| raw.trim_matches(|c| c == '\r' || c == '\n').to_string())
            .unwrap_or_else(|| fields.join(","));

        let source = SourceRecord { text, fields };
        if !source.is_blank() {
            records.push(source);
        }
    }
    records
}

/// Column names of the first record of `text`.
pub fn header_columns(text: &str) -> Vec<String> {
    read_records(text)
        .into_iter()
        .next()
        .map(|record| record.columns())
        .unwrap_or_default()
}

/// Rows selected for one ingestion invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowBatch {
    /// First record, when it was recognized as a header and dropped
    pub header: Option<String>,
    /// Rows to process, in input order
    pub rows: Vec<String>,
    /// Rows past the cap that this invocation will not process
    pub skipped: usize,
}

/// Split `text` into at most `max_rows` non-empty rows.
///
/// When there is more than one record, the first is a header if one of its
/// columns equals the first mapping rule's column name; it is then dropped.
/// Rows past the cap are counted in [`RowBatch::skipped`] and otherwise
/// ignored.
pub fn split_rows(text: &str, rules: &[MappingRule], max_rows: usize) -> RowBatch {
    let mut records = read_records(text);

    let mut header = None;
    if records.len() > 1 {
        if let Some(rule) = rules.first() {
            let column = rule.header_column.trim();
            if !column.is_empty() && records[0].columns().iter().any(|c| c == column) {
                header = Some(records.remove(0).text);
            }
        }
    }

    let skipped = records.len().saturating_sub(max_rows);
    let rows = records
        .into_iter()
        .take(max_rows)
        .map(|record| record.text)
        .collect();

    RowBatch {
        header,
        rows,
        skipped,
    }
}
