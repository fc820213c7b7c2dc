//! Text and JSON rendering of cache contents and history for the CLI.

use crate::backend::LogEntry;
use crate::error::ApiError;
use crate::status::{NodeKind, StatusRecord};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use serde::Serialize;
use std::path::Path;

/// Flat, serializable view of one record
#[derive(Debug, Serialize)]
pub struct StatusRow {
    pub path: String,
    pub state: String,
    pub kind: String,
    pub locked: bool,
    pub revision: Option<i64>,
    pub uri: Option<String>,
    pub versioned: bool,
    pub modified: bool,
}

impl StatusRow {
    pub fn from_record(record: &StatusRecord, root: &Path) -> Self {
        let shown = record.path().strip_prefix(root).unwrap_or(record.path());
        let path = if shown.as_os_str().is_empty() {
            ".".to_string()
        } else {
            shown.display().to_string()
        };
        Self {
            path,
            state: record.version_state().label().to_string(),
            kind: kind_label(record.node_kind()).to_string(),
            locked: record.is_locked(),
            revision: record.revision(),
            uri: record.uri().map(str::to_string),
            versioned: record.is_versioned(),
            modified: record.is_modified(),
        }
    }
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::File => "file",
        NodeKind::Directory => "dir",
        NodeKind::Unknown => "-",
    }
}

/// Render rows as a table; rows are expected pre-sorted
pub fn format_status_table(rows: &[StatusRow]) -> String {
    if rows.is_empty() {
        return "No cached entries.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Path", "State", "Kind", "Lock", "Revision"]);
    for row in rows {
        table.add_row(vec![
            row.path.clone(),
            row.state.clone(),
            row.kind.clone(),
            if row.locked { "K" } else { "" }.to_string(),
            row.revision
                .map(|r| r.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    format!("{}\n{} entries", table, rows.len())
}

pub fn format_history_table(entries: &[LogEntry]) -> String {
    if entries.is_empty() {
        return "No history.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Revision", "Author", "Date"]);
    for entry in entries {
        table.add_row(vec![
            format!("r{}", entry.revision),
            entry.author.clone().unwrap_or_else(|| "-".to_string()),
            entry
                .date
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }
    table.to_string()
}

pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::ConfigError(format!("Failed to serialize output: {}", e)))
}
