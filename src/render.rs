//! Purpose: Presentation helpers for typed rows.
//! Exports: `bracketed`, `row_json`.
//! Role: Output formatting for the CLI; the parsing core never formats rows.
//! Invariants: Bracketed form is `[v1; v2; ...]` with values printed via `Display`.
//! Invariants: JSON form is one object per row: `{"line": N, "values": [...]}`.
use serde_json::{Value, json};

use crate::api::TypedRow;

pub fn bracketed(row: &TypedRow) -> String {
    let joined = row
        .values()
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    format!("[{joined}]")
}

pub fn row_json(row: &TypedRow) -> Value {
    json!({
        "line": row.line(),
        "values": row.values(),
    })
}
