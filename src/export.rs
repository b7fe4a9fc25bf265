//! CSV serialization of the final record sequence.
//!
//! Records are heterogeneous JSON objects, so the header is the union of
//! keys across all of them, in first-seen order. Cells follow RFC 4180:
//! quoted only when they contain a comma, quote, or line break, with
//! embedded quotes doubled.

use serde_json::Value;
use std::collections::HashSet;

/// Serialize `items` as CSV. An empty input yields an empty string; the
/// caller decides whether to store anything at all in that case.
pub fn to_csv(items: &[Value]) -> String {
    let headers = collect_headers(items);
    if headers.is_empty() {
        return String::new();
    }

    let mut lines = Vec::with_capacity(items.len() + 1);
    lines.push(headers.join(","));
    for item in items {
        let row: Vec<String> = headers
            .iter()
            .map(|header| csv_cell(item.get(header.as_str())))
            .collect();
        lines.push(row.join(","));
    }
    lines.join("\n")
}

/// Union of keys across all records, in first-seen order, so rows with
/// differing fields still line up.
fn collect_headers(items: &[Value]) -> Vec<String> {
    let mut headers: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for item in items {
        if let Some(obj) = item.as_object() {
            for key in obj.keys() {
                if seen.insert(key.clone()) {
                    headers.push(key.clone());
                }
            }
        }
    }
    headers
}

/// One cell: null or absent renders empty, strings render as-is, anything
/// else as compact JSON.
fn csv_cell(value: Option<&Value>) -> String {
    let text = match value {
        None | Some(Value::Null) => return String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    escape_csv(&text)
}

fn needs_quotes(text: &str) -> bool {
    text.contains(',') || text.contains('"') || text.contains('\n') || text.contains('\r')
}

fn escape_csv(text: &str) -> String {
    if needs_quotes(text) {
        format!("\"{}\"", text.replace('"', "\"\""))
    } else {
        text.to_string()
    }
}
