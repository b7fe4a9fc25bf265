//! Normalization of the heterogeneous page shapes the events API serves.
//!
//! The upstream API is inconsistent across endpoints and pagination styles,
//! so a page body is sniffed against a fixed, ordered chain of shapes and
//! reduced to the one form the pagination loop consumes. Unknown shapes
//! degrade to an empty page; this layer never fails.

use serde_json::{Map, Value};

/// Which known shape a page body matched. Priority is top to bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageShape {
    /// Bare JSON array: the whole body is the item list, never a cursor.
    Array,
    /// Object carrying an `events` field.
    Events,
    /// Object carrying an `items` field.
    Items,
    /// Object exposing a non-negative numeric `count`; items under `items`.
    Counted,
    /// Any other non-null value, treated as a single item.
    Scalar,
    /// Null body: no items, no cursor.
    Empty,
}

/// Continuation state carried from one response into the next request.
/// Existence of the cursor already encodes the continuation rule: both
/// halves were present and truthy.
#[derive(Debug, Clone, PartialEq)]
pub struct PageCursor {
    pub offset_id: Value,
    pub offset_timestamp: Value,
}

impl PageCursor {
    /// Wire form of the id half: strings pass through, other scalars print
    /// as JSON.
    pub fn offset_id_param(&self) -> String {
        value_to_param(&self.offset_id)
    }

    /// Wire form of the timestamp half.
    pub fn offset_timestamp_param(&self) -> String {
        value_to_param(&self.offset_timestamp)
    }
}

/// A page body reduced to the uniform form the pagination loop consumes.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedPage {
    pub shape: PageShape,
    pub items: Vec<Value>,
    pub next_cursor: Option<PageCursor>,
}

impl NormalizedPage {
    fn new(shape: PageShape, items: Vec<Value>, next_cursor: Option<PageCursor>) -> Self {
        Self {
            shape,
            items,
            next_cursor,
        }
    }
}

/// Sniff `body` against the known shapes, in priority order.
pub fn unpack(body: &Value) -> NormalizedPage {
    if let Some(items) = body.as_array() {
        return NormalizedPage::new(PageShape::Array, items.clone(), None);
    }

    if let Some(obj) = body.as_object() {
        if obj.contains_key("events") {
            return NormalizedPage::new(
                PageShape::Events,
                array_field(obj, "events"),
                extract_cursor(obj),
            );
        }
        if obj.contains_key("items") {
            return NormalizedPage::new(
                PageShape::Items,
                array_field(obj, "items"),
                extract_cursor(obj),
            );
        }
        if has_count(obj) {
            return NormalizedPage::new(
                PageShape::Counted,
                array_field(obj, "items"),
                extract_cursor(obj),
            );
        }
        // An object in none of the known envelopes is a bare event.
    }

    if body.is_null() {
        return NormalizedPage::new(PageShape::Empty, Vec::new(), None);
    }

    NormalizedPage::new(PageShape::Scalar, vec![body.clone()], None)
}

/// A present-but-non-array field degrades to an empty list, never a panic.
fn array_field(obj: &Map<String, Value>, key: &str) -> Vec<Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}

fn has_count(obj: &Map<String, Value>) -> bool {
    obj.get("count")
        .and_then(Value::as_f64)
        .map_or(false, |count| count >= 0.0)
}

/// Each cursor half may arrive under two names; the first present (non-null)
/// wins. The cursor exists only when both halves came out truthy.
fn extract_cursor(obj: &Map<String, Value>) -> Option<PageCursor> {
    let offset_id = coalesce(obj, &["last_id", "next_id"])?;
    let offset_timestamp = coalesce(obj, &["last_timestamp", "offset_timestamp"])?;
    if is_truthy(&offset_id) && is_truthy(&offset_timestamp) {
        Some(PageCursor {
            offset_id,
            offset_timestamp,
        })
    } else {
        None
    }
}

fn coalesce(obj: &Map<String, Value>, names: &[&str]) -> Option<Value> {
    names
        .iter()
        .filter_map(|name| obj.get(*name))
        .find(|value| !value.is_null())
        .cloned()
}

/// JS-style truthiness: null, false, 0, and "" end pagination.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn value_to_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
