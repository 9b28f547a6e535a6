// src/extract/value.rs

use crate::process::Cell;
use serde_json::Value;

/// Keys that carry the display form of a structured cell, most preferred first.
pub const PREFERRED_KEYS: &[&str] = &["name", "text", "displayValue", "value"];

/// Reduce one raw cell to a scalar.
///
/// Structured cells (people, lookups, currency, …) yield the first non-null
/// preferred key, or the JSON rendering of the whole object when none is
/// present. Lists are coerced element-wise and joined with `", "`. Never fails.
pub fn coerce(value: &Value) -> Cell {
    match value {
        Value::Null => Cell::Null,
        Value::Bool(b) => Cell::Bool(*b),
        Value::Number(n) => n
            .as_f64()
            .map_or_else(|| Cell::Text(n.to_string()), Cell::Number),
        Value::String(s) => Cell::Text(s.clone()),
        Value::Array(items) => coerce_list(items),
        Value::Object(map) => PREFERRED_KEYS
            .iter()
            .find_map(|key| map.get(*key).filter(|v| !v.is_null()))
            .map_or_else(|| Cell::Text(value.to_string()), coerce),
    }
}

fn coerce_list(items: &[Value]) -> Cell {
    let mut cells: Vec<Cell> = items
        .iter()
        .map(coerce)
        .filter(|c| !c.is_null())
        .collect();
    match cells.len() {
        0 => Cell::Null,
        1 => cells.remove(0),
        _ => Cell::Text(
            cells
                .iter()
                .map(Cell::to_string)
                .collect::<Vec<_>>()
                .join(", "),
        ),
    }
}
