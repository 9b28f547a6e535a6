// src/process/normalize.rs

use super::table::{Cell, Table};
use crate::api::RawRow;
use crate::extract::{value::coerce, ColumnMap};
use std::collections::HashMap;
use tracing::info;

/// Flatten fetched rows into a rectangular table keyed by display name.
///
/// Identifiers missing from `columns` keep their raw id as the header. Column
/// order is the order of first appearance across all rows.
pub fn normalize(rows: &[RawRow], columns: &ColumnMap) -> Table {
    let mut names: Vec<String> = Vec::new();
    let mut slots: HashMap<String, usize> = HashMap::new();
    let mut records: Vec<Vec<Cell>> = Vec::with_capacity(rows.len());

    for row in rows {
        let mut record = vec![Cell::Null; names.len()];
        for (id, raw) in &row.values {
            let name = columns.resolve(id);
            let slot = match slots.get(name) {
                Some(&slot) => slot,
                None => {
                    let slot = names.len();
                    names.push(name.to_string());
                    slots.insert(name.to_string(), slot);
                    slot
                }
            };
            if record.len() <= slot {
                record.resize(slot + 1, Cell::Null);
            }
            record[slot] = coerce(raw);
        }
        records.push(record);
    }

    let table = Table::from_rows(names, records);
    info!(
        rows = table.row_count(),
        columns = ?table.columns(),
        "normalized rows"
    );
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ColumnDef;
    use serde_json::{json, Value};

    fn raw(values: Value) -> RawRow {
        match values {
            Value::Object(map) => RawRow::new(map),
            _ => panic!("row values must be an object"),
        }
    }

    fn column_map(pairs: &[(&str, &str)]) -> ColumnMap {
        pairs.iter().map(|(id, name)| ColumnDef::new(*id, *name)).collect()
    }

    #[test]
    fn resolves_names_and_coerces_values() {
        let rows = vec![raw(json!({"c1": "5", "c2": {"name": "Acme"}}))];
        let table = normalize(&rows, &column_map(&[("c1", "Hours"), ("c2", "Project")]));

        assert_eq!(table.columns(), ["Hours", "Project"]);
        assert_eq!(table.get(0, "Hours"), Some(&Cell::from("5")));
        assert_eq!(table.get(0, "Project"), Some(&Cell::from("Acme")));
    }

    #[test]
    fn output_is_rectangular_with_union_of_keys() {
        let rows = vec![
            raw(json!({"c1": 1})),
            raw(json!({"c2": "b"})),
            raw(json!({"c3": true, "c1": 3})),
        ];
        let table = normalize(&rows, &column_map(&[("c1", "A"), ("c2", "B")]));

        assert_eq!(table.columns(), ["A", "B", "c3"]);
        assert!(table.rows().iter().all(|r| r.len() == 3));
        assert_eq!(table.rows()[0], vec![Cell::Number(1.0), Cell::Null, Cell::Null]);
        assert_eq!(table.rows()[1], vec![Cell::Null, Cell::from("b"), Cell::Null]);
        assert_eq!(
            table.rows()[2],
            vec![Cell::Number(3.0), Cell::Null, Cell::Bool(true)]
        );
    }

    #[test]
    fn shared_display_names_collapse_into_one_column() {
        let rows = vec![raw(json!({"c1": "first", "c2": "second"}))];
        let table = normalize(&rows, &column_map(&[("c1", "Name"), ("c2", "Name")]));
        assert_eq!(table.columns(), ["Name"]);
        assert_eq!(table.get(0, "Name"), Some(&Cell::from("second")));
    }

    #[test]
    fn no_rows_no_columns() {
        let table = normalize(&[], &column_map(&[("c1", "Hours")]));
        assert_eq!(table.column_count(), 0);
        assert!(table.is_empty());
    }
}
