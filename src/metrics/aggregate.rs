// src/metrics/aggregate.rs

use crate::process::{Cell, Table};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AggregateOp {
    #[default]
    Sum,
    Mean,
    Count,
    Max,
    Min,
}

impl AggregateOp {
    /// Unknown names fall back to [`AggregateOp::Sum`].
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "sum" => Self::Sum,
            "mean" | "avg" | "average" => Self::Mean,
            "count" => Self::Count,
            "max" => Self::Max,
            "min" => Self::Min,
            other => {
                warn!(op = other, "unknown aggregate op; using sum");
                Self::Sum
            }
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sum => "sum",
            Self::Mean => "mean",
            Self::Count => "count",
            Self::Max => "max",
            Self::Min => "min",
        }
    }

    fn reduce(self, numbers: &[f64], non_null: usize) -> Cell {
        match self {
            Self::Sum => Cell::Number(numbers.iter().sum()),
            Self::Count => Cell::Number(non_null as f64),
            Self::Mean if numbers.is_empty() => Cell::Null,
            Self::Mean => Cell::Number(numbers.iter().sum::<f64>() / numbers.len() as f64),
            Self::Max => numbers.iter().copied().reduce(f64::max).into(),
            Self::Min => numbers.iter().copied().reduce(f64::min).into(),
        }
    }
}

impl fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Default)]
struct Group {
    numbers: Vec<f64>,
    non_null: usize,
}

/// Group rows by the rendering of `group` and reduce `value` per group.
///
/// Output has the two columns `[group, value]`, one row per group sorted by
/// key. Rows with a null group key are dropped. Either column missing yields
/// an empty table.
pub fn aggregate(table: &Table, group: &str, value: &str, op: AggregateOp) -> Table {
    let (Some(g_idx), Some(v_idx)) = (table.column_index(group), table.column_index(value))
    else {
        warn!(group, value, "aggregate column missing; returning empty table");
        return Table::default();
    };

    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for row in table.rows() {
        let Some(key) = row[g_idx].render() else {
            continue;
        };
        let entry = groups.entry(key).or_default();
        let cell = &row[v_idx];
        if !cell.is_null() {
            entry.non_null += 1;
        }
        if let Some(n) = cell.to_number() {
            entry.numbers.push(n);
        }
    }

    let rows = groups
        .into_iter()
        .map(|(key, g)| vec![Cell::Text(key), op.reduce(&g.numbers, g.non_null)])
        .collect::<Vec<_>>();

    info!(group, value, op = %op, groups = rows.len(), "aggregated");
    Table::from_rows(vec![group.to_string(), value.to_string()], rows)
}
