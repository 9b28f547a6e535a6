// src/metrics/summary.rs

use crate::process::kind::{is_categorical, matches_any, HOUR_KEYWORDS, TEMPORAL_KEYWORDS};
use crate::process::Table;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnNulls {
    pub column: String,
    pub null_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateRange {
    pub column: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub span_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourStats {
    pub column: String,
    pub total: f64,
    pub mean: f64,
    pub max: f64,
}

/// Shape and headline figures of a table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub columns: Vec<String>,
    pub nulls: Vec<ColumnNulls>,
    pub date_range: Option<DateRange>,
    pub hours: Option<HourStats>,
}

/// First hour-named column holding at least one number. Rates, costs and
/// totals are numeric too but never feed the hour figures.
pub fn hour_column(table: &Table) -> Option<usize> {
    (0..table.column_count()).find(|&idx| {
        matches_any(&table.columns()[idx], HOUR_KEYWORDS)
            && table.column_values(idx).any(|c| c.to_number().is_some())
    })
}

/// First temporal-named column holding at least one date.
pub fn temporal_column(table: &Table) -> Option<usize> {
    (0..table.column_count()).find(|&idx| {
        matches_any(&table.columns()[idx], TEMPORAL_KEYWORDS)
            && table.column_values(idx).any(|c| c.to_datetime().is_some())
    })
}

/// First column named like a project, client, task or category.
pub fn category_column(table: &Table) -> Option<usize> {
    table.columns().iter().position(|name| is_categorical(name))
}

pub fn summarize(table: &Table) -> Summary {
    let rows = table.row_count();
    let nulls = table
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let missing = table.column_values(idx).filter(|c| c.is_null()).count();
            let null_pct = if rows == 0 {
                0.0
            } else {
                missing as f64 * 100.0 / rows as f64
            };
            ColumnNulls {
                column: column.clone(),
                null_pct,
            }
        })
        .collect();

    let date_range = temporal_column(table).and_then(|idx| {
        let dates: Vec<NaiveDate> = table
            .column_values(idx)
            .filter_map(|c| c.to_datetime())
            .map(|dt| dt.date())
            .collect();
        let start = dates.iter().min().copied()?;
        let end = dates.iter().max().copied()?;
        Some(DateRange {
            column: table.columns()[idx].clone(),
            start,
            end,
            span_days: (end - start).num_days(),
        })
    });

    let hours = hour_column(table).and_then(|idx| {
        let values: Vec<f64> = table.column_values(idx).filter_map(|c| c.to_number()).collect();
        if values.is_empty() {
            return None;
        }
        let total: f64 = values.iter().sum();
        Some(HourStats {
            column: table.columns()[idx].clone(),
            total,
            mean: total / values.len() as f64,
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        })
    });

    Summary {
        rows,
        columns: table.columns().to_vec(),
        nulls,
        date_range,
        hours,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Summary:")?;
        writeln!(f, "  Total rows: {}", self.rows)?;
        writeln!(f, "  Columns: {}", self.columns.join(", "))?;
        if let Some(range) = &self.date_range {
            writeln!(
                f,
                "  Date range: {} to {} ({} days)",
                range.start, range.end, range.span_days
            )?;
        }
        if let Some(hours) = &self.hours {
            writeln!(f, "  Total hours: {:.2}", hours.total)?;
        }
        Ok(())
    }
}
