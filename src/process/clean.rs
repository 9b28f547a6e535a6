// src/process/clean.rs

use super::kind::classify;
use super::table::{Cell, Table};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, info, warn};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d %b %Y", "%B %d, %Y"];

/// Parse a calendar date or date-time. Offsets are dropped: the wall-clock
/// time the user entered is kept.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Plain numeric parse; `NaN` and infinities are rejected.
pub fn parse_numeric(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `"H:MM"` → `H + MM/60`, split on the first colon. Missing minutes count as
/// zero, so `"5"` is `5.0`; `"1:30:00"` has minutes `"30:00"` and is rejected.
pub fn parse_duration(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    let (hours, minutes) = match s.split_once(':') {
        Some((h, m)) => (parse_numeric(h)?, parse_numeric(m)?),
        None => (parse_numeric(s)?, 0.0),
    };
    Some(hours + minutes / 60.0).filter(|v| v.is_finite())
}

fn temporal_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::DateTime(_) => cell.clone(),
        Cell::Text(s) => parse_datetime(s).map_or(Cell::Null, Cell::DateTime),
        _ => Cell::Null,
    }
}

fn numeric_cell(cell: &Cell) -> Cell {
    match cell {
        Cell::Number(_) => cell.clone(),
        Cell::Text(s) => parse_numeric(s).map_or(Cell::Null, Cell::Number),
        _ => Cell::Null,
    }
}

fn duration_cell(cell: &Cell) -> Cell {
    cell.render()
        .and_then(|s| parse_duration(&s))
        .map_or(Cell::Null, Cell::Number)
}

fn trimmed_cell(cell: &Cell) -> Cell {
    cell.render()
        .map_or(Cell::Null, |s| Cell::Text(s.trim().to_string()))
}

/// Rewrite column `idx` through `convert`; returns how many non-null cells became null.
fn convert_column(table: &mut Table, idx: usize, convert: fn(&Cell) -> Cell) -> usize {
    let mut lost = 0;
    table.map_column(idx, |cell| {
        let out = convert(cell);
        if out.is_null() && !cell.is_null() {
            lost += 1;
        }
        out
    });
    lost
}

/// Returns a cleaned copy of `table`:
///  1) temporal-named columns → `DateTime` (unparseable → null)
///  2) numeric-named columns → `Number`, using `H:MM` notation when any cell has a colon
///  3) columns still holding text → trimmed text
///
/// A name matching both keyword tables goes through 1) and then 2).
pub fn clean(table: &Table) -> Table {
    let mut out = table.clone();

    for idx in 0..out.column_count() {
        let name = out.columns()[idx].clone();
        let kinds = classify(&name);

        if kinds.overlapping() {
            debug!(column = %name, "name matches temporal and numeric keywords; applying both");
        }

        if kinds.temporal {
            let lost = convert_column(&mut out, idx, temporal_cell);
            report_lost(&name, "date", lost);
        }

        if kinds.numeric {
            let colon = out
                .column_values(idx)
                .any(|c| c.render().is_some_and(|s| s.contains(':')));
            if colon {
                let lost = convert_column(&mut out, idx, duration_cell);
                report_lost(&name, "duration", lost);
            } else {
                let lost = convert_column(&mut out, idx, numeric_cell);
                report_lost(&name, "number", lost);
            }
        }

        if out.column_values(idx).any(|c| matches!(c, Cell::Text(_))) {
            out.map_column(idx, trimmed_cell);
        }
    }

    info!(
        rows = out.row_count(),
        columns = out.column_count(),
        "applied cleaning rules"
    );
    out
}

fn report_lost(column: &str, kind: &str, lost: usize) {
    if lost > 0 {
        warn!(column, kind, lost, "cells could not be parsed; stored as null");
    }
}
