// src/metrics/filter.rs

use crate::error::{Error, Result};
use crate::process::{parse_datetime, parse_numeric, Cell, Table};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;
use tracing::{debug, info};

/// `<column> <op> <value>` where op is `>`, `<`, `==`, `contains` or `date_range`.
/// A `date_range` value is written `start..end`.
static PREDICATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*(?P<col>.+?)\s*(?:(?P<sym>==|>|<)|\s(?P<word>contains|date_range)\s)\s*(?P<val>.*?)\s*$",
    )
    .expect("predicate regex should compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    GreaterThan(String),
    LessThan(String),
    Equals(String),
    Contains(String),
    DateRange { start: String, end: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: String,
    pub condition: Condition,
}

impl Predicate {
    pub fn new(column: impl Into<String>, condition: Condition) -> Self {
        Self {
            column: column.into(),
            condition,
        }
    }

    /// Cell test for this predicate. Comparison values that cannot be read
    /// as numbers or dates yield a test that rejects every cell.
    fn matcher(&self) -> Box<dyn Fn(&Cell) -> bool + '_> {
        match &self.condition {
            Condition::GreaterThan(v) => numeric(v, |cell, bound| cell > bound),
            Condition::LessThan(v) => numeric(v, |cell, bound| cell < bound),
            Condition::Equals(v) => match parse_numeric(v) {
                Some(target) => Box::new(move |c| match c.to_number() {
                    Some(n) => n == target,
                    None => c.render().is_some_and(|s| &s == v),
                }),
                None => Box::new(move |c| c.render().is_some_and(|s| &s == v)),
            },
            Condition::Contains(v) => {
                let needle = v.to_lowercase();
                Box::new(move |c| {
                    c.render()
                        .is_some_and(|s| s.to_lowercase().contains(&needle))
                })
            }
            Condition::DateRange { start, end } => {
                match (parse_datetime(start), parse_datetime(end)) {
                    (Some(lo), Some(hi)) => Box::new(move |c| in_range(c, lo, hi)),
                    _ => Box::new(|_| false),
                }
            }
        }
    }
}

fn numeric<'a>(raw: &str, cmp: fn(f64, f64) -> bool) -> Box<dyn Fn(&Cell) -> bool + 'a> {
    match parse_numeric(raw) {
        Some(bound) => Box::new(move |c| c.to_number().is_some_and(|n| cmp(n, bound))),
        None => Box::new(|_| false),
    }
}

fn in_range(cell: &Cell, lo: NaiveDateTime, hi: NaiveDateTime) -> bool {
    cell.to_datetime().is_some_and(|dt| lo <= dt && dt <= hi)
}

impl FromStr for Predicate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let caps = PREDICATE_RE
            .captures(s)
            .ok_or_else(|| Error::InvalidFilter(s.to_string()))?;
        let column = caps["col"].to_string();
        let value = caps["val"].to_string();
        let op = caps
            .name("sym")
            .or_else(|| caps.name("word"))
            .map(|m| m.as_str())
            .unwrap_or_default();

        let condition = match op {
            ">" => Condition::GreaterThan(value),
            "<" => Condition::LessThan(value),
            "==" => Condition::Equals(value),
            "contains" => Condition::Contains(value),
            "date_range" => {
                let (start, end) = value
                    .split_once("..")
                    .ok_or_else(|| Error::InvalidFilter(s.to_string()))?;
                Condition::DateRange {
                    start: start.trim().to_string(),
                    end: end.trim().to_string(),
                }
            }
            _ => return Err(Error::InvalidFilter(s.to_string())),
        };
        Ok(Predicate { column, condition })
    }
}

/// Keep the rows that satisfy every predicate, applied in order.
/// A predicate naming a missing column is skipped.
pub fn filter(table: &Table, predicates: &[Predicate]) -> Table {
    let mut out = table.clone();
    for predicate in predicates {
        let Some(idx) = out.column_index(&predicate.column) else {
            debug!(column = %predicate.column, "filter column not found; skipping");
            continue;
        };
        let matches = predicate.matcher();
        out = out.select_rows(|row| row.get(idx).is_some_and(|c| matches(c)));
    }
    info!(
        before = table.row_count(),
        after = out.row_count(),
        predicates = predicates.len(),
        "filtered rows"
    );
    out
}
