// src/metrics/timesheet.rs

use super::summary::{category_column, hour_column, temporal_column};
use crate::process::Table;
use chrono::Datelike;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Days above this many hours count as overtime.
pub const OVERTIME_THRESHOLD: f64 = 8.0;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum MetricValue {
    Number(f64),
    Count(usize),
    Group(BTreeMap<String, f64>),
}

impl MetricValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Number(n) => Some(*n),
            MetricValue::Count(c) => Some(*c as f64),
            MetricValue::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&BTreeMap<String, f64>> {
        match self {
            MetricValue::Group(g) => Some(g),
            _ => None,
        }
    }
}

/// Metric name → value, in the order the metrics were computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metrics {
    entries: Vec<(String, MetricValue)>,
}

impl Metrics {
    fn push(&mut self, name: &str, value: MetricValue) {
        self.entries.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&MetricValue> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetricValue)> + '_ {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for Metrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// ISO week key, e.g. `2024-W03`.
pub fn week_key(date: chrono::NaiveDate) -> String {
    let week = date.iso_week();
    format!("{}-W{:02}", week.year(), week.week())
}

/// Hour totals, weekly totals and per-project breakdown.
///
/// The hour column is the first numeric-named column that holds a number;
/// without one the result is empty.
pub fn compute_timesheet_metrics(table: &Table) -> Metrics {
    let mut metrics = Metrics::default();
    let Some(hour_idx) = hour_column(table) else {
        debug!("no hour column; skipping timesheet metrics");
        return metrics;
    };

    let hours: Vec<Option<f64>> = table.column_values(hour_idx).map(|c| c.to_number()).collect();
    let present: Vec<f64> = hours.iter().flatten().copied().collect();
    let total: f64 = present.iter().sum();
    let max = present.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = present.iter().copied().fold(f64::INFINITY, f64::min);
    let overtime = present.iter().filter(|&&h| h > OVERTIME_THRESHOLD).count();

    metrics.push("total_hours", MetricValue::Number(total));
    metrics.push(
        "average_daily_hours",
        MetricValue::Number(total / present.len() as f64),
    );
    metrics.push("max_daily_hours", MetricValue::Number(max));
    metrics.push("min_daily_hours", MetricValue::Number(min));
    metrics.push("overtime_days", MetricValue::Count(overtime));

    if let Some(date_idx) = temporal_column(table) {
        let mut weekly: BTreeMap<String, f64> = BTreeMap::new();
        for (cell, h) in table.column_values(date_idx).zip(&hours) {
            if let (Some(dt), Some(h)) = (cell.to_datetime(), h) {
                *weekly.entry(week_key(dt.date())).or_default() += h;
            }
        }
        if !weekly.is_empty() {
            let average = weekly.values().sum::<f64>() / weekly.len() as f64;
            metrics.push("weekly_totals", MetricValue::Group(weekly));
            metrics.push("average_weekly_hours", MetricValue::Number(average));
        }
    }

    if let Some(cat_idx) = category_column(table) {
        let mut breakdown: BTreeMap<String, f64> = BTreeMap::new();
        for (cell, h) in table.column_values(cat_idx).zip(&hours) {
            if let (Some(key), Some(h)) = (cell.render(), h) {
                *breakdown.entry(key).or_default() += h;
            }
        }
        if !breakdown.is_empty() {
            metrics.push("project_breakdown", MetricValue::Group(breakdown));
        }
    }

    info!(
        hour_column = %table.columns()[hour_idx],
        total_hours = total,
        overtime_days = overtime,
        "computed timesheet metrics"
    );
    metrics
}
