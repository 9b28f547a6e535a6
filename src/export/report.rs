// src/export/report.rs

use super::prepare_parent;
use crate::error::{Error, Result};
use crate::metrics::{MetricValue, Metrics};
use std::{
    fmt::Write as _,
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

const RULE_WIDTH: usize = 30;

/// `<dir>/<stem>_metrics.txt` for a data file at `<dir>/<stem>.<ext>`.
pub fn metrics_path(data_path: &Path) -> PathBuf {
    let stem = data_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("export");
    data_path.with_file_name(format!("{stem}_metrics.txt"))
}

/// `average_daily_hours` → `Average Daily Hours`
fn title(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn heading(key: &str) -> String {
    match key {
        "weekly_totals" => "WEEKLY BREAKDOWN".to_string(),
        "project_breakdown" => "PROJECT BREAKDOWN".to_string(),
        other => title(other).to_uppercase(),
    }
}

/// Plain-text metrics report: scalars first, then one block per grouped metric.
pub fn render_metrics(metrics: &Metrics) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "TIMESHEET METRICS");
    let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(out);

    if metrics.is_empty() {
        let _ = writeln!(out, "No hour data available.");
        return out;
    }

    for (key, value) in metrics.iter() {
        match value {
            MetricValue::Number(n) => {
                let _ = writeln!(out, "{}: {n:.2}", title(key));
            }
            MetricValue::Count(c) => {
                let _ = writeln!(out, "{}: {c}", title(key));
            }
            MetricValue::Group(_) => {}
        }
    }

    for (key, value) in metrics.iter() {
        let Some(group) = value.as_group() else {
            continue;
        };
        if group.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{}:", heading(key));
        let prefix = if key == "weekly_totals" { "Week " } else { "" };
        for (name, hours) in group {
            let _ = writeln!(out, "  {prefix}{name}: {hours:.2} hours");
        }
    }
    out
}

pub fn write_report(metrics: &Metrics, path: &Path) -> Result<PathBuf> {
    prepare_parent(path)?;
    fs::write(path, render_metrics(metrics)).map_err(|e| Error::io(path, e))?;
    info!(path = %path.display(), metrics = metrics.len(), "wrote metrics report");
    Ok(path.to_path_buf())
}
