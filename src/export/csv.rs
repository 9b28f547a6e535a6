// src/export/csv.rs

use super::{prepare_parent, report};
use crate::error::{Error, Result};
use crate::metrics::Metrics;
use crate::process::Table;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::info;

/// Header row of display names, then one record per row. Nulls are empty
/// fields and dates use `%Y-%m-%d %H:%M:%S`.
pub fn write_csv<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    if table.column_count() > 0 {
        out.write_record(table.columns())?;
    }
    for row in table.rows() {
        out.write_record(row.iter().map(|c| c.render().unwrap_or_default()))?;
    }
    out.flush().map_err(|e| Error::Csv(e.into()))?;
    Ok(())
}

pub fn export_table(table: &Table, path: &Path) -> Result<PathBuf> {
    prepare_parent(path)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    write_csv(table, BufWriter::new(file))?;
    info!(path = %path.display(), rows = table.row_count(), "exported csv");
    Ok(path.to_path_buf())
}

/// CSV at `path` plus the metrics report next to it.
pub fn export_with_metrics(
    table: &Table,
    metrics: &Metrics,
    path: &Path,
) -> Result<(PathBuf, PathBuf)> {
    let data = export_table(table, path)?;
    let report = report::write_report(metrics, &report::metrics_path(&data))?;
    Ok((data, report))
}
