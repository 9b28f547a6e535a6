// src/export/mod.rs

pub mod csv;
pub mod excel;
pub mod parquet;
pub mod report;

pub use self::csv::{export_table, export_with_metrics, write_csv};
pub use self::excel::export_excel;
pub use self::parquet::export_parquet;
pub use self::report::{metrics_path, render_metrics, write_report};

use crate::error::{Error, Result};
use crate::process::Table;
use chrono::{Local, NaiveDateTime};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

pub const EXPORT_PREFIX: &str = "timesheet_processed_";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportFormat {
    #[default]
    Csv,
    Parquet,
    Excel,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Excel => "xlsx",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
            Self::Excel => "excel",
        })
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            "excel" | "xlsx" => Ok(Self::Excel),
            other => Err(Error::Export(format!("unknown export format `{other}`"))),
        }
    }
}

/// `timesheet_processed_YYYYmmdd_HHMMSS.<ext>`
pub fn default_file_name(format: ExportFormat, at: NaiveDateTime) -> String {
    format!(
        "{EXPORT_PREFIX}{}.{}",
        at.format("%Y%m%d_%H%M%S"),
        format.extension()
    )
}

/// Where an export lands: `file_name` under `dir`, or a timestamped default.
/// A bare name gets the format's extension.
pub fn output_path(dir: &Path, file_name: Option<&str>, format: ExportFormat) -> PathBuf {
    match file_name {
        None => dir.join(default_file_name(format, Local::now().naive_local())),
        Some(name) => {
            let path = dir.join(name);
            if path.extension().is_some() {
                path
            } else {
                path.with_extension(format.extension())
            }
        }
    }
}

/// Write `table` at `path` in `format`.
pub fn export(table: &Table, format: ExportFormat, path: &Path) -> Result<PathBuf> {
    match format {
        ExportFormat::Csv => export_table(table, path),
        ExportFormat::Parquet => export_parquet(table, path),
        ExportFormat::Excel => export_excel(table, path),
    }
}

pub(crate) fn prepare_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))
        }
        _ => Ok(()),
    }
}
