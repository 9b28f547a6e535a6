// src/extract/snapshot.rs

use super::columns::ColumnMap;
use super::fetch::FetchResult;
use crate::api::RawRow;
use crate::error::{Error, Result};
use chrono::{Local, NaiveDateTime};
use glob::glob;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{
    fs::{self, File, OpenOptions},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const SNAPSHOT_PREFIX: &str = "timesheet_raw_";
const STAMP: &str = "%Y%m%d_%H%M%S";

/// On-disk form of one extraction: `{items, column_mapping}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub items: Vec<RawRow>,
    #[serde(default)]
    pub column_mapping: Map<String, Value>,
}

#[derive(Serialize)]
struct SnapshotRef<'a> {
    items: &'a [RawRow],
    column_mapping: Map<String, Value>,
}

/// Timestamped raw snapshots in one directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn write(&self, rows: &[RawRow], columns: &ColumnMap) -> Result<PathBuf> {
        self.write_at(rows, columns, Local::now().naive_local())
    }

    /// Writes `timesheet_raw_<stamp>.json`; a second snapshot in the same
    /// second gets a `_1`, `_2`, … suffix instead of overwriting.
    pub fn write_at(
        &self,
        rows: &[RawRow],
        columns: &ColumnMap,
        at: NaiveDateTime,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let stem = format!("{SNAPSHOT_PREFIX}{}", at.format(STAMP));

        let mut attempt = 0usize;
        let (path, file) = loop {
            let name = match attempt {
                0 => format!("{stem}.json"),
                n => format!("{stem}_{n}.json"),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => break (path, file),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(Error::io(path, e)),
            }
        };

        let body = SnapshotRef {
            items: rows,
            column_mapping: columns.to_mapping(),
        };
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &body)?;
        writer.flush().map_err(|e| Error::io(&path, e))?;

        info!(path = %path.display(), rows = rows.len(), "raw snapshot saved");
        Ok(path)
    }

    /// Best-effort [`write`](Self::write): failures are logged and swallowed.
    pub fn record(&self, rows: &[RawRow], columns: &ColumnMap) -> Option<PathBuf> {
        match self.write(rows, columns) {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "could not save raw snapshot");
                None
            }
        }
    }

    /// Most recent snapshot in the directory, by file name.
    pub fn latest(&self) -> Result<Option<PathBuf>> {
        let pattern = self.dir.join(format!("{SNAPSHOT_PREFIX}*.json"));
        let mut newest: Option<PathBuf> = None;
        for entry in glob(&pattern.to_string_lossy())? {
            let path = match entry {
                Ok(p) => p,
                Err(e) => {
                    warn!(error = %e, "cannot read snapshot entry");
                    continue;
                }
            };
            if newest.as_ref().map_or(true, |n| snapshot_order(&path) > snapshot_order(n)) {
                newest = Some(path);
            }
        }
        Ok(newest)
    }

    pub fn load(path: &Path) -> Result<FetchResult> {
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let snapshot: Snapshot = serde_json::from_reader(BufReader::new(file))?;
        info!(path = %path.display(), rows = snapshot.items.len(), "loaded raw snapshot");
        Ok(FetchResult {
            column_map: ColumnMap::from_mapping(&snapshot.column_mapping),
            rows: snapshot.items,
        })
    }
}

/// `(stamp, suffix)` so that `_10` sorts after `_9`.
fn snapshot_order(path: &Path) -> (String, usize) {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .trim_start_matches(SNAPSHOT_PREFIX);
    // stamp is `YYYYmmdd_HHMMSS`, 15 chars
    let (stamp, rest) = match stem.get(..15) {
        Some(stamp) => (stamp, &stem[15..]),
        None => (stem, ""),
    };
    let suffix = rest
        .strip_prefix('_')
        .and_then(|n| n.parse().ok())
        .unwrap_or(0);
    (stamp.to_string(), suffix)
}
