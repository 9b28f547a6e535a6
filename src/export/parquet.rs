// src/export/parquet.rs

use super::prepare_parent;
use crate::error::{Error, Result};
use crate::process::{Cell, Table};
use arrow::{
    array::{ArrayRef, BooleanArray, Float64Array, StringArray, TimestampMillisecondArray},
    datatypes::{DataType, Field, Schema, TimeUnit},
    record_batch::RecordBatch,
};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::info;

/// Arrow type for a column: the single non-null cell kind it holds, or
/// `Utf8` for mixed and all-null columns.
fn column_type<'a>(cells: impl Iterator<Item = &'a Cell>) -> DataType {
    let mut seen: Option<DataType> = None;
    for cell in cells {
        let ty = match cell {
            Cell::Null => continue,
            Cell::Number(_) => DataType::Float64,
            Cell::Bool(_) => DataType::Boolean,
            Cell::DateTime(_) => DataType::Timestamp(TimeUnit::Millisecond, None),
            Cell::Text(_) => return DataType::Utf8,
        };
        match &seen {
            None => seen = Some(ty),
            Some(prev) if *prev == ty => {}
            Some(_) => return DataType::Utf8,
        }
    }
    seen.unwrap_or(DataType::Utf8)
}

fn column_array<'a>(ty: &DataType, cells: impl Iterator<Item = &'a Cell>) -> ArrayRef {
    match ty {
        DataType::Float64 => Arc::new(cells.map(Cell::as_f64).collect::<Float64Array>()),
        DataType::Boolean => Arc::new(
            cells
                .map(|c| match c {
                    Cell::Bool(b) => Some(*b),
                    _ => None,
                })
                .collect::<BooleanArray>(),
        ),
        DataType::Timestamp(TimeUnit::Millisecond, None) => Arc::new(
            cells
                .map(|c| c.as_datetime().map(|dt| dt.and_utc().timestamp_millis()))
                .collect::<TimestampMillisecondArray>(),
        ),
        _ => Arc::new(cells.map(Cell::render).collect::<StringArray>()),
    }
}

/// Build one record batch with a typed, nullable column per table column.
pub fn to_record_batch(table: &Table) -> Result<RecordBatch> {
    if table.column_count() == 0 {
        return Err(Error::Export("table has no columns".into()));
    }
    let mut fields = Vec::with_capacity(table.column_count());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.column_count());
    for (idx, name) in table.columns().iter().enumerate() {
        let ty = column_type(table.column_values(idx));
        arrays.push(column_array(&ty, table.column_values(idx)));
        fields.push(Field::new(name, ty, true));
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), arrays)?)
}

pub fn export_parquet(table: &Table, path: &Path) -> Result<PathBuf> {
    let batch = to_record_batch(table)?;
    prepare_parent(path)?;
    let file = File::create(path).map_err(|e| Error::io(path, e))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;
    info!(path = %path.display(), rows = batch.num_rows(), "exported parquet");
    Ok(path.to_path_buf())
}
