// src/export/excel.rs

use super::prepare_parent;
use crate::error::{Error, Result};
use crate::process::{Cell, Table};
use rust_xlsxwriter::{Format, Workbook};
use std::path::{Path, PathBuf};
use tracing::info;

/// Worksheet with a bold header row. Numbers stay numeric; dates are written
/// as text in the CSV date format so they survive without a cell format.
pub fn export_excel(table: &Table, path: &Path) -> Result<PathBuf> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Timesheet")?;

    let bold = Format::new().set_bold();
    for (col, name) in table.columns().iter().enumerate() {
        sheet.write_string_with_format(0, column_index(col)?, name, &bold)?;
    }

    for (row_idx, row) in table.rows().iter().enumerate() {
        let r = u32::try_from(row_idx + 1)
            .map_err(|_| Error::Export(format!("too many rows for a worksheet: {row_idx}")))?;
        for (col, cell) in row.iter().enumerate() {
            let c = column_index(col)?;
            match cell {
                Cell::Null => {}
                Cell::Number(n) => {
                    sheet.write_number(r, c, *n)?;
                }
                Cell::Bool(b) => {
                    sheet.write_boolean(r, c, *b)?;
                }
                Cell::Text(s) => {
                    sheet.write_string(r, c, s)?;
                }
                Cell::DateTime(_) => {
                    sheet.write_string(r, c, cell.to_string())?;
                }
            }
        }
    }

    prepare_parent(path)?;
    workbook.save(path)?;
    info!(path = %path.display(), rows = table.row_count(), "exported excel");
    Ok(path.to_path_buf())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::Export(format!("too many columns for a worksheet: {col}")))
}
