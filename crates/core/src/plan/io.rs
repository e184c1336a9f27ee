//! Spreadsheet and list file I/O for the plan module.
//!
//! These functions block; async callers run them on the blocking pool.

use calamine::{open_workbook, Data, Reader, Xlsx, XlsxError};
use rust_xlsxwriter::Workbook;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::PlanError;
use super::types::{MergePlan, Sheet};

/// Name of the single worksheet in the canonical workbook.
const CANONICAL_SHEET_NAME: &str = "Sheet1";

/// Reads the first worksheet of an `.xlsx` file.
///
/// The first row becomes the header row.
pub fn read_sheet(path: &Path) -> Result<Sheet, PlanError> {
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: XlsxError| PlanError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| PlanError::NoWorksheet {
            path: path.to_path_buf(),
        })?
        .map_err(|e| PlanError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());

    let headers = rows.next().unwrap_or_default();
    Ok(Sheet::new(headers, rows.collect()))
}

/// Renders a cell as text. Integral floats lose their `.0` so numeric sample
/// ids survive the round trip unchanged.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Writes the canonical `Name` / `Merge` workbook consumed by the merger.
pub fn write_plan(path: &Path, plan: &MergePlan) -> Result<(), PlanError> {
    let write_failed = |e: rust_xlsxwriter::XlsxError| PlanError::WriteFailed {
        path: path.to_path_buf(),
        reason: e.to_string(),
    };

    let sheet = plan.to_sheet();
    let mut workbook = Workbook::new();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(CANONICAL_SHEET_NAME).map_err(write_failed)?;

        for (col, header) in sheet.headers.iter().enumerate() {
            worksheet
                .write_string(0, col as u16, header)
                .map_err(write_failed)?;
        }
        for (row_idx, row) in sheet.rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                worksheet
                    .write_string((row_idx + 1) as u32, col as u16, value)
                    .map_err(write_failed)?;
            }
        }
    }

    workbook.save(path).map_err(write_failed)
}

/// Writes one identifier per line.
pub fn write_identifier_list(path: &Path, identifiers: &[String]) -> Result<(), PlanError> {
    let mut writer = BufWriter::new(fs::File::create(path)?);
    for id in identifiers {
        writeln!(writer, "{}", id)?;
    }
    writer.flush()?;
    Ok(())
}
