//! Error types for the plan module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a merge plan.
#[derive(Debug, Error)]
pub enum PlanError {
    /// A required column is absent from the spreadsheet header row.
    #[error("Required column '{column}' not found in spreadsheet (columns: {})", .found.join(", "))]
    MissingColumn { column: String, found: Vec<String> },

    /// The workbook contains no worksheet.
    #[error("Spreadsheet has no worksheets: {path}")]
    NoWorksheet { path: PathBuf },

    /// The workbook could not be opened or parsed.
    #[error("Failed to read spreadsheet {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    /// The canonical workbook could not be written.
    #[error("Failed to write spreadsheet {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    /// I/O error while writing plan files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlanError {
    /// Creates a missing column error.
    pub fn missing_column(column: impl Into<String>, found: &[String]) -> Self {
        Self::MissingColumn {
            column: column.into(),
            found: found.to_vec(),
        }
    }
}
