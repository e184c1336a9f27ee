//! Core types for the plan module.

use serde::{Deserialize, Serialize};

/// Canonical header of the target sample column.
pub const NAME_COLUMN: &str = "Name";

/// Canonical header of the merge group column.
pub const MERGE_COLUMN: &str = "Merge";

/// An in-memory table read from the first worksheet of a spreadsheet.
///
/// Every cell is rendered as text. Rows may be shorter than the header row
/// when trailing cells are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Sheet {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Position of the column with the given header.
    pub fn column_index(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == header)
    }

    /// Cell text, empty when the row is short.
    pub fn cell(&self, row: usize, column: usize) -> &str {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
            .unwrap_or("")
    }
}

/// One row of the canonical plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRow {
    /// Target sample name.
    pub name: String,
    /// Raw merge cell, identifiers separated by the plan delimiter.
    pub merge: String,
}

impl PlanRow {
    pub fn new(name: impl Into<String>, merge: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            merge: merge.into(),
        }
    }

    /// Source identifiers of this row, in cell order.
    ///
    /// Pieces are trimmed and empty pieces are skipped, so `"A;B;"` yields
    /// `A`, `B`.
    pub fn identifiers(&self, delimiter: char) -> impl Iterator<Item = &str> {
        self.merge
            .split(delimiter)
            .map(str::trim)
            .filter(|piece| !piece.is_empty())
    }
}

/// Ordered mapping from target sample to the identifiers merged into it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergePlan {
    rows: Vec<PlanRow>,
    delimiter: char,
}

impl MergePlan {
    pub fn new(rows: Vec<PlanRow>, delimiter: char) -> Self {
        Self { rows, delimiter }
    }

    pub fn rows(&self) -> &[PlanRow] {
        &self.rows
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Canonical two-column table (`Name`, `Merge`).
    pub fn to_sheet(&self) -> Sheet {
        Sheet {
            headers: vec![NAME_COLUMN.to_string(), MERGE_COLUMN.to_string()],
            rows: self
                .rows
                .iter()
                .map(|row| vec![row.name.clone(), row.merge.clone()])
                .collect(),
        }
    }
}
