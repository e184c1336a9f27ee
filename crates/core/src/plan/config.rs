//! Configuration for the plan module.

use serde::{Deserialize, Serialize};

/// Which spreadsheet columns feed the merge plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Header of the target sample identifier column.
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Header of the column listing the identifiers to merge.
    #[serde(default = "default_merge_column")]
    pub merge_column: String,

    /// Delimiter between identifiers inside a merge cell.
    #[serde(default = "default_delimiter")]
    pub delimiter: char,
}

fn default_name_column() -> String {
    "SEQID".to_string()
}

fn default_merge_column() -> String {
    "OtherName".to_string()
}

fn default_delimiter() -> char {
    ';'
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            name_column: default_name_column(),
            merge_column: default_merge_column(),
            delimiter: default_delimiter(),
        }
    }
}

impl PlanConfig {
    /// Creates a config reading the given columns.
    pub fn with_columns(name_column: impl Into<String>, merge_column: impl Into<String>) -> Self {
        Self {
            name_column: name_column.into(),
            merge_column: merge_column.into(),
            ..Default::default()
        }
    }
}
