//! Spreadsheet normalization and identifier flattening.

use tracing::debug;

use super::config::PlanConfig;
use super::error::PlanError;
use super::types::{MergePlan, PlanRow, Sheet};

/// Reduces a raw spreadsheet to the canonical merge plan.
///
/// Only the configured name and merge columns are kept; every other column is
/// dropped. Row order is preserved. Rows where both kept cells are blank are
/// skipped, since spreadsheets commonly carry formatted but empty trailing
/// rows.
pub fn normalize(sheet: &Sheet, config: &PlanConfig) -> Result<MergePlan, PlanError> {
    let name_idx = sheet
        .column_index(&config.name_column)
        .ok_or_else(|| PlanError::missing_column(&config.name_column, &sheet.headers))?;
    let merge_idx = sheet
        .column_index(&config.merge_column)
        .ok_or_else(|| PlanError::missing_column(&config.merge_column, &sheet.headers))?;

    let rows: Vec<PlanRow> = (0..sheet.rows.len())
        .map(|i| {
            PlanRow::new(
                sheet.cell(i, name_idx).trim(),
                sheet.cell(i, merge_idx).trim(),
            )
        })
        .filter(|row| !(row.name.is_empty() && row.merge.is_empty()))
        .collect();

    debug!(
        rows = rows.len(),
        dropped_columns = sheet.headers.len().saturating_sub(2),
        "Normalized merge spreadsheet"
    );

    Ok(MergePlan::new(rows, config.delimiter))
}

/// Every source identifier referenced by the plan.
///
/// Row order first, then order within the merge cell. Duplicates are kept.
pub fn flatten_identifiers(plan: &MergePlan) -> Vec<String> {
    plan.rows()
        .iter()
        .flat_map(|row| row.identifiers(plan.delimiter()))
        .map(str::to_string)
        .collect()
}
