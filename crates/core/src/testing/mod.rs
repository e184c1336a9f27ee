//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the external seams (the
//! ticketing system and the command runner), so the whole merge pipeline can
//! be exercised without Redmine, python or docker.
//!
//! # Example
//!
//! ```rust,ignore
//! use seqmerge_core::testing::{fixtures, MockCommandRunner, MockTicketClient};
//!
//! let tickets = MockTicketClient::new();
//! tickets.add_empty_ticket(42, "Merge request").await;
//! tickets
//!     .add_attachment(42, 1, "merge.xlsx", fixtures::merge_workbook(&[("S1", "A;B")])?)
//!     .await;
//!
//! let runner = MockCommandRunner::new();
//! runner.on_run("merger", |spec| /* create *MER*/x.fastq.gz */ Ok(())).await;
//! ```

mod mock_command_runner;
mod mock_ticket_client;

pub use mock_command_runner::{CommandHook, MockCommandRunner};
pub use mock_ticket_client::{MockTicketClient, RecordedUpdate, RecordedUpload};

/// Test fixtures and helper functions.
pub mod fixtures {
    use rust_xlsxwriter::{Workbook, XlsxError};

    use crate::plan::PlanConfig;

    /// Build an `.xlsx` workbook in memory with the given headers and rows.
    pub fn workbook(headers: &[&str], rows: &[Vec<&str>]) -> Result<Vec<u8>, XlsxError> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();

        for (col, header) in headers.iter().enumerate() {
            sheet.write_string(0, col as u16, *header)?;
        }
        for (row, cells) in rows.iter().enumerate() {
            for (col, cell) in cells.iter().enumerate() {
                if !cell.is_empty() {
                    sheet.write_string(row as u32 + 1, col as u16, *cell)?;
                }
            }
        }

        workbook.save_to_buffer()
    }

    /// A merge request workbook in the lab's submission layout: the default
    /// identifier and merge columns plus an unrelated extra column.
    pub fn merge_workbook(rows: &[(&str, &str)]) -> Result<Vec<u8>, XlsxError> {
        let config = PlanConfig::default();
        let headers = [
            config.name_column.as_str(),
            "Comments",
            config.merge_column.as_str(),
        ];
        let rows: Vec<Vec<&str>> = rows
            .iter()
            .map(|(name, merge)| vec![*name, "", *merge])
            .collect();

        workbook(&headers, &rows)
    }
}
