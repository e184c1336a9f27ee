//! Error types for the merge pipeline.

use std::path::PathBuf;
use thiserror::Error;

use crate::plan::PlanError;
use crate::staging::StagingError;
use crate::ticket::{TicketClientError, TicketId, TicketStatus};
use crate::tools::ToolError;

use super::messages;

/// Errors that can stop a merge run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The ticket carries no attachment to build a plan from.
    #[error("Ticket {0} has no attachments")]
    NoAttachment(TicketId),

    /// The merger left no merged reads behind.
    #[error("No merged FASTQ files were created in {dir}")]
    NoMergedFiles { dir: PathBuf },

    #[error(transparent)]
    Ticket(#[from] TicketClientError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Staging(#[from] StagingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A blocking task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Task(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

impl PipelineError {
    /// Lifts the ticket client's missing attachment signal to a pipeline halt.
    pub fn from_fetch(error: TicketClientError) -> Self {
        match error {
            TicketClientError::NoAttachment(id) => Self::NoAttachment(id),
            other => Self::Ticket(other),
        }
    }

    /// Lifts the empty merge result to a pipeline halt.
    pub fn from_collect(error: StagingError) -> Self {
        match error {
            StagingError::NoMergedFiles { dir } => Self::NoMergedFiles { dir },
            other => Self::Staging(other),
        }
    }

    /// Whether this is an expected stop the requester can fix, as opposed to
    /// an unexpected failure.
    pub fn is_halt(&self) -> bool {
        matches!(self, Self::NoAttachment(_) | Self::NoMergedFiles { .. })
    }

    /// Note posted to the ticket for this error.
    pub fn ticket_note(&self) -> String {
        match self {
            Self::NoAttachment(_) => messages::NO_ATTACHMENT.to_string(),
            Self::NoMergedFiles { .. } => messages::NO_MERGED_FILES.to_string(),
            other => messages::failure(other),
        }
    }

    /// Status the ticket moves to, if any.
    pub fn ticket_status(&self) -> Option<TicketStatus> {
        if self.is_halt() {
            Some(TicketStatus::Error)
        } else {
            None
        }
    }
}
