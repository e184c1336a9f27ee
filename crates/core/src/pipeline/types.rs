//! Types for the merge pipeline.

use serde::Serialize;
use std::path::PathBuf;

use crate::ticket::{Attachment, TicketId};

/// One merge run requested for a ticket.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub ticket_id: TicketId,
    /// Scratch directory owned by the caller; never cleaned up.
    pub work_dir: PathBuf,
    /// Free-text ticket description, informational only.
    pub description: Option<String>,
}

impl MergeRequest {
    pub fn new(ticket_id: TicketId, work_dir: impl Into<PathBuf>) -> Self {
        Self {
            ticket_id,
            work_dir: work_dir.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Steps of a merge run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    FetchAttachment,
    BuildPlan,
    LinkFiles,
    MergeFiles,
    CollectMerged,
    Backup,
    StageFiles,
    Assemble,
    StoreResults,
    Archive,
    Publish,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Start => "start",
            Stage::FetchAttachment => "fetch_attachment",
            Stage::BuildPlan => "build_plan",
            Stage::LinkFiles => "link_files",
            Stage::MergeFiles => "merge_files",
            Stage::CollectMerged => "collect_merged",
            Stage::Backup => "backup",
            Stage::StageFiles => "stage_files",
            Stage::Assemble => "assemble",
            Stage::StoreResults => "store_results",
            Stage::Archive => "archive",
            Stage::Publish => "publish",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attachment saved into the work directory.
#[derive(Debug, Clone)]
pub struct DownloadedSheet {
    pub attachment: Attachment,
    pub path: PathBuf,
}

/// Files written from the normalized plan.
#[derive(Debug, Clone)]
pub struct PreparedPlan {
    pub plan_path: PathBuf,
    pub list_path: PathBuf,
    pub rows: usize,
    pub identifiers: Vec<String>,
}

/// Merged reads gathered into one folder.
#[derive(Debug, Clone)]
pub struct MergedFiles {
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Merged reads after backup and staging.
#[derive(Debug, Clone)]
pub struct StagedFiles {
    pub backups: Vec<PathBuf>,
    pub staged_dir: PathBuf,
}

/// The zipped assembly reports.
#[derive(Debug, Clone, Serialize)]
pub struct ReportArchive {
    pub path: PathBuf,
    /// Name the archive is attached under.
    pub display_name: String,
    pub files: usize,
}

/// How a merge run ended.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// Reports were uploaded and the ticket resolved.
    Completed {
        ticket_id: TicketId,
        archive: ReportArchive,
        duration_ms: u64,
    },
    /// An expected stop the requester can act on; the ticket was closed
    /// with an explanation.
    Halted {
        ticket_id: TicketId,
        stage: Stage,
        reason: String,
    },
    /// An unexpected error; the error text was posted to the ticket.
    Failed {
        ticket_id: TicketId,
        stage: Stage,
        error: String,
    },
}

impl PipelineOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, PipelineOutcome::Completed { .. })
    }

    pub fn ticket_id(&self) -> TicketId {
        match self {
            PipelineOutcome::Completed { ticket_id, .. }
            | PipelineOutcome::Halted { ticket_id, .. }
            | PipelineOutcome::Failed { ticket_id, .. } => *ticket_id,
        }
    }
}
