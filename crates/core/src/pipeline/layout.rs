//! Paths derived from a work directory and ticket id.

use std::path::{Path, PathBuf};

use crate::staging::StorageConfig;
use crate::ticket::TicketId;

/// Every file and folder a merge run reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkLayout {
    work_dir: PathBuf,
    ticket_id: TicketId,
    staging_root: PathBuf,
    results_root: PathBuf,
}

impl WorkLayout {
    pub fn new(work_dir: impl Into<PathBuf>, ticket_id: TicketId, storage: &StorageConfig) -> Self {
        Self {
            work_dir: work_dir.into(),
            ticket_id,
            staging_root: storage.staging_dir.clone(),
            results_root: storage.results_dir.clone(),
        }
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn ticket_id(&self) -> TicketId {
        self.ticket_id
    }

    /// The downloaded attachment, as submitted.
    pub fn attachment_path(&self) -> PathBuf {
        self.work_dir.join("merge.xlsx")
    }

    /// The canonical `Name`/`Merge` workbook handed to the merger.
    pub fn plan_path(&self) -> PathBuf {
        self.work_dir.join("Merge.xlsx")
    }

    /// Identifier list handed to the file linker.
    pub fn list_path(&self) -> PathBuf {
        self.work_dir.join("list.txt")
    }

    fn merged_name(&self) -> String {
        format!("merged_{}", self.ticket_id)
    }

    /// Folder collecting the merged reads inside the work directory.
    pub fn merged_dir(&self) -> PathBuf {
        self.work_dir.join(self.merged_name())
    }

    /// Copy of the merged folder the assembly container mounts.
    pub fn staged_dir(&self) -> PathBuf {
        self.staging_root.join(self.merged_name())
    }

    /// Where the staged folder ends up after assembly.
    pub fn results_dir(&self) -> PathBuf {
        self.results_root
            .join(format!("{}_Assembled", self.merged_name()))
    }

    /// Reports written by the assembly pipeline.
    pub fn reports_dir(&self) -> PathBuf {
        self.results_dir().join("reports")
    }

    pub fn archive_path(&self) -> PathBuf {
        self.work_dir.join("reports.zip")
    }

    /// Name the archive is attached under on the ticket.
    pub fn upload_name(&self) -> String {
        format!("{}_reports.zip", self.merged_name())
    }
}
