//! Merge pipeline runner.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::plan::{self, PlanConfig};
use crate::staging::{self, StorageConfig};
use crate::ticket::{TicketClient, TicketId, TicketStatus};
use crate::tools::{CommandRunner, ExternalTools};

use super::error::PipelineError;
use super::layout::WorkLayout;
use super::messages;
use super::types::{
    DownloadedSheet, MergeRequest, MergedFiles, PipelineOutcome, PreparedPlan, ReportArchive,
    Stage, StagedFiles,
};

/// Drives one ticket from attachment to published reports.
///
/// Stages run strictly in sequence. The first error stops the run and is
/// reported on the ticket; there is no retry and no rollback.
pub struct MergePipeline<T: TicketClient, R: CommandRunner> {
    tickets: Arc<T>,
    tools: ExternalTools<R>,
    plan: PlanConfig,
    storage: StorageConfig,
}

impl<T: TicketClient, R: CommandRunner> MergePipeline<T, R> {
    pub fn new(
        tickets: Arc<T>,
        tools: ExternalTools<R>,
        plan: PlanConfig,
        storage: StorageConfig,
    ) -> Self {
        Self {
            tickets,
            tools,
            plan,
            storage,
        }
    }

    /// Builds a pipeline from the loaded configuration.
    pub fn from_config(tickets: Arc<T>, runner: Arc<R>, config: &Config) -> Self {
        Self::new(
            tickets,
            ExternalTools::new(runner, config.tools.clone(), config.assembly.clone()),
            config.plan.clone(),
            config.storage.clone(),
        )
    }

    pub fn tools(&self) -> &ExternalTools<R> {
        &self.tools
    }

    /// Runs the merge for one ticket.
    ///
    /// Never fails: every error ends up as a ticket note and a
    /// [`PipelineOutcome`] other than `Completed`.
    pub async fn run(&self, request: &MergeRequest) -> PipelineOutcome {
        let start = Instant::now();
        let ticket_id = request.ticket_id;
        info!(
            ticket_id,
            work_dir = %request.work_dir.display(),
            client = self.tickets.name(),
            runner = self.tools.runner().name(),
            "Starting merge"
        );
        if let Some(description) = &request.description {
            debug!(ticket_id, description = %description, "Ticket description");
        }

        let mut stage = Stage::Start;
        match self.run_stages(request, &mut stage).await {
            Ok(archive) => {
                let duration_ms = start.elapsed().as_millis() as u64;
                info!(ticket_id, duration_ms, archive = %archive.display_name, "Merge complete");
                PipelineOutcome::Completed {
                    ticket_id,
                    archive,
                    duration_ms,
                }
            }
            Err(e) => self.report_failure(ticket_id, stage, e).await,
        }
    }

    async fn run_stages(
        &self,
        request: &MergeRequest,
        stage: &mut Stage,
    ) -> Result<ReportArchive, PipelineError> {
        let layout = WorkLayout::new(&request.work_dir, request.ticket_id, &self.storage);
        let ticket_id = request.ticket_id;

        self.notify(ticket_id, messages::STARTED).await;

        self.enter(stage, Stage::FetchAttachment, ticket_id);
        let sheet = self.fetch_sheet(&layout).await?;
        self.notify(ticket_id, messages::DOWNLOADED).await;
        debug!(
            ticket_id,
            attachment_id = sheet.attachment.id,
            filename = %sheet.attachment.filename,
            path = %sheet.path.display(),
            "Attachment saved"
        );

        self.enter(stage, Stage::BuildPlan, ticket_id);
        let prepared = self.build_plan(&layout).await?;
        info!(
            ticket_id,
            rows = prepared.rows,
            identifiers = prepared.identifiers.len(),
            "Merge plan written"
        );

        self.enter(stage, Stage::LinkFiles, ticket_id);
        self.tools
            .link_files(&prepared.list_path, layout.work_dir())
            .await?;

        self.enter(stage, Stage::MergeFiles, ticket_id);
        self.tools
            .merge_files(&prepared.plan_path, self.plan.delimiter, layout.work_dir())
            .await?;

        self.enter(stage, Stage::CollectMerged, ticket_id);
        let merged = self.collect(&layout).await?;

        self.enter(stage, Stage::Backup, ticket_id);
        let backups = staging::backup_files(
            &merged.files,
            &self.storage.backup_dir,
            self.storage.verify_backups,
        )
        .await?;

        self.enter(stage, Stage::StageFiles, ticket_id);
        let staged = self.stage(&layout, &merged, backups).await?;
        self.notify(ticket_id, messages::ASSEMBLY_STARTED).await;

        self.enter(stage, Stage::Assemble, ticket_id);
        self.tools.assemble(&staged.staged_dir).await?;

        self.enter(stage, Stage::StoreResults, ticket_id);
        staging::move_dir(&staged.staged_dir, &layout.results_dir()).await?;

        self.enter(stage, Stage::Archive, ticket_id);
        let files = staging::archive_dir(&layout.reports_dir(), &layout.archive_path()).await?;
        let archive = ReportArchive {
            path: layout.archive_path(),
            display_name: layout.upload_name(),
            files,
        };

        self.enter(stage, Stage::Publish, ticket_id);
        self.publish(ticket_id, &archive).await?;

        Ok(archive)
    }

    fn enter(&self, current: &mut Stage, next: Stage, ticket_id: TicketId) {
        *current = next;
        info!(ticket_id, stage = %next, "Entering stage");
    }

    /// Downloads the newest attachment to `merge.xlsx`.
    async fn fetch_sheet(&self, layout: &WorkLayout) -> Result<DownloadedSheet, PipelineError> {
        let fetched = self
            .tickets
            .fetch_attachment(layout.ticket_id())
            .await
            .map_err(PipelineError::from_fetch)?;

        tokio::fs::create_dir_all(layout.work_dir()).await?;
        let path = layout.attachment_path();
        tokio::fs::write(&path, &fetched.bytes).await?;

        Ok(DownloadedSheet {
            attachment: fetched.attachment,
            path,
        })
    }

    /// Normalizes the attachment into `Merge.xlsx` and `list.txt`.
    async fn build_plan(&self, layout: &WorkLayout) -> Result<PreparedPlan, PipelineError> {
        let config = self.plan.clone();
        let attachment_path = layout.attachment_path();
        let plan_path = layout.plan_path();
        let list_path = layout.list_path();

        let prepared = tokio::task::spawn_blocking(move || -> Result<PreparedPlan, PipelineError> {
            let sheet = plan::read_sheet(&attachment_path)?;
            let merge_plan = plan::normalize(&sheet, &config)?;
            plan::write_plan(&plan_path, &merge_plan)?;

            let identifiers = plan::flatten_identifiers(&merge_plan);
            plan::write_identifier_list(&list_path, &identifiers)?;

            Ok(PreparedPlan {
                plan_path,
                list_path,
                rows: merge_plan.len(),
                identifiers,
            })
        })
        .await??;

        if prepared.identifiers.is_empty() {
            warn!(
                ticket_id = layout.ticket_id(),
                "Merge plan lists no identifiers"
            );
        }
        Ok(prepared)
    }

    async fn collect(&self, layout: &WorkLayout) -> Result<MergedFiles, PipelineError> {
        let dir = layout.merged_dir();
        let files = staging::collect_merged(
            layout.work_dir(),
            &dir,
            &self.storage.merged_source_pattern,
            &self.storage.merged_file_glob,
        )
        .await
        .map_err(PipelineError::from_collect)?;

        Ok(MergedFiles { dir, files })
    }

    /// Copies the merged folder into the staging area.
    async fn stage(
        &self,
        layout: &WorkLayout,
        merged: &MergedFiles,
        backups: Vec<std::path::PathBuf>,
    ) -> Result<StagedFiles, PipelineError> {
        tokio::fs::create_dir_all(&self.storage.staging_dir).await?;
        let staged_dir = layout.staged_dir();
        let copied = staging::copy_dir(&merged.dir, &staged_dir).await?;
        info!(
            ticket_id = layout.ticket_id(),
            files = copied,
            dir = %staged_dir.display(),
            "Merged files staged"
        );

        Ok(StagedFiles {
            backups,
            staged_dir,
        })
    }

    /// Uploads the archive and resolves the ticket.
    async fn publish(&self, ticket_id: TicketId, archive: &ReportArchive) -> Result<(), PipelineError> {
        self.tickets
            .upload_artifact(
                ticket_id,
                &archive.path,
                &archive.display_name,
                TicketStatus::Resolved,
                messages::COMPLETED,
            )
            .await?;
        Ok(())
    }

    /// Posts a progress note. Failures are logged and otherwise ignored.
    async fn notify(&self, ticket_id: TicketId, text: &str) {
        if let Err(e) = self.tickets.post_note(ticket_id, text, None).await {
            warn!(ticket_id, error = %e, note = text, "Failed to post progress note");
        }
    }

    /// Reports an error on the ticket and turns it into an outcome.
    async fn report_failure(
        &self,
        ticket_id: TicketId,
        stage: Stage,
        e: PipelineError,
    ) -> PipelineOutcome {
        let note = e.ticket_note();
        let status = e.ticket_status();

        if e.is_halt() {
            warn!(ticket_id, stage = %stage, reason = %e, "Merge halted");
        } else {
            error!(ticket_id, stage = %stage, error = %e, "Merge failed");
        }

        if let Err(post_err) = self.tickets.post_note(ticket_id, &note, status).await {
            error!(
                ticket_id,
                error = %post_err,
                "Failed to report merge error on ticket"
            );
        }

        if e.is_halt() {
            PipelineOutcome::Halted {
                ticket_id,
                stage,
                reason: e.to_string(),
            }
        } else {
            PipelineOutcome::Failed {
                ticket_id,
                stage,
                error: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCommandRunner, MockTicketClient};
    use crate::tools::{AssemblyConfig, ToolsConfig};
    use tempfile::TempDir;

    fn pipeline(
        tickets: MockTicketClient,
        runner: MockCommandRunner,
        root: &std::path::Path,
    ) -> MergePipeline<MockTicketClient, MockCommandRunner> {
        MergePipeline::new(
            Arc::new(tickets),
            ExternalTools::new(
                Arc::new(runner),
                ToolsConfig::default(),
                AssemblyConfig {
                    user: Some("1000".to_string()),
                    ..Default::default()
                },
            ),
            PlanConfig::default(),
            StorageConfig::rooted_at(root),
        )
    }

    #[tokio::test]
    async fn test_unknown_ticket_fails_at_fetch() {
        let dir = TempDir::new().unwrap();
        let tickets = MockTicketClient::new();
        let runner = MockCommandRunner::new();
        let p = pipeline(tickets, runner.clone(), dir.path());

        let outcome = p.run(&MergeRequest::new(77, dir.path().join("work"))).await;

        match outcome {
            PipelineOutcome::Failed { stage, ref error, .. } => {
                assert_eq!(stage, Stage::FetchAttachment);
                assert!(error.contains("77"));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(runner.command_count().await, 0);
    }

    #[tokio::test]
    async fn test_note_failures_do_not_mask_outcome() {
        let dir = TempDir::new().unwrap();
        let tickets = MockTicketClient::new();
        tickets.add_empty_ticket(8, "Merge").await;
        tickets.set_fail_updates(true).await;
        let p = pipeline(tickets.clone(), MockCommandRunner::new(), dir.path());

        let outcome = p.run(&MergeRequest::new(8, dir.path().join("work"))).await;

        assert!(matches!(
            outcome,
            PipelineOutcome::Halted {
                stage: Stage::FetchAttachment,
                ..
            }
        ));
        assert!(tickets.recorded_updates().await.is_empty());
    }
}
