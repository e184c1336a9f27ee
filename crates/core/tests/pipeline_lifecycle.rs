//! End-to-end tests of a merge run against mock collaborators.
//!
//! The mock ticket client stands in for Redmine and the mock command runner
//! stands in for the linker, merger and docker, with hooks creating the files
//! those tools would leave behind.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use seqmerge_core::pipeline::{messages, MergePipeline, MergeRequest, PipelineOutcome, Stage};
use seqmerge_core::plan::{read_sheet, PlanConfig};
use seqmerge_core::staging::StorageConfig;
use seqmerge_core::testing::{fixtures, MockCommandRunner, MockTicketClient};
use seqmerge_core::ticket::TicketStatus;
use seqmerge_core::tools::{AssemblyConfig, CommandOutput, ExternalTools, ToolsConfig};

const TICKET: u64 = 42;

struct Harness {
    _dir: TempDir,
    root: PathBuf,
    tickets: MockTicketClient,
    runner: MockCommandRunner,
    pipeline: MergePipeline<MockTicketClient, MockCommandRunner>,
}

impl Harness {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let tickets = MockTicketClient::new();
        let runner = MockCommandRunner::new();

        let pipeline = MergePipeline::new(
            Arc::new(tickets.clone()),
            ExternalTools::new(
                Arc::new(runner.clone()),
                ToolsConfig::default(),
                AssemblyConfig {
                    user: Some("1000".to_string()),
                    ..Default::default()
                },
            ),
            PlanConfig::default(),
            StorageConfig::rooted_at(&root),
        );

        Self {
            _dir: dir,
            root,
            tickets,
            runner,
            pipeline,
        }
    }

    fn work_dir(&self) -> PathBuf {
        self.root.join("work")
    }

    fn request(&self) -> MergeRequest {
        MergeRequest::new(TICKET, self.work_dir())
    }

    async fn with_merge_sheet(&self, rows: &[(&str, &str)]) {
        self.tickets.add_empty_ticket(TICKET, "Merge request").await;
        self.tickets
            .add_attachment(
                TICKET,
                100,
                "merge_request.xlsx",
                fixtures::merge_workbook(rows).unwrap(),
            )
            .await;
    }

    /// The merger writes one `<name>_MER` folder per plan row.
    async fn merger_creates(&self, names: &[&str]) {
        let names: Vec<String> = names.iter().map(|n| n.to_string()).collect();
        self.runner
            .on_run("merger", move |spec| {
                let work = PathBuf::from(spec.args.last().unwrap());
                for name in &names {
                    let dir = work.join(format!("{}_MER", name));
                    std::fs::create_dir_all(&dir)?;
                    std::fs::write(dir.join(format!("{}_R1.fastq.gz", name)), name.as_bytes())?;
                    std::fs::write(dir.join(format!("{}_R2.fastq.gz", name)), name.as_bytes())?;
                }
                Ok(())
            })
            .await;
    }

    /// The assembly container writes reports into the mounted folder.
    async fn assembly_creates_reports(&self) {
        let staged = self.root.join("staging").join(format!("merged_{}", TICKET));
        self.runner
            .on_run("assembly", move |_spec| {
                let reports = staged.join("reports");
                std::fs::create_dir_all(&reports)?;
                std::fs::write(reports.join("combinedMetadata.csv"), b"SeqID,N50\nS1,120000\n")
            })
            .await;
    }
}

fn read_zip_entry(bytes: &[u8], name: &str) -> String {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
    let mut content = String::new();
    archive
        .by_name(name)
        .unwrap()
        .read_to_string(&mut content)
        .unwrap();
    content
}

fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

#[tokio::test]
async fn test_full_merge_publishes_reports() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A;B"), ("S2", "C")]).await;
    h.merger_creates(&["S1", "S2"]).await;
    h.assembly_creates_reports().await;

    let outcome = h.pipeline.run(&h.request()).await;

    match &outcome {
        PipelineOutcome::Completed { archive, .. } => {
            assert_eq!(archive.display_name, "merged_42_reports.zip");
            assert_eq!(archive.files, 1);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    assert_eq!(
        h.tickets.notes(TICKET).await,
        vec![
            messages::STARTED,
            messages::DOWNLOADED,
            messages::ASSEMBLY_STARTED,
            messages::COMPLETED,
        ]
    );
    assert_eq!(h.tickets.last_status(TICKET).await, Some(TicketStatus::Resolved));

    assert_eq!(
        h.runner.recorded_tools().await,
        vec!["file_linker", "merger", "docker", "assembly", "docker"]
    );

    let work = h.work_dir();
    assert!(work.join("merge.xlsx").is_file());
    assert_eq!(
        std::fs::read_to_string(work.join("list.txt")).unwrap(),
        "A\nB\nC\n"
    );
    assert_eq!(
        files_in(&work.join("merged_42")),
        vec!["S1_R1.fastq.gz", "S1_R2.fastq.gz", "S2_R1.fastq.gz", "S2_R2.fastq.gz"]
    );
    assert_eq!(files_in(&h.root.join("backup")).len(), 4);
    assert!(!h.root.join("staging/merged_42").exists());
    assert!(h
        .root
        .join("results/merged_42_Assembled/reports/combinedMetadata.csv")
        .is_file());

    let uploads = h.tickets.recorded_uploads().await;
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].filename, "merged_42_reports.zip");
    assert_eq!(uploads[0].path, work.join("reports.zip"));
    assert!(read_zip_entry(&uploads[0].bytes, "combinedMetadata.csv").contains("S1,120000"));
}

#[tokio::test]
async fn test_plan_files_are_canonical() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A;B")]).await;

    // Stop after the plan: the merger produces nothing.
    let outcome = h.pipeline.run(&h.request()).await;
    assert!(matches!(
        outcome,
        PipelineOutcome::Halted {
            stage: Stage::CollectMerged,
            ..
        }
    ));

    let work = h.work_dir();
    let plan = read_sheet(&work.join("Merge.xlsx")).unwrap();
    assert_eq!(plan.headers, vec!["Name", "Merge"]);
    assert_eq!(plan.rows, vec![vec!["S1".to_string(), "A;B".to_string()]]);
    assert_eq!(
        std::fs::read_to_string(work.join("list.txt")).unwrap(),
        "A\nB\n"
    );

    let commands = h.runner.recorded_commands().await;
    assert_eq!(
        commands[0].args.last().unwrap(),
        &work.to_string_lossy().to_string()
    );
    assert!(commands[1].args.contains(&work.join("Merge.xlsx").to_string_lossy().to_string()));
}

#[tokio::test]
async fn test_no_attachment_halts_without_commands() {
    let h = Harness::new();
    h.tickets.add_empty_ticket(TICKET, "Merge request").await;

    let outcome = h.pipeline.run(&h.request()).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Halted {
            stage: Stage::FetchAttachment,
            ..
        }
    ));
    assert_eq!(
        h.tickets.notes(TICKET).await,
        vec![messages::STARTED, messages::NO_ATTACHMENT]
    );
    assert_eq!(h.tickets.last_status(TICKET).await, Some(TicketStatus::Error));
    assert_eq!(h.runner.command_count().await, 0);
    assert!(!h.work_dir().join("merge.xlsx").exists());
}

#[tokio::test]
async fn test_no_merged_files_halts_before_staging() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A;B")]).await;

    let outcome = h.pipeline.run(&h.request()).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Halted {
            stage: Stage::CollectMerged,
            ..
        }
    ));
    assert_eq!(
        h.tickets.notes(TICKET).await,
        vec![
            messages::STARTED,
            messages::DOWNLOADED,
            messages::NO_MERGED_FILES
        ]
    );
    assert_eq!(h.tickets.last_status(TICKET).await, Some(TicketStatus::Error));
    assert_eq!(h.runner.recorded_tools().await, vec!["file_linker", "merger"]);
    assert!(files_in(&h.root.join("backup")).is_empty());
    assert!(!h.root.join("staging/merged_42").exists());
}

#[tokio::test]
async fn test_missing_column_posts_catch_all_note() {
    let h = Harness::new();
    h.tickets.add_empty_ticket(TICKET, "Merge request").await;
    h.tickets
        .add_attachment(
            TICKET,
            5,
            "merge.xlsx",
            fixtures::workbook(&["SEQID", "Comments"], &[vec!["S1", "x"]]).unwrap(),
        )
        .await;

    let outcome = h.pipeline.run(&h.request()).await;

    match &outcome {
        PipelineOutcome::Failed { stage, error, .. } => {
            assert_eq!(*stage, Stage::BuildPlan);
            assert!(error.contains("OtherName"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }

    let notes = h.tickets.notes(TICKET).await;
    assert_eq!(notes.len(), 3);
    assert!(notes[2].starts_with(
        "Something went wrong! Send this error traceback to your friendly neighborhood bioinformatician: "
    ));
    assert!(notes[2].contains("OtherName"));
    assert_eq!(h.tickets.last_status(TICKET).await, None);
    assert_eq!(h.runner.command_count().await, 0);
}

#[tokio::test]
async fn test_merger_failure_is_reported() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A;B")]).await;
    h.runner
        .set_output("merger", CommandOutput::failed(1, "KeyError: 'Merge'"))
        .await;

    let outcome = h.pipeline.run(&h.request()).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: Stage::MergeFiles,
            ..
        }
    ));
    let notes = h.tickets.notes(TICKET).await;
    let last = notes.last().unwrap();
    assert!(last.contains("merger failed with exit code 1"));
    assert!(last.contains("KeyError"));
}

#[tokio::test]
async fn test_assembly_failure_still_removes_container() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A")]).await;
    h.merger_creates(&["S1"]).await;
    h.runner
        .set_output("assembly", CommandOutput::failed(125, "docker: image not found"))
        .await;

    let outcome = h.pipeline.run(&h.request()).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: Stage::Assemble,
            ..
        }
    ));
    assert_eq!(
        h.runner.recorded_tools().await,
        vec!["file_linker", "merger", "docker", "assembly", "docker"]
    );
    assert!(h.tickets.recorded_uploads().await.is_empty());
    // Staged copy stays for inspection.
    assert!(h.root.join("staging/merged_42/S1_R1.fastq.gz").is_file());
}

#[tokio::test]
async fn test_missing_reports_fails_at_archive() {
    let h = Harness::new();
    h.with_merge_sheet(&[("S1", "A")]).await;
    h.merger_creates(&["S1"]).await;

    let outcome = h.pipeline.run(&h.request()).await;

    assert!(matches!(
        outcome,
        PipelineOutcome::Failed {
            stage: Stage::Archive,
            ..
        }
    ));
    assert!(h.root.join("results/merged_42_Assembled").is_dir());
    assert_eq!(h.tickets.last_status(TICKET).await, None);
}

#[tokio::test]
async fn test_latest_attachment_is_used() {
    let h = Harness::new();
    h.tickets.add_empty_ticket(TICKET, "Merge request").await;
    h.tickets
        .add_attachment(
            TICKET,
            9,
            "newer.xlsx",
            fixtures::merge_workbook(&[("S9", "X;Y")]).unwrap(),
        )
        .await;
    h.tickets
        .add_attachment(
            TICKET,
            3,
            "older.xlsx",
            fixtures::merge_workbook(&[("S3", "Z")]).unwrap(),
        )
        .await;

    h.pipeline.run(&h.request()).await;

    assert_eq!(
        std::fs::read_to_string(h.work_dir().join("list.txt")).unwrap(),
        "X\nY\n"
    );
}
