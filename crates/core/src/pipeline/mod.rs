//! Pipeline module for running one merge request end to end.
//!
//! `MergePipeline` chains the stages: fetch the attachment, build the plan,
//! link and merge the reads, back up and stage them, assemble, file the
//! results and publish the reports. Progress is posted to the ticket as notes.
//!
//! # Example
//!
//! ```ignore
//! use seqmerge_core::pipeline::{MergePipeline, MergeRequest};
//!
//! let pipeline = MergePipeline::from_config(tickets, runner, &config);
//! let outcome = pipeline.run(&MergeRequest::new(42, "/work/42")).await;
//! if !outcome.is_completed() {
//!     std::process::exit(1);
//! }
//! ```

mod error;
mod layout;
pub mod messages;
mod runner;
mod types;

pub use error::PipelineError;
pub use layout::WorkLayout;
pub use runner::MergePipeline;
pub use types::{
    DownloadedSheet, MergeRequest, MergedFiles, PipelineOutcome, PreparedPlan, ReportArchive,
    Stage, StagedFiles,
};
