//! Tools module for running the external merge and assembly programs.
//!
//! This module provides the `CommandRunner` trait, a process-backed
//! implementation, and `ExternalTools`, which knows the command lines of the
//! file linker, the merger and the dockerized assembly pipeline.
//!
//! Unlike a bare `system()` call, every run captures its exit code and
//! output, so a failing tool surfaces as a [`ToolError`] instead of being
//! inferred later from missing files.
//!
//! # Example
//!
//! ```ignore
//! use seqmerge_core::tools::{ExternalTools, ProcessRunner, ToolsConfig, AssemblyConfig};
//!
//! let tools = ExternalTools::new(
//!     Arc::new(ProcessRunner::with_defaults()),
//!     ToolsConfig::default(),
//!     AssemblyConfig::default(),
//! );
//!
//! tools.link_files(Path::new("/work/list.txt"), Path::new("/work")).await?;
//! tools.merge_files(Path::new("/work/Merge.xlsx"), ';', Path::new("/work")).await?;
//! tools.assemble(Path::new("/hdfs/merged_42")).await?;
//! ```

mod config;
mod error;
mod invoker;
mod process;
mod traits;
mod types;

pub use config::{AssemblyConfig, ToolCommand, ToolsConfig};
pub use error::ToolError;
pub use invoker::{ExternalTools, PIPELINE_FILES_MOUNT, SEQUENCES_MOUNT, SPADES_FILES_MOUNT};
pub use process::ProcessRunner;
pub use traits::CommandRunner;
pub use types::{CommandOutput, CommandSpec};
