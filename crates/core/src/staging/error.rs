//! Error types for the staging module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while moving merged reads and results around.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The merger produced no FASTQ files.
    #[error("No merged FASTQ files found in {dir}")]
    NoMergedFiles { dir: PathBuf },

    /// The assembly left no reports folder behind.
    #[error("Reports directory not found: {path}")]
    ReportsMissing { path: PathBuf },

    /// A glob pattern could not be parsed.
    #[error("Invalid file pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },

    /// Destination already exists.
    #[error("Destination already exists: {path}")]
    DestinationExists { path: PathBuf },

    /// Failed to copy a file.
    #[error("Failed to copy file from {source} to {destination}")]
    CopyFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// Failed to move a file or directory.
    #[error("Failed to move {source} to {destination}")]
    MoveFailed {
        source: PathBuf,
        destination: PathBuf,
        #[source]
        error: std::io::Error,
    },

    /// A backup copy differs from its source.
    #[error("Checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    /// Failed to write the reports archive.
    #[error("Failed to write archive {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    /// Failed to traverse a directory tree.
    #[error("Failed to walk {path}: {reason}")]
    Walk { path: PathBuf, reason: String },

    /// A blocking filesystem task panicked or was cancelled.
    #[error("Filesystem task failed: {0}")]
    Task(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StagingError {
    /// Creates a copy failed error.
    pub fn copy_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::CopyFailed {
            source,
            destination,
            error,
        }
    }

    /// Creates a move failed error.
    pub fn move_failed(source: PathBuf, destination: PathBuf, error: std::io::Error) -> Self {
        Self::MoveFailed {
            source,
            destination,
            error,
        }
    }
}

impl From<tokio::task::JoinError> for StagingError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}
