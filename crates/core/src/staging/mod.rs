//! Staging module for shuffling merged reads and assembly results between
//! storage areas.
//!
//! The merger leaves its output scattered below the work directory. These
//! functions gather it, back it up, stage it where the assembly container
//! can see it, file the assembled folder away and archive its reports.
//!
//! # Features
//!
//! - Renames when source and destination share a filesystem
//! - Copy fallback across filesystems
//! - SHA-256 verified backups
//! - Deflate zip archives with relative entry names

mod archive;
mod config;
mod error;
mod files;

pub use archive::archive_dir;
pub use config::StorageConfig;
pub use error::StagingError;
pub use files::{backup_files, collect_merged, copy_dir, find_files, move_dir, sha256_file};
