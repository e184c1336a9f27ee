//! Configuration for the staging module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where merged reads and assembly results are kept.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Every merged FASTQ file is copied here before assembly.
    #[serde(default = "default_backup_dir")]
    pub backup_dir: PathBuf,

    /// Shared area the assembly container reads from.
    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    /// Final home of assembled folders.
    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    /// Compare SHA-256 of every backup copy with its source.
    #[serde(default = "default_true")]
    pub verify_backups: bool,

    /// Pattern, relative to the work directory, matching the merger's output.
    #[serde(default = "default_merged_source_pattern")]
    pub merged_source_pattern: String,

    /// Pattern, relative to the merged directory, matching merged reads.
    #[serde(default = "default_merged_file_glob")]
    pub merged_file_glob: String,
}

fn default_backup_dir() -> PathBuf {
    PathBuf::from("/mnt/nas/merge_Backup")
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from("/hdfs")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("/mnt/nas/merge_WGSspades")
}

fn default_true() -> bool {
    true
}

fn default_merged_source_pattern() -> String {
    "*MER*/*.fastq.gz".to_string()
}

fn default_merged_file_glob() -> String {
    "*fastq.gz".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backup_dir: default_backup_dir(),
            staging_dir: default_staging_dir(),
            results_dir: default_results_dir(),
            verify_backups: true,
            merged_source_pattern: default_merged_source_pattern(),
            merged_file_glob: default_merged_file_glob(),
        }
    }
}

impl StorageConfig {
    /// Points all three storage areas below `root`.
    pub fn rooted_at(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        Self {
            backup_dir: root.join("backup"),
            staging_dir: root.join("staging"),
            results_dir: root.join("results"),
            ..Default::default()
        }
    }
}
