//! Moving merged reads between the work, backup, staging and results areas.

use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufWriter};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::error::StagingError;

const BUFFER_SIZE: usize = 1024 * 1024;

/// Expands `pattern` below `dir`, sorted.
///
/// `dir` is escaped, so only `pattern` contributes wildcards.
pub fn find_files(dir: &Path, pattern: &str) -> Result<Vec<PathBuf>, StagingError> {
    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&dir.to_string_lossy()).trim_end_matches('/'),
        pattern
    );

    let paths = glob::glob(&full).map_err(|e| StagingError::Pattern {
        pattern: full.clone(),
        reason: e.to_string(),
    })?;

    let mut files = Vec::new();
    for entry in paths {
        match entry {
            Ok(path) if path.is_file() => files.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Skipping unreadable glob match"),
        }
    }
    files.sort();
    Ok(files)
}

/// Gathers the merger's output into `merged_dir`.
///
/// Every file matching `source_pattern` below `work_dir` is moved into
/// `merged_dir`, which is created if needed. The result is whatever matches
/// `merged_glob` inside `merged_dir` afterwards; an empty result fails with
/// [`StagingError::NoMergedFiles`].
pub async fn collect_merged(
    work_dir: &Path,
    merged_dir: &Path,
    source_pattern: &str,
    merged_glob: &str,
) -> Result<Vec<PathBuf>, StagingError> {
    fs::create_dir_all(merged_dir).await?;

    for source in find_files(work_dir, source_pattern)? {
        let Some(name) = source.file_name() else {
            continue;
        };
        let destination = merged_dir.join(name);
        move_file(&source, &destination).await?;
        debug!(from = %source.display(), to = %destination.display(), "Collected merged file");
    }

    let merged = find_files(merged_dir, merged_glob)?;
    if merged.is_empty() {
        return Err(StagingError::NoMergedFiles {
            dir: merged_dir.to_path_buf(),
        });
    }

    info!(count = merged.len(), dir = %merged_dir.display(), "Collected merged files");
    Ok(merged)
}

/// Copies each file into `backup_dir`, optionally verifying the copy.
///
/// Existing backups with the same name are overwritten.
pub async fn backup_files(
    files: &[PathBuf],
    backup_dir: &Path,
    verify: bool,
) -> Result<Vec<PathBuf>, StagingError> {
    fs::create_dir_all(backup_dir).await?;

    let mut copies = Vec::with_capacity(files.len());
    for source in files {
        let Some(name) = source.file_name() else {
            continue;
        };
        let destination = backup_dir.join(name);
        let (bytes, checksum) = copy_file(source, &destination).await?;

        if verify {
            let actual = sha256_file(&destination).await?;
            if actual != checksum {
                return Err(StagingError::ChecksumMismatch {
                    path: destination,
                    expected: checksum,
                    actual,
                });
            }
        }

        debug!(file = %destination.display(), bytes, "Backed up merged file");
        copies.push(destination);
    }

    info!(count = copies.len(), dir = %backup_dir.display(), verified = verify, "Backup complete");
    Ok(copies)
}

/// Copies the directory tree `source` to `destination`, which must not
/// exist yet.
pub async fn copy_dir(source: &Path, destination: &Path) -> Result<u64, StagingError> {
    if fs::try_exists(destination).await? {
        return Err(StagingError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || copy_tree_blocking(&source, &destination)).await?
}

/// Moves the directory `source` to `destination`.
///
/// Uses a rename when both are on one filesystem, else copies the tree and
/// removes the source.
pub async fn move_dir(source: &Path, destination: &Path) -> Result<(), StagingError> {
    if fs::try_exists(destination).await? {
        return Err(StagingError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent).await?;
    }

    let renamed = try_rename(source, destination)
        .await
        .map_err(|e| StagingError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;

    if !renamed {
        debug!(
            from = %source.display(),
            to = %destination.display(),
            "Rename crosses filesystems, copying"
        );
        copy_dir(source, destination).await?;
        fs::remove_dir_all(source).await.map_err(|e| {
            StagingError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
    }

    info!(from = %source.display(), to = %destination.display(), "Moved directory");
    Ok(())
}

/// Moves a single file, falling back to copy and delete across filesystems.
async fn move_file(source: &Path, destination: &Path) -> Result<(), StagingError> {
    let renamed = try_rename(source, destination)
        .await
        .map_err(|e| StagingError::move_failed(source.to_path_buf(), destination.to_path_buf(), e))?;

    if !renamed {
        copy_file(source, destination).await?;
        fs::remove_file(source).await.map_err(|e| {
            StagingError::move_failed(source.to_path_buf(), destination.to_path_buf(), e)
        })?;
    }
    Ok(())
}

/// Renames, returning `false` when the rename would cross filesystems.
async fn try_rename(source: &Path, destination: &Path) -> Result<bool, std::io::Error> {
    match fs::rename(source, destination).await {
        Ok(()) => Ok(true),
        Err(e) => {
            // EXDEV is 18 on Linux
            if e.kind() == std::io::ErrorKind::CrossesDevices || e.raw_os_error() == Some(18) {
                Ok(false)
            } else {
                Err(e)
            }
        }
    }
}

/// Copies a file, returning its size and SHA-256.
async fn copy_file(source: &Path, destination: &Path) -> Result<(u64, String), StagingError> {
    let copy_err = |e: std::io::Error| {
        StagingError::copy_failed(source.to_path_buf(), destination.to_path_buf(), e)
    };

    let source_file = File::open(source).await.map_err(copy_err)?;
    let dest_file = File::create(destination).await.map_err(copy_err)?;

    let mut reader = BufReader::with_capacity(BUFFER_SIZE, source_file);
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, dest_file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).await.map_err(copy_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
        writer
            .write_all(&buffer[..bytes_read])
            .await
            .map_err(copy_err)?;
        total_bytes += bytes_read as u64;
    }
    writer.flush().await.map_err(copy_err)?;

    Ok((total_bytes, format!("{:x}", hasher.finalize())))
}

/// SHA-256 of a file's content, hex encoded.
pub async fn sha256_file(path: &Path) -> Result<String, StagingError> {
    let file = File::open(path).await?;
    let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; BUFFER_SIZE];

    loop {
        let bytes_read = reader.read(&mut buffer).await?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

fn copy_tree_blocking(source: &Path, destination: &Path) -> Result<u64, StagingError> {
    let mut copied = 0u64;

    for entry in WalkDir::new(source).follow_links(true) {
        let entry = entry.map_err(|e| StagingError::Walk {
            path: source.to_path_buf(),
            reason: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| StagingError::Walk {
                path: entry.path().to_path_buf(),
                reason: e.to_string(),
            })?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| {
                StagingError::copy_failed(entry.path().to_path_buf(), target.clone(), e)
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}
