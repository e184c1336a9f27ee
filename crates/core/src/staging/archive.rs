//! Zip archives of assembly reports.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::error::StagingError;

/// Writes a deflate zip of everything below `source_dir` to `archive_path`.
///
/// Entry names are relative to `source_dir` and use `/` separators. Returns
/// the number of files archived. Fails with [`StagingError::ReportsMissing`]
/// when `source_dir` is not a directory.
pub async fn archive_dir(source_dir: &Path, archive_path: &Path) -> Result<usize, StagingError> {
    if !tokio::fs::metadata(source_dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
    {
        return Err(StagingError::ReportsMissing {
            path: source_dir.to_path_buf(),
        });
    }

    let source = source_dir.to_path_buf();
    let target = archive_path.to_path_buf();
    let count = tokio::task::spawn_blocking(move || write_archive(&source, &target)).await??;

    info!(
        archive = %archive_path.display(),
        files = count,
        "Reports archived"
    );
    Ok(count)
}

fn write_archive(source_dir: &Path, archive_path: &Path) -> Result<usize, StagingError> {
    let archive_err = |reason: String| StagingError::Archive {
        path: archive_path.to_path_buf(),
        reason,
    };

    let mut entries: Vec<(String, PathBuf, bool)> = Vec::new();
    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| StagingError::Walk {
            path: source_dir.to_path_buf(),
            reason: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source_dir)
            .map_err(|e| archive_err(e.to_string()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push((name, entry.path().to_path_buf(), entry.file_type().is_dir()));
    }

    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut files = 0;
    for (name, path, is_dir) in entries {
        if is_dir {
            zip.add_directory(name, options)
                .map_err(|e| archive_err(e.to_string()))?;
        } else {
            zip.start_file(name, options)
                .map_err(|e| archive_err(e.to_string()))?;
            let mut source = File::open(&path)?;
            std::io::copy(&mut source, &mut zip)?;
            files += 1;
        }
    }

    let mut writer = zip.finish().map_err(|e| archive_err(e.to_string()))?;
    writer.flush()?;
    Ok(files)
}
