//! Translation archive extraction
//!
//! Crowdin exports are ZIP files laid out as `<locale>/<file>`. Entries are
//! written below the output directory; entries whose path would escape it are
//! skipped.

use crate::error::{Error, FilesystemError, Result};
use std::path::{Path, PathBuf};
use tokio::task::spawn_blocking;
use tracing::{debug, info, warn};

/// Extract a ZIP archive into `dest_path` without blocking the runtime
///
/// # Returns
/// * `Ok(Vec<PathBuf>)` - Every regular file written
/// * `Err(Error)` - Unreadable archive, corrupt entry or unwritable destination
pub async fn extract_archive(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    let archive_owned = archive_path.to_path_buf();
    let dest_owned = dest_path.to_path_buf();

    spawn_blocking(move || extract_zip(&archive_owned, &dest_owned))
        .await
        .map_err(|e| {
            Error::Filesystem(FilesystemError::Extraction {
                archive: archive_path.to_path_buf(),
                reason: format!("extraction task panicked: {}", e),
            })
        })?
}

/// Extract a ZIP archive into `dest_path`
pub fn extract_zip(archive_path: &Path, dest_path: &Path) -> Result<Vec<PathBuf>> {
    debug!(?archive_path, ?dest_path, "extracting translation archive");

    std::fs::create_dir_all(dest_path).map_err(|e| {
        Error::Filesystem(FilesystemError::CreateDir {
            path: dest_path.to_path_buf(),
            source: e,
        })
    })?;

    let file = std::fs::File::open(archive_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to open archive '{}': {}", archive_path.display(), e),
        ))
    })?;

    let mut archive = zip::ZipArchive::new(file)
        .map_err(|e| extraction_failed(archive_path, format!("failed to read ZIP archive: {}", e)))?;

    let mut extracted_files = Vec::new();

    for i in 0..archive.len() {
        let entry = archive
            .by_index(i)
            .map_err(|e| extraction_failed(archive_path, format!("failed to read ZIP entry: {}", e)))?;

        if let Some(file_path) = extract_entry(entry, dest_path, archive_path)? {
            extracted_files.push(file_path);
        }
    }

    info!(
        ?archive_path,
        extracted_count = extracted_files.len(),
        "archive extracted"
    );

    Ok(extracted_files)
}

/// Write a single entry to disk, creating directories as needed
fn extract_entry(
    mut entry: zip::read::ZipFile,
    dest_path: &Path,
    archive_path: &Path,
) -> Result<Option<PathBuf>> {
    let file_path = match entry.enclosed_name() {
        Some(path) => dest_path.join(path),
        None => {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            return Ok(None);
        }
    };

    if entry.is_dir() {
        create_dir(&file_path)?;
        return Ok(None);
    }

    if let Some(parent) = file_path.parent() {
        create_dir(parent)?;
    }

    let mut outfile = std::fs::File::create(&file_path).map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create '{}': {}", file_path.display(), e),
        ))
    })?;

    // a bad CRC or truncated stream shows up here as an I/O error
    std::io::copy(&mut entry, &mut outfile).map_err(|e| {
        extraction_failed(
            archive_path,
            format!("failed to extract '{}': {}", file_path.display(), e),
        )
    })?;

    Ok(Some(file_path))
}

fn create_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path).map_err(|e| {
        Error::Filesystem(FilesystemError::CreateDir {
            path: path.to_path_buf(),
            source: e,
        })
    })
}

fn extraction_failed(archive_path: &Path, reason: String) -> Error {
    Error::Filesystem(FilesystemError::Extraction {
        archive: archive_path.to_path_buf(),
        reason,
    })
}
