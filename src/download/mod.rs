//! Download orchestration
//!
//! Export, download, extract, then optionally rename. The archive is spooled
//! to a temporary file and extracted only once the whole body has arrived.

mod rename;

pub use rename::{FileAction, RenamePlan, RenameSummary, rename_translations};

use crate::branch::{BranchResolver, resolve_filename};
use crate::client::CrowdinClient;
use crate::config::DownloadTarget;
use crate::error::{Error, FilesystemError, Result};
use crate::extraction::extract_archive;
use crate::placeholder::upload_base_name;
use std::path::PathBuf;
use tracing::{debug, info};

/// Result of a finished download
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Directory the archive was extracted into
    pub output_dir: PathBuf,
    /// Build status reported by the export step, if any
    pub export_status: Option<String>,
    /// Files written by the extractor
    pub extracted_files: Vec<PathBuf>,
    /// Counts from the rename pass, when one was configured
    pub rename: Option<RenameSummary>,
}

/// Export, download and unpack translations into the target directory
pub async fn run_download(
    client: &CrowdinClient,
    resolver: &dyn BranchResolver,
    target: &DownloadTarget,
) -> Result<DownloadOutcome> {
    // resolved before any request so a missing filename is reported first
    let plan_template = match &target.rename_file_to {
        Some(template) => Some((template, client.config().filename_template()?)),
        None => None,
    };

    let export = client.trigger_export().await?;
    let export_status = export.status().map(str::to_string);
    info!(status = ?export_status, "export finished");

    tokio::fs::create_dir_all(&target.output_dir)
        .await
        .map_err(|e| {
            Error::Filesystem(FilesystemError::CreateDir {
                path: target.output_dir.clone(),
                source: e,
            })
        })?;

    let spool = tempfile::Builder::new()
        .prefix("crowdin-")
        .suffix(".zip")
        .tempfile()?;
    let mut file = tokio::fs::File::from_std(spool.reopen()?);

    let archive = client.download_archive(&target.target_language).await?;
    let bytes = archive.write_to(&mut file).await?;
    drop(file);
    debug!(path = ?spool.path(), bytes, "archive spooled");

    let extracted_files = extract_archive(spool.path(), &target.output_dir).await?;

    let rename = match plan_template {
        Some((template, filename)) => {
            let remote_filename = resolve_filename(filename, resolver).await?;
            let plan = RenamePlan::new(upload_base_name(&remote_filename), template)?;
            Some(rename_translations(&target.output_dir, &plan).await?)
        }
        None => None,
    };

    info!(
        output_dir = ?target.output_dir,
        files = extracted_files.len(),
        "download finished"
    );
    Ok(DownloadOutcome {
        output_dir: target.output_dir.clone(),
        export_status,
        extracted_files,
        rename,
    })
}
