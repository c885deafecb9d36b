//! Upload orchestration
//!
//! Resolve the remote filename, look it up in the project listing, then
//! create or update it. Each step awaits the previous one; the first error
//! ends the run.

use crate::branch::{BranchResolver, resolve_filename};
use crate::client::{CrowdinClient, ProjectStatus, UploadMode, UploadRequest, UploadResponse};
use crate::config::UploadTarget;
use crate::error::Result;
use tracing::info;

/// Result of a finished upload
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    /// Remote filename with placeholders substituted
    pub remote_filename: String,
    /// Endpoint variant that was used
    pub mode: UploadMode,
    /// What the service reported
    pub response: UploadResponse,
}

/// Pick `add-file` or `update-file` for a resolved remote filename
///
/// Only an exact name match in the listing counts.
pub fn classify(status: &ProjectStatus, remote_filename: &str) -> UploadMode {
    match status.find_file(remote_filename) {
        Some(_) => UploadMode::Update,
        None => UploadMode::Create,
    }
}

/// Upload the configured source file
pub async fn run_upload(
    client: &CrowdinClient,
    resolver: &dyn BranchResolver,
    target: &UploadTarget,
) -> Result<UploadOutcome> {
    let template = client.config().filename_template()?;
    let remote_filename = resolve_filename(template, resolver).await?;

    let status = client.query_status().await?;
    let mode = classify(&status, &remote_filename);
    info!(remote = %remote_filename, ?mode, "uploading source file");

    let request = UploadRequest {
        remote_filename,
        local_path: target.src_file.clone(),
    };
    let response = client.upload(&request, mode).await?;

    info!(remote = %request.remote_filename, stats = ?response.stats, "upload finished");
    Ok(UploadOutcome {
        remote_filename: request.remote_filename,
        mode,
        response,
    })
}
