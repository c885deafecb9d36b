//! # crowdin-request
//!
//! Keeps a project's localization files in sync with Crowdin.
//!
//! Two jobs are provided:
//! - **upload** - resolves the remote filename (optionally tagged with the
//!   current git branch), checks whether Crowdin already knows it, then
//!   creates or updates it
//! - **download** - triggers an export, downloads the translation archive,
//!   extracts it and optionally renames the extracted files to the project's
//!   naming convention
//!
//! ## Quick Start
//!
//! ```no_run
//! use crowdin_request::{FixedBranch, ServiceConfig, TaskConfig, UploadTarget, run_task};
//! use tokio::task::JoinHandle;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = TaskConfig {
//!         options: ServiceConfig {
//!             api_key: "0123456789abcdef".to_string(),
//!             project_identifier: "myapp".to_string(),
//!             filename: Some("myapp-#GIT_BRANCH#.pot".to_string()),
//!             ..Default::default()
//!         },
//!         upload: Some(UploadTarget {
//!             src_file: "./out/messages.pot".into(),
//!         }),
//!         ..Default::default()
//!     };
//!
//!     let outcome = run_task(
//!         "upload",
//!         &config,
//!         &FixedBranch("main".to_string()),
//!         &CancellationToken::new(),
//!     )
//!     .await;
//!     std::process::exit(outcome.exit_code().into());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Source-control branch lookup
pub mod branch;
/// Crowdin API client
pub mod client;
/// Configuration types
pub mod config;
/// Download orchestration and the rename pass
pub mod download;
/// Error types
pub mod error;
/// Translation archive extraction
pub mod extraction;
/// Filename template helpers
pub mod placeholder;
/// Job dispatch, deadline and cancellation
pub mod task;
/// Upload orchestration
pub mod upload;

// Re-export commonly used types
pub use branch::{BranchResolver, FixedBranch, GitBranchResolver};
pub use client::{CrowdinClient, ProjectStatus, UploadMode, UploadRequest};
pub use config::{DownloadTarget, ServiceConfig, TaskConfig, UploadTarget};
pub use download::{DownloadOutcome, RenameSummary, run_download};
pub use error::{Error, FilesystemError, Result, TransportError};
pub use task::{Job, JobReport, TaskOutcome, run_task};
pub use upload::{UploadOutcome, run_upload};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Cancel `token` when the process receives SIGINT or SIGTERM (Ctrl+C elsewhere)
///
/// The listener stops once the token is cancelled by anyone else.
pub fn cancel_on_shutdown_signal(token: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            received = wait_for_signal() => match received {
                Ok(()) => {
                    tracing::info!("shutdown signal received, cancelling");
                    token.cancel();
                }
                // a run without a listener can still finish or hit its deadline
                Err(e) => tracing::warn!(error = %e, "could not listen for shutdown signals"),
            },
            _ = token.cancelled() => {}
        }
    })
}

#[cfg(unix)]
async fn wait_for_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = signal(SignalKind::terminate())?;
    tokio::select! {
        _ = sigterm.recv() => Ok(()),
        received = tokio::signal::ctrl_c() => received,
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn listener_only_cancels_on_a_signal() {
        let token = CancellationToken::new();
        let listener = cancel_on_shutdown_signal(token.clone());

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!token.is_cancelled());

        token.cancel();
        tokio::time::timeout(Duration::from_secs(5), listener)
            .await
            .expect("listener stops with the run")
            .expect("listener task does not panic");
    }
}
