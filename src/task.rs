//! Task entry point
//!
//! Dispatches on the job label and decides how severe a failure is: an
//! upload failure is reported and the host may carry on, a download failure
//! or an unknown label halts it.

use crate::branch::BranchResolver;
use crate::client::CrowdinClient;
use crate::config::TaskConfig;
use crate::download::{DownloadOutcome, run_download};
use crate::error::{Error, Result, TransportError};
use crate::upload::{UploadOutcome, run_upload};
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit code for a successful run
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code for a failure that halts the host
pub const EXIT_FATAL: u8 = 1;
/// Exit code for a reported failure the host may continue past
pub const EXIT_FAILED: u8 = 3;

/// Invocation target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Job {
    /// Upload the source strings file
    Upload,
    /// Export and download translations
    Download,
}

impl FromStr for Job {
    type Err = Error;

    fn from_str(label: &str) -> Result<Self> {
        match label {
            "upload" => Ok(Job::Upload),
            "download" => Ok(Job::Download),
            other => Err(Error::UnknownJob(other.to_string())),
        }
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Job::Upload => f.write_str("upload"),
            Job::Download => f.write_str("download"),
        }
    }
}

/// What a successful job produced
#[derive(Debug, Clone)]
pub enum JobReport {
    /// Result of the upload job
    Upload(UploadOutcome),
    /// Result of the download job
    Download(DownloadOutcome),
}

/// Final status handed back to the host
#[derive(Debug)]
pub enum TaskOutcome {
    /// Every step completed
    Succeeded(JobReport),
    /// The job failed; the host may continue
    Failed(Error),
    /// The job failed and the host must stop
    Fatal(Error),
}

impl TaskOutcome {
    /// Process exit code for this outcome
    pub fn exit_code(&self) -> u8 {
        match self {
            TaskOutcome::Succeeded(_) => EXIT_SUCCESS,
            TaskOutcome::Failed(_) => EXIT_FAILED,
            TaskOutcome::Fatal(_) => EXIT_FATAL,
        }
    }

    /// True if every step completed
    pub fn is_success(&self) -> bool {
        matches!(self, TaskOutcome::Succeeded(_))
    }

    /// The error behind a failed outcome
    pub fn error(&self) -> Option<&Error> {
        match self {
            TaskOutcome::Succeeded(_) => None,
            TaskOutcome::Failed(e) | TaskOutcome::Fatal(e) => Some(e),
        }
    }
}

/// Run the job named by `label`
///
/// The whole job is bounded by `config.deadline` and aborted as soon as
/// `cancel` fires; the in-flight request is dropped in both cases.
pub async fn run_task(
    label: &str,
    config: &TaskConfig,
    resolver: &dyn BranchResolver,
    cancel: &CancellationToken,
) -> TaskOutcome {
    let job = match label.parse::<Job>() {
        Ok(job) => job,
        Err(e) => {
            error!(job = label, error = %e, "unknown job, nothing was done");
            return TaskOutcome::Fatal(e);
        }
    };

    info!(%job, "starting job");
    let result = guarded(run_job(job, config, resolver), config.deadline, cancel).await;

    match (job, result) {
        (_, Ok(report)) => {
            info!(%job, "job finished");
            TaskOutcome::Succeeded(report)
        }
        (Job::Upload, Err(e)) => {
            warn!(%job, error = %e, error_code = e.error_code(), "job failed");
            TaskOutcome::Failed(e)
        }
        (Job::Download, Err(e)) => {
            error!(%job, error = %e, error_code = e.error_code(), "job failed");
            TaskOutcome::Fatal(e)
        }
    }
}

async fn run_job(
    job: Job,
    config: &TaskConfig,
    resolver: &dyn BranchResolver,
) -> Result<JobReport> {
    match job {
        Job::Upload => {
            let target = config.upload_target()?;
            let client = CrowdinClient::new(config.options.clone())?;
            run_upload(&client, resolver, target)
                .await
                .map(JobReport::Upload)
        }
        Job::Download => {
            let target = config.download_target()?;
            let client = CrowdinClient::new(config.options.clone())?;
            run_download(&client, resolver, target)
                .await
                .map(JobReport::Download)
        }
    }
}

/// Bound a future by an optional deadline and a cancellation token
///
/// A zero deadline counts as no deadline.
async fn guarded<T, F>(fut: F, deadline: Option<Duration>, cancel: &CancellationToken) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    let bounded = async move {
        match deadline.filter(|d| !d.is_zero()) {
            Some(after) => match tokio::time::timeout(after, fut).await {
                Ok(result) => result,
                Err(_) => Err(Error::Transport(TransportError::Timeout { after })),
            },
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        result = bounded => result,
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::branch::FixedBranch;
    use crate::config::{DownloadTarget, ServiceConfig, UploadTarget};
    use tempfile::TempDir;
    use wiremock::matchers::{any, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(server: &MockServer, dir: &TempDir) -> TaskConfig {
        let src_file = dir.path().join("messages.pot");
        std::fs::write(&src_file, "msgid \"\"\n").unwrap();
        TaskConfig {
            options: ServiceConfig {
                endpoint_url: format!("{}/api", server.uri()),
                api_key: "k".into(),
                project_identifier: "myapp".into(),
                filename: Some("messages.pot".into()),
                ..Default::default()
            },
            upload: Some(UploadTarget { src_file }),
            download: Some(DownloadTarget::new(dir.path().join("locales"))),
            deadline: Some(Duration::from_secs(30)),
        }
    }

    #[test]
    fn job_labels() {
        assert_eq!("upload".parse::<Job>().unwrap(), Job::Upload);
        assert_eq!("download".parse::<Job>().unwrap(), Job::Download);
        assert!(matches!("Upload".parse::<Job>(), Err(Error::UnknownJob(l)) if l == "Upload"));
        assert_eq!(Job::Download.to_string(), "download");
    }

    #[tokio::test]
    async fn unknown_job_is_fatal_and_does_nothing() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let outcome = run_task(
            "deploy",
            &config(&server, &dir),
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome.exit_code(), EXIT_FATAL);
        assert!(matches!(outcome.error(), Some(Error::UnknownJob(l)) if l == "deploy"));
    }

    #[tokio::test]
    async fn upload_failure_is_soft() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/project/myapp/info"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let outcome = run_task(
            "upload",
            &config(&server, &dir),
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Failed(_)));
        assert_eq!(outcome.exit_code(), EXIT_FAILED);
    }

    #[tokio::test]
    async fn download_failure_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/project/myapp/export"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let outcome = run_task(
            "download",
            &config(&server, &dir),
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Fatal(Error::Transport(_))));
        assert_eq!(outcome.exit_code(), EXIT_FATAL);
    }

    #[tokio::test]
    async fn successful_upload_reports_the_outcome() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/project/myapp/info"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"files":[]}"#))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/project/myapp/add-file"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"success":true}"#))
            .expect(1)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let outcome = run_task(
            "upload",
            &config(&server, &dir),
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        assert_eq!(outcome.exit_code(), EXIT_SUCCESS);
        match outcome {
            TaskOutcome::Succeeded(JobReport::Upload(report)) => {
                assert_eq!(report.remote_filename, "messages.pot")
            }
            other => panic!("expected upload report, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn missing_api_key_fails_before_any_request() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = config(&server, &dir);
        config.options.api_key.clear();
        let outcome = run_task(
            "upload",
            &config,
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(outcome, TaskOutcome::Failed(Error::Config { .. })));
    }

    #[tokio::test]
    async fn deadline_aborts_a_hung_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/project/myapp/export"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let mut config = config(&server, &dir);
        config.deadline = Some(Duration::from_millis(200));
        let outcome = run_task(
            "download",
            &config,
            &FixedBranch("main".into()),
            &CancellationToken::new(),
        )
        .await;

        match outcome {
            TaskOutcome::Fatal(Error::Transport(TransportError::Timeout { after })) => {
                assert_eq!(after, Duration::from_millis(200))
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn cancellation_aborts_the_job() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/project/myapp/info"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
            .mount(&server)
            .await;

        let dir = TempDir::new().unwrap();
        let config = config(&server, &dir);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let outcome = run_task("upload", &config, &FixedBranch("main".into()), &cancel).await;

        assert!(matches!(outcome, TaskOutcome::Failed(Error::Cancelled)));
    }

    #[tokio::test]
    async fn zero_deadline_does_not_time_out() {
        let value = guarded(
            async { Ok::<_, Error>(7) },
            Some(Duration::ZERO),
            &CancellationToken::new(),
        )
        .await
        .unwrap();
        assert_eq!(value, 7);
    }
}
