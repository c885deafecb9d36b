use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use crowdin_request::branch::GitBranchResolver;
use crowdin_request::config::{DownloadTarget, TaskConfig, UploadTarget};
use crowdin_request::task::{EXIT_FATAL, TaskOutcome};
use crowdin_request::{Result, cancel_on_shutdown_signal, run_task};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Upload source strings to Crowdin or download translated files
#[derive(Parser, Debug)]
#[command(name = "crowdin-request", version, about)]
struct Args {
    /// Job to run: "upload" or "download"
    job: String,

    /// JSON task config; flags override its values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Crowdin project API key
    #[arg(long, env = "CROWDIN_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Crowdin project identifier
    #[arg(short = 'p', long)]
    project_identifier: Option<String>,

    /// API base URL
    #[arg(long)]
    endpoint_url: Option<String>,

    /// Crowdin branch every request is scoped to
    #[arg(long)]
    branch: Option<String>,

    /// Remote filename, may contain #GIT_BRANCH#
    #[arg(short = 'f', long)]
    filename: Option<String>,

    /// Local file to upload
    #[arg(long)]
    src_file: Option<PathBuf>,

    /// Directory translations are extracted into
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// Language to download
    #[arg(long)]
    target_language: Option<String>,

    /// Rename extracted files to this template, must contain #LOCALE#
    #[arg(long)]
    rename_file_to: Option<String>,

    /// Overall deadline in seconds, 0 disables it
    #[arg(long)]
    deadline: Option<u64>,

    /// Per-request timeout in seconds
    #[arg(long)]
    request_timeout: Option<u64>,

    /// Connection timeout in seconds
    #[arg(long)]
    connect_timeout: Option<u64>,

    /// Working tree used to detect the git branch
    #[arg(long)]
    git_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Load the config file if given and apply flag overrides
    fn task_config(&self) -> Result<TaskConfig> {
        let mut config = match &self.config {
            Some(path) => TaskConfig::from_file(path)?,
            None => TaskConfig::default(),
        };

        let options = &mut config.options;
        if let Some(key) = &self.api_key {
            options.api_key = key.clone();
        }
        if let Some(project) = &self.project_identifier {
            options.project_identifier = project.clone();
        }
        if let Some(url) = &self.endpoint_url {
            options.endpoint_url = url.clone();
        }
        if let Some(branch) = &self.branch {
            options.branch = Some(branch.clone());
        }
        if let Some(filename) = &self.filename {
            options.filename = Some(filename.clone());
        }
        if let Some(secs) = self.request_timeout {
            options.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.connect_timeout {
            options.connect_timeout = Duration::from_secs(secs);
        }

        if let Some(src_file) = &self.src_file {
            config.upload = Some(UploadTarget {
                src_file: src_file.clone(),
            });
        }

        if self.output_dir.is_some()
            || self.target_language.is_some()
            || self.rename_file_to.is_some()
        {
            let target = config
                .download
                .get_or_insert_with(|| DownloadTarget::new(PathBuf::new()));
            if let Some(dir) = &self.output_dir {
                target.output_dir = dir.clone();
            }
            if let Some(language) = &self.target_language {
                target.target_language = language.clone();
            }
            if let Some(template) = &self.rename_file_to {
                target.rename_file_to = Some(template.clone());
            }
        }

        if let Some(secs) = self.deadline {
            config.deadline = (secs > 0).then(|| Duration::from_secs(secs));
        }

        Ok(config)
    }

    fn branch_resolver(&self) -> GitBranchResolver {
        let resolver =
            GitBranchResolver::from_path().unwrap_or_else(|| GitBranchResolver::new("git".into()));
        match &self.git_dir {
            Some(dir) => resolver.with_work_dir(dir),
            None => resolver,
        }
    }
}

fn initialize_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("crowdin_request=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    initialize_logging(args.verbose);

    let config = match args.task_config() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, error_code = e.error_code(), "cannot load configuration");
            return ExitCode::from(EXIT_FATAL);
        }
    };

    let resolver = args.branch_resolver();
    let cancel = CancellationToken::new();
    cancel_on_shutdown_signal(cancel.clone());

    let outcome = run_task(&args.job, &config, &resolver, &cancel).await;
    // stops the signal listener
    cancel.cancel();

    if let TaskOutcome::Succeeded(report) = &outcome {
        info!(?report, "done");
    }
    ExitCode::from(outcome.exit_code())
}
