//! Error types for crowdin-request
//!
//! Failures are grouped the way the task reports them:
//! - Configuration problems detected before any network call
//! - Transport failures (connection errors, HTTP error statuses, timeouts)
//! - Service-level errors embedded in an otherwise well-formed response
//! - Unparseable response bodies
//! - Filesystem failures while reading, extracting or renaming files
//!
//! Nothing is retried. Every error aborts the orchestration that raised it.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for crowdin-request operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for crowdin-request
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "api-key")
        key: Option<String>,
    },

    /// Network failure or non-success HTTP status
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The service answered with an embedded `error` object
    #[error("error from Crowdin: {message}")]
    Service {
        /// Message taken from `error.message`
        message: String,
        /// Numeric code from `error.code`, when the service supplied one
        code: Option<i64>,
    },

    /// Response body was not in the expected JSON shape
    #[error("unable to parse {context}: {source}")]
    Parse {
        /// What was being parsed (e.g., "project info response")
        context: String,
        /// Underlying JSON error
        #[source]
        source: serde_json::Error,
    },

    /// Filesystem error while reading, extracting or renaming files
    #[error("filesystem error: {0}")]
    Filesystem(#[from] FilesystemError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Could not determine the current source-control branch
    #[error("branch resolution failed: {0}")]
    BranchResolution(String),

    /// Invocation target is neither `upload` nor `download`
    #[error("unknown job: {0}")]
    UnknownJob(String),

    /// The run was cancelled before it finished
    #[error("cancelled")]
    Cancelled,
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// The request could not be sent or its body could not be read
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an HTTP error status
    #[error("request to {url} failed with status {status}: {body}")]
    Status {
        /// Request URL with the API key redacted
        url: String,
        /// HTTP status code (>= 400)
        status: u16,
        /// Response body, kept for the log
        body: String,
    },

    /// The run exceeded its overall deadline
    #[error("timed out after {after:?}")]
    Timeout {
        /// The deadline that was exceeded
        after: Duration,
    },
}

/// Filesystem failures
#[derive(Debug, Error)]
pub enum FilesystemError {
    /// Local source file missing or unreadable
    #[error("failed to read source file {path}: {source}")]
    ReadSource {
        /// Path of the file to upload
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Output directory could not be created
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        /// Directory that could not be created
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Directory could not be listed
    #[error("failed to list directory {path}: {source}")]
    ListDir {
        /// Directory that could not be listed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Rename of a translated file failed
    #[error("failed to rename {from} to {to}: {source}")]
    Rename {
        /// Original path
        from: PathBuf,
        /// Destination path
        to: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Deletion of a stale translated file failed
    #[error("failed to delete {path}: {source}")]
    Remove {
        /// File that could not be deleted
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Translation archive could not be extracted
    #[error("extraction failed for {archive}: {reason}")]
    Extraction {
        /// The archive that failed to extract
        archive: PathBuf,
        /// The reason extraction failed
        reason: String,
    },
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Error::Transport(TransportError::Request(error))
    }
}

impl Error {
    /// Build a configuration error for the given key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }

    /// Build a parse error with context
    pub fn parse(context: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Parse {
            context: context.into(),
            source,
        }
    }

    /// Machine-readable error code, used as a structured log field
    pub fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Transport(e) => match e {
                TransportError::Request(_) => "request_failed",
                TransportError::Status { .. } => "http_status",
                TransportError::Timeout { .. } => "timeout",
            },
            Error::Service { .. } => "service_error",
            Error::Parse { .. } => "parse_error",
            Error::Filesystem(e) => match e {
                FilesystemError::ReadSource { .. } => "read_source_failed",
                FilesystemError::CreateDir { .. } => "create_dir_failed",
                FilesystemError::ListDir { .. } => "list_dir_failed",
                FilesystemError::Rename { .. } => "rename_failed",
                FilesystemError::Remove { .. } => "remove_failed",
                FilesystemError::Extraction { .. } => "extraction_failed",
            },
            Error::Io(_) => "io_error",
            Error::BranchResolution(_) => "branch_resolution_failed",
            Error::UnknownJob(_) => "unknown_job",
            Error::Cancelled => "cancelled",
        }
    }
}
