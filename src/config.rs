//! Configuration types for crowdin-request
//!
//! Keys use the same kebab-case spelling as the build tool's task options
//! (`api-key`, `project-identifier`, `src-file`, ...), so a task block can be
//! loaded from JSON unchanged.

use crate::error::{Error, Result};
use crate::placeholder::LOCALE_PLACEHOLDER;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Crowdin API base URL used when none is configured
pub const DEFAULT_ENDPOINT_URL: &str = "https://api.crowdin.com/api";

/// Target language meaning "every language in the project"
pub const DEFAULT_TARGET_LANGUAGE: &str = "all";

/// Connection settings shared by every job
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServiceConfig {
    /// Crowdin API base URL (default: "https://api.crowdin.com/api")
    #[serde(default = "default_endpoint_url")]
    pub endpoint_url: String,

    /// Project API key (required)
    #[serde(default)]
    pub api_key: String,

    /// Project identifier (required)
    #[serde(default)]
    pub project_identifier: String,

    /// Crowdin branch to scope every request to
    #[serde(default)]
    pub branch: Option<String>,

    /// Remote filename template, may contain `#GIT_BRANCH#`
    ///
    /// Required for uploads. Downloads use it to recognise the files that
    /// came from this upload during the rename pass.
    #[serde(default)]
    pub filename: Option<String>,

    /// Per-request timeout, including the response body (default: 300 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// TCP connect timeout (default: 30 seconds)
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            endpoint_url: default_endpoint_url(),
            api_key: String::new(),
            project_identifier: String::new(),
            branch: None,
            filename: None,
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl ServiceConfig {
    /// Check that every identifying field is present and well formed
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("api-key", "missing API key"));
        }
        if self.project_identifier.trim().is_empty() {
            return Err(Error::config(
                "project-identifier",
                "missing project identifier",
            ));
        }
        if self.endpoint_url.trim().is_empty() {
            return Err(Error::config("endpoint-url", "missing endpoint URL"));
        }

        let url = url::Url::parse(&self.endpoint_url).map_err(|e| {
            Error::config(
                "endpoint-url",
                format!("invalid endpoint URL '{}': {}", self.endpoint_url, e),
            )
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(
                "endpoint-url",
                format!("unsupported URL scheme '{}'", url.scheme()),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(Error::config("request-timeout", "must be greater than zero"));
        }
        if self.connect_timeout.is_zero() {
            return Err(Error::config("connect-timeout", "must be greater than zero"));
        }

        Ok(())
    }

    /// Configured branch, with an empty string treated as unset
    pub fn effective_branch(&self) -> Option<&str> {
        self.branch
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
    }

    /// Remote filename template, required by the upload job
    pub fn filename_template(&self) -> Result<&str> {
        self.filename
            .as_deref()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| Error::config("filename", "missing remote filename"))
    }
}

/// Settings for the `upload` job
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UploadTarget {
    /// Local file to upload (e.g., "./out/messages.pot")
    pub src_file: PathBuf,
}

impl UploadTarget {
    /// Check that the source path is set
    pub fn validate(&self) -> Result<()> {
        if self.src_file.as_os_str().is_empty() {
            return Err(Error::config("src-file", "missing source file"));
        }
        Ok(())
    }
}

/// Settings for the `download` job
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DownloadTarget {
    /// Directory the translation archive is extracted into
    pub output_dir: PathBuf,

    /// Language code to download (default: "all")
    #[serde(default = "default_target_language")]
    pub target_language: String,

    /// Rename template for extracted files, must contain `#LOCALE#`
    #[serde(default)]
    pub rename_file_to: Option<String>,
}

impl DownloadTarget {
    /// Create a download target for every language with no rename pass
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            target_language: default_target_language(),
            rename_file_to: None,
        }
    }

    /// Check output directory, language and rename template
    pub fn validate(&self) -> Result<()> {
        if self.output_dir.as_os_str().is_empty() {
            return Err(Error::config("output-dir", "missing output directory"));
        }
        if self.target_language.trim().is_empty() {
            return Err(Error::config("target-language", "must not be empty"));
        }
        if let Some(pattern) = &self.rename_file_to {
            if !pattern.contains(LOCALE_PLACEHOLDER) {
                return Err(Error::config(
                    "rename-file-to",
                    format!(
                        "template '{}' has no {} placeholder",
                        pattern, LOCALE_PLACEHOLDER
                    ),
                ));
            }
        }
        Ok(())
    }
}

/// A whole task block: shared options plus the per-job targets
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TaskConfig {
    /// Options shared by both jobs
    #[serde(default)]
    pub options: ServiceConfig,

    /// `upload` job settings
    #[serde(default)]
    pub upload: Option<UploadTarget>,

    /// `download` job settings
    #[serde(default)]
    pub download: Option<DownloadTarget>,

    /// Overall deadline for one run (default: 600 seconds)
    ///
    /// `null` or `0` in JSON means no deadline.
    #[serde(default = "default_deadline", with = "optional_duration_serde")]
    pub deadline: Option<Duration>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            options: ServiceConfig::default(),
            upload: None,
            download: None,
            deadline: default_deadline(),
        }
    }
}

impl TaskConfig {
    /// Load a task block from a JSON file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read config file '{}': {}", path.display(), e),
            ))
        })?;

        serde_json::from_str(&content)
            .map_err(|e| Error::parse(format!("config file '{}'", path.display()), e))
    }

    /// Validated upload settings
    pub fn upload_target(&self) -> Result<&UploadTarget> {
        self.options.validate()?;
        self.options.filename_template()?;
        let target = self
            .upload
            .as_ref()
            .ok_or_else(|| Error::config("upload", "no upload settings configured"))?;
        target.validate()?;
        Ok(target)
    }

    /// Validated download settings
    pub fn download_target(&self) -> Result<&DownloadTarget> {
        self.options.validate()?;
        let target = self
            .download
            .as_ref()
            .ok_or_else(|| Error::config("download", "no download settings configured"))?;
        target.validate()?;
        if target.rename_file_to.is_some() {
            // the rename pass needs the upload name to recognise our files
            self.options.filename_template()?;
        }
        Ok(target)
    }
}

fn default_endpoint_url() -> String {
    DEFAULT_ENDPOINT_URL.to_string()
}

fn default_target_language() -> String {
    DEFAULT_TARGET_LANGUAGE.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_deadline() -> Option<Duration> {
    Some(Duration::from_secs(600))
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.filter(|s| *s > 0).map(Duration::from_secs))
    }
}
