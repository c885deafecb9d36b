//! Crowdin API client
//!
//! Wraps a single `reqwest::Client` with the project URL conventions, API key
//! authentication and response interpretation. Responses are checked in this
//! order: HTTP status, JSON body, embedded `error` object, typed payload.

mod endpoint;
mod types;


pub use endpoint::Action;
pub use types::{
    ExportResponse, ProjectStatus, RemoteFile, UploadMode, UploadRequest, UploadResponse,
};

use crate::config::ServiceConfig;
use crate::error::{Error, FilesystemError, Result, TransportError};
use endpoint::redacted;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};
use types::{embedded_error, parse_response};
use url::Url;

const USER_AGENT: &str = concat!("crowdin-request/", env!("CARGO_PKG_VERSION"));

/// Authenticated client for one Crowdin project
#[derive(Debug, Clone)]
pub struct CrowdinClient {
    http: reqwest::Client,
    config: ServiceConfig,
}

impl CrowdinClient {
    /// Create a client, validating the configuration first
    ///
    /// # Errors
    /// Returns `Error::Config` if the API key, endpoint or project identifier
    /// is missing, before any network call is made.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self { http, config })
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Full URL for an action, with key, format and branch query parameters
    pub fn action_url(&self, action: Action<'_>) -> Result<Url> {
        endpoint::action_url(
            &self.config.endpoint_url,
            &self.config.project_identifier,
            action,
            &self.config.api_key,
            self.config.effective_branch(),
        )
    }

    /// Fetch the project status, including the remote file listing
    pub async fn query_status(&self) -> Result<ProjectStatus> {
        let url = self.action_url(Action::Info)?;
        let status: ProjectStatus = self
            .send_json(Method::GET, url, None, "project info response")
            .await?;

        debug!(files = status.files.len(), "got project info");
        Ok(status)
    }

    /// Ask the service to rebuild the translation archives
    pub async fn trigger_export(&self) -> Result<ExportResponse> {
        let url = self.action_url(Action::Export)?;
        self.send_json(Method::GET, url, None, "export response")
            .await
    }

    /// Upload a local file under its remote name
    ///
    /// `UploadMode::Create` posts to `add-file`, `UploadMode::Update` to
    /// `update-file`. The file travels as multipart field `files[<remote name>]`.
    pub async fn upload(&self, request: &UploadRequest, mode: UploadMode) -> Result<UploadResponse> {
        let action = match mode {
            UploadMode::Create => Action::AddFile,
            UploadMode::Update => Action::UpdateFile,
        };
        let url = self.action_url(action)?;

        let content = tokio::fs::read(&request.local_path).await.map_err(|e| {
            Error::Filesystem(FilesystemError::ReadSource {
                path: request.local_path.clone(),
                source: e,
            })
        })?;

        let file_name = request
            .local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(&request.remote_filename)
            .to_string();

        let part = Part::bytes(content).file_name(file_name);
        // field names go out verbatim, remote names may contain '/'
        let form = Form::new()
            .percent_encode_noop()
            .part(format!("files[{}]", request.remote_filename), part);

        self.send_json(Method::POST, url, Some(form), "upload response")
            .await
    }

    /// Open the translation archive for a language ("all" for every language)
    ///
    /// The returned stream has already passed the HTTP status check; the body
    /// is read chunk by chunk by [`ArchiveStream::write_to`].
    pub async fn download_archive(&self, target_language: &str) -> Result<ArchiveStream> {
        let url = self.action_url(Action::Download { target_language })?;
        let shown = redacted(&url);
        debug!(method = "GET", url = %shown, "downloading translations");

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status.as_u16() >= 400 {
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(shown, status.as_u16(), body));
        }

        let is_json = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));
        if is_json {
            // the service answers errors with a JSON document instead of a zip
            let body = response.text().await?;
            let value: serde_json::Value = serde_json::from_str(&body)
                .map_err(|e| Error::parse("download response", e))?;
            return Err(embedded_error(&value).unwrap_or_else(|| Error::Service {
                message: format!("expected a zip archive, got: {}", body),
                code: None,
            }));
        }

        Ok(ArchiveStream { response, url: shown })
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        form: Option<Form>,
        context: &str,
    ) -> Result<T> {
        let shown = redacted(&url);
        debug!(method = %method, url = %shown, "making request");

        let mut request = self.http.request(method, url);
        if let Some(form) = form {
            request = request.multipart(form);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() >= 400 {
            return Err(status_error(shown, status.as_u16(), body));
        }

        parse_response(&body, context)
    }
}

fn status_error(url: String, status: u16, body: String) -> Error {
    warn!(url = %url, status, body = %body, "request failed");
    Error::Transport(TransportError::Status { url, status, body })
}

/// Body of a translation archive download, not yet consumed
#[derive(Debug)]
pub struct ArchiveStream {
    response: reqwest::Response,
    url: String,
}

impl ArchiveStream {
    /// Copy the body into `writer`, returning the number of bytes written
    ///
    /// A broken connection mid-body surfaces as a transport error.
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut written = 0u64;
        while let Some(chunk) = self.response.chunk().await? {
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        debug!(url = %self.url, bytes = written, "archive downloaded");
        Ok(written)
    }
}
