//! URL and query-string construction for the Crowdin project API
//!
//! Every endpoint lives under `{endpoint}/project/{project}/{action}` and
//! carries `key` and `json` query parameters, plus `branch` when configured.

use crate::error::{Error, Result};
use url::Url;

/// Query parameter carrying the API key
pub(crate) const KEY_PARAM: &str = "key";

/// Project API actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action<'a> {
    /// Project status and file listing
    Info,
    /// Upload a file the project does not have yet
    AddFile,
    /// Replace a file the project already has
    UpdateFile,
    /// Build the translation archives
    Export,
    /// Fetch the archive for one language, or "all"
    Download {
        /// Language code, or "all"
        target_language: &'a str,
    },
}

impl Action<'_> {
    /// Path segments below `/project/{project}/`
    fn segments(&self) -> Vec<String> {
        match self {
            Action::Info => vec!["info".into()],
            Action::AddFile => vec!["add-file".into()],
            Action::UpdateFile => vec!["update-file".into()],
            Action::Export => vec!["export".into()],
            Action::Download { target_language } => {
                vec!["download".into(), format!("{}.zip", target_language)]
            }
        }
    }
}

/// Build the full request URL for an action
pub(crate) fn action_url(
    endpoint_url: &str,
    project: &str,
    action: Action<'_>,
    api_key: &str,
    branch: Option<&str>,
) -> Result<Url> {
    let mut url = Url::parse(endpoint_url).map_err(|e| {
        Error::config(
            "endpoint-url",
            format!("invalid endpoint URL '{}': {}", endpoint_url, e),
        )
    })?;

    {
        let mut segments = url.path_segments_mut().map_err(|_| {
            Error::config(
                "endpoint-url",
                format!("endpoint URL '{}' cannot carry a path", endpoint_url),
            )
        })?;
        segments.pop_if_empty().push("project").push(project);
        for segment in action.segments() {
            segments.push(&segment);
        }
    }

    {
        let mut query = url.query_pairs_mut();
        query.append_pair(KEY_PARAM, api_key);
        query.append_pair("json", "json");
        if let Some(branch) = branch {
            query.append_pair("branch", branch);
        }
    }

    Ok(url)
}

/// Render a URL for logs and errors with the API key hidden
pub(crate) fn redacted(url: &Url) -> String {
    let mut shown = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let value = if k == KEY_PARAM {
                "***".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), value)
        })
        .collect();

    if !pairs.is_empty() {
        shown.query_pairs_mut().clear().extend_pairs(pairs);
    }
    shown.to_string()
}
