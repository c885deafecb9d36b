//! Crowdin API payloads

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Project status returned by the `info` action
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectStatus {
    /// Files the project currently has on record
    pub files: Vec<RemoteFile>,
}

impl ProjectStatus {
    /// First remote entry whose name equals `name` exactly
    pub fn find_file(&self, name: &str) -> Option<&RemoteFile> {
        self.files.iter().find(|f| f.name == name)
    }
}

/// One entry of the remote file listing
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteFile {
    /// Remote filename
    pub name: String,

    /// "file" or "directory", when reported
    #[serde(default)]
    pub node_type: Option<String>,
}

/// Acknowledgement of the `export` action
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportResponse {
    #[serde(default)]
    success: Option<serde_json::Value>,
}

impl ExportResponse {
    /// Build status reported by the service ("built", "skipped", ...)
    pub fn status(&self) -> Option<&str> {
        self.success
            .as_ref()
            .and_then(|s| s.get("status"))
            .and_then(|s| s.as_str())
    }
}

/// Result of `add-file` / `update-file`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadResponse {
    /// Per-file outcome, e.g. `{"myapp-main.pot": "updated"}`
    #[serde(default)]
    pub stats: BTreeMap<String, String>,
}

/// Which remote operation an upload uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadMode {
    /// `add-file`: the project does not know the filename yet
    Create,
    /// `update-file`: the filename is already in the listing
    Update,
}

/// A resolved remote filename paired with the local file to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Remote filename with every placeholder substituted
    pub remote_filename: String,
    /// Local file to read
    pub local_path: PathBuf,
}

/// Decode a response body, honouring an embedded `error` object
///
/// An empty body decodes as `{}`.
pub(crate) fn parse_response<T: DeserializeOwned>(body: &str, context: &str) -> Result<T> {
    let value: serde_json::Value = if body.trim().is_empty() {
        serde_json::Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(body).map_err(|e| Error::parse(context, e))?
    };

    if let Some(err) = embedded_error(&value) {
        return Err(err);
    }

    serde_json::from_value(value).map_err(|e| Error::parse(context, e))
}

/// Service-level error carried in a successful HTTP response
pub(crate) fn embedded_error(value: &serde_json::Value) -> Option<Error> {
    let error = value.get("error")?;
    let (message, code) = match error {
        serde_json::Value::Null | serde_json::Value::Bool(false) => return None,
        serde_json::Value::String(s) => (s.clone(), None),
        serde_json::Value::Object(map) => {
            let message = map
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            let code = map.get("code").and_then(|c| {
                c.as_i64()
                    .or_else(|| c.as_str().and_then(|s| s.parse().ok()))
            });
            (message, code)
        }
        other => (other.to_string(), None),
    };
    Some(Error::Service { message, code })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_listing_exact_match_only() {
        let status: ProjectStatus = parse_response(
            r#"{"files":[
                {"node_type":"file","name":"myapp-main.pot"},
                {"node_type":"file","name":"myapp-main.pot.bak"}
            ]}"#,
            "project info response",
        )
        .unwrap();

        assert!(status.find_file("myapp-main.pot").is_some());
        assert!(status.find_file("myapp-main").is_none());
        assert!(status.find_file("myapp").is_none());
    }

    #[test]
    fn first_exact_match_wins() {
        let status: ProjectStatus = serde_json::from_str(
            r#"{"files":[
                {"node_type":"directory","name":"a.pot"},
                {"node_type":"file","name":"a.pot"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            status.find_file("a.pot").unwrap().node_type.as_deref(),
            Some("directory")
        );
    }

    #[test]
    fn embedded_error_wins_over_payload() {
        let err = parse_response::<ProjectStatus>(
            r#"{"success":false,"error":{"code":3,"message":"API key is not valid"}}"#,
            "project info response",
        )
        .unwrap_err();

        match err {
            Error::Service { message, code } => {
                assert_eq!(message, "API key is not valid");
                assert_eq!(code, Some(3));
            }
            other => panic!("expected service error, got {other:?}"),
        }
    }

    #[test]
    fn missing_file_listing_is_a_parse_error() {
        let err = parse_response::<ProjectStatus>(r#"{"details":{}}"#, "project info response")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn garbage_body_is_a_parse_error() {
        let err = parse_response::<ExportResponse>("<html>502</html>", "export response")
            .unwrap_err();
        match err {
            Error::Parse { context, .. } => assert_eq!(context, "export response"),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn empty_body_decodes_as_empty_object() {
        let export: ExportResponse = parse_response("", "export response").unwrap();
        assert_eq!(export.status(), None);

        let upload: UploadResponse = parse_response("  ", "upload response").unwrap();
        assert!(upload.stats.is_empty());
    }

    #[test]
    fn export_status_and_upload_stats() {
        let export: ExportResponse =
            parse_response(r#"{"success":{"status":"built"}}"#, "export response").unwrap();
        assert_eq!(export.status(), Some("built"));

        let upload: UploadResponse = parse_response(
            r#"{"success":true,"stats":{"myapp-main.pot":"updated"}}"#,
            "upload response",
        )
        .unwrap();
        assert_eq!(upload.stats["myapp-main.pot"], "updated");
    }

    #[test]
    fn string_error_and_string_code_are_understood() {
        let value = serde_json::json!({"error": "quota exceeded"});
        assert!(matches!(
            embedded_error(&value),
            Some(Error::Service { ref message, code: None }) if message == "quota exceeded"
        ));

        let value = serde_json::json!({"error": {"code": "17", "message": "Branch not found"}});
        assert!(matches!(
            embedded_error(&value),
            Some(Error::Service { code: Some(17), .. })
        ));

        assert!(embedded_error(&serde_json::json!({"error": null})).is_none());
    }
}
