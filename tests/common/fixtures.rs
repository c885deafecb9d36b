//! Stub service and on-disk fixtures

use crowdin_request::config::{DownloadTarget, ServiceConfig, TaskConfig, UploadTarget};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use wiremock::MockServer;

/// Project identifier used by every stub
pub const PROJECT: &str = "myapp";

/// API key used by every stub
pub const API_KEY: &str = "integration-key";

/// Remote filename template carrying the branch placeholder
pub const FILENAME_TEMPLATE: &str = "myapp-#GIT_BRANCH#.pot";

/// Path of an action below the stub server root
pub fn action_path(action: &str) -> String {
    format!("/api/project/{}/{}", PROJECT, action)
}

/// Service options pointing at the stub server
pub fn service_config(server: &MockServer) -> ServiceConfig {
    ServiceConfig {
        endpoint_url: format!("{}/api", server.uri()),
        api_key: API_KEY.to_string(),
        project_identifier: PROJECT.to_string(),
        filename: Some(FILENAME_TEMPLATE.to_string()),
        ..Default::default()
    }
}

/// Write a gettext template at `dir/out/messages.pot` and return the upload settings
pub fn source_file(dir: &Path) -> UploadTarget {
    let src_file = dir.join("out").join("messages.pot");
    std::fs::create_dir_all(dir.join("out")).unwrap();
    std::fs::write(
        &src_file,
        "msgid \"\"\nmsgstr \"\"\n\nmsgid \"Hello\"\nmsgstr \"\"\n",
    )
    .unwrap();
    UploadTarget { src_file }
}

/// Full task block for both jobs
pub fn task_config(server: &MockServer, dir: &Path) -> TaskConfig {
    TaskConfig {
        options: service_config(server),
        upload: Some(source_file(dir)),
        download: Some(DownloadTarget {
            output_dir: dir.join("locales"),
            target_language: "all".to_string(),
            rename_file_to: Some("locale-#LOCALE#.po".to_string()),
        }),
        deadline: Some(Duration::from_secs(30)),
    }
}

/// Build a ZIP archive in memory from (name, content) pairs
pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options =
        zip::write::FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (name, content) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Sorted file names directly inside `dir`
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
