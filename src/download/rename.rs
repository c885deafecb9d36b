//! Rename pass over extracted translations
//!
//! Crowdin names exported files `<upload base>-<locale>.<ext>` inside one
//! directory per locale. The pass renames the files that came from our upload
//! to the project's naming template and deletes every other file of the same
//! shape. Files already in template form are left alone, so a second run over
//! its own output changes nothing.

use crate::error::{Error, FilesystemError, Result};
use crate::placeholder::{LOCALE_PLACEHOLDER, resolve_locale, template_extension};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Extension used when the rename template has none
const DEFAULT_EXTENSION: &str = "po";

/// Language tag as Crowdin exports them: `fr`, `pt-BR`, `es-419`, `zh-Hans-CN`
const LOCALE_CODE: &str = r"^[A-Za-z]{2,3}(?:[-_][A-Za-z0-9]{2,8}){0,2}$";

/// What the pass does with one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileAction {
    /// Not a `<code>-<locale>.<ext>` file
    Ignore,
    /// Already named after the template
    Keep,
    /// Rename to this file name
    Rename(String),
    /// Stale file from another upload
    Delete,
}

/// Counts reported by one run of the pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenameSummary {
    /// Files renamed to the template
    pub renamed: usize,
    /// Files deleted
    pub deleted: usize,
    /// Files already in template form
    pub kept: usize,
}

/// Compiled matchers for one upload base name and rename template
#[derive(Debug, Clone)]
pub struct RenamePlan {
    template: String,
    shape: Regex,
    target_form: Regex,
    upload_form: Regex,
    locale_code: Regex,
}

impl RenamePlan {
    /// Build the plan for files exported from `upload_base` (e.g. "myapp-main")
    pub fn new(upload_base: &str, template: &str) -> Result<Self> {
        if !template.contains(LOCALE_PLACEHOLDER) {
            return Err(Error::config(
                "rename-file-to",
                format!("template '{}' has no {} placeholder", template, LOCALE_PLACEHOLDER),
            ));
        }

        let ext = regex::escape(template_extension(template).unwrap_or(DEFAULT_EXTENSION));

        let target_pattern = template
            .split(LOCALE_PLACEHOLDER)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join("(.+)");

        Ok(Self {
            template: template.to_string(),
            shape: compile(&format!(r"\w+-.+\.{}$", ext))?,
            target_form: compile(&format!("^{}$", target_pattern))?,
            upload_form: compile(&format!(r"^{}-(.+)\.{}$", regex::escape(upload_base), ext))?,
            locale_code: compile(LOCALE_CODE)?,
        })
    }

    /// Decide what happens to a file called `file_name`
    ///
    /// A file counts as already renamed only when the template matches it
    /// with something shaped like a locale code in place of `#LOCALE#`.
    /// When both readings fit, the one explaining more of the name literally
    /// wins, so `locale-x-fr.po` stays put under `locale-x-#LOCALE#.po`
    /// even with upload base `locale`.
    pub fn decide(&self, file_name: &str) -> FileAction {
        if !self.shape.is_match(file_name) {
            return FileAction::Ignore;
        }

        let uploaded = capture(&self.upload_form, file_name);
        let renamed = capture(&self.target_form, file_name)
            .filter(|locale| self.locale_code.is_match(locale));

        match (uploaded, renamed) {
            (Some(upload_locale), Some(locale)) if locale.len() <= upload_locale.len() => {
                FileAction::Keep
            }
            (Some(locale), _) => {
                let new_name = resolve_locale(&self.template, locale);
                if new_name == file_name {
                    FileAction::Keep
                } else {
                    FileAction::Rename(new_name)
                }
            }
            (None, Some(_)) => FileAction::Keep,
            (None, None) => FileAction::Delete,
        }
    }
}

fn capture<'a>(re: &Regex, file_name: &'a str) -> Option<&'a str> {
    re.captures(file_name)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| {
        Error::config(
            "rename-file-to",
            format!("cannot build matcher '{}': {}", pattern, e),
        )
    })
}

/// Apply the plan to every subdirectory of `output_dir`
///
/// Files directly inside `output_dir` are not touched.
pub async fn rename_translations(output_dir: &Path, plan: &RenamePlan) -> Result<RenameSummary> {
    let mut summary = RenameSummary::default();

    for dir in list(output_dir, EntryKind::Dir).await? {
        for file in list(&dir, EntryKind::File).await? {
            let Some(name) = file.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            match plan.decide(name) {
                FileAction::Ignore => {}
                FileAction::Keep => summary.kept += 1,
                FileAction::Rename(new_name) => {
                    let to = dir.join(&new_name);
                    debug!(from = %name, to = %new_name, "renaming");
                    tokio::fs::rename(&file, &to).await.map_err(|e| {
                        Error::Filesystem(FilesystemError::Rename {
                            from: file.clone(),
                            to: to.clone(),
                            source: e,
                        })
                    })?;
                    summary.renamed += 1;
                }
                FileAction::Delete => {
                    debug!(file = %name, "deleting");
                    tokio::fs::remove_file(&file).await.map_err(|e| {
                        Error::Filesystem(FilesystemError::Remove {
                            path: file.clone(),
                            source: e,
                        })
                    })?;
                    summary.deleted += 1;
                }
            }
        }
    }

    info!(
        ?output_dir,
        renamed = summary.renamed,
        deleted = summary.deleted,
        kept = summary.kept,
        "rename pass finished"
    );
    Ok(summary)
}

#[derive(Clone, Copy)]
enum EntryKind {
    Dir,
    File,
}

/// Sorted entries of one kind; symlinks are not followed
async fn list(dir: &Path, kind: EntryKind) -> Result<Vec<PathBuf>> {
    let list_err = |e: std::io::Error| {
        Error::Filesystem(FilesystemError::ListDir {
            path: dir.to_path_buf(),
            source: e,
        })
    };

    let mut entries = tokio::fs::read_dir(dir).await.map_err(list_err)?;
    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(list_err)? {
        let file_type = entry.file_type().await.map_err(list_err)?;
        let wanted = match kind {
            EntryKind::Dir => file_type.is_dir(),
            EntryKind::File => file_type.is_file(),
        };
        if wanted {
            paths.push(entry.path());
        }
    }
    paths.sort();
    Ok(paths)
}
