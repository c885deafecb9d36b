//! Filename template helpers
//!
//! Remote filenames may embed `#GIT_BRANCH#`, rename templates embed `#LOCALE#`.
//! Substitution is literal and replaces every occurrence.

use std::path::Path;

/// Token replaced with the current git branch in the remote filename
pub const BRANCH_PLACEHOLDER: &str = "#GIT_BRANCH#";

/// Token replaced with the locale code in the rename template
pub const LOCALE_PLACEHOLDER: &str = "#LOCALE#";

/// Whether resolving this template needs the current branch
pub fn needs_branch(template: &str) -> bool {
    template.contains(BRANCH_PLACEHOLDER)
}

/// Substitute the branch name into a filename template
///
/// A template without the placeholder is returned unchanged.
///
/// ```
/// use crowdin_request::placeholder::resolve_branch;
///
/// assert_eq!(resolve_branch("myapp-#GIT_BRANCH#.pot", "main"), "myapp-main.pot");
/// assert_eq!(resolve_branch("myapp.pot", "main"), "myapp.pot");
/// ```
pub fn resolve_branch(template: &str, branch: &str) -> String {
    template.replace(BRANCH_PLACEHOLDER, branch)
}

/// Substitute a locale code into a rename template
pub fn resolve_locale(template: &str, locale: &str) -> String {
    template.replace(LOCALE_PLACEHOLDER, locale)
}

/// Upload base name: the resolved remote filename without its extension
///
/// Crowdin names exported files `<base>-<locale>.po`, so `myapp-main.pot`
/// becomes `myapp-main`.
pub fn upload_base_name(remote_filename: &str) -> &str {
    // branch names may contain '/', so only a dot in the last segment counts
    match remote_filename.rfind('.') {
        Some(i) if i > 0 && !remote_filename[i..].contains('/') => &remote_filename[..i],
        _ => remote_filename,
    }
}

/// Extension of a rename template, without the dot
pub fn template_extension(template: &str) -> Option<&str> {
    Path::new(template)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && !e.contains(LOCALE_PLACEHOLDER))
}
