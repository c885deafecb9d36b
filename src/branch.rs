//! Source-control branch lookup for `#GIT_BRANCH#` filenames

use crate::error::{Error, Result};
use crate::placeholder;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;

/// Yields the name of the branch currently checked out
///
/// Only consulted when a filename template contains the branch placeholder.
#[async_trait]
pub trait BranchResolver: Send + Sync {
    /// Current branch name
    async fn current_branch(&self) -> Result<String>;
}

/// Reads the branch from a git working tree using the `git` binary
///
/// # Examples
///
/// ```no_run
/// use crowdin_request::branch::{BranchResolver, GitBranchResolver};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = GitBranchResolver::from_path().expect("git not found in PATH");
/// println!("on branch {}", resolver.current_branch().await?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitBranchResolver {
    binary_path: PathBuf,
    work_dir: Option<PathBuf>,
}

impl GitBranchResolver {
    /// Create a resolver with an explicit git binary
    pub fn new(binary_path: PathBuf) -> Self {
        Self {
            binary_path,
            work_dir: None,
        }
    }

    /// Attempt to find git in PATH
    pub fn from_path() -> Option<Self> {
        which::which("git").ok().map(Self::new)
    }

    /// Run git inside this directory instead of the process working directory
    pub fn with_work_dir(mut self, work_dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(work_dir.into());
        self
    }
}

#[async_trait]
impl BranchResolver for GitBranchResolver {
    async fn current_branch(&self) -> Result<String> {
        let mut command = Command::new(&self.binary_path);
        // symbolic-ref also works on a fresh repository with no commits yet
        command.args(["symbolic-ref", "--short", "HEAD"]);
        if let Some(dir) = &self.work_dir {
            command.current_dir(dir);
        }

        let output = command
            .output()
            .await
            .map_err(|e| Error::BranchResolution(format!("failed to execute git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::BranchResolution(format!(
                "git exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let branch = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if branch.is_empty() {
            return Err(Error::BranchResolution("git printed no branch name".into()));
        }

        tracing::debug!(branch = %branch, "detected git branch");
        Ok(branch)
    }
}

/// Resolve a remote filename template to a concrete name
///
/// The resolver is only asked for the branch when the template contains
/// `#GIT_BRANCH#`.
pub async fn resolve_filename(template: &str, resolver: &dyn BranchResolver) -> Result<String> {
    if !placeholder::needs_branch(template) {
        return Ok(template.to_string());
    }

    let branch = resolver.current_branch().await?;
    Ok(placeholder::resolve_branch(template, &branch))
}

/// A branch name known up front
#[derive(Debug, Clone)]
pub struct FixedBranch(pub String);

#[async_trait]
impl BranchResolver for FixedBranch {
    async fn current_branch(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fixed_branch_returns_its_value() {
        let resolver = FixedBranch("main".into());
        assert_eq!(resolver.current_branch().await.unwrap(), "main");
    }

    /// Counts how often the branch was asked for
    struct CountingResolver(std::sync::atomic::AtomicUsize);

    #[async_trait]
    impl BranchResolver for CountingResolver {
        async fn current_branch(&self) -> Result<String> {
            self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Ok("main".into())
        }
    }

    #[tokio::test]
    async fn resolver_is_skipped_without_placeholder() {
        let resolver = CountingResolver(Default::default());
        let name = resolve_filename("messages.pot", &resolver).await.unwrap();
        assert_eq!(name, "messages.pot");
        assert_eq!(resolver.0.load(std::sync::atomic::Ordering::SeqCst), 0);

        let name = resolve_filename("myapp-#GIT_BRANCH#.pot", &resolver)
            .await
            .unwrap();
        assert_eq!(name, "myapp-main.pot");
        assert_eq!(resolver.0.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resolver_failure_propagates() {
        let resolver = GitBranchResolver::new(PathBuf::from("/nonexistent/git-binary-xyz"));
        let err = resolve_filename("myapp-#GIT_BRANCH#.pot", &resolver)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BranchResolution(_)));
    }

    #[tokio::test]
    async fn missing_binary_is_a_branch_resolution_error() {
        let resolver = GitBranchResolver::new(PathBuf::from("/nonexistent/git-binary-xyz"));
        match resolver.current_branch().await {
            Err(Error::BranchResolution(msg)) => assert!(msg.contains("failed to execute git")),
            other => panic!("expected BranchResolution error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn reads_branch_of_a_fresh_repository() {
        // Skip when git is not installed on the test machine
        let Some(resolver) = GitBranchResolver::from_path() else {
            return;
        };

        let repo = tempfile::tempdir().unwrap();
        let git = which::which("git").unwrap();
        let init = std::process::Command::new(&git)
            .arg("init")
            .arg("--quiet")
            .current_dir(repo.path())
            .status()
            .unwrap();
        assert!(init.success());
        let switch = std::process::Command::new(&git)
            .args(["symbolic-ref", "HEAD", "refs/heads/feature-x"])
            .current_dir(repo.path())
            .status()
            .unwrap();
        assert!(switch.success());

        let branch = resolver
            .with_work_dir(repo.path())
            .current_branch()
            .await
            .unwrap();
        assert_eq!(branch, "feature-x");
    }
}
