//! Git CLI wrapper for producing diffs.
//!
//! Shells out to `git` via `tokio::process::Command`. Read-only: the
//! repository is never modified.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DiffError, DiffSource, non_empty};
use crate::models::DiffText;

/// Diff source that runs `git diff <base>...<head>` in a working tree.
#[derive(Debug, Clone)]
pub struct GitDiffSource {
    repo_root: PathBuf,
}

impl GitDiffSource {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
        }
    }
}

#[async_trait]
impl DiffSource for GitDiffSource {
    async fn fetch(&self, base_ref: &str, head_ref: &str) -> Result<DiffText, DiffError> {
        let range = diff_range(base_ref, head_ref);
        tracing::debug!(%range, repo = %self.repo_root.display(), "running git diff");
        let output = git_diff(&self.repo_root, &range).await?;
        non_empty(output, &range)
    }
}

/// Build the three-dot range: changes on `head` since it diverged from `base`.
pub fn diff_range(base_ref: &str, head_ref: &str) -> String {
    format!("{base_ref}...{head_ref}")
}

/// Run `git diff <range>` and return the unified diff output.
pub async fn git_diff(repo_root: &Path, range: &str) -> Result<String, DiffError> {
    let output = tokio::process::Command::new("git")
        .args([
            "diff",
            "--no-color",
            "--no-ext-diff",
            "--src-prefix=a/",
            "--dst-prefix=b/",
            "--end-of-options",
            range,
        ])
        .current_dir(repo_root)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "git diff {range} failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| DiffError::GitError(format!("git output is not valid UTF-8: {e}")))
}

/// Find the root of the git repository containing `start_dir`.
pub async fn find_repo_root(start_dir: &Path) -> Result<PathBuf, DiffError> {
    let output = tokio::process::Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(start_dir)
        .output()
        .await
        .map_err(|e| DiffError::GitError(format!("failed to run git: {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(DiffError::GitError(format!(
            "not a git repository: {}",
            stderr.trim()
        )));
    }

    Ok(PathBuf::from(
        String::from_utf8_lossy(&output.stdout).trim().to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn git(dir: &Path, args: &[&str]) {
        let status = tokio::process::Command::new("git")
            .args(args)
            .current_dir(dir)
            .output()
            .await
            .unwrap()
            .status;
        assert!(status.success(), "git {args:?} failed");
    }

    /// Repo with `main` at one commit and `feature` one commit ahead.
    async fn repo_with_feature_branch() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path();
        git(p, &["init", "-b", "main"]).await;
        git(p, &["config", "user.email", "test@test.com"]).await;
        git(p, &["config", "user.name", "Test"]).await;
        git(p, &["config", "commit.gpgsign", "false"]).await;
        tokio::fs::write(p.join("README.md"), "hello\n").await.unwrap();
        git(p, &["add", "."]).await;
        git(p, &["commit", "-m", "init"]).await;
        git(p, &["checkout", "-b", "feature"]).await;
        tokio::fs::create_dir_all(p.join(".github/workflows")).await.unwrap();
        tokio::fs::write(
            p.join(".github/workflows/deploy.yml"),
            "name: Deploy\non:\n  push:\n    branches: [main]\n",
        )
        .await
        .unwrap();
        git(p, &["add", "."]).await;
        git(p, &["commit", "-m", "add deploy workflow"]).await;
        dir
    }

    #[test]
    fn range_uses_three_dots() {
        assert_eq!(diff_range("origin/main", "HEAD"), "origin/main...HEAD");
    }

    #[tokio::test]
    async fn fetch_returns_branch_changes() {
        let repo = repo_with_feature_branch().await;
        let diff = GitDiffSource::new(repo.path())
            .fetch("main", "HEAD")
            .await
            .unwrap();
        assert!(diff.as_str().contains("b/.github/workflows/deploy.yml"));
        assert!(diff.as_str().contains("+name: Deploy"));
    }

    #[tokio::test]
    async fn fetch_with_no_changes_is_empty_error() {
        let repo = repo_with_feature_branch().await;
        let err = GitDiffSource::new(repo.path())
            .fetch("HEAD", "HEAD")
            .await
            .unwrap_err();
        assert!(matches!(err, DiffError::Empty(_)), "got: {err}");
    }

    #[tokio::test]
    async fn fetch_unknown_ref_fails() {
        let repo = repo_with_feature_branch().await;
        let err = GitDiffSource::new(repo.path())
            .fetch("origin/does-not-exist", "HEAD")
            .await
            .unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("git diff origin/does-not-exist...HEAD failed"), "got: {msg}");
    }

    #[tokio::test]
    async fn option_like_ref_is_treated_as_revision() {
        let repo = repo_with_feature_branch().await;
        let out = repo.path().join("leaked.txt");
        let base = format!("--output={}", out.display());

        let err = GitDiffSource::new(repo.path())
            .fetch(&base, "feature")
            .await
            .unwrap_err();

        assert!(matches!(err, DiffError::GitError(_)), "got: {err}");
        let leaked = std::fs::read_dir(repo.path())
            .unwrap()
            .filter_map(Result::ok)
            .any(|e| e.file_name().to_string_lossy().starts_with("leaked"));
        assert!(!leaked, "git wrote an output file");
    }

    #[tokio::test]
    async fn fetch_in_non_git_dir() {
        let dir = tempfile::tempdir().unwrap();
        let result = GitDiffSource::new(dir.path()).fetch("main", "HEAD").await;
        assert!(matches!(result, Err(DiffError::GitError(_))));
    }

    #[tokio::test]
    async fn find_repo_root_non_git() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_repo_root(dir.path()).await.unwrap_err();
        assert!(err.to_string().contains("not a git repository"), "got: {err}");
    }

    #[tokio::test]
    async fn find_repo_root_real() {
        let repo = repo_with_feature_branch().await;
        let root = find_repo_root(repo.path()).await.unwrap();
        assert!(root.join(".git").exists());
    }
}
