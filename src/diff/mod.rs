//! Diff retrieval: git CLI wrapper and pre-computed diff files.

pub mod file;
pub mod git;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::DiffText;

pub use file::FileDiffSource;
pub use git::GitDiffSource;

/// Errors from diff retrieval. Every variant means the diff is unavailable.
#[derive(Error, Debug)]
pub enum DiffError {
    #[error("git command failed: {0}")]
    GitError(String),

    #[error("failed to read diff file: {0}")]
    FileReadError(#[from] std::io::Error),

    #[error("path not found: {0}")]
    PathNotFound(String),

    #[error("diff for {0} is empty")]
    Empty(String),
}

/// Produces the diff that gets summarized.
#[async_trait]
pub trait DiffSource: Send + Sync {
    /// Return the diff between `base_ref` and `head_ref`.
    ///
    /// Sources that don't compare revisions (e.g. a diff file) may ignore
    /// the refs.
    async fn fetch(&self, base_ref: &str, head_ref: &str) -> Result<DiffText, DiffError>;
}

/// Reject diffs with no content.
pub(crate) fn non_empty(text: String, what: &str) -> Result<DiffText, DiffError> {
    let diff = DiffText::new(text);
    if diff.is_blank() {
        return Err(DiffError::Empty(what.to_string()));
    }
    Ok(diff)
}
