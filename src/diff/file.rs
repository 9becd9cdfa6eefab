//! Read a unified diff from a file or stdin.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{DiffError, DiffSource, non_empty};
use crate::models::DiffText;

/// Diff source backed by a pre-computed diff.
///
/// A path of `-` reads from stdin.
#[derive(Debug, Clone)]
pub struct FileDiffSource {
    path: PathBuf,
}

impl FileDiffSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_stdin(&self) -> bool {
        self.path == Path::new("-")
    }
}

#[async_trait]
impl DiffSource for FileDiffSource {
    async fn fetch(&self, _base_ref: &str, _head_ref: &str) -> Result<DiffText, DiffError> {
        let content = if self.is_stdin() {
            read_diff_stdin().await?
        } else {
            read_diff_file(&self.path).await?
        };
        non_empty(content, &self.path.display().to_string())
    }
}

/// Read a unified diff from a file path.
pub async fn read_diff_file(path: &Path) -> Result<String, DiffError> {
    if !path.exists() {
        return Err(DiffError::PathNotFound(path.display().to_string()));
    }

    tokio::fs::read_to_string(path)
        .await
        .map_err(DiffError::FileReadError)
}

/// Read a unified diff from stdin.
pub async fn read_diff_stdin() -> Result<String, DiffError> {
    use tokio::io::AsyncReadExt;
    let mut buf = String::new();
    tokio::io::stdin()
        .read_to_string(&mut buf)
        .await
        .map_err(DiffError::FileReadError)?;
    Ok(buf)
}
