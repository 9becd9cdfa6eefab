//! Comment publishing: replace any earlier summary comment, then post.

pub mod github;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{CommentTarget, PublishOutcome};

pub use github::GithubPublisher;

/// Errors from the forge comment API.
#[derive(Error, Debug)]
pub enum PublishError {
    /// The forge rejected a request or could not be reached.
    ///
    /// `status` is `None` for transport errors.
    #[error("{message}")]
    Failed {
        status: Option<u16>,
        message: String,
    },
}

impl PublishError {
    pub fn status(&self) -> Option<u16> {
        match self {
            PublishError::Failed { status, .. } => *status,
        }
    }

    fn transport(err: reqwest::Error) -> Self {
        PublishError::Failed {
            status: None,
            message: format!("request failed: {err}"),
        }
    }
}

/// Posts a rendered summary to a pull request or commit.
#[async_trait]
pub trait CommentPublisher: Send + Sync {
    /// Remove earlier summary comments on `target` (pull requests only),
    /// then create a new comment with `body`.
    async fn publish(
        &self,
        target: &CommentTarget,
        body: &str,
    ) -> Result<PublishOutcome, PublishError>;
}
