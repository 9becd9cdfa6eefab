//! Comment targets and publishing results.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where the summary comment is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CommentTarget {
    /// Conversation thread of a pull request.
    PullRequest { number: u64 },
    /// A single commit (used for `push` events).
    Commit { sha: String },
}

impl fmt::Display for CommentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentTarget::PullRequest { number } => write!(f, "pull request #{number}"),
            CommentTarget::Commit { sha } => {
                let short = sha.get(..7).unwrap_or(sha.as_str());
                write!(f, "commit {short}")
            }
        }
    }
}

/// A comment already present on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ExistingComment {
    pub id: u64,
    #[serde(default)]
    pub body: Option<String>,
}

impl ExistingComment {
    /// Returns `true` if the body carries the given marker token.
    pub fn has_marker(&self, marker: &str) -> bool {
        self.body.as_deref().is_some_and(|b| b.contains(marker))
    }
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishOutcome {
    /// ID of the newly created comment.
    pub comment_id: u64,
    /// Browser URL of the new comment, when the API returned one.
    pub html_url: Option<String>,
    /// Number of earlier bot comments removed before posting.
    pub replaced: usize,
}
