//! GitHub REST API publisher.
//!
//! Uses the issue-comment endpoints for pull requests and the
//! commit-comment endpoint for pushes:
//!
//! | Step | Request |
//! |---|---|
//! | list | `GET /repos/{repo}/issues/{n}/comments?per_page=100&page={p}` |
//! | delete | `DELETE /repos/{repo}/issues/comments/{id}` |
//! | create (PR) | `POST /repos/{repo}/issues/{n}/comments` |
//! | create (commit) | `POST /repos/{repo}/commits/{sha}/comments` |

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;

use super::{CommentPublisher, PublishError};
use crate::constants;
use crate::models::{CommentTarget, ExistingComment, PublishOutcome};

/// Page size used when listing comments (GitHub's maximum).
const PER_PAGE: usize = 100;

/// Upper bound on listed pages, in case a server ignores `page`.
const MAX_PAGES: u32 = 30;

/// Bounded timeout for every forge request.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Publishes summary comments through the GitHub REST API.
pub struct GithubPublisher {
    client: reqwest::Client,
    api_url: String,
    repository: String,
    token: String,
    marker: String,
}

impl fmt::Debug for GithubPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GithubPublisher")
            .field("api_url", &self.api_url)
            .field("repository", &self.repository)
            .field("token", &"[REDACTED]")
            .field("marker", &self.marker)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CreatedComment {
    id: u64,
    #[serde(default)]
    html_url: Option<String>,
}

impl GithubPublisher {
    /// Create a publisher for `repository` (`owner/name`).
    ///
    /// `api_url` is the REST root, e.g. `https://api.github.com` or a
    /// GitHub Enterprise `https://host/api/v3`.
    pub fn new(
        api_url: &str,
        repository: &str,
        token: &str,
        marker: &str,
    ) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(format!("{}/{}", constants::APP_NAME, constants::VERSION))
            .build()
            .map_err(PublishError::transport)?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            repository: repository.to_string(),
            token: token.to_string(),
            marker: marker.to_string(),
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/repos/{}/{}", self.api_url, self.repository, path);
        tracing::debug!(%method, %url, "forge request");
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header("Accept", constants::GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", constants::GITHUB_API_VERSION)
    }

    /// List every comment on a pull request carrying the marker.
    async fn find_marked_comments(&self, number: u64) -> Result<Vec<ExistingComment>, PublishError> {
        let mut marked = Vec::new();
        let mut page = 1u32;

        loop {
            let response = self
                .request(Method::GET, &format!("issues/{number}/comments"))
                .query(&[("per_page", PER_PAGE.to_string()), ("page", page.to_string())])
                .send()
                .await
                .map_err(PublishError::transport)?;

            let status = response.status();
            if !status.is_success() {
                return Err(failure(status, "listing comments", response).await);
            }

            let comments: Vec<ExistingComment> =
                response.json().await.map_err(|e| PublishError::Failed {
                    status: Some(status.as_u16()),
                    message: format!("invalid comment list: {e}"),
                })?;

            let count = comments.len();
            marked.extend(comments.into_iter().filter(|c| c.has_marker(&self.marker)));

            if count < PER_PAGE {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!(
                    pr = number,
                    pages = MAX_PAGES,
                    "comment listing did not end, stopped paging"
                );
                break;
            }
            page += 1;
        }

        Ok(marked)
    }

    /// Delete one comment. Returns `false` (after logging) on failure.
    async fn delete_comment(&self, id: u64) -> bool {
        let result = self
            .request(Method::DELETE, &format!("issues/comments/{id}"))
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::NO_CONTENT => {
                tracing::info!(comment_id = id, "deleted previous summary comment");
                true
            }
            Ok(response) => {
                tracing::warn!(
                    comment_id = id,
                    status = response.status().as_u16(),
                    "could not delete previous summary comment"
                );
                false
            }
            Err(e) => {
                tracing::warn!(comment_id = id, error = %e, "could not delete previous summary comment");
                false
            }
        }
    }

    async fn create_comment(
        &self,
        target: &CommentTarget,
        body: &str,
    ) -> Result<CreatedComment, PublishError> {
        let path = match target {
            CommentTarget::PullRequest { number } => format!("issues/{number}/comments"),
            CommentTarget::Commit { sha } => format!("commits/{sha}/comments"),
        };

        let response = self
            .request(Method::POST, &path)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(PublishError::transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(status, "comment creation", response).await);
        }

        response.json().await.map_err(|e| PublishError::Failed {
            status: Some(status.as_u16()),
            message: format!("invalid comment creation response: {e}"),
        })
    }
}

async fn failure(status: StatusCode, what: &str, response: reqwest::Response) -> PublishError {
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<no body>".to_string());
    PublishError::Failed {
        status: Some(status.as_u16()),
        message: format!("{what} failed with HTTP {status}: {body}"),
    }
}

#[async_trait]
impl CommentPublisher for GithubPublisher {
    async fn publish(
        &self,
        target: &CommentTarget,
        body: &str,
    ) -> Result<PublishOutcome, PublishError> {
        let mut replaced = 0;

        if let CommentTarget::PullRequest { number } = target {
            let previous = self.find_marked_comments(*number).await?;
            for comment in &previous {
                if self.delete_comment(comment.id).await {
                    replaced += 1;
                }
            }
        }

        let created = self.create_comment(target, body).await?;
        tracing::info!(comment_id = created.id, %target, "posted summary comment");

        Ok(PublishOutcome {
            comment_id: created.id,
            html_url: created.html_url,
            replaced,
        })
    }
}
