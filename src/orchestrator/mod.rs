//! Pipeline orchestrator: diff, summarize, format, publish.
//!
//! One linear run per invocation. Reported stages:
//! `start → diff_fetched → summarized → formatted → target_resolved → published`.
//! The target is resolved before the diff is fetched so an unsupported
//! event fails without spending an LLM call, but it is reported in the
//! position above.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::config::ConfigError;
use crate::context::{ContextError, ExecutionContext};
use crate::diff::{DiffError, DiffSource};
use crate::models::{CommentTarget, PublishOutcome, SummaryResult};
use crate::output::OutputRenderer;
use crate::output::markdown::MarkdownRenderer;
use crate::providers::{ProviderError, Summarizer};
use crate::publish::{CommentPublisher, PublishError};

/// Terminal pipeline failures. None are retried here.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("diff unavailable: {0}")]
    DiffUnavailable(#[from] DiffError),

    #[error("summarization failed: {0}")]
    SummarizationFailed(#[from] ProviderError),

    #[error("missing pull request number: {0}")]
    MissingPrNumber(String),

    #[error("unsupported event: {0}")]
    UnsupportedEvent(String),

    #[error("publishing failed: {message}")]
    PublishFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    /// Short name of the stage that failed, for the final status line.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::DiffUnavailable(_) => "diff",
            PipelineError::SummarizationFailed(_) => "summarize",
            PipelineError::MissingPrNumber(_) | PipelineError::UnsupportedEvent(_) => "target",
            PipelineError::PublishFailed { .. } => "publish",
            PipelineError::Config(_) => "config",
        }
    }
}

impl From<ContextError> for PipelineError {
    fn from(err: ContextError) -> Self {
        match err {
            ContextError::MissingPrNumber(_) => PipelineError::MissingPrNumber(err.to_string()),
            ContextError::UnsupportedEvent(event) => PipelineError::UnsupportedEvent(event),
            other => PipelineError::Config(other.to_string()),
        }
    }
}

impl From<PublishError> for PipelineError {
    fn from(err: PublishError) -> Self {
        PipelineError::PublishFailed {
            status: err.status(),
            message: err.to_string(),
        }
    }
}

impl From<ConfigError> for PipelineError {
    fn from(err: ConfigError) -> Self {
        PipelineError::Config(err.to_string())
    }
}

/// Pipeline stages, in reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    DiffFetched,
    Summarized,
    Formatted,
    TargetResolved,
    Published,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Start => "start",
            Stage::DiffFetched => "diff_fetched",
            Stage::Summarized => "summarized",
            Stage::Formatted => "formatted",
            Stage::TargetResolved => "target_resolved",
            Stage::Published => "published",
        };
        f.write_str(name)
    }
}

/// A summary and its rendered comment body.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub summary: SummaryResult,
    pub body: String,
}

/// Result of a dry run: nothing is posted.
#[derive(Debug, Clone)]
pub struct DryRun {
    pub prepared: Prepared,
    /// Where the comment would have gone, if the context allowed resolving it.
    pub target: Option<CommentTarget>,
}

/// Sequences diff retrieval, summarization, rendering, and publishing.
pub struct Pipeline {
    diff_source: Arc<dyn DiffSource>,
    summarizer: Arc<dyn Summarizer>,
    renderer: MarkdownRenderer,
    base_ref: String,
    head_ref: String,
}

impl Pipeline {
    pub fn new(
        diff_source: Arc<dyn DiffSource>,
        summarizer: Arc<dyn Summarizer>,
        renderer: MarkdownRenderer,
        base_ref: impl Into<String>,
        head_ref: impl Into<String>,
    ) -> Self {
        Self {
            diff_source,
            summarizer,
            renderer,
            base_ref: base_ref.into(),
            head_ref: head_ref.into(),
        }
    }

    /// Run the full pipeline and post the comment.
    pub async fn run(
        &self,
        context: &ExecutionContext,
        publisher: &dyn CommentPublisher,
    ) -> Result<PublishOutcome, PipelineError> {
        let target = context.resolve_target()?;
        tracing::debug!(%target, event = %context.event, "comment target");

        let prepared = self.prepare().await?;
        tracing::info!(stage = %Stage::TargetResolved, %target, "target resolved");

        let outcome = publisher.publish(&target, &prepared.body).await?;
        tracing::info!(
            stage = %Stage::Published,
            comment_id = outcome.comment_id,
            replaced = outcome.replaced,
            "comment published"
        );
        Ok(outcome)
    }

    /// Diff, summarize, and format without publishing.
    pub async fn dry_run(&self, context: &ExecutionContext) -> Result<DryRun, PipelineError> {
        let prepared = self.prepare().await?;
        let target = match context.resolve_target() {
            Ok(target) => {
                tracing::info!(stage = %Stage::TargetResolved, %target, "target resolved (dry run)");
                Some(target)
            }
            Err(e) => {
                tracing::debug!(error = %e, "no comment target (dry run)");
                None
            }
        };
        Ok(DryRun { prepared, target })
    }

    /// The first three stages: fetch, summarize, render.
    pub async fn prepare(&self) -> Result<Prepared, PipelineError> {
        tracing::info!(
            stage = %Stage::Start,
            base = %self.base_ref,
            head = %self.head_ref,
            "starting summary"
        );

        let diff = self.diff_source.fetch(&self.base_ref, &self.head_ref).await?;
        tracing::info!(stage = %Stage::DiffFetched, bytes = diff.len(), "diff fetched");

        let summary = self.summarizer.summarize(&diff).await?;
        tracing::info!(stage = %Stage::Summarized, items = summary.item_count(), "diff summarized");

        let body = self.renderer.render(&summary);
        tracing::info!(stage = %Stage::Formatted, chars = body.len(), "comment formatted");

        Ok(Prepared { summary, body })
    }
}
