//! Summarizer trait and LLM integration.
//!
//! Provides an abstraction layer over rig-core to decouple the
//! pipeline from the specific LLM library.

pub mod prompt;
pub mod retry;
pub mod rig;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{DiffText, SummaryResult};

/// Errors from the summarization provider.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("LLM API error: {0}")]
    ApiError(String),

    #[error("failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("provider not configured: {0}")]
    NotConfigured(String),

    #[error("LLM request timed out after {0}s")]
    Timeout(u64),
}

/// Turns a diff into a structured summary.
///
/// Implementations either return a complete [`SummaryResult`] or fail;
/// there is no partial result.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, diff: &DiffText) -> Result<SummaryResult, ProviderError>;
}
