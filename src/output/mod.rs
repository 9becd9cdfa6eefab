//! Output renderers: Markdown comment body and JSON.

pub mod json;
pub mod markdown;

use crate::models::SummaryResult;

/// Trait for rendering a summary to an output format.
pub trait OutputRenderer {
    /// Render the summary to a string.
    fn render(&self, summary: &SummaryResult) -> String;
}
