//! JSON output renderer.
//!
//! Outputs `{"summary": {...}, "counts": {...}, "body": "..."}` for piping
//! into other tools. `body` is the exact Markdown comment that would be posted.

use crate::models::SummaryResult;
use crate::output::OutputRenderer;
use crate::output::markdown::MarkdownRenderer;

/// JSON output renderer.
#[derive(Debug, Clone, Default)]
pub struct JsonRenderer {
    markdown: MarkdownRenderer,
}

impl JsonRenderer {
    pub fn new(markdown: MarkdownRenderer) -> Self {
        Self { markdown }
    }
}

impl OutputRenderer for JsonRenderer {
    fn render(&self, summary: &SummaryResult) -> String {
        let output = serde_json::json!({
            "summary": summary,
            "counts": {
                "high_level_summary": summary.high_level_summary.len(),
                "potential_breaking_changes": summary.potential_breaking_changes.len(),
                "recommended_code_improvements": summary.recommended_code_improvements.len(),
            },
            "body": self.markdown.render(summary),
        });

        serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
    }
}
