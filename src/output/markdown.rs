//! Markdown comment body for pull request and commit comments.
//!
//! Layout:
//!
//! ```text
//! <!-- prscribe:pr-summary -->        hidden marker, always line 1
//! ## Pull Request Summary
//! <details open> 📝 Summary           bullets
//! <details> ⚠️ Breaking Changes       bullets
//! <details> ✅ Improvements            bullets
//! <sub>AI disclosure</sub>
//! ```
//!
//! Sections are never omitted. An empty list keeps its header and
//! disclosure block and shows a placeholder line instead of bullets.

use crate::constants;
use crate::models::SummaryResult;
use crate::output::OutputRenderer;

/// Placeholder shown inside a section with no items.
pub const EMPTY_SECTION: &str = "_Nothing to report._";

/// Renders a [`SummaryResult`] as the comment body.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    marker: String,
}

impl MarkdownRenderer {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self::new(constants::COMMENT_MARKER)
    }
}

impl OutputRenderer for MarkdownRenderer {
    fn render(&self, summary: &SummaryResult) -> String {
        let mut out = String::new();
        out.push_str(&self.marker);
        out.push('\n');
        out.push_str("## Pull Request Summary\n\n");

        push_section(&mut out, "📝 Summary", &summary.high_level_summary, true);
        push_section(
            &mut out,
            "⚠️ Breaking Changes",
            &summary.potential_breaking_changes,
            false,
        );
        push_section(
            &mut out,
            "✅ Improvements",
            &summary.recommended_code_improvements,
            false,
        );

        out.push_str(&format!("<sub>{}</sub>\n", constants::AI_DISCLOSURE));
        out
    }
}

fn push_section(out: &mut String, title: &str, items: &[String], open: bool) {
    let tag = if open { "<details open>" } else { "<details>" };
    out.push_str(&format!(
        "{tag}\n<summary><strong>{title}</strong></summary>\n\n"
    ));

    let bullets: Vec<String> = items.iter().filter_map(|i| bullet_text(i)).collect();
    if bullets.is_empty() {
        out.push_str(EMPTY_SECTION);
        out.push('\n');
    } else {
        for b in bullets {
            out.push_str(&format!("- {b}\n"));
        }
    }

    out.push_str("\n</details>\n\n");
}

/// Fold an item onto one line. Blank items are dropped.
fn bullet_text(item: &str) -> Option<String> {
    let folded = item
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if folded.is_empty() { None } else { Some(folded) }
}
