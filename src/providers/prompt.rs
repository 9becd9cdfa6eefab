//! Fixed instructions and user payload for the summarization request.

use crate::models::DiffText;

/// System instruction sent with every request.
pub const SYSTEM_PROMPT: &str = "\
You are a pull request summarization assistant. You receive the unified diff \
of a GitHub pull request (often including GitHub Actions workflow files) and \
produce a structured summary with exactly three lists:

1. high_level_summary: briefly describe the main changes introduced by the diff.
2. potential_breaking_changes: identify modifications that might disrupt existing \
workflows, public APIs, configuration, or runtime behavior.
3. recommended_code_improvements: suggest concrete enhancements or best practices \
that would improve code quality, security, or maintainability.

Rules:
- Each list item is a single short sentence of plain text.
- Use an empty list when a category has nothing to report. Never invent issues.
- Respond with a single JSON object and nothing else, matching exactly:

{
  \"high_level_summary\": [\"...\"],
  \"potential_breaking_changes\": [\"...\"],
  \"recommended_code_improvements\": [\"...\"]
}

Do not add any other keys.";

/// Appended when the diff had to be cut to fit the request budget.
pub const TRUNCATION_NOTICE: &str =
    "\n\n[diff truncated: only the first part of the changes is shown]";

/// Build the user message for a diff, truncating it to `max_chars` bytes.
///
/// Truncation always lands on a UTF-8 character boundary.
pub fn build_user_prompt(diff: &DiffText, max_chars: usize) -> String {
    let text = diff.as_str();
    let (body, truncated) = truncate_at_boundary(text, max_chars);
    let mut prompt = format!("Summarize the following pull request diff.\n\n```diff\n{body}\n```");
    if truncated {
        prompt.push_str(TRUNCATION_NOTICE);
    }
    prompt
}

fn truncate_at_boundary(text: &str, max: usize) -> (&str, bool) {
    if text.len() <= max {
        return (text, false);
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    (&text[..end], true)
}
