//! Diff payload and the structured summary the model must return.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Unified diff text between two revisions.
///
/// Opaque: never parsed, only handed to the summarizer verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffText(String);

impl DiffText {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the diff contains nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Structured pull request summary.
///
/// All three lists are required on deserialization and unknown keys are
/// rejected, so a value of this type is always complete.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct SummaryResult {
    /// Short bullet points describing the main changes.
    pub high_level_summary: Vec<String>,
    /// Changes that may break existing workflows, APIs, or behavior.
    pub potential_breaking_changes: Vec<String>,
    /// Suggested improvements to quality, security, or maintainability.
    pub recommended_code_improvements: Vec<String>,
}

impl SummaryResult {
    /// Total number of items across all three lists.
    pub fn item_count(&self) -> usize {
        self.high_level_summary.len()
            + self.potential_breaking_changes.len()
            + self.recommended_code_improvements.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_complete_summary() {
        let json = r#"{
            "high_level_summary": ["Added deploy workflow"],
            "potential_breaking_changes": [],
            "recommended_code_improvements": ["Pin action versions"]
        }"#;
        let summary: SummaryResult = serde_json::from_str(json).unwrap();
        assert_eq!(summary.high_level_summary, vec!["Added deploy workflow"]);
        assert!(summary.potential_breaking_changes.is_empty());
        assert_eq!(summary.item_count(), 2);
    }

    #[test]
    fn deserialize_rejects_missing_field() {
        let json = r#"{"high_level_summary": [], "potential_breaking_changes": []}"#;
        let err = serde_json::from_str::<SummaryResult>(json).unwrap_err();
        assert!(err.to_string().contains("recommended_code_improvements"), "got: {err}");
    }

    #[test]
    fn deserialize_rejects_unknown_field() {
        let json = r#"{
            "high_level_summary": [],
            "potential_breaking_changes": [],
            "recommended_code_improvements": [],
            "confidence": "high"
        }"#;
        let err = serde_json::from_str::<SummaryResult>(json).unwrap_err();
        assert!(err.to_string().contains("confidence"), "got: {err}");
    }

    #[test]
    fn deserialize_rejects_null_list() {
        let json = r#"{
            "high_level_summary": null,
            "potential_breaking_changes": [],
            "recommended_code_improvements": []
        }"#;
        assert!(serde_json::from_str::<SummaryResult>(json).is_err());
    }

    #[test]
    fn diff_text_blank_detection() {
        assert!(DiffText::new("  \n\t").is_blank());
        assert!(!DiffText::new("diff --git a/x b/x").is_blank());
        assert!(DiffText::new("").is_empty());
    }
}
