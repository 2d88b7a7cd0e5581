//! Issues produced by checks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Issue severity. Ordered so that sorting ascending puts critical first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Critical,
        Severity::High,
        Severity::Medium,
        Severity::Low,
    ];

    /// Points subtracted from a perfect score per issue.
    pub fn penalty(self) -> u32 {
        match self {
            Severity::Critical => 20,
            Severity::High => 10,
            Severity::Medium => 5,
            Severity::Low => 2,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::High => "high",
            Severity::Medium => "medium",
            Severity::Low => "low",
        }
    }

    /// Parse free-form severity text from a generative collaborator.
    /// Unrecognized values fall back to medium.
    pub fn parse_lenient(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "critical" | "blocker" | "severe" => Severity::Critical,
            "high" | "major" | "error" => Severity::High,
            "low" | "minor" | "info" | "suggestion" => Severity::Low,
            _ => Severity::Medium,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which language audience an issue belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Primary,
    Secondary,
    #[default]
    Both,
}

/// A single finding. Ephemeral: produced per check and discarded after
/// reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub rule_id: String,

    #[serde(rename = "type")]
    pub issue_type: String,

    pub category: String,
    pub severity: Severity,
    pub message: String,

    /// The offending snippet as it appears in the content.
    pub original: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    /// Byte offset of the match in the evaluated content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,

    /// Byte length of the match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_text: Option<String>,

    #[serde(default)]
    pub language: LanguageTag,
}

impl Issue {
    /// Create an issue. The type defaults to the category.
    pub fn new(
        rule_id: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        message: impl Into<String>,
        original: impl Into<String>,
    ) -> Self {
        let category = category.into();
        Self {
            rule_id: rule_id.into(),
            issue_type: category.clone(),
            category,
            severity,
            message: message.into(),
            original: original.into(),
            suggestion: None,
            position: None,
            length: None,
            context: None,
            found: None,
            link_text: None,
            language: LanguageTag::Both,
        }
    }

    pub fn with_type(mut self, issue_type: impl Into<String>) -> Self {
        self.issue_type = issue_type.into();
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Record where the match sits in the evaluated content.
    pub fn at(mut self, position: usize, length: usize) -> Self {
        self.position = Some(position);
        self.length = Some(length);
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_found(mut self, found: impl Into<String>) -> Self {
        self.found = Some(found.into());
        self
    }

    pub fn with_link_text(mut self, link_text: impl Into<String>) -> Self {
        self.link_text = Some(link_text.into());
        self
    }

    pub fn with_language(mut self, language: LanguageTag) -> Self {
        self.language = language;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalties_are_strictly_ordered() {
        let penalties: Vec<u32> = Severity::ALL.iter().map(|s| s.penalty()).collect();
        assert_eq!(penalties, vec![20, 10, 5, 2]);
        assert!(penalties.windows(2).all(|w| w[0] > w[1]));
    }

    #[test]
    fn test_severity_sorts_critical_first() {
        let mut severities = vec![Severity::Low, Severity::Critical, Severity::Medium, Severity::High];
        severities.sort();
        assert_eq!(severities, Severity::ALL.to_vec());
    }

    #[test]
    fn test_parse_lenient() {
        assert_eq!(Severity::parse_lenient("Critical"), Severity::Critical);
        assert_eq!(Severity::parse_lenient(" minor "), Severity::Low);
        assert_eq!(Severity::parse_lenient("whatever"), Severity::Medium);
    }

    #[test]
    fn test_issue_serializes_type_field() {
        let issue = Issue::new("cta_weak", "cta", Severity::Medium, "Weak CTA", "click here")
            .with_type("weak_cta");
        let json = serde_json::to_value(&issue).unwrap();

        assert_eq!(json["type"], "weak_cta");
        assert_eq!(json["severity"], "medium");
        assert_eq!(json["language"], "both");
        assert!(json.get("suggestion").is_none());
    }
}
