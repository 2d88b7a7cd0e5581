//! Declarative rule records and content-type tags.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::issue::Severity;

/// Kind of content being checked. Rules opt in via `applies_to`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContentType {
    /// Templated marketing email
    Edm,
    /// Public web page
    Webpage,
    Social,
    Print,
    Other(String),
}

impl ContentType {
    pub fn as_str(&self) -> &str {
        match self {
            ContentType::Edm => "edm",
            ContentType::Webpage => "webpage",
            ContentType::Social => "social",
            ContentType::Print => "print",
            ContentType::Other(tag) => tag,
        }
    }
}

impl From<&str> for ContentType {
    fn from(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "edm" | "email" => ContentType::Edm,
            "webpage" | "web" | "url" => ContentType::Webpage,
            "social" => ContentType::Social,
            "print" => ContentType::Print,
            other => ContentType::Other(other.to_string()),
        }
    }
}

impl From<String> for ContentType {
    fn from(value: String) -> Self {
        ContentType::from(value.as_str())
    }
}

impl From<ContentType> for String {
    fn from(value: ContentType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_case_insensitive() -> bool {
    true
}

/// A declarative pattern rule. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub category: String,
    pub severity: Severity,

    /// Regular expression (Rust `regex` syntax).
    pub pattern: String,

    /// Replacement for the matched text; may reference capture groups (`$1`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,

    /// Free-form advice used when there is no mechanical replacement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Strings that veto a match when found near it (case-insensitive).
    #[serde(default)]
    pub context_exceptions: Vec<String>,

    /// Content types this rule applies to. Empty means all.
    #[serde(default)]
    pub applies_to: Vec<ContentType>,

    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        category: impl Into<String>,
        severity: Severity,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            severity,
            pattern: pattern.into(),
            replacement: None,
            suggestion: None,
            message: None,
            context_exceptions: Vec::new(),
            applies_to: Vec::new(),
            case_insensitive: true,
        }
    }

    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_exceptions(mut self, exceptions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.context_exceptions = exceptions.into_iter().map(Into::into).collect();
        self
    }

    pub fn applies_to(mut self, content_types: impl IntoIterator<Item = ContentType>) -> Self {
        self.applies_to = content_types.into_iter().collect();
        self
    }

    pub fn case_sensitive(mut self) -> Self {
        self.case_insensitive = false;
        self
    }

    /// True if this rule should run for the given content type.
    pub fn applies(&self, content_type: &ContentType) -> bool {
        self.applies_to.is_empty() || self.applies_to.contains(content_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_applies_to_means_all() {
        let rule = Rule::new("r1", "brand", Severity::Low, "foo");
        assert!(rule.applies(&ContentType::Edm));
        assert!(rule.applies(&ContentType::Webpage));
    }

    #[test]
    fn test_applies_to_restricts_content_types() {
        let rule = Rule::new("r1", "brand", Severity::Low, "foo").applies_to([ContentType::Edm]);
        assert!(rule.applies(&ContentType::Edm));
        assert!(!rule.applies(&ContentType::Webpage));
    }

    #[test]
    fn test_rule_deserializes_with_defaults() {
        let json = r#"{
            "id": "legal_guarantee",
            "category": "legal",
            "severity": "high",
            "pattern": "\\bguaranteed?\\b",
            "applies_to": ["edm", "landing"]
        }"#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert!(rule.case_insensitive);
        assert!(rule.context_exceptions.is_empty());
        assert_eq!(
            rule.applies_to,
            vec![ContentType::Edm, ContentType::Other("landing".to_string())]
        );
    }
}
