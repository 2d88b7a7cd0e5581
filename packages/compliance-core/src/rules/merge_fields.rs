//! `[Field: Name]` merge-token validation.
//!
//! The downstream mail platform substitutes tokens by exact, case-sensitive
//! lookup, so a token that is only slightly off renders literally in the
//! recipient's inbox.

use std::ops::Range;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::debug;

use crate::text::{char_window, fragment_text};
use crate::types::{Issue, Severity};

/// Field names accepted by default.
pub const DEFAULT_WHITELIST: &[&str] = &[
    "First Name",
    "Last Name",
    "Full Name",
    "Email",
    "Company",
    "Mobile",
    "City",
    "Country",
    "Unsubscribe Link",
];

lazy_static! {
    static ref MERGE_TOKEN: Regex = Regex::new(r"\[Field:([ \t]*)([^\]\[]*)\]").unwrap();
}

/// Byte ranges of every merge token in `text`.
pub fn merge_field_spans(text: &str) -> Vec<Range<usize>> {
    MERGE_TOKEN.find_iter(text).map(|m| m.range()).collect()
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Validate every merge token against `whitelist`.
///
/// A token with wrong spacing only reports the spacing problem; the name
/// is checked once the spacing is right.
pub fn check_merge_fields(text: &str, whitelist: &[String], context_radius: usize) -> Vec<Issue> {
    let mut issues = Vec::new();

    for caps in MERGE_TOKEN.captures_iter(text) {
        let (Some(token), Some(gap), Some(raw_name)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };

        let name = raw_name.as_str();
        let trimmed = name.trim();
        let context = fragment_text(char_window(text, token.start(), token.end(), context_radius));

        let base = |rule_id: &str, severity: Severity, message: String| {
            Issue::new(rule_id, "merge_field", severity, message, token.as_str())
                .with_found(token.as_str())
                .with_context(context.clone())
                .at(token.start(), token.len())
        };

        if gap.as_str() != " " || trimmed.len() != name.len() {
            issues.push(
                base(
                    "merge_field_spacing",
                    Severity::Critical,
                    format!(
                        "Merge field \"{}\" needs exactly one space after the colon",
                        token.as_str()
                    ),
                )
                .with_type("merge_field_spacing")
                .with_suggestion(format!("[Field: {}]", trimmed)),
            );
            continue;
        }

        if whitelist.iter().any(|allowed| allowed == name) {
            continue;
        }

        let normalized = normalize(name);
        if let Some(expected) = whitelist.iter().find(|allowed| normalize(allowed) == normalized) {
            debug!(found = %name, expected = %expected, "Merge field case mismatch");
            issues.push(
                base(
                    "merge_field_case",
                    Severity::Critical,
                    format!(
                        "Merge field \"{}\" does not match \"{}\" exactly; substitution is case-sensitive",
                        name, expected
                    ),
                )
                .with_type("merge_field_case")
                .with_suggestion(format!("[Field: {}]", expected)),
            );
            continue;
        }

        issues.push(
            base(
                "merge_field_unknown",
                Severity::Medium,
                format!("Merge field \"{}\" is not a known field", name),
            )
            .with_type("merge_field_unknown")
            .with_suggestion(format!("Confirm \"{}\" exists in the mailing platform", name)),
        );
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> Vec<String> {
        DEFAULT_WHITELIST.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_valid_token_passes() {
        assert!(check_merge_fields("Dear [Field: First Name],", &whitelist(), 40).is_empty());
    }

    #[test]
    fn test_missing_space_is_critical() {
        let issues = check_merge_fields("Hi [Field:LastName]!", &whitelist(), 40);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, "merge_field_spacing");
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].suggestion.as_deref(), Some("[Field: LastName]"));
        assert_eq!(issues[0].position, Some(3));
    }

    #[test]
    fn test_extra_space_is_spacing_issue() {
        let issues = check_merge_fields("[Field:  Email ]", &whitelist(), 40);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].suggestion.as_deref(), Some("[Field: Email]"));
    }

    #[test]
    fn test_case_mismatch_is_critical() {
        let issues = check_merge_fields("Dear [Field: lastname]", &whitelist(), 40);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, "merge_field_case");
        assert_eq!(issues[0].severity, Severity::Critical);
        assert_eq!(issues[0].suggestion.as_deref(), Some("[Field: Last Name]"));
    }

    #[test]
    fn test_unknown_field_is_medium() {
        let issues = check_merge_fields("Your tier: [Field: Loyalty Tier]", &whitelist(), 40);

        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].rule_id, "merge_field_unknown");
        assert_eq!(issues[0].severity, Severity::Medium);
    }

    #[test]
    fn test_context_is_reconstructed_without_markup() {
        let html = "<p>Hello <b>[Field: first name]</b>, welcome back</p>";
        let issues = check_merge_fields(html, &whitelist(), 40);

        let context = issues[0].context.as_deref().unwrap();
        assert!(context.contains("Hello"));
        assert!(context.contains("welcome back"));
        assert!(!context.contains("<b>"));
    }

    #[test]
    fn test_spans_cover_tokens() {
        let text = "a [Field: Email] b [Field:City]";
        let spans = merge_field_spans(text);

        assert_eq!(spans.len(), 2);
        assert_eq!(&text[spans[0].clone()], "[Field: Email]");
        assert_eq!(&text[spans[1].clone()], "[Field:City]");
    }
}
