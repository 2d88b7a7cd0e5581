//! Weak call-to-action detection.

use lazy_static::lazy_static;
use regex::Regex;

use crate::types::{Issue, Severity};

/// Phrases that make a poor call to action, checked in order.
pub const WEAK_CTA_PHRASES: &[&str] = &[
    "click here",
    "learn more",
    "read more",
    "submit",
    "click",
    "more info",
    "go",
    "here",
];

const STRONGER_CTA: &str =
    "Use an action-oriented CTA that names the benefit (e.g. \"Book your stay\", \"Get your quote\")";

lazy_static! {
    static ref WEAK_CTA_PATTERNS: Vec<(&'static str, Regex)> = WEAK_CTA_PHRASES
        .iter()
        .map(|phrase| {
            let pattern = format!(r"(?i)\b{}\b", regex::escape(phrase));
            (*phrase, Regex::new(&pattern).unwrap())
        })
        .collect();
}

/// Report the first weak CTA phrase found, if any.
///
/// Emits at most one issue per call: the first catalogue phrase present
/// as a whole word or phrase, regardless of how many others occur.
pub fn check_weak_cta(text: &str) -> Option<Issue> {
    WEAK_CTA_PATTERNS.iter().find_map(|(phrase, regex)| {
        let m = regex.find(text)?;
        Some(
            Issue::new(
                "cta_weak",
                "cta",
                Severity::Medium,
                format!("Weak call to action: \"{}\"", m.as_str()),
                m.as_str(),
            )
            .with_type("weak_cta")
            .with_suggestion(STRONGER_CTA)
            .with_found(*phrase)
            .at(m.start(), m.len()),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_match_only() {
        let issue = check_weak_cta("Learn more about rates, or click here to apply").unwrap();

        assert_eq!(issue.found.as_deref(), Some("click here"));
        assert_eq!(issue.severity, Severity::Medium);
        assert!(issue.suggestion.is_some());
    }

    #[test]
    fn test_whole_word_matching() {
        assert!(check_weak_cta("Submission deadline is Friday").is_none());
        assert!(check_weak_cta("Let's go shopping").is_some());
        assert!(check_weak_cta("Ongoing offers").is_none());
    }

    #[test]
    fn test_each_catalogue_phrase_is_flagged() {
        let cases = [
            ("Click here to book", "click here"),
            ("Learn more about the spa", "learn more"),
            ("Read more on our blog", "read more"),
            ("Press submit when ready", "submit"),
            ("Click the banner below", "click"),
            ("More info at the front desk", "more info"),
            ("Ready? Go!", "go"),
            ("Rates are listed here", "here"),
        ];

        for (text, phrase) in cases {
            let issue = check_weak_cta(text).unwrap_or_else(|| panic!("no issue for {text:?}"));
            assert_eq!(issue.found.as_deref(), Some(phrase), "{}", text);
        }
    }

    #[test]
    fn test_phrases_inside_words_are_ignored() {
        assert!(check_weak_cta("Stay there and wherever you like").is_none());
        assert!(check_weak_cta("Clicking through the gallery, find out more").is_none());
        assert!(check_weak_cta("Our cargo service").is_none());
    }

    #[test]
    fn test_no_weak_cta() {
        assert!(check_weak_cta("Book your stay today").is_none());
        assert!(check_weak_cta("").is_none());
    }

    #[test]
    fn test_position_reported() {
        let issue = check_weak_cta("Offer ends soon. Click HERE").unwrap();
        assert_eq!(issue.position, Some(17));
        assert_eq!(issue.length, Some(10));
    }
}
