use crate::types::{Issue, IssueCategory};

/// Bucket keywords, checked in order. The first hit wins.
const KEYWORDS: &[(&[&str], IssueCategory)] = &[
    (&["grammar", "spelling"], IssueCategory::Grammar),
    (&["link", "url", "utm"], IssueCategory::Links),
    (&["image"], IssueCategory::Images),
    (&["cta"], IssueCategory::Cta),
    (&["tone"], IssueCategory::Tone),
    (&["legal"], IssueCategory::Legal),
    (&["accessibility"], IssueCategory::Accessibility),
    (&["numerical", "number", "currency"], IssueCategory::Numerical),
];

fn match_keywords(text: &str) -> Option<IssueCategory> {
    let text = text.to_lowercase();
    KEYWORDS
        .iter()
        .find(|(words, _)| words.iter().any(|w| text.contains(w)))
        .map(|(_, category)| *category)
}

/// Report bucket for an issue: its category first, then its type.
/// Anything unrecognized is a brand issue.
pub fn categorize(issue: &Issue) -> IssueCategory {
    match_keywords(&issue.category)
        .or_else(|| match_keywords(&issue.issue_type))
        .unwrap_or(IssueCategory::Brand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn issue(category: &str, issue_type: &str) -> Issue {
        Issue::new("r", category, Severity::Low, "m", "o").with_type(issue_type)
    }

    #[test]
    fn test_category_before_type() {
        assert_eq!(categorize(&issue("spelling", "spelling")), IssueCategory::Grammar);
        assert_eq!(categorize(&issue("links", "link_no_utm")), IssueCategory::Links);
        assert_eq!(categorize(&issue("numerical", "currency_format")), IssueCategory::Numerical);
        assert_eq!(categorize(&issue("cta", "weak_cta")), IssueCategory::Cta);
    }

    #[test]
    fn test_type_used_when_category_unknown() {
        assert_eq!(categorize(&issue("content", "broken_image")), IssueCategory::Images);
    }

    #[test]
    fn test_unknown_falls_back_to_brand() {
        assert_eq!(categorize(&issue("merge_field", "merge_field_spacing")), IssueCategory::Brand);
        assert_eq!(categorize(&issue("brand", "brand")), IssueCategory::Brand);
    }
}
