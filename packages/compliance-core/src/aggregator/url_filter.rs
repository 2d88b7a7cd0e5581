use tracing::debug;

use super::categorize;
use crate::config::UrlExclusionPolicy;
use crate::types::{Issue, IssueCategory, Severity};

/// Drop issues that only make sense for uploaded templates.
pub fn apply_url_exclusions(issues: Vec<Issue>, policy: &UrlExclusionPolicy) -> Vec<Issue> {
    let before = issues.len();

    let kept: Vec<Issue> = issues
        .into_iter()
        .filter(|issue| {
            !policy
                .excluded_prefixes
                .iter()
                .any(|prefix| issue.rule_id.starts_with(prefix.as_str()))
        })
        .filter(|issue| {
            !(policy.suppress_soft_cta_and_tone
                && matches!(categorize(issue), IssueCategory::Cta | IssueCategory::Tone)
                && matches!(issue.severity, Severity::Medium | Severity::Low))
        })
        .collect();

    debug!(removed = before - kept.len(), "Applied URL-mode exclusions");
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(rule_id: &str, category: &str, severity: Severity) -> Issue {
        Issue::new(rule_id, category, severity, "m", "o")
    }

    #[test]
    fn test_template_only_families_removed() {
        let issues = vec![
            issue("merge_field_spacing", "merge_field", Severity::Critical),
            issue("font_family_inline", "brand", Severity::Medium),
            issue("brand_color_deprecated", "brand", Severity::Medium),
            issue("staging_domain_link", "links", Severity::Critical),
            issue("legal_risk_free", "legal", Severity::High),
            issue("brand_exclamation_overuse", "brand", Severity::Medium),
        ];

        let kept = apply_url_exclusions(issues, &UrlExclusionPolicy::default());
        let ids: Vec<&str> = kept.iter().map(|i| i.rule_id.as_str()).collect();

        assert_eq!(ids, vec!["legal_risk_free", "brand_exclamation_overuse"]);
    }

    #[test]
    fn test_soft_cta_and_tone_suppressed() {
        let issues = vec![
            issue("cta_weak", "cta", Severity::Medium),
            issue("tone_urgency_pressure", "tone", Severity::Low),
            issue("tone_offensive", "tone", Severity::High),
        ];

        let kept = apply_url_exclusions(issues.clone(), &UrlExclusionPolicy::default());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].rule_id, "tone_offensive");

        let policy = UrlExclusionPolicy {
            suppress_soft_cta_and_tone: false,
            ..Default::default()
        };
        assert_eq!(apply_url_exclusions(issues, &policy).len(), 3);
    }
}
