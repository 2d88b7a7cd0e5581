//! Categorization and severity-weighted scoring.

pub mod categorize;
pub mod scoring;
pub mod url_filter;

pub use categorize::categorize;
pub use scoring::{compliance_score, sort_by_severity, SeverityCounts};
pub use url_filter::apply_url_exclusions;

use std::collections::BTreeMap;

use crate::types::{Issue, IssueCategory};

/// Issues bucketed and scored.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    /// Non-empty buckets only, each severity-sorted.
    pub issues: BTreeMap<IssueCategory, Vec<Issue>>,
    pub counts: SeverityCounts,
    pub score: u8,
    /// Every category, scored with the same formula as the whole report.
    pub category_scores: BTreeMap<IssueCategory, u8>,
}

impl Aggregation {
    pub fn from_issues(issues: Vec<Issue>) -> Self {
        let counts = SeverityCounts::from_issues(&issues);
        let score = compliance_score(&counts);

        let mut buckets: BTreeMap<IssueCategory, Vec<Issue>> = BTreeMap::new();
        for issue in issues {
            buckets.entry(categorize(&issue)).or_default().push(issue);
        }
        for bucket in buckets.values_mut() {
            sort_by_severity(bucket);
        }

        let category_scores = IssueCategory::ALL
            .iter()
            .map(|category| {
                let bucket = buckets.get(category).map(Vec::as_slice).unwrap_or(&[]);
                (*category, compliance_score(&SeverityCounts::from_issues(bucket)))
            })
            .collect();

        Self {
            issues: buckets,
            counts,
            score,
            category_scores,
        }
    }

    pub fn issue_count(&self) -> usize {
        self.counts.total()
    }
}
