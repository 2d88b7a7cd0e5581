//! The completed-check output contract.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::issue::{Issue, Severity};
use super::rule::ContentType;
use crate::acquisition::{AcquisitionMethod, ScrapeAttempt};
use crate::aggregator::SeverityCounts;
use crate::collaborators::{SeoAdvice, ToneAnalysis};
use crate::seo::SeoReport;

/// Report bucket an issue is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueCategory {
    Grammar,
    Brand,
    Links,
    Images,
    Cta,
    Tone,
    Legal,
    Accessibility,
    Numerical,
}

impl IssueCategory {
    pub const ALL: [IssueCategory; 9] = [
        IssueCategory::Grammar,
        IssueCategory::Brand,
        IssueCategory::Links,
        IssueCategory::Images,
        IssueCategory::Cta,
        IssueCategory::Tone,
        IssueCategory::Legal,
        IssueCategory::Accessibility,
        IssueCategory::Numerical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            IssueCategory::Grammar => "grammar",
            IssueCategory::Brand => "brand",
            IssueCategory::Links => "links",
            IssueCategory::Images => "images",
            IssueCategory::Cta => "cta",
            IssueCategory::Tone => "tone",
            IssueCategory::Legal => "legal",
            IssueCategory::Accessibility => "accessibility",
            IssueCategory::Numerical => "numerical",
        }
    }
}

/// Per-language issue counts, reported for bilingual content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageCounts {
    pub primary: usize,
    pub secondary: usize,
    pub both: usize,
}

/// What was checked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckTarget {
    /// Uploaded template (EDM or other markup)
    Template { content_type: ContentType },
    /// Public URL, acquired automatically
    Url { url: String, content_type: ContentType },
    /// Public URL whose content was pasted manually after acquisition failed
    ManualContent { url: String, content_type: ContentType },
}

impl CheckTarget {
    /// URL-mode checks apply the template-only exclusion filter.
    pub fn is_url_mode(&self) -> bool {
        !matches!(self, CheckTarget::Template { .. })
    }
}

/// Acquisition diagnostics carried on URL reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcquisitionSummary {
    pub method: AcquisitionMethod,
    pub final_url: String,
    pub attempts: Vec<ScrapeAttempt>,
}

/// Result of one compliance check. Immutable once computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComplianceReport {
    /// Correlation id
    pub id: Uuid,
    pub target: CheckTarget,

    /// Detected languages, primary first ("en", "ar").
    pub languages: Vec<String>,
    pub is_bilingual: bool,

    /// Issues by category, each bucket severity-sorted.
    pub issues: BTreeMap<IssueCategory, Vec<Issue>>,
    pub severity_counts: SeverityCounts,

    /// 0-100
    pub score: u8,

    /// Per-category 0-100 sub-scores (URL checks).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_scores: Option<BTreeMap<IssueCategory, u8>>,

    /// Issue counts per language audience (bilingual content).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_counts: Option<LanguageCounts>,

    #[serde(default)]
    pub suggestions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<ToneAnalysis>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoReport>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo_advice: Option<SeoAdvice>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquisition: Option<AcquisitionSummary>,

    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

impl ComplianceReport {
    /// Total number of issues across all buckets.
    pub fn issue_count(&self) -> usize {
        self.issues.values().map(Vec::len).sum()
    }

    /// All issues in display order (critical → high → medium → low).
    pub fn sorted_issues(&self) -> Vec<&Issue> {
        let mut all: Vec<&Issue> = self.issues.values().flatten().collect();
        all.sort_by_key(|issue| issue.severity);
        all
    }

    /// Issues of the given severity.
    pub fn issues_with_severity(&self, severity: Severity) -> impl Iterator<Item = &Issue> {
        self.issues
            .values()
            .flatten()
            .filter(move |issue| issue.severity == severity)
    }

    /// Bucket for a category (empty if no issues).
    pub fn bucket(&self, category: IssueCategory) -> &[Issue] {
        self.issues.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}
