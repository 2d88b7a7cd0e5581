//! SEO / technical analysis of acquired pages.
//!
//! Each aspect gets a 0-100 sub-score: coverage aspects (Open Graph,
//! images) use their coverage ratio, the rest start at 100 and lose the
//! same per-severity penalty the compliance score uses. The composite is
//! the weighted sum of the sub-scores.

pub mod analyzer;
pub mod document;

pub use analyzer::analyze_seo;
pub use document::{ImageRef, LinkRef, SeoDocument};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::acquisition::normalize_url;
use crate::types::Severity;

/// Scored aspect of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeoAspect {
    Title,
    Description,
    OpenGraph,
    Twitter,
    Technical,
    Headings,
    Schema,
    Images,
}

impl SeoAspect {
    pub const ALL: [SeoAspect; 8] = [
        SeoAspect::Title,
        SeoAspect::Description,
        SeoAspect::OpenGraph,
        SeoAspect::Twitter,
        SeoAspect::Technical,
        SeoAspect::Headings,
        SeoAspect::Schema,
        SeoAspect::Images,
    ];

    /// Share of the composite score. Weights sum to 1.
    pub fn weight(self) -> f64 {
        match self {
            SeoAspect::Title => 0.15,
            SeoAspect::Description => 0.15,
            SeoAspect::OpenGraph => 0.10,
            SeoAspect::Twitter => 0.05,
            SeoAspect::Technical => 0.20,
            SeoAspect::Headings => 0.15,
            SeoAspect::Schema => 0.10,
            SeoAspect::Images => 0.10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SeoAspect::Title => "title",
            SeoAspect::Description => "description",
            SeoAspect::OpenGraph => "open_graph",
            SeoAspect::Twitter => "twitter",
            SeoAspect::Technical => "technical",
            SeoAspect::Headings => "headings",
            SeoAspect::Schema => "schema",
            SeoAspect::Images => "images",
        }
    }
}

impl fmt::Display for SeoAspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One problem found within an aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoIssue {
    pub severity: Severity,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Sub-score and issues of one aspect.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoFinding {
    pub aspect: SeoAspect,
    /// 0-100
    pub score: u8,
    pub issues: Vec<SeoIssue>,
}

/// Informational link counts. Not weighted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkSummary {
    pub internal: usize,
    pub external: usize,
}

/// SEO analysis of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoReport {
    /// Weighted composite, 0-100
    pub score: u8,
    pub category: UrlCategory,
    /// One entry per aspect, in [`SeoAspect::ALL`] order.
    pub findings: Vec<SeoFinding>,
    pub links: LinkSummary,
}

impl SeoReport {
    pub fn finding(&self, aspect: SeoAspect) -> Option<&SeoFinding> {
        self.findings.iter().find(|f| f.aspect == aspect)
    }

    pub fn issue_count(&self) -> usize {
        self.findings.iter().map(|f| f.issues.len()).sum()
    }

    /// All issues with their aspect, most severe first.
    pub fn sorted_issues(&self) -> Vec<(SeoAspect, &SeoIssue)> {
        let mut all: Vec<(SeoAspect, &SeoIssue)> = self
            .findings
            .iter()
            .flat_map(|f| f.issues.iter().map(move |i| (f.aspect, i)))
            .collect();
        all.sort_by_key(|(_, i)| i.severity);
        all
    }
}

/// Kind of page, used to judge which structured data is appropriate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlCategory {
    Product,
    Article,
    LocalBusiness,
    Homepage,
    General,
}

impl UrlCategory {
    /// Guess the category from the URL path, then from the page's own
    /// structured data.
    pub fn infer(url: &str, doc: &SeoDocument) -> Self {
        if let Ok(parsed) = normalize_url(url) {
            let path = parsed.path().to_lowercase();
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

            let any = |names: &[&str]| {
                segments
                    .iter()
                    .any(|seg| names.iter().any(|name| seg == name || seg.starts_with(&format!("{name}-"))))
            };

            if any(&["product", "products", "p", "shop"]) {
                return UrlCategory::Product;
            }
            if any(&["blog", "news", "article", "articles"]) {
                return UrlCategory::Article;
            }
            if any(&["contact", "contact-us", "location", "locations"]) {
                return UrlCategory::LocalBusiness;
            }
            if segments.is_empty() {
                return UrlCategory::Homepage;
            }
        }

        let has = |names: &[&str]| doc.schema_types.iter().any(|t| names.contains(&t.as_str()));
        if has(&["Product", "Offer"]) {
            UrlCategory::Product
        } else if has(&["Article", "NewsArticle", "BlogPosting"]) {
            UrlCategory::Article
        } else if has(&["LocalBusiness"]) {
            UrlCategory::LocalBusiness
        } else {
            UrlCategory::General
        }
    }

    /// JSON-LD types that suit this category. Empty means anything goes.
    pub fn expected_schema_types(self) -> &'static [&'static str] {
        match self {
            UrlCategory::Product => &["Product", "Offer"],
            UrlCategory::Article => &["Article", "NewsArticle", "BlogPosting"],
            UrlCategory::LocalBusiness => &["LocalBusiness", "Organization"],
            UrlCategory::Homepage => &["Organization", "WebSite"],
            UrlCategory::General => &[],
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UrlCategory::Product => "product",
            UrlCategory::Article => "article",
            UrlCategory::LocalBusiness => "local_business",
            UrlCategory::Homepage => "homepage",
            UrlCategory::General => "general",
        }
    }
}

impl fmt::Display for UrlCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        let total: f64 = SeoAspect::ALL.iter().map(|a| a.weight()).sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_infer_from_path() {
        let doc = SeoDocument::default();

        assert_eq!(UrlCategory::infer("https://example.com/shop/towels", &doc), UrlCategory::Product);
        assert_eq!(UrlCategory::infer("example.com/p/123", &doc), UrlCategory::Product);
        assert_eq!(UrlCategory::infer("https://example.com/en/blog/summer", &doc), UrlCategory::Article);
        assert_eq!(UrlCategory::infer("https://example.com/contact-us", &doc), UrlCategory::LocalBusiness);
        assert_eq!(UrlCategory::infer("https://example.com/", &doc), UrlCategory::Homepage);
        assert_eq!(UrlCategory::infer("https://example.com/en/offers", &doc), UrlCategory::General);
    }

    #[test]
    fn test_infer_falls_back_to_schema() {
        let doc = SeoDocument {
            schema_types: vec!["BlogPosting".into()],
            ..Default::default()
        };

        assert_eq!(UrlCategory::infer("https://example.com/en/summer-story", &doc), UrlCategory::Article);
    }

    #[test]
    fn test_productivity_path_is_not_product() {
        let doc = SeoDocument::default();
        assert_eq!(UrlCategory::infer("https://example.com/productivity", &doc), UrlCategory::General);
    }
}
