//! Per-aspect SEO checks and the weighted composite score.

use tracing::debug;

use super::document::SeoDocument;
use super::{LinkSummary, SeoAspect, SeoFinding, SeoIssue, SeoReport, UrlCategory};
use crate::types::Severity;

const TITLE_CHARS: (usize, usize) = (30, 60);
const DESCRIPTION_CHARS: (usize, usize) = (100, 160);
const H1_CHARS: (usize, usize) = (20, 70);

const REQUIRED_OPEN_GRAPH: [&str; 4] = ["og:title", "og:description", "og:image", "og:url"];
const TWITTER_CARD: [&str; 4] = [
    "twitter:card",
    "twitter:title",
    "twitter:description",
    "twitter:image",
];

/// Verbs that make a meta description read as an invitation to click.
const ACTION_VERBS: &[&str] = &[
    "discover", "learn", "shop", "book", "explore", "get", "find", "buy", "order", "try", "start",
    "save", "visit", "call", "join", "sign up", "download", "contact", "see", "reserve", "enjoy",
];

fn issue(severity: Severity, message: impl Into<String>) -> SeoIssue {
    SeoIssue {
        severity,
        message: message.into(),
        recommendation: None,
    }
}

fn penalty_score(issues: &[SeoIssue]) -> u8 {
    let penalty: u32 = issues.iter().map(|i| i.severity.penalty()).sum();
    100u32.saturating_sub(penalty) as u8
}

fn ratio_score(present: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((present as f64 / total as f64) * 100.0).round() as u8
}

fn finding(aspect: SeoAspect, issues: Vec<SeoIssue>) -> SeoFinding {
    SeoFinding {
        aspect,
        score: penalty_score(&issues),
        issues,
    }
}

fn outside(len: usize, (min, max): (usize, usize)) -> bool {
    len < min || len > max
}

fn check_title(doc: &SeoDocument) -> SeoFinding {
    let mut issues = Vec::new();
    match doc.metadata.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        None => issues.push(
            issue(Severity::Critical, "Page has no <title>")
                .recommend("Add a unique, descriptive title of 30-60 characters"),
        ),
        Some(title) => {
            let len = title.chars().count();
            if outside(len, TITLE_CHARS) {
                issues.push(issue(
                    Severity::Medium,
                    format!("Title is {} characters; aim for 30-60", len),
                ));
            }
        }
    }
    finding(SeoAspect::Title, issues)
}

fn check_description(doc: &SeoDocument) -> SeoFinding {
    let mut issues = Vec::new();
    match doc.metadata.description.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        None => issues.push(
            issue(Severity::High, "Page has no meta description")
                .recommend("Add a meta description of 100-160 characters"),
        ),
        Some(description) => {
            let len = description.chars().count();
            if outside(len, DESCRIPTION_CHARS) {
                issues.push(issue(
                    Severity::Medium,
                    format!("Meta description is {} characters; aim for 100-160", len),
                ));
            }
            let lower = description.to_lowercase();
            if !ACTION_VERBS.iter().any(|verb| contains_word(&lower, verb)) {
                issues.push(
                    issue(Severity::Low, "Meta description has no call to action")
                        .recommend("Invite the reader to act, e.g. \"Book now\" or \"Discover\""),
                );
            }
        }
    }
    finding(SeoAspect::Description, issues)
}

fn contains_word(haystack: &str, word: &str) -> bool {
    haystack.match_indices(word).any(|(i, m)| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + m.len()..].chars().next();
        !before.map(char::is_alphanumeric).unwrap_or(false)
            && !after.map(char::is_alphanumeric).unwrap_or(false)
    })
}

fn check_open_graph(doc: &SeoDocument) -> SeoFinding {
    let og = &doc.metadata.open_graph;
    let has = |key: &str| og.get(key).map(|v| !v.trim().is_empty()).unwrap_or(false);

    let missing: Vec<&str> = REQUIRED_OPEN_GRAPH.iter().copied().filter(|k| !has(k)).collect();
    let mut issues = Vec::new();
    if !missing.is_empty() {
        issues.push(issue(
            Severity::Medium,
            format!("Missing Open Graph tags: {}", missing.join(", ")),
        ));
    }
    if !has("og:type") {
        issues.push(issue(Severity::Low, "Missing recommended og:type"));
    }

    SeoFinding {
        aspect: SeoAspect::OpenGraph,
        score: ratio_score(REQUIRED_OPEN_GRAPH.len() - missing.len(), REQUIRED_OPEN_GRAPH.len()),
        issues,
    }
}

fn check_twitter(doc: &SeoDocument) -> SeoFinding {
    let issues = TWITTER_CARD
        .iter()
        .filter(|key| {
            doc.metadata
                .twitter
                .get(**key)
                .map(|v| v.trim().is_empty())
                .unwrap_or(true)
        })
        .map(|key| issue(Severity::Low, format!("Missing {}", key)))
        .collect();
    finding(SeoAspect::Twitter, issues)
}

fn check_technical(doc: &SeoDocument) -> SeoFinding {
    let meta = &doc.metadata;
    let present = |v: &Option<String>| v.as_deref().map(|s| !s.trim().is_empty()).unwrap_or(false);
    let mut issues = Vec::new();

    if !present(&meta.canonical) {
        issues.push(issue(Severity::Medium, "No canonical link"));
    }
    if let Some(robots) = meta.robots.as_deref() {
        let robots = robots.to_lowercase();
        if robots.split(',').map(str::trim).any(|d| d == "noindex" || d == "none") {
            issues.push(
                issue(Severity::Critical, format!("Robots meta blocks indexing ({})", robots))
                    .recommend("Remove noindex from public marketing pages"),
            );
        }
    }
    if !present(&meta.viewport) {
        issues.push(issue(Severity::High, "No viewport meta tag; page is not mobile-friendly"));
    }
    if !present(&meta.lang) {
        issues.push(issue(Severity::Low, "No lang attribute on <html>"));
    }
    if !present(&meta.favicon) {
        issues.push(issue(Severity::Low, "No favicon"));
    }

    finding(SeoAspect::Technical, issues)
}

fn check_headings(doc: &SeoDocument) -> SeoFinding {
    let h1s: Vec<&str> = doc.h1s().collect();
    let mut issues = Vec::new();

    match h1s.len() {
        0 => issues.push(issue(Severity::Critical, "Page has no H1")),
        1 => {}
        n => issues.push(issue(Severity::High, format!("Page has {} H1 headings; use exactly one", n))),
    }

    if let Some(h1) = h1s.first() {
        let len = h1.chars().count();
        if outside(len, H1_CHARS) {
            issues.push(issue(Severity::Low, format!("H1 is {} characters; aim for 20-70", len)));
        }
        if doc.count_level(2) == 0 {
            issues.push(issue(Severity::Medium, "No H2 headings structure the content"));
        }
    }

    finding(SeoAspect::Headings, issues)
}

fn check_schema(doc: &SeoDocument, category: UrlCategory) -> SeoFinding {
    let mut issues = Vec::new();

    if !doc.has_json_ld {
        issues.push(issue(Severity::Medium, "No JSON-LD structured data"));
    } else {
        let expected = category.expected_schema_types();
        if !expected.is_empty() && !doc.schema_types.iter().any(|t| expected.contains(&t.as_str())) {
            issues.push(
                issue(
                    Severity::Low,
                    format!(
                        "Structured data ({}) does not match a {} page",
                        doc.schema_types.join(", "),
                        category
                    ),
                )
                .recommend(format!("Add one of: {}", expected.join(", "))),
            );
        }
    }

    finding(SeoAspect::Schema, issues)
}

fn check_images(doc: &SeoDocument) -> SeoFinding {
    let total = doc.images.len();
    let with_alt = doc.images.iter().filter(|img| img.has_alt()).count();

    let mut issues = Vec::new();
    if with_alt < total {
        issues.push(issue(
            Severity::Medium,
            format!("{} of {} images have no alt text", total - with_alt, total),
        ));
    }

    SeoFinding {
        aspect: SeoAspect::Images,
        score: ratio_score(with_alt, total),
        issues,
    }
}

/// Analyze a parsed page. Pure.
pub fn analyze_seo(doc: &SeoDocument, category: UrlCategory) -> SeoReport {
    let findings = vec![
        check_title(doc),
        check_description(doc),
        check_open_graph(doc),
        check_twitter(doc),
        check_technical(doc),
        check_headings(doc),
        check_schema(doc, category),
        check_images(doc),
    ];

    let composite: f64 = findings
        .iter()
        .map(|f| f.aspect.weight() * f64::from(f.score))
        .sum();
    let score = composite.round().clamp(0.0, 100.0) as u8;

    debug!(score, category = %category, "SEO analysis complete");

    SeoReport {
        score,
        category,
        findings,
        links: LinkSummary {
            internal: doc.internal_link_count(),
            external: doc.external_link_count(),
        },
    }
}

impl SeoIssue {
    fn recommend(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPLETE: &str = r#"<!DOCTYPE html><html lang="en"><head>
<title>Summer Offers at Example Hotels Dubai Marina</title>
<meta name="description" content="Book three nights and pay for two at Example Hotels Dubai Marina. Discover pool cabanas, dining credit and late checkout.">
<meta name="viewport" content="width=device-width, initial-scale=1">
<meta name="robots" content="index, follow">
<link rel="canonical" href="https://example.com/offers/summer">
<link rel="icon" href="/favicon.ico">
<meta property="og:title" content="Summer Offers">
<meta property="og:description" content="Three nights for two">
<meta property="og:image" content="https://example.com/og.jpg">
<meta property="og:url" content="https://example.com/offers/summer">
<meta property="og:type" content="website">
<meta name="twitter:card" content="summary_large_image">
<meta name="twitter:title" content="Summer Offers">
<meta name="twitter:description" content="Three nights for two">
<meta name="twitter:image" content="https://example.com/og.jpg">
<script type="application/ld+json">{"@type":"Offer"}</script>
</head><body>
<h1>Summer Offers in Dubai Marina</h1>
<h2>What is included</h2>
<img src="/pool.jpg" alt="Rooftop pool">
</body></html>"#;

    fn aspect(report: &SeoReport, aspect: SeoAspect) -> &SeoFinding {
        report.finding(aspect).unwrap()
    }

    #[test]
    fn test_complete_page_scores_100() {
        let report = analyze_seo(&SeoDocument::parse(COMPLETE), UrlCategory::Product);

        assert_eq!(report.issue_count(), 0, "{:?}", report.findings);
        assert_eq!(report.score, 100);
    }

    #[test]
    fn test_bare_page() {
        let report = analyze_seo(&SeoDocument::parse("<html><body></body></html>"), UrlCategory::General);

        assert_eq!(aspect(&report, SeoAspect::Title).score, 80);
        assert_eq!(aspect(&report, SeoAspect::Description).score, 90);
        assert_eq!(aspect(&report, SeoAspect::OpenGraph).score, 0);
        assert_eq!(aspect(&report, SeoAspect::Twitter).score, 92);
        assert_eq!(aspect(&report, SeoAspect::Technical).score, 81);
        assert_eq!(aspect(&report, SeoAspect::Headings).score, 80);
        assert_eq!(aspect(&report, SeoAspect::Schema).score, 95);
        assert_eq!(aspect(&report, SeoAspect::Images).score, 100);
        assert_eq!(report.score, 78);
    }

    #[test]
    fn test_noindex_is_critical() {
        let html = r#"<html><head><meta name="robots" content="NOINDEX, nofollow"></head></html>"#;
        let report = analyze_seo(&SeoDocument::parse(html), UrlCategory::General);

        assert!(aspect(&report, SeoAspect::Technical)
            .issues
            .iter()
            .any(|i| i.severity == Severity::Critical));
    }

    #[test]
    fn test_multiple_h1_is_high() {
        let html = "<h1>Summer Offers in Dubai Marina</h1><h1>Another heading here</h1><h2>x</h2>";
        let report = analyze_seo(&SeoDocument::parse(html), UrlCategory::General);
        let headings = aspect(&report, SeoAspect::Headings);

        assert_eq!(headings.issues.len(), 1);
        assert_eq!(headings.issues[0].severity, Severity::High);
    }

    #[test]
    fn test_schema_category_mismatch_is_low() {
        let html = r#"<script type="application/ld+json">{"@type":"Organization"}</script>"#;
        let report = analyze_seo(&SeoDocument::parse(html), UrlCategory::Article);
        let schema = aspect(&report, SeoAspect::Schema);

        assert_eq!(schema.issues.len(), 1);
        assert_eq!(schema.issues[0].severity, Severity::Low);
        assert_eq!(schema.score, 98);
    }

    #[test]
    fn test_image_alt_coverage_ratio() {
        let html = r#"<img src="a.png" alt="A"><img src="b.png"><img src="c.png" alt=" "><img src="d.png" alt="D">"#;
        let report = analyze_seo(&SeoDocument::parse(html), UrlCategory::General);

        assert_eq!(aspect(&report, SeoAspect::Images).score, 50);
    }

    #[test]
    fn test_description_call_to_action() {
        assert!(contains_word("book your stay", "book"));
        assert!(!contains_word("our guidebook", "book"));
        assert!(contains_word("please sign up today", "sign up"));
    }
}
