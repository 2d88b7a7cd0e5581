//! Check orchestration.
//!
//! A check resolves its subject into the text the rule engine scans and
//! the markup the validators scan, runs every branch concurrently, tags
//! each issue with its language audience using sections computed on the
//! same content the branch scanned, and aggregates.
//!
//! The rule engine and validators are CPU-bound and run on the blocking
//! pool, so a slow generative analyzer overlaps them instead of waiting
//! behind them. Section labels follow the detected primary language, so a
//! `Primary` tag always means the first reported language.

use std::sync::Arc;

use chrono::Utc;
use lazy_static::lazy_static;
use regex::Regex;
use tokio::task::{spawn_blocking, JoinError};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::acquisition::content::extract_page;
use crate::acquisition::{AcquisitionMethod, Acquirer, TieredAcquirer};
use crate::aggregator::{apply_url_exclusions, Aggregation};
use crate::bilingual::{
    detect_languages, group_by_language, split_sections, tag_issue_with, tag_issues, ContextStrategy,
    MatchedTextStrategy, Script, Sections, TaggingStrategy,
};
use crate::collaborators::{
    advise_or_degrade, analyze_or_degrade, AssistedExtractor, GrammarToneAnalyzer, NoopAnalyzer,
    ResultStore, SeoAdvice, SeoAdvisor,
};
use crate::config::{AcquisitionConfig, CheckConfig};
use crate::error::{AcquisitionResult, CheckError};
use crate::rules::{check_merge_fields, check_numerical_formatting, check_weak_cta, RuleEngine};
use crate::seo::{analyze_seo, SeoDocument, SeoReport, UrlCategory};
use crate::text::strip_markup;
use crate::types::{AcquisitionSummary, CheckTarget, ComplianceReport, ContentType, Issue, LanguageTag};
use crate::validators::{validate_images, validate_links_with, LinkValidationOptions};

lazy_static! {
    static ref MARKUP_TAG: Regex = Regex::new(r"<[a-zA-Z][^>]*>").unwrap();
}

/// Collaborator issues carry no offsets, so only snippet-based strategies apply.
const COLLABORATOR_STRATEGIES: [&dyn TaggingStrategy; 2] = [&ContextStrategy, &MatchedTextStrategy];

/// Template content to check.
#[derive(Debug, Clone)]
pub struct CheckRequest {
    pub content: String,
    pub content_type: ContentType,
}

impl CheckRequest {
    pub fn new(content: impl Into<String>, content_type: ContentType) -> Self {
        Self {
            content: content.into(),
            content_type,
        }
    }
}

/// What one check scans.
struct Subject<'a> {
    target: CheckTarget,
    content_type: &'a ContentType,
    /// Scanned by the rule engine and the specialized checks
    text: &'a str,
    /// Scanned by the link and image validators and the SEO analyzer
    markup: Option<&'a str>,
    /// Page URL for SEO link classification and category inference
    page_url: Option<&'a str>,
    acquisition: Option<AcquisitionSummary>,
}

/// The rule engine and validator branches, owned so they can move onto the
/// blocking pool.
#[derive(Clone)]
struct LocalChecks {
    rules: Arc<RuleEngine>,
    config: Arc<CheckConfig>,
    content_type: ContentType,
    primary: Script,
    is_bilingual: bool,
}

impl LocalChecks {
    /// Rules and specialized checks over `text`, tagged against sections of
    /// `text`. The sections are returned for tagging collaborator issues.
    fn scan_text(&self, text: &str) -> (Vec<Issue>, Sections) {
        let mut issues = self.rules.evaluate(text, &self.content_type);
        issues.extend(check_numerical_formatting(text));
        issues.extend(check_weak_cta(text));
        issues.extend(check_merge_fields(
            text,
            &self.config.merge_field_whitelist,
            self.config.windows.merge_field_context_radius,
        ));

        let sections = split_sections(text).with_primary(self.primary);
        tag_issues(&mut issues, &sections, text, self.is_bilingual);
        (issues, sections)
    }

    /// Link and image validation, tagged against sections of the markup.
    fn scan_markup(&self, html: &str) -> Vec<Issue> {
        let options = LinkValidationOptions::from_config(&self.config);
        let mut issues = validate_links_with(html, self.primary, &options);
        issues.extend(validate_images(html));

        if !issues.is_empty() {
            let sections = split_sections(html).with_primary(self.primary);
            tag_issues(&mut issues, &sections, html, self.is_bilingual);
        }
        issues
    }
}

fn branch_failed(check_id: Uuid, branch: &str, error: JoinError) {
    warn!(check_id = %check_id, branch, error = %error, "Local check branch failed");
}

/// Runs compliance checks. Cheap to share behind an `Arc`.
pub struct ComplianceChecker {
    rules: Arc<RuleEngine>,
    analyzer: Arc<dyn GrammarToneAnalyzer>,
    seo_advisor: Option<Arc<dyn SeoAdvisor>>,
    acquirer: Arc<dyn Acquirer>,
    store: Option<Arc<dyn ResultStore>>,
    config: Arc<CheckConfig>,
}

impl ComplianceChecker {
    pub fn builder() -> ComplianceCheckerBuilder {
        ComplianceCheckerBuilder::default()
    }

    /// Rule engine handle. Reloading it affects subsequent checks only.
    pub fn rules(&self) -> &Arc<RuleEngine> {
        &self.rules
    }

    pub fn config(&self) -> &CheckConfig {
        &self.config
    }

    /// Check an uploaded template.
    pub async fn check_template(&self, request: CheckRequest) -> ComplianceReport {
        info!(content_type = %request.content_type, bytes = request.content.len(), "Checking template");

        self.run(Subject {
            target: CheckTarget::Template {
                content_type: request.content_type.clone(),
            },
            content_type: &request.content_type,
            text: &request.content,
            markup: Some(&request.content),
            page_url: None,
            acquisition: None,
        })
        .await
    }

    /// Acquire a public page and check it.
    pub async fn check_url(&self, url: &str, content_type: ContentType) -> Result<ComplianceReport, CheckError> {
        info!(url = %url, content_type = %content_type, "Checking URL");

        let page = match self.acquirer.acquire(url).await {
            Ok(page) => page,
            Err(e) => {
                warn!(url = %url, code = e.code(), error = %e, "Could not acquire page");
                return Err(e.into());
            }
        };

        let acquisition = AcquisitionSummary {
            method: page.method,
            final_url: page.final_url.clone(),
            attempts: page.attempts.clone(),
        };

        Ok(self
            .run(Subject {
                target: CheckTarget::Url {
                    url: url.to_string(),
                    content_type: content_type.clone(),
                },
                content_type: &content_type,
                text: &page.text,
                markup: page.html.as_deref(),
                page_url: Some(&page.final_url),
                acquisition: Some(acquisition),
            })
            .await)
    }

    /// Check page content the user pasted after automated acquisition
    /// failed. Markup gets the full URL treatment, plain text only the
    /// text branches.
    pub async fn check_manual_content(&self, url: &str, content: &str, content_type: ContentType) -> ComplianceReport {
        info!(url = %url, bytes = content.len(), "Checking manually supplied content");

        let is_markup = MARKUP_TAG.is_match(content);
        let text = if is_markup {
            extract_page(content).1
        } else {
            content.to_string()
        };

        self.run(Subject {
            target: CheckTarget::ManualContent {
                url: url.to_string(),
                content_type: content_type.clone(),
            },
            content_type: &content_type,
            text: &text,
            markup: is_markup.then_some(content),
            page_url: Some(url),
            acquisition: Some(AcquisitionSummary {
                method: AcquisitionMethod::Manual,
                final_url: url.to_string(),
                attempts: vec![],
            }),
        })
        .await
    }

    async fn seo(&self, markup: Option<&str>, page_url: Option<&str>) -> Option<(SeoReport, Option<SeoAdvice>)> {
        let (html, url) = (markup?, page_url?);

        let doc = SeoDocument::parse_with_base(html, url);
        let category = UrlCategory::infer(url, &doc);
        let report = analyze_seo(&doc, category);

        let advice = match &self.seo_advisor {
            Some(advisor) => advise_or_degrade(advisor.as_ref(), &report, category).await,
            None => None,
        };
        Some((report, advice))
    }

    async fn run(&self, subject: Subject<'_>) -> ComplianceReport {
        let started_at = Utc::now();
        let id = Uuid::new_v4();
        let Subject {
            target,
            content_type,
            text,
            markup,
            page_url,
            acquisition,
        } = subject;

        let detected = detect_languages(markup.unwrap_or(text));
        let language = if detected.is_bilingual {
            detected.codes().join("+")
        } else {
            detected.primary().code().to_string()
        };
        debug!(check_id = %id, languages = ?detected.codes(), "Detected languages");

        let local = LocalChecks {
            rules: self.rules.clone(),
            config: self.config.clone(),
            content_type: content_type.clone(),
            primary: detected.primary(),
            is_bilingual: detected.is_bilingual,
        };
        let owned_text: Arc<str> = Arc::from(text);

        // Spawned before anything is awaited, so they run while the
        // analyzer call is in flight.
        let text_branch = {
            let (local, text) = (local.clone(), owned_text.clone());
            spawn_blocking(move || local.scan_text(&text))
        };
        let markup_branch = {
            let markup: Option<Arc<str>> = markup.map(Arc::from);
            spawn_blocking(move || markup.map(|html| local.scan_markup(&html)).unwrap_or_default())
        };
        let tone_branch = async {
            let plain = match spawn_blocking(move || strip_markup(&owned_text)).await {
                Ok(plain) => plain,
                Err(e) => {
                    branch_failed(id, "tone_input", e);
                    String::new()
                }
            };
            analyze_or_degrade(self.analyzer.as_ref(), &plain, &language).await
        };
        let seo_branch = self.seo(markup, page_url);

        let (text_result, markup_result, tone, seo) =
            tokio::join!(text_branch, markup_branch, tone_branch, seo_branch);

        let (text_issues, text_sections) = text_result.unwrap_or_else(|e| {
            branch_failed(id, "text", e);
            (Vec::new(), split_sections(text).with_primary(detected.primary()))
        });
        let mut markup_issues = markup_result.unwrap_or_else(|e| {
            branch_failed(id, "markup", e);
            Vec::new()
        });

        let mut collaborator_issues: Vec<Issue> = tone.grammar_issues.into_iter().chain(tone.brand_issues).collect();
        tag_collaborator_issues(&mut collaborator_issues, &text_sections, text, detected.is_bilingual);

        let mut issues = text_issues;
        issues.append(&mut markup_issues);
        issues.append(&mut collaborator_issues);

        if target.is_url_mode() {
            issues = apply_url_exclusions(issues, &self.config.url_exclusions);
        }

        let language_counts = detected
            .is_bilingual
            .then(|| group_by_language(&issues).counts());
        let aggregation = Aggregation::from_issues(issues);
        let (seo, seo_advice) = match seo {
            Some((report, advice)) => (Some(report), advice),
            None => (None, None),
        };

        let report = ComplianceReport {
            id,
            category_scores: target.is_url_mode().then_some(aggregation.category_scores),
            target,
            languages: detected.codes(),
            is_bilingual: detected.is_bilingual,
            issues: aggregation.issues,
            severity_counts: aggregation.counts,
            score: aggregation.score,
            language_counts,
            suggestions: tone.suggestions,
            tone: tone.tone_analysis,
            seo,
            seo_advice,
            acquisition,
            started_at,
            completed_at: Utc::now(),
        };

        info!(
            check_id = %report.id,
            score = report.score,
            issues = report.issue_count(),
            critical = report.severity_counts.critical,
            "Compliance check complete"
        );

        if let Some(store) = &self.store {
            if let Err(e) = store.put(report.clone()).await {
                warn!(check_id = %report.id, error = %e, "Failed to store report");
            }
        }

        report
    }
}

fn tag_collaborator_issues(issues: &mut [Issue], sections: &Sections, content: &str, is_bilingual: bool) {
    for issue in issues.iter_mut() {
        issue.language = if is_bilingual {
            tag_issue_with(&COLLABORATOR_STRATEGIES, issue, sections, content)
        } else {
            LanguageTag::Primary
        };
    }
}

/// Builder for [`ComplianceChecker`]. Everything is optional: the default
/// checker uses the built-in rules, no generative analysis, a direct-only
/// acquirer and no storage.
#[derive(Default)]
pub struct ComplianceCheckerBuilder {
    rules: Option<Arc<RuleEngine>>,
    analyzer: Option<Arc<dyn GrammarToneAnalyzer>>,
    seo_advisor: Option<Arc<dyn SeoAdvisor>>,
    acquirer: Option<Arc<dyn Acquirer>>,
    extractor: Option<Arc<dyn AssistedExtractor>>,
    acquisition: AcquisitionConfig,
    store: Option<Arc<dyn ResultStore>>,
    config: CheckConfig,
}

impl ComplianceCheckerBuilder {
    pub fn rules(mut self, rules: Arc<RuleEngine>) -> Self {
        self.rules = Some(rules);
        self
    }

    pub fn analyzer(mut self, analyzer: Arc<dyn GrammarToneAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn seo_advisor(mut self, advisor: Arc<dyn SeoAdvisor>) -> Self {
        self.seo_advisor = Some(advisor);
        self
    }

    /// Use a custom acquirer. Overrides `assisted_extractor` and
    /// `acquisition_config`.
    pub fn acquirer(mut self, acquirer: Arc<dyn Acquirer>) -> Self {
        self.acquirer = Some(acquirer);
        self
    }

    /// Enable the assisted tier of the default acquirer.
    pub fn assisted_extractor(mut self, extractor: Arc<dyn AssistedExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    pub fn acquisition_config(mut self, config: AcquisitionConfig) -> Self {
        self.acquisition = config;
        self
    }

    pub fn store(mut self, store: Arc<dyn ResultStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn config(mut self, config: CheckConfig) -> Self {
        self.config = config;
        self
    }

    /// Fails only if the default acquirer's HTTP client cannot be built.
    pub fn build(self) -> AcquisitionResult<ComplianceChecker> {
        let acquirer: Arc<dyn Acquirer> = match self.acquirer {
            Some(acquirer) => acquirer,
            None => {
                let mut tiered = TieredAcquirer::new(self.acquisition)?;
                if let Some(extractor) = self.extractor {
                    tiered = tiered.with_extractor(extractor);
                }
                Arc::new(tiered)
            }
        };

        Ok(ComplianceChecker {
            rules: self
                .rules
                .unwrap_or_else(|| Arc::new(RuleEngine::with_default_rules())),
            analyzer: self.analyzer.unwrap_or_else(|| Arc::new(NoopAnalyzer)),
            seo_advisor: self.seo_advisor,
            acquirer,
            store: self.store,
            config: Arc::new(self.config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockAcquirer;

    fn checker() -> ComplianceChecker {
        ComplianceChecker::builder()
            .acquirer(Arc::new(MockAcquirer::new()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_empty_template_scores_100() {
        let report = checker().check_template(CheckRequest::new("", ContentType::Edm)).await;

        assert_eq!(report.score, 100);
        assert_eq!(report.issue_count(), 0);
        assert!(report.category_scores.is_none());
        assert!(report.seo.is_none());
    }

    #[tokio::test]
    async fn test_whitespace_template_scores_100() {
        let report = checker()
            .check_template(CheckRequest::new("   \n\t ", ContentType::Edm))
            .await;

        assert_eq!(report.score, 100);
        assert_eq!(report.languages, vec!["en"]);
        assert!(!report.is_bilingual);
    }

    #[tokio::test]
    async fn test_template_single_language_tags_primary() {
        let html = "<p>Pay AED500 today</p>";
        let report = checker().check_template(CheckRequest::new(html, ContentType::Edm)).await;

        assert!(report.sorted_issues().iter().all(|i| i.language == LanguageTag::Primary));
        assert!(report.language_counts.is_none());
    }

    #[tokio::test]
    async fn test_leading_arabic_block_is_primary() {
        let html = "<div dir=\"rtl\"><p>ادفع AED750 اليوم</p></div>\n<div><p>Pay USD500 today.</p></div>";
        let report = checker().check_template(CheckRequest::new(html, ContentType::Edm)).await;

        assert!(report.is_bilingual);
        assert_eq!(report.languages, vec!["ar", "en"]);

        let issues = report.sorted_issues();
        let tag_of = |original: &str| {
            issues
                .iter()
                .find(|i| i.rule_id == "numerical_currency_spacing" && i.original == original)
                .map(|i| i.language)
        };
        assert_eq!(tag_of("AED750"), Some(LanguageTag::Primary));
        assert_eq!(tag_of("USD500"), Some(LanguageTag::Secondary));
    }

    #[tokio::test]
    async fn test_declared_language_sets_primary_tag() {
        let html = "<html lang=\"en\"><body><p>ادفع AED750 اليوم</p>\n<p>Pay USD500 today.</p></body></html>";
        let report = checker().check_template(CheckRequest::new(html, ContentType::Edm)).await;

        assert_eq!(report.languages, vec!["en", "ar"]);
        let issues = report.sorted_issues();
        let usd = issues.iter().find(|i| i.original == "USD500").unwrap();
        let aed = issues.iter().find(|i| i.original == "AED750").unwrap();
        assert_eq!(usd.language, LanguageTag::Primary);
        assert_eq!(aed.language, LanguageTag::Secondary);
    }

    #[test]
    fn test_markup_detection() {
        assert!(MARKUP_TAG.is_match("<p>Hello</p>"));
        assert!(!MARKUP_TAG.is_match("Prices < 500 and > 100"));
    }
}
