//! External collaborators: generative analysis, assisted extraction and
//! result storage.
//!
//! Each seam is an `async_trait` so the checker can be wired with real
//! clients in production and with mocks (see [`crate::testing`]) in tests.

pub mod memory_store;
pub mod openai;

pub use memory_store::MemoryResultStore;
pub use openai::OpenAiCollaborator;

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::error::CollaboratorResult;
use crate::seo::{SeoReport, UrlCategory};
use crate::types::{ComplianceReport, Issue};

// =============================================================================
// Grammar / tone
// =============================================================================

/// Tone assessment of a piece of copy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ToneAnalysis {
    /// e.g. "friendly", "urgent", "formal"
    pub overall_tone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formality: Option<String>,
    /// 0-100 fit with brand voice
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_alignment: Option<u8>,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// Output of the grammar/tone collaborator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ToneAnalysisResult {
    pub grammar_issues: Vec<Issue>,
    pub brand_issues: Vec<Issue>,
    pub tone_analysis: Option<ToneAnalysis>,
    pub suggestions: Vec<String>,
}

impl ToneAnalysisResult {
    pub fn is_empty(&self) -> bool {
        self.grammar_issues.is_empty()
            && self.brand_issues.is_empty()
            && self.tone_analysis.is_none()
            && self.suggestions.is_empty()
    }
}

#[async_trait]
pub trait GrammarToneAnalyzer: Send + Sync {
    /// Analyze `text`. `language` is a language code such as "en" or "ar",
    /// or "en+ar" for bilingual content.
    async fn analyze(&self, text: &str, language: &str) -> CollaboratorResult<ToneAnalysisResult>;
}

/// Analyzer that finds nothing. Used when no generative backend is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAnalyzer;

#[async_trait]
impl GrammarToneAnalyzer for NoopAnalyzer {
    async fn analyze(&self, _text: &str, _language: &str) -> CollaboratorResult<ToneAnalysisResult> {
        Ok(ToneAnalysisResult::default())
    }
}

/// Run the analyzer, degrading any failure to an empty result.
pub async fn analyze_or_degrade(
    analyzer: &dyn GrammarToneAnalyzer,
    text: &str,
    language: &str,
) -> ToneAnalysisResult {
    if text.trim().is_empty() {
        return ToneAnalysisResult::default();
    }
    match analyzer.analyze(text, language).await {
        Ok(result) => result,
        Err(e) => {
            warn!(error = %e, language = %language, "Grammar/tone analysis failed, continuing without it");
            ToneAnalysisResult::default()
        }
    }
}

// =============================================================================
// SEO advice
// =============================================================================

/// Generative SEO recommendations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeoAdvice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_suggestion: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description_suggestion: Option<String>,
    #[serde(default)]
    pub keyword_opportunities: Vec<String>,
    #[serde(default)]
    pub content_suggestions: Vec<String>,
    #[serde(default)]
    pub schema_suggestions: Vec<String>,
}

impl SeoAdvice {
    pub fn is_empty(&self) -> bool {
        self == &SeoAdvice::default()
    }
}

#[async_trait]
pub trait SeoAdvisor: Send + Sync {
    async fn advise(&self, report: &SeoReport, category: UrlCategory) -> CollaboratorResult<SeoAdvice>;
}

/// Ask the advisor, degrading failures to `None`.
pub async fn advise_or_degrade(
    advisor: &dyn SeoAdvisor,
    report: &SeoReport,
    category: UrlCategory,
) -> Option<SeoAdvice> {
    match advisor.advise(report, category).await {
        Ok(advice) if !advice.is_empty() => Some(advice),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, "SEO advice failed, continuing without it");
            None
        }
    }
}

// =============================================================================
// Assisted extraction
// =============================================================================

/// Strategy used by the assisted-extraction tier, tried in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssistedStrategy {
    /// Ask the model to read the URL directly
    DirectContext,
    /// Ask a search-grounded model to find and summarize the page
    SearchGrounded,
}

impl AssistedStrategy {
    pub const ORDER: [AssistedStrategy; 2] = [AssistedStrategy::DirectContext, AssistedStrategy::SearchGrounded];

    pub fn as_str(self) -> &'static str {
        match self {
            AssistedStrategy::DirectContext => "direct_context",
            AssistedStrategy::SearchGrounded => "search_grounded",
        }
    }
}

impl fmt::Display for AssistedStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Page content recovered by the assisted tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedPage {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub meta_description: Option<String>,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub links: Vec<String>,
    #[serde(default)]
    pub body_text: String,
}

#[async_trait]
pub trait AssistedExtractor: Send + Sync {
    async fn extract(&self, url: &str, strategy: AssistedStrategy) -> CollaboratorResult<ExtractedPage>;
}

// =============================================================================
// Result store
// =============================================================================

/// Persistence for completed reports. Reports are write-once.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn put(&self, report: ComplianceReport) -> CollaboratorResult<()>;

    async fn get(&self, id: Uuid) -> CollaboratorResult<Option<ComplianceReport>>;

    /// Most recent reports first.
    async fn recent(&self, limit: usize) -> CollaboratorResult<Vec<ComplianceReport>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollaboratorError;

    struct FailingAnalyzer;

    #[async_trait]
    impl GrammarToneAnalyzer for FailingAnalyzer {
        async fn analyze(&self, _text: &str, _language: &str) -> CollaboratorResult<ToneAnalysisResult> {
            Err(CollaboratorError::Network("connection reset".into()))
        }
    }

    #[tokio::test]
    async fn test_analyzer_failure_degrades_to_empty() {
        let result = analyze_or_degrade(&FailingAnalyzer, "Some copy", "en").await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_noop_analyzer() {
        let result = analyze_or_degrade(&NoopAnalyzer, "Some copy", "en").await;
        assert_eq!(result, ToneAnalysisResult::default());
    }

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            AssistedStrategy::ORDER,
            [AssistedStrategy::DirectContext, AssistedStrategy::SearchGrounded]
        );
    }
}
