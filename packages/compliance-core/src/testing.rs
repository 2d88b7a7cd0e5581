//! Mock collaborators for tests.
//!
//! Each mock returns queued responses in order and records every call so
//! tests can assert on how the checker and acquirer used it.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::acquisition::content::extract_page;
use crate::acquisition::{AcquiredPage, AcquisitionMethod, Acquirer, AttemptOutcome, ScrapeAttempt};
use crate::collaborators::{
    AssistedExtractor, AssistedStrategy, ExtractedPage, GrammarToneAnalyzer, SeoAdvice, SeoAdvisor,
    ToneAnalysisResult,
};
use crate::error::{AcquisitionError, AcquisitionResult, CollaboratorError, CollaboratorResult};
use crate::seo::{SeoReport, UrlCategory};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// =============================================================================
// Mock Grammar / Tone Analyzer
// =============================================================================

/// Arguments captured from an analyze call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzeCall {
    pub text: String,
    pub language: String,
}

#[derive(Default)]
pub struct MockGrammarAnalyzer {
    responses: Mutex<Vec<Result<ToneAnalysisResult, String>>>,
    calls: Mutex<Vec<AnalyzeCall>>,
    latency: Option<Duration>,
}

impl MockGrammarAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful result
    pub fn with_result(self, result: ToneAnalysisResult) -> Self {
        lock(&self.responses).push(Ok(result));
        self
    }

    /// Queue an API failure
    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.responses).push(Err(message.into()));
        self
    }

    /// Sleep this long before answering, like a remote model would
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<AnalyzeCall> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

#[async_trait]
impl GrammarToneAnalyzer for MockGrammarAnalyzer {
    async fn analyze(&self, text: &str, language: &str) -> CollaboratorResult<ToneAnalysisResult> {
        lock(&self.calls).push(AnalyzeCall {
            text: text.to_string(),
            language: language.to_string(),
        });

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let mut responses = lock(&self.responses);
        if responses.is_empty() {
            return Ok(ToneAnalysisResult::default());
        }
        responses.remove(0).map_err(CollaboratorError::Api)
    }
}

// =============================================================================
// Mock SEO Advisor
// =============================================================================

#[derive(Default)]
pub struct MockSeoAdvisor {
    responses: Mutex<Vec<Result<SeoAdvice, String>>>,
    calls: Mutex<Vec<(u8, UrlCategory)>>,
}

impl MockSeoAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_advice(self, advice: SeoAdvice) -> Self {
        lock(&self.responses).push(Ok(advice));
        self
    }

    pub fn with_failure(self, message: impl Into<String>) -> Self {
        lock(&self.responses).push(Err(message.into()));
        self
    }

    /// (report score, category) per call
    pub fn calls(&self) -> Vec<(u8, UrlCategory)> {
        lock(&self.calls).clone()
    }
}

#[async_trait]
impl SeoAdvisor for MockSeoAdvisor {
    async fn advise(&self, report: &SeoReport, category: UrlCategory) -> CollaboratorResult<SeoAdvice> {
        lock(&self.calls).push((report.score, category));

        let mut responses = lock(&self.responses);
        if responses.is_empty() {
            return Ok(SeoAdvice::default());
        }
        responses.remove(0).map_err(CollaboratorError::Api)
    }
}

// =============================================================================
// Mock Assisted Extractor
// =============================================================================

/// Extractor with a fixed response per strategy. Strategies without a
/// configured response fail with an empty-result error.
#[derive(Default)]
pub struct MockAssistedExtractor {
    responses: Mutex<HashMap<AssistedStrategy, Result<ExtractedPage, String>>>,
    calls: Mutex<Vec<(String, AssistedStrategy)>>,
}

impl MockAssistedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, strategy: AssistedStrategy, page: ExtractedPage) -> Self {
        lock(&self.responses).insert(strategy, Ok(page));
        self
    }

    pub fn with_failure(self, strategy: AssistedStrategy, message: impl Into<String>) -> Self {
        lock(&self.responses).insert(strategy, Err(message.into()));
        self
    }

    pub fn calls(&self) -> Vec<(String, AssistedStrategy)> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn strategies_tried(&self) -> Vec<AssistedStrategy> {
        lock(&self.calls).iter().map(|(_, s)| *s).collect()
    }
}

#[async_trait]
impl AssistedExtractor for MockAssistedExtractor {
    async fn extract(&self, url: &str, strategy: AssistedStrategy) -> CollaboratorResult<ExtractedPage> {
        lock(&self.calls).push((url.to_string(), strategy));

        match lock(&self.responses).get(&strategy) {
            Some(Ok(page)) => Ok(page.clone()),
            Some(Err(message)) => Err(CollaboratorError::Api(message.clone())),
            None => Err(CollaboratorError::Empty(format!("no mock page for {}", strategy))),
        }
    }
}

// =============================================================================
// Mock Acquirer
// =============================================================================

/// Acquirer returning queued results. When the queue is empty it behaves
/// like a site whose automated tiers are all exhausted.
#[derive(Default)]
pub struct MockAcquirer {
    responses: Mutex<Vec<AcquisitionResult<AcquiredPage>>>,
    calls: Mutex<Vec<String>>,
}

impl MockAcquirer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a directly fetched page built from `html`
    pub fn with_html(self, url: &str, html: &str) -> Self {
        lock(&self.responses).push(Ok(direct_page(url, html)));
        self
    }

    pub fn with_page(self, page: AcquiredPage) -> Self {
        lock(&self.responses).push(Ok(page));
        self
    }

    pub fn with_error(self, error: AcquisitionError) -> Self {
        lock(&self.responses).push(Err(error));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn was_acquired(&self, url: &str) -> bool {
        lock(&self.calls).iter().any(|u| u == url)
    }
}

#[async_trait]
impl Acquirer for MockAcquirer {
    async fn acquire(&self, url: &str) -> AcquisitionResult<AcquiredPage> {
        lock(&self.calls).push(url.to_string());

        let mut responses = lock(&self.responses);
        if responses.is_empty() {
            return Err(AcquisitionError::TiersExhausted {
                url: url.to_string(),
                final_reason: "mock acquirer has no queued response".to_string(),
                attempts: vec![],
            });
        }
        responses.remove(0)
    }
}

/// A page as the direct tier would have produced it.
pub fn direct_page(url: &str, html: &str) -> AcquiredPage {
    let (metadata, text) = extract_page(html);
    AcquiredPage {
        url: url.to_string(),
        final_url: url.to_string(),
        html: Some(html.to_string()),
        text,
        metadata,
        method: AcquisitionMethod::Direct,
        attempts: vec![ScrapeAttempt {
            tier: 1,
            strategy: "direct".to_string(),
            outcome: AttemptOutcome::Succeeded,
            elapsed_ms: 0,
        }],
    }
}
