//! The tiered acquirer: direct fetch, then assisted extraction, then manual.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use super::classify::{classify_failure, FailureClass, FetchFailure};
use super::content::extract_page;
use super::direct::DirectFetcher;
use super::{AcquiredPage, AcquisitionMethod, Acquirer, AttemptOutcome, PageMetadata, ScrapeAttempt};
use crate::collaborators::{AssistedExtractor, AssistedStrategy, ExtractedPage};
use crate::config::AcquisitionConfig;
use crate::error::{AcquisitionError, AcquisitionResult, CollaboratorError};

/// Add `https://` when no scheme is present and validate the result.
pub fn normalize_url(url: &str) -> AcquisitionResult<Url> {
    let trimmed = url.trim();
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let parsed = Url::parse(&candidate).map_err(|_| AcquisitionError::InvalidUrl { url: url.to_string() })?;
    if parsed.host_str().is_none() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(AcquisitionError::InvalidUrl { url: url.to_string() });
    }
    Ok(parsed)
}

fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

/// Direct fetch with escalation to an assisted extractor on bot defenses.
pub struct TieredAcquirer {
    direct: DirectFetcher,
    extractor: Option<Arc<dyn AssistedExtractor>>,
    config: AcquisitionConfig,
}

impl TieredAcquirer {
    pub fn new(config: AcquisitionConfig) -> AcquisitionResult<Self> {
        let direct = DirectFetcher::new(config.clone())?;
        Ok(Self {
            direct,
            extractor: None,
            config,
        })
    }

    /// Enable tier 2. Without an extractor, defense-triggered failures go
    /// straight to manual fallback.
    pub fn with_extractor(mut self, extractor: Arc<dyn AssistedExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    async fn try_direct(&self, url: &Url) -> Result<AcquiredPage, (FetchFailure, FailureClass, ScrapeAttempt)> {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.config.timeout, self.direct.fetch(url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchFailure::Timeout),
        };

        match result {
            Ok(document) => {
                let (metadata, text) = extract_page(&document.html);
                let attempt = ScrapeAttempt {
                    tier: 1,
                    strategy: "direct".to_string(),
                    outcome: AttemptOutcome::Succeeded,
                    elapsed_ms: elapsed_ms(start),
                };
                Ok(AcquiredPage {
                    url: url.to_string(),
                    final_url: document.final_url,
                    html: Some(document.html),
                    text,
                    metadata,
                    method: AcquisitionMethod::Direct,
                    attempts: vec![attempt],
                })
            }
            Err(failure) => {
                let class = classify_failure(&failure, &self.config.signatures);
                let attempt = ScrapeAttempt {
                    tier: 1,
                    strategy: "direct".to_string(),
                    outcome: AttemptOutcome::Failed {
                        reason: failure.to_string(),
                        class: Some(class),
                    },
                    elapsed_ms: elapsed_ms(start),
                };
                Err((failure, class, attempt))
            }
        }
    }

    async fn try_assisted(
        &self,
        extractor: &dyn AssistedExtractor,
        url: &Url,
        strategy: AssistedStrategy,
    ) -> (Result<ExtractedPage, CollaboratorError>, ScrapeAttempt) {
        let start = Instant::now();

        let result = match tokio::time::timeout(self.config.timeout, extractor.extract(url.as_str(), strategy)).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::Network(format!(
                "timed out after {}s",
                self.config.timeout.as_secs()
            ))),
        };

        let outcome = match &result {
            Ok(_) => AttemptOutcome::Succeeded,
            Err(e) => AttemptOutcome::Failed {
                reason: e.to_string(),
                class: None,
            },
        };

        let attempt = ScrapeAttempt {
            tier: 2,
            strategy: format!("assisted:{}", strategy),
            outcome,
            elapsed_ms: elapsed_ms(start),
        };
        (result, attempt)
    }
}

fn assisted_page(url: &Url, page: ExtractedPage, attempts: Vec<ScrapeAttempt>) -> AcquiredPage {
    let mut text = page.headings.join("\n");
    if !text.is_empty() {
        text.push('\n');
    }
    text.push_str(page.body_text.trim());

    AcquiredPage {
        url: url.to_string(),
        final_url: url.to_string(),
        html: None,
        text,
        metadata: PageMetadata {
            title: page.title,
            description: page.meta_description,
            ..Default::default()
        },
        method: AcquisitionMethod::Assisted,
        attempts,
    }
}

#[async_trait]
impl Acquirer for TieredAcquirer {
    async fn acquire(&self, url: &str) -> AcquisitionResult<AcquiredPage> {
        let target = normalize_url(url)?;

        // Tier 1
        info!(url = %target, tier = 1, "Fetching page directly");
        let (failure, class, attempt) = match self.try_direct(&target).await {
            Ok(page) => {
                info!(url = %target, final_url = %page.final_url, "Direct fetch succeeded");
                return Ok(page);
            }
            Err(failed) => failed,
        };

        let mut attempts = vec![attempt];

        if !class.escalates() {
            warn!(url = %target, class = %class, error = %failure, "Direct fetch failed, not escalating");
            return Err(AcquisitionError::Fetch {
                url: target.to_string(),
                class,
                reason: failure.to_string(),
                attempts,
            });
        }

        // Tier 2
        let Some(extractor) = self.extractor.as_deref() else {
            warn!(url = %target, error = %failure, "Site blocking requests but no assisted extractor configured");
            return Err(AcquisitionError::TiersExhausted {
                url: target.to_string(),
                final_reason: format!("{} ({}); assisted extraction unavailable", failure, FailureClass::DefenseTriggered),
                attempts,
            });
        };

        let mut final_reason = failure.to_string();
        for strategy in AssistedStrategy::ORDER {
            warn!(url = %target, tier = 2, strategy = %strategy, "Direct fetch blocked, trying assisted extraction");

            let (result, attempt) = self.try_assisted(extractor, &target, strategy).await;
            attempts.push(attempt);

            match result {
                Ok(page) => {
                    info!(url = %target, strategy = %strategy, "Assisted extraction succeeded");
                    return Ok(assisted_page(&target, page, attempts));
                }
                Err(e) => {
                    warn!(url = %target, strategy = %strategy, error = %e, "Assisted extraction failed");
                    final_reason = e.to_string();
                }
            }
        }

        // Tier 3
        warn!(url = %target, attempts = attempts.len(), "All automated tiers failed, manual content required");
        Err(AcquisitionError::TiersExhausted {
            url: target.to_string(),
            final_reason,
            attempts,
        })
    }
}
