//! Tiered content acquisition for public URLs.
//!
//! Tier 1 fetches the page directly. If the site's bot defenses block
//! that fetch, tier 2 delegates to an assisted extractor (two strategies,
//! in order). If both fail, tier 3 is manual: the caller gets a
//! `MANUAL_CONTENT_REQUIRED` error and should offer a paste-in form.
//! Tiers run strictly in sequence; a tier never starts while the previous
//! one is pending.

pub mod classify;
pub mod content;
pub mod direct;
pub mod pipeline;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AcquisitionResult;

pub use classify::{classify_failure, ChallengeSignatures, FailureClass, FetchFailure};
pub use direct::{DirectFetcher, FetchedDocument};
pub use pipeline::{normalize_url, TieredAcquirer};

/// How page content was finally obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    Direct,
    Assisted,
    /// Content pasted by the user after automated tiers were exhausted
    Manual,
}

impl fmt::Display for AcquisitionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AcquisitionMethod::Direct => "direct",
            AcquisitionMethod::Assisted => "assisted",
            AcquisitionMethod::Manual => "manual",
        })
    }
}

/// Result of a single tier attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttemptOutcome {
    Succeeded,
    Failed {
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        class: Option<FailureClass>,
    },
}

/// Diagnostic record of one tier attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeAttempt {
    /// 1 = direct, 2 = assisted
    pub tier: u8,
    /// e.g. "direct", "assisted:direct_context"
    pub strategy: String,
    pub outcome: AttemptOutcome,
    pub elapsed_ms: u64,
}

impl ScrapeAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Succeeded)
    }
}

/// Document metadata captured before non-content elements are stripped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub canonical: Option<String>,
    pub robots: Option<String>,
    pub viewport: Option<String>,
    pub lang: Option<String>,
    pub favicon: Option<String>,
    /// `og:*` properties
    #[serde(default)]
    pub open_graph: BTreeMap<String, String>,
    /// `twitter:*` names
    #[serde(default)]
    pub twitter: BTreeMap<String, String>,
}

/// A successfully acquired page.
#[derive(Debug, Clone)]
pub struct AcquiredPage {
    pub url: String,
    pub final_url: String,
    /// Raw markup; absent when content came from the assisted tier.
    pub html: Option<String>,
    /// Main-content text.
    pub text: String,
    pub metadata: PageMetadata,
    pub method: AcquisitionMethod,
    pub attempts: Vec<ScrapeAttempt>,
}

/// Something that can turn a URL into page content.
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, url: &str) -> AcquisitionResult<AcquiredPage>;
}
