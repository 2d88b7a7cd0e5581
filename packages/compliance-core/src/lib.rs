//! Marketing Content Compliance Engine
//!
//! Reviews templated emails (EDMs) and public web pages against a
//! configurable rule catalogue and produces a severity-weighted compliance
//! report.
//!
//! # Pipeline
//!
//! ```text
//! URL ──► acquisition (direct ─► assisted ─► manual) ──┐
//!                                                      ▼
//! template ──────────────────────────────────► rules + validators + SEO
//!                                                      │
//!                              bilingual tagging ◄─────┘
//!                                                      ▼
//!                                             aggregator ─► ComplianceReport
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use compliance_core::{CheckRequest, ComplianceChecker, ContentType, RuleEngine};
//!
//! let checker = ComplianceChecker::builder()
//!     .rules(Arc::new(RuleEngine::with_default_rules()))
//!     .build()?;
//!
//! let report = checker
//!     .check_template(CheckRequest::new(html, ContentType::Edm))
//!     .await;
//! println!("score: {}", report.score);
//! ```
//!
//! # Modules
//!
//! - [`rules`] - Pattern rule engine and specialized checks
//! - [`validators`] - Link and image markup validation
//! - [`bilingual`] - Script detection, section split and issue tagging
//! - [`acquisition`] - Tiered page acquisition
//! - [`seo`] - SEO / technical analysis
//! - [`aggregator`] - Categorization and scoring
//! - [`collaborators`] - External service seams (generative analyzers, storage)
//! - [`testing`] - Mock collaborators

pub mod acquisition;
pub mod aggregator;
pub mod bilingual;
pub mod checker;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod rules;
pub mod seo;
pub mod testing;
pub mod types;
pub mod validators;

mod markup;
mod text;

// Re-export core types at crate root
pub use acquisition::{
    classify_failure, AcquiredPage, AcquisitionMethod, Acquirer, AttemptOutcome,
    ChallengeSignatures, DirectFetcher, FailureClass, FetchFailure, PageMetadata, ScrapeAttempt,
    TieredAcquirer,
};
pub use aggregator::{
    apply_url_exclusions, categorize, compliance_score, sort_by_severity, Aggregation,
    SeverityCounts,
};
pub use bilingual::{
    detect_languages, group_by_language, split_sections, tag_issue, DetectedLanguages,
    LanguageGroups, Script, Sections, SplitMethod,
};
pub use checker::{CheckRequest, ComplianceChecker, ComplianceCheckerBuilder};
pub use collaborators::{
    AssistedExtractor, AssistedStrategy, ExtractedPage, GrammarToneAnalyzer, MemoryResultStore,
    NoopAnalyzer, OpenAiCollaborator, ResultStore, SeoAdvice, SeoAdvisor, ToneAnalysis,
    ToneAnalysisResult,
};
pub use config::{AcquisitionConfig, CheckConfig, UrlExclusionPolicy, Windows};
pub use error::{AcquisitionError, CheckError, CollaboratorError, RuleConfigError};
pub use rules::{default_rules, LoadSummary, RuleEngine, RuleSet};
pub use seo::{
    analyze_seo, LinkSummary, SeoAspect, SeoDocument, SeoFinding, SeoIssue, SeoReport, UrlCategory,
};
pub use types::{
    AcquisitionSummary, CheckTarget, ComplianceReport, ContentType, Issue, IssueCategory, LanguageCounts,
    LanguageTag, Rule, Severity,
};
pub use validators::{validate_images, validate_links, LinkValidationOptions};
