//! Typed errors for the compliance engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`). Only acquisition
//! failures ever reach a caller as a failed check; configuration and
//! collaborator errors are logged and degraded locally.

use std::path::PathBuf;

use thiserror::Error;

use crate::acquisition::{FailureClass, ScrapeAttempt};

/// Errors raised while loading rule configuration.
#[derive(Debug, Error)]
pub enum RuleConfigError {
    /// Rule file could not be read
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Rule file is not valid JSON or does not match the rule schema
    #[error("failed to parse rule file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A rule pattern does not compile
    #[error("invalid pattern for rule {rule_id}: {source}")]
    InvalidPattern {
        rule_id: String,
        #[source]
        source: regex::Error,
    },
}

/// Errors from external collaborators (generative analyzers, result store).
///
/// Callers degrade these to empty results; they never fail a check.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    /// Configuration error (missing API key, invalid settings)
    #[error("configuration error: {0}")]
    Config(String),

    /// Network error (connection failed, timeout)
    #[error("network error: {0}")]
    Network(String),

    /// API error (non-2xx response, rate limit, invalid request)
    #[error("API error: {0}")]
    Api(String),

    /// Parse error (invalid JSON, unexpected response format)
    #[error("parse error: {0}")]
    Parse(String),

    /// Collaborator returned nothing usable
    #[error("empty response: {0}")]
    Empty(String),

    /// Result store rejected the operation
    #[error("store error: {0}")]
    Store(String),
}

/// Errors from the tiered acquisition pipeline.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    /// The target is not a fetchable http(s) URL
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// HTTP client could not be constructed
    #[error("failed to build HTTP client: {0}")]
    Client(String),

    /// Direct fetch failed for a reason that escalation cannot fix
    /// (DNS, connection, timeout, non-markup, unclassified HTTP error)
    #[error("failed to fetch {url} ({class}): {reason}")]
    Fetch {
        url: String,
        class: FailureClass,
        reason: String,
        attempts: Vec<ScrapeAttempt>,
    },

    /// Every automated tier failed; the user must paste the content manually
    #[error(
        "automated retrieval of {url} failed after {} attempts ({final_reason}); paste the page content manually",
        .attempts.len()
    )]
    TiersExhausted {
        url: String,
        final_reason: String,
        attempts: Vec<ScrapeAttempt>,
    },
}

impl AcquisitionError {
    /// Failure code signalling that a manual-paste affordance should be offered.
    pub const MANUAL_CONTENT_REQUIRED: &'static str = "MANUAL_CONTENT_REQUIRED";

    /// Stable machine-readable code for this failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "INVALID_URL",
            Self::Client(_) => "CLIENT_ERROR",
            Self::Fetch { .. } => "FETCH_FAILED",
            Self::TiersExhausted { .. } => Self::MANUAL_CONTENT_REQUIRED,
        }
    }

    /// Attempts made before the failure (empty if none were made).
    pub fn attempts(&self) -> &[ScrapeAttempt] {
        match self {
            Self::Fetch { attempts, .. } | Self::TiersExhausted { attempts, .. } => attempts,
            Self::InvalidUrl { .. } | Self::Client(_) => &[],
        }
    }

    /// True if the caller should offer manual content submission.
    pub fn requires_manual_content(&self) -> bool {
        matches!(self, Self::TiersExhausted { .. })
    }
}

/// Errors that fail a whole check.
#[derive(Debug, Error)]
pub enum CheckError {
    /// Content could not be acquired
    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}

/// Result type alias for acquisition operations.
pub type AcquisitionResult<T> = std::result::Result<T, AcquisitionError>;

/// Result type alias for collaborator operations.
pub type CollaboratorResult<T> = std::result::Result<T, CollaboratorError>;
