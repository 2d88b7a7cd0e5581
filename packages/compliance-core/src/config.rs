//! Tunable settings for checks and acquisition.
//!
//! The context windows are empirically tuned values, not protocol
//! constants; every one of them can be overridden per checker.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::acquisition::ChallengeSignatures;

/// Browser-like User-Agent used for direct fetches.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Character radii used when looking around a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Windows {
    /// Radius searched for rule context exceptions. Default: 100.
    pub exception_radius: usize,

    /// Radius used to decide the locale of content around a link. Default: 500.
    pub locale_radius: usize,

    /// Radius of the context snippet attached to rule issues. Default: 50.
    pub issue_context_radius: usize,

    /// Radius of the reconstructed context for merge-field issues. Default: 40.
    pub merge_field_context_radius: usize,
}

impl Default for Windows {
    fn default() -> Self {
        Self {
            exception_radius: 100,
            locale_radius: 500,
            issue_context_radius: 50,
            merge_field_context_radius: 40,
        }
    }
}

/// Issues removed when checking a public URL instead of an uploaded template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UrlExclusionPolicy {
    /// Rule-id prefixes of template-only rule families.
    pub excluded_prefixes: Vec<String>,

    /// Also drop low/medium CTA and tone issues.
    pub suppress_soft_cta_and_tone: bool,
}

impl Default for UrlExclusionPolicy {
    fn default() -> Self {
        Self {
            excluded_prefixes: vec![
                "merge_".to_string(),
                "font_".to_string(),
                "brand_color_".to_string(),
                "staging_".to_string(),
            ],
            suppress_soft_cta_and_tone: true,
        }
    }
}

/// Settings for a single check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckConfig {
    pub windows: Windows,

    /// Merge-field names accepted verbatim (case-sensitive).
    pub merge_field_whitelist: Vec<String>,

    /// Flag absolute external links without UTM parameters.
    pub require_utm: bool,

    /// Share of non-Latin letters above which content counts as non-Latin.
    pub non_latin_ratio_threshold: f64,

    pub url_exclusions: UrlExclusionPolicy,
}

impl Default for CheckConfig {
    fn default() -> Self {
        Self {
            windows: Windows::default(),
            merge_field_whitelist: crate::rules::merge_fields::DEFAULT_WHITELIST
                .iter()
                .map(|s| s.to_string())
                .collect(),
            require_utm: true,
            non_latin_ratio_threshold: 0.3,
            url_exclusions: UrlExclusionPolicy::default(),
        }
    }
}

impl CheckConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the context windows.
    pub fn with_windows(mut self, windows: Windows) -> Self {
        self.windows = windows;
        self
    }

    /// Replace the merge-field whitelist.
    pub fn with_merge_field_whitelist(
        mut self,
        names: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.merge_field_whitelist = names.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable the UTM requirement.
    pub fn with_require_utm(mut self, require: bool) -> Self {
        self.require_utm = require;
        self
    }

    /// Replace the URL-mode exclusion policy.
    pub fn with_url_exclusions(mut self, policy: UrlExclusionPolicy) -> Self {
        self.url_exclusions = policy;
        self
    }
}

/// Settings for the acquisition pipeline.
#[derive(Debug, Clone)]
pub struct AcquisitionConfig {
    /// Per-call timeout for every network call. Default: 15s.
    pub timeout: Duration,

    pub user_agent: String,

    /// Maximum redirects followed by the direct fetch. Default: 5.
    pub max_redirects: usize,

    /// Interstitial/challenge signatures that trigger escalation.
    pub signatures: ChallengeSignatures,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_redirects: 5,
            signatures: ChallengeSignatures::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set a custom user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Replace the challenge signature catalogue.
    pub fn with_signatures(mut self, signatures: ChallengeSignatures) -> Self {
        self.signatures = signatures;
        self
    }
}
