//! Direct-fetch failure classification.
//!
//! Escalation depends only on the structured failure, never on the wording
//! of an error message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::text::strip_markup;

/// Closed set of failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// DNS, connection, timeout or non-markup content. Terminal.
    GenuineNetworkError,
    /// Bot defenses blocked the fetch. Escalate to assisted extraction.
    DefenseTriggered,
    /// Anything else (404, 5xx without a challenge). Terminal.
    Unknown,
}

impl FailureClass {
    pub fn escalates(self) -> bool {
        matches!(self, FailureClass::DefenseTriggered)
    }
}

impl fmt::Display for FailureClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FailureClass::GenuineNetworkError => "genuine network error",
            FailureClass::DefenseTriggered => "defense triggered",
            FailureClass::Unknown => "unknown",
        })
    }
}

/// What went wrong with a direct fetch.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchFailure {
    #[error("DNS resolution failed: {0}")]
    Dns(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request timed out")]
    Timeout,

    #[error("response is not markup ({content_type})")]
    NonMarkup { content_type: String },

    #[error("HTTP {code}")]
    Status { code: u16, body: String },

    /// A successful response whose body is an interstitial challenge
    #[error("challenge page detected ({signature})")]
    Challenge { code: u16, signature: String },

    #[error("{0}")]
    Other(String),
}

/// Interstitial / bot-challenge fingerprints.
///
/// Interstitial markers only appear on challenge pages themselves. Widget
/// markers also appear on ordinary pages that embed a captcha (contact
/// forms, sign-ups), so they only count when the page has almost no
/// visible text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeSignatures {
    /// Markers that identify a challenge page wherever they appear.
    pub interstitial_markers: Vec<String>,

    /// Captcha and bot-manager widget markers.
    pub widget_markers: Vec<String>,

    /// Visible-text length under which widget markers count.
    pub max_widget_page_chars: usize,

    /// Phrases that identify a block page, only on short pages.
    pub blocking_phrases: Vec<String>,

    /// Visible-text length under which blocking phrases count.
    pub max_blocking_page_chars: usize,
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl Default for ChallengeSignatures {
    fn default() -> Self {
        Self {
            interstitial_markers: owned(&[
                "<title>just a moment...",
                "<title>attention required! | cloudflare",
                "cf-browser-verification",
                "cf_chl_opt",
                "_incapsula_resource",
                "geo.captcha-delivery.com",
            ]),
            widget_markers: owned(&[
                "challenge-platform",
                "g-recaptcha",
                "h-captcha",
                "hcaptcha.com",
                "px-captcha",
                "datadome",
            ]),
            max_widget_page_chars: 300,
            blocking_phrases: owned(&[
                "access denied",
                "blocked",
                "forbidden",
                "captcha",
                "checking your browser",
                "unusual traffic",
            ]),
            max_blocking_page_chars: 2000,
        }
    }
}

impl ChallengeSignatures {
    /// No signatures at all.
    pub fn none() -> Self {
        Self {
            interstitial_markers: Vec::new(),
            widget_markers: Vec::new(),
            max_widget_page_chars: 0,
            blocking_phrases: Vec::new(),
            max_blocking_page_chars: 0,
        }
    }

    /// The first signature found in `body`, if any.
    pub fn detect(&self, body: &str) -> Option<String> {
        let lower = body.to_lowercase();

        if let Some(marker) = find_in(&self.interstitial_markers, &lower) {
            return Some(marker);
        }

        if self.widget_markers.is_empty() && self.blocking_phrases.is_empty() {
            return None;
        }

        let visible = strip_markup(body).to_lowercase();
        let visible_chars = visible.chars().count();

        if visible_chars < self.max_widget_page_chars {
            if let Some(marker) = find_in(&self.widget_markers, &lower) {
                return Some(marker);
            }
        }

        if visible_chars < self.max_blocking_page_chars {
            return find_in(&self.blocking_phrases, &visible);
        }
        None
    }
}

fn find_in(needles: &[String], haystack: &str) -> Option<String> {
    needles
        .iter()
        .find(|n| haystack.contains(&n.to_lowercase()))
        .cloned()
}

/// Classify a direct-fetch failure.
pub fn classify_failure(failure: &FetchFailure, signatures: &ChallengeSignatures) -> FailureClass {
    match failure {
        FetchFailure::Dns(_)
        | FetchFailure::Connect(_)
        | FetchFailure::Timeout
        | FetchFailure::NonMarkup { .. } => FailureClass::GenuineNetworkError,
        FetchFailure::Status { code: 403 | 429, .. } => FailureClass::DefenseTriggered,
        FetchFailure::Status { body, .. } if signatures.detect(body).is_some() => {
            FailureClass::DefenseTriggered
        }
        FetchFailure::Challenge { .. } => FailureClass::DefenseTriggered,
        FetchFailure::Status { .. } | FetchFailure::Other(_) => FailureClass::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(code: u16, body: &str) -> FetchFailure {
        FetchFailure::Status {
            code,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_network_failures_are_genuine() {
        let sigs = ChallengeSignatures::default();
        for failure in [
            FetchFailure::Dns("no such host".into()),
            FetchFailure::Connect("refused".into()),
            FetchFailure::Timeout,
            FetchFailure::NonMarkup {
                content_type: "application/pdf".into(),
            },
        ] {
            assert_eq!(classify_failure(&failure, &sigs), FailureClass::GenuineNetworkError);
        }
    }

    #[test]
    fn test_defense_statuses() {
        let sigs = ChallengeSignatures::default();
        assert_eq!(classify_failure(&status(403, ""), &sigs), FailureClass::DefenseTriggered);
        assert_eq!(classify_failure(&status(429, ""), &sigs), FailureClass::DefenseTriggered);
    }

    #[test]
    fn test_challenge_body_on_other_status() {
        let sigs = ChallengeSignatures::default();
        let body = "<html><title>Just a moment...</title><script>window._cf_chl_opt={}</script></html>";
        assert_eq!(classify_failure(&status(503, body), &sigs), FailureClass::DefenseTriggered);
    }

    #[test]
    fn test_other_statuses_are_unknown() {
        let sigs = ChallengeSignatures::default();
        assert_eq!(classify_failure(&status(404, "Not found"), &sigs), FailureClass::Unknown);
        assert_eq!(classify_failure(&status(500, "oops"), &sigs), FailureClass::Unknown);
        assert_eq!(
            classify_failure(&FetchFailure::Other("redirect loop".into()), &sigs),
            FailureClass::Unknown
        );
    }

    #[test]
    fn test_signatures_are_replaceable() {
        let body = "<p>Access denied</p>";
        assert_eq!(
            classify_failure(&status(503, body), &ChallengeSignatures::default()),
            FailureClass::DefenseTriggered
        );
        assert_eq!(
            classify_failure(&status(503, body), &ChallengeSignatures::none()),
            FailureClass::Unknown
        );
    }

    #[test]
    fn test_blocking_phrases_ignored_on_long_pages() {
        let sigs = ChallengeSignatures::default();
        let article = format!("<p>{}</p><p>The road was blocked by snow.</p>", "Travel news. ".repeat(200));

        assert!(sigs.detect(&article).is_none());
        assert_eq!(sigs.detect("<h1>Request blocked</h1>").as_deref(), Some("blocked"));
    }

    #[test]
    fn test_captcha_widget_on_content_page_is_not_a_challenge() {
        let sigs = ChallengeSignatures::default();
        let page = format!(
            "<html><head><title>Contact us</title></head><body><p>{}</p>\
             <form><div class=\"g-recaptcha\" data-sitekey=\"abc\"></div></form>\
             <script src=\"/cdn-cgi/challenge-platform/scripts/jsd/main.js\"></script></body></html>",
            "Our concierge team answers within one working day. ".repeat(20)
        );

        assert!(sigs.detect(&page).is_none());
    }

    #[test]
    fn test_captcha_widget_on_empty_page_is_a_challenge() {
        let sigs = ChallengeSignatures::default();
        let page = r#"<html><body><div class="g-recaptcha" data-sitekey="abc"></div></body></html>"#;

        assert_eq!(sigs.detect(page).as_deref(), Some("g-recaptcha"));
    }

    #[test]
    fn test_interstitial_marker_on_any_page() {
        let sigs = ChallengeSignatures::default();
        let page = format!(
            "<html><body><p>{}</p><iframe src=\"https://geo.captcha-delivery.com/captcha/\"></iframe></body></html>",
            "Long copy. ".repeat(400)
        );

        assert_eq!(sigs.detect(&page).as_deref(), Some("geo.captcha-delivery.com"));
    }
}
