//! Tier 1: direct HTTP fetch with browser-like headers.

use std::error::Error as _;

use reqwest::header::{self, HeaderMap, HeaderValue};
use tracing::debug;
use url::Url;

use super::classify::FetchFailure;
use crate::config::AcquisitionConfig;
use crate::error::{AcquisitionError, AcquisitionResult};
use crate::text::truncate_chars;

/// Bytes of an error body kept for classification.
const MAX_ERROR_BODY_CHARS: usize = 8192;

/// A fetched markup document.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    pub final_url: String,
    pub status: u16,
    pub html: String,
}

/// Plain reqwest fetcher. Does not retry or escalate.
pub struct DirectFetcher {
    client: reqwest::Client,
    config: AcquisitionConfig,
}

impl DirectFetcher {
    pub fn new(config: AcquisitionConfig) -> AcquisitionResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8"),
        );
        headers.insert(header::ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9,ar;q=0.8"));
        headers.insert(header::UPGRADE_INSECURE_REQUESTS, HeaderValue::from_static("1"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| AcquisitionError::Client(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Fetch `url`. Non-2xx responses, non-markup bodies and challenge
    /// pages are returned as failures for classification.
    pub async fn fetch(&self, url: &Url) -> Result<FetchedDocument, FetchFailure> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        debug!(url = %url, status = status.as_u16(), content_type = %content_type, "Direct fetch response");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchFailure::Status {
                code: status.as_u16(),
                body: truncate_chars(&body, MAX_ERROR_BODY_CHARS).to_string(),
            });
        }

        if !content_type.is_empty() && !is_markup(&content_type) {
            return Err(FetchFailure::NonMarkup { content_type });
        }

        let html = response.text().await.map_err(map_request_error)?;

        if let Some(signature) = self.config.signatures.detect(&html) {
            return Err(FetchFailure::Challenge {
                code: status.as_u16(),
                signature,
            });
        }

        Ok(FetchedDocument {
            final_url,
            status: status.as_u16(),
            html,
        })
    }
}

fn is_markup(content_type: &str) -> bool {
    content_type.contains("text/html") || content_type.contains("application/xhtml")
}

fn map_request_error(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        return FetchFailure::Timeout;
    }

    let mut detail = error.to_string();
    let mut source = error.source();
    while let Some(inner) = source {
        detail = format!("{}: {}", detail, inner);
        source = inner.source();
    }

    if error.is_connect() {
        let lower = detail.to_lowercase();
        if lower.contains("dns") || lower.contains("resolve") || lower.contains("lookup") {
            FetchFailure::Dns(detail)
        } else {
            FetchFailure::Connect(detail)
        }
    } else {
        FetchFailure::Other(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_markup() {
        assert!(is_markup("text/html; charset=utf-8"));
        assert!(is_markup("application/xhtml+xml"));
        assert!(!is_markup("application/json"));
        assert!(!is_markup("application/pdf"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_connect_failure() {
        let fetcher = DirectFetcher::new(AcquisitionConfig::default()).unwrap();
        let url = Url::parse("http://127.0.0.1:1/").unwrap();

        let failure = fetcher.fetch(&url).await.unwrap_err();

        assert!(matches!(failure, FetchFailure::Connect(_) | FetchFailure::Dns(_)));
    }
}
