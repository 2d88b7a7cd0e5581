//! OpenAI-compatible implementation of the generative collaborators.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{
    AssistedExtractor, AssistedStrategy, ExtractedPage, GrammarToneAnalyzer, SeoAdvice, SeoAdvisor,
    ToneAnalysis, ToneAnalysisResult,
};
use crate::error::{CollaboratorError, CollaboratorResult};
use crate::seo::{SeoReport, UrlCategory};
use crate::text::truncate_chars;
use crate::types::{Issue, Severity};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_SEARCH_MODEL: &str = "gpt-4o-mini-search-preview";

/// Characters of content sent for analysis.
const MAX_CONTENT_CHARS: usize = 12_000;

const TONE_SYSTEM_PROMPT: &str = r#"You are a marketing compliance editor. Review the copy for grammar, spelling and brand-voice problems.
Respond with a JSON object:
{
  "grammar_issues": [{"original": "...", "suggestion": "...", "explanation": "...", "severity": "critical|high|medium|low", "type": "grammar|spelling|punctuation"}],
  "brand_issues": [{"original": "...", "suggestion": "...", "explanation": "...", "severity": "...", "type": "brand|tone"}],
  "tone_analysis": {"overall_tone": "...", "formality": "...", "brand_alignment": 0-100, "notes": ["..."]},
  "suggestions": ["..."]
}
Only report real problems. Quote "original" exactly as it appears in the copy."#;

const SEO_SYSTEM_PROMPT: &str = r#"You are an SEO specialist. Given a technical SEO report for a page, suggest improvements.
Respond with a JSON object:
{"title_suggestion": "...", "description_suggestion": "...", "keyword_opportunities": ["..."], "content_suggestions": ["..."], "schema_suggestions": ["..."]}"#;

const EXTRACT_SYSTEM_PROMPT: &str = r#"You extract the visible content of a public web page.
Respond with a JSON object:
{"title": "...", "meta_description": "...", "headings": ["..."], "links": ["..."], "body_text": "..."}
"body_text" must contain the page's main copy verbatim. If you cannot access the page, respond with {"body_text": ""}."#;

#[derive(Debug, Deserialize)]
struct RawIssue {
    #[serde(default)]
    original: String,
    #[serde(default)]
    suggestion: Option<String>,
    #[serde(default, alias = "message")]
    explanation: Option<String>,
    #[serde(default)]
    severity: Option<String>,
    #[serde(default, rename = "type")]
    issue_type: Option<String>,
}

impl RawIssue {
    fn into_issue(self, rule_id: &str, category: &str) -> Issue {
        let severity = self
            .severity
            .as_deref()
            .map(Severity::parse_lenient)
            .unwrap_or(Severity::Medium);
        let message = self
            .explanation
            .unwrap_or_else(|| format!("Possible {} issue", category));

        let mut issue = Issue::new(rule_id, category, severity, message, self.original.clone())
            .with_type(self.issue_type.unwrap_or_else(|| category.to_string()))
            .with_found(self.original);
        issue.suggestion = self.suggestion.filter(|s| !s.trim().is_empty());
        issue
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawToneResponse {
    #[serde(default)]
    grammar_issues: Vec<RawIssue>,
    #[serde(default)]
    brand_issues: Vec<RawIssue>,
    #[serde(default)]
    tone_analysis: Option<ToneAnalysis>,
    #[serde(default)]
    suggestions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<ChoiceRaw>,
}

#[derive(Debug, Deserialize)]
struct ChoiceRaw {
    message: MessageRaw,
}

#[derive(Debug, Deserialize)]
struct MessageRaw {
    #[serde(default)]
    content: Option<String>,
}

/// One client implementing every generative seam against an
/// OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiCollaborator {
    http_client: Client,
    api_key: String,
    base_url: String,
    model: String,
    search_model: String,
}

impl OpenAiCollaborator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, Duration::from_secs(60))
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Duration) -> Self {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                warn!(error = %e, "Falling back to default HTTP client");
                Client::new()
            });

        Self {
            http_client,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            search_model: DEFAULT_SEARCH_MODEL.to_string(),
        }
    }

    /// Create from environment variable `OPENAI_API_KEY`.
    pub fn from_env() -> CollaboratorResult<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .map_err(|_| CollaboratorError::Config("OPENAI_API_KEY not set".into()))?;
        Ok(Self::new(api_key))
    }

    /// Set a custom base URL (proxies, compatible providers).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_search_model(mut self, model: impl Into<String>) -> Self {
        self.search_model = model.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a chat completion and return the message content.
    async fn chat(&self, body: Value) -> CollaboratorResult<String> {
        let start = std::time::Instant::now();

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Chat completion request failed");
                CollaboratorError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Chat completion API error");
            return Err(CollaboratorError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| CollaboratorError::Parse(e.to_string()))?;

        debug!(
            model = %body["model"],
            duration_ms = start.elapsed().as_millis() as u64,
            "Chat completion"
        );

        raw.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| CollaboratorError::Empty("no content in completion".into()))
    }

    /// Chat completion constrained to a JSON object.
    async fn chat_json(&self, system: &str, user: String) -> CollaboratorResult<String> {
        self.chat(json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "response_format": {"type": "json_object"},
            "temperature": 0.2,
        }))
        .await
    }
}

/// First balanced-looking JSON object in free-form model output.
fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_json<T: for<'de> Deserialize<'de>>(content: &str) -> CollaboratorResult<T> {
    let json = first_json_object(content)
        .ok_or_else(|| CollaboratorError::Parse("no JSON object in response".into()))?;
    serde_json::from_str(json).map_err(|e| CollaboratorError::Parse(e.to_string()))
}

#[async_trait]
impl GrammarToneAnalyzer for OpenAiCollaborator {
    async fn analyze(&self, text: &str, language: &str) -> CollaboratorResult<ToneAnalysisResult> {
        let user = format!(
            "Language: {}\n\nCopy:\n{}",
            language,
            truncate_chars(text, MAX_CONTENT_CHARS)
        );
        let content = self.chat_json(TONE_SYSTEM_PROMPT, user).await?;
        let raw: RawToneResponse = parse_json(&content)?;

        Ok(ToneAnalysisResult {
            grammar_issues: raw
                .grammar_issues
                .into_iter()
                .filter(|i| !i.original.trim().is_empty())
                .map(|i| i.into_issue("ai_grammar", "grammar"))
                .collect(),
            brand_issues: raw
                .brand_issues
                .into_iter()
                .filter(|i| !i.original.trim().is_empty())
                .map(|i| i.into_issue("ai_brand_voice", "brand"))
                .collect(),
            tone_analysis: raw.tone_analysis,
            suggestions: raw.suggestions,
        })
    }
}

#[async_trait]
impl SeoAdvisor for OpenAiCollaborator {
    async fn advise(&self, report: &SeoReport, category: UrlCategory) -> CollaboratorResult<SeoAdvice> {
        let report_json =
            serde_json::to_string(report).map_err(|e| CollaboratorError::Parse(e.to_string()))?;
        let user = format!(
            "Page category: {}\n\nSEO report:\n{}",
            category,
            truncate_chars(&report_json, MAX_CONTENT_CHARS)
        );
        let content = self.chat_json(SEO_SYSTEM_PROMPT, user).await?;
        parse_json(&content)
    }
}

#[async_trait]
impl AssistedExtractor for OpenAiCollaborator {
    async fn extract(&self, url: &str, strategy: AssistedStrategy) -> CollaboratorResult<ExtractedPage> {
        let content = match strategy {
            AssistedStrategy::DirectContext => {
                self.chat_json(EXTRACT_SYSTEM_PROMPT, format!("URL: {}", url)).await?
            }
            // Search models reject response_format; the JSON is parsed out of free text.
            AssistedStrategy::SearchGrounded => {
                self.chat(json!({
                    "model": self.search_model,
                    "web_search_options": {},
                    "messages": [
                        {"role": "system", "content": EXTRACT_SYSTEM_PROMPT},
                        {"role": "user", "content": format!("Find this exact page and extract it: {}", url)},
                    ],
                }))
                .await?
            }
        };

        let page: ExtractedPage = parse_json(&content)?;
        if page.body_text.trim().is_empty() {
            return Err(CollaboratorError::Empty(format!(
                "{} extraction returned no body text",
                strategy
            )));
        }
        Ok(page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn completion(content: &str) -> Value {
        json!({"choices": [{"message": {"role": "assistant", "content": content}}]})
    }

    #[test]
    fn test_client_builder() {
        let client = OpenAiCollaborator::new("sk-test")
            .with_base_url("https://custom.api.com/v1/")
            .with_model("gpt-test");

        assert_eq!(client.base_url, "https://custom.api.com/v1");
        assert_eq!(client.model(), "gpt-test");
    }

    #[test]
    fn test_first_json_object() {
        assert_eq!(
            first_json_object("Here you go:\n```json\n{\"a\": 1}\n```"),
            Some("{\"a\": 1}")
        );
        assert_eq!(first_json_object("no json"), None);
    }

    #[tokio::test]
    async fn test_analyze_maps_issues() {
        let server = MockServer::start().await;
        let body = json!({
            "grammar_issues": [{"original": "recieve", "suggestion": "receive", "explanation": "Misspelling", "severity": "minor", "type": "spelling"}],
            "brand_issues": [{"original": "", "severity": "high"}],
            "tone_analysis": {"overall_tone": "friendly", "notes": []},
            "suggestions": ["Shorten the subject line"]
        });
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(&body.to_string())))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiCollaborator::new("sk-test").with_base_url(server.uri());
        let result = client.analyze("You will recieve it", "en").await.unwrap();

        assert_eq!(result.grammar_issues.len(), 1);
        assert_eq!(result.grammar_issues[0].severity, Severity::Low);
        assert_eq!(result.grammar_issues[0].issue_type, "spelling");
        assert!(result.brand_issues.is_empty());
        assert_eq!(result.tone_analysis.unwrap().overall_tone, "friendly");
    }

    #[tokio::test]
    async fn test_api_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = OpenAiCollaborator::new("sk-test").with_base_url(server.uri());
        let err = client.analyze("copy", "en").await.unwrap_err();

        assert!(matches!(err, CollaboratorError::Api(_)));
    }

    #[tokio::test]
    async fn test_empty_extraction_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion("{\"body_text\": \"\"}")))
            .mount(&server)
            .await;

        let client = OpenAiCollaborator::new("sk-test").with_base_url(server.uri());
        let err = client
            .extract("https://example.com", AssistedStrategy::DirectContext)
            .await
            .unwrap_err();

        assert!(matches!(err, CollaboratorError::Empty(_)));
    }
}
