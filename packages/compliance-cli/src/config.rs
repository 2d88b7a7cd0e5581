use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Enables the generative analyzers; without it only deterministic checks run.
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub model: Option<String>,
    pub rules_path: Option<PathBuf>,
    /// Direct page fetches
    pub fetch_timeout: Duration,
    /// Generative analyzer, SEO advisor and assisted extraction calls
    pub analysis_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let fetch_timeout = secs_from_env("FETCH_TIMEOUT_SECS", 15)?;
        let analysis_timeout = secs_from_env("ANALYSIS_TIMEOUT_SECS", 60)?;

        Ok(Self {
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty()),
            openai_base_url: env::var("OPENAI_BASE_URL").ok(),
            model: env::var("COMPLIANCE_MODEL").ok(),
            rules_path: env::var("COMPLIANCE_RULES_PATH").ok().map(PathBuf::from),
            fetch_timeout,
            analysis_timeout,
        })
    }
}

fn secs_from_env(name: &str, default: u64) -> Result<Duration> {
    parse_secs(name, env::var(name).ok().as_deref(), default)
}

fn parse_secs(name: &str, value: Option<&str>, default: u64) -> Result<Duration> {
    let secs = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(value) => value
            .parse()
            .with_context(|| format!("{} must be a whole number of seconds", name))?,
        None => default,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_default_independently() {
        assert_eq!(parse_secs("FETCH_TIMEOUT_SECS", None, 15).unwrap(), Duration::from_secs(15));
        assert_eq!(parse_secs("ANALYSIS_TIMEOUT_SECS", None, 60).unwrap(), Duration::from_secs(60));
    }

    #[test]
    fn test_timeout_override() {
        assert_eq!(parse_secs("ANALYSIS_TIMEOUT_SECS", Some(" 90 "), 60).unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_invalid_timeout_names_variable() {
        let err = parse_secs("ANALYSIS_TIMEOUT_SECS", Some("soon"), 60).unwrap_err();
        assert!(err.to_string().contains("ANALYSIS_TIMEOUT_SECS"));
    }
}
