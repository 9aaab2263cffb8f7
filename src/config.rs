use std::time::Duration;

use clap::Parser;
use thiserror::Error;
use url::Url;

/// llm-relay: provider-agnostic relay to OpenAI-compatible chat APIs.
#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Config {
    /// Listen address (e.g. ":8000" or "0.0.0.0:8000")
    #[arg(long, default_value = ":8000", env = "ADDR")]
    pub addr: String,

    /// Log format: "text" or "json"
    #[arg(long, default_value = "text", env = "LOG_FORMAT")]
    pub log_format: String,

    /// API key for the upstream provider
    #[arg(long, env = "LLM_API_KEY")]
    pub llm_api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API (e.g. "https://api.groq.com/openai")
    #[arg(long, env = "LLM_BASE_URL")]
    pub llm_base_url: Option<String>,

    /// Model identifier sent in every upstream request
    #[arg(long, env = "LLM_MODEL")]
    pub llm_model: Option<String>,

    /// Upstream request timeout in seconds
    #[arg(long, default_value_t = 60, env = "API_TIMEOUT")]
    pub api_timeout: u64,

    /// Provider name, used only in logs. Never sent upstream.
    #[arg(long, default_value = "generic", env = "LLM_PROVIDER")]
    pub llm_provider: String,
}

/// Configuration errors. All are fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("LLM_BASE_URL is not an absolute URL: {0}")]
    InvalidBaseUrl(String),

    #[error("API_TIMEOUT must be a positive number of seconds")]
    InvalidTimeout,
}

/// Validated provider settings. Immutable after resolution.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_key: String,
    /// Absolute URL with no trailing slash.
    pub base_url: String,
    pub model: String,
    pub provider: String,
    pub timeout: Duration,
}

impl Settings {
    /// Resolve and validate settings from parsed configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let api_key = require(&config.llm_api_key, "LLM_API_KEY")?;
        let base_url = require(&config.llm_base_url, "LLM_BASE_URL")?;
        let model = require(&config.llm_model, "LLM_MODEL")?;

        let base_url = normalize_base_url(&base_url)?;

        if config.api_timeout == 0 {
            return Err(ConfigError::InvalidTimeout);
        }

        Ok(Self {
            api_key,
            base_url,
            model,
            provider: config.llm_provider.clone(),
            timeout: Duration::from_secs(config.api_timeout),
        })
    }
}

/// An env var set to the empty string counts as missing.
fn require(value: &Option<String>, name: &'static str) -> Result<String, ConfigError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v.clone()),
        _ => Err(ConfigError::Missing(name)),
    }
}

/// Validate the base URL and strip any trailing slashes.
fn normalize_base_url(raw: &str) -> Result<String, ConfigError> {
    Url::parse(raw).map_err(|_| ConfigError::InvalidBaseUrl(raw.to_string()))?;
    Ok(raw.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            addr: ":8000".into(),
            log_format: "text".into(),
            llm_api_key: Some("sk-test".into()),
            llm_base_url: Some("https://api.example.com".into()),
            llm_model: Some("test-model".into()),
            api_timeout: 60,
            llm_provider: "generic".into(),
        }
    }

    #[test]
    fn test_resolves_valid_config() {
        let settings = Settings::from_config(&config()).unwrap();
        assert_eq!(settings.api_key, "sk-test");
        assert_eq!(settings.base_url, "https://api.example.com");
        assert_eq!(settings.model, "test-model");
        assert_eq!(settings.provider, "generic");
        assert_eq!(settings.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_trims_trailing_slash() {
        let mut c = config();
        c.llm_base_url = Some("https://api.example.com/openai/".into());
        let settings = Settings::from_config(&c).unwrap();
        assert_eq!(settings.base_url, "https://api.example.com/openai");
    }

    #[test]
    fn test_missing_api_key() {
        let mut c = config();
        c.llm_api_key = None;
        let err = Settings::from_config(&c).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LLM_API_KEY")));
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut c = config();
        c.llm_model = Some(String::new());
        let err = Settings::from_config(&c).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("LLM_MODEL")));
    }

    #[test]
    fn test_rejects_relative_base_url() {
        let mut c = config();
        c.llm_base_url = Some("api.example.com/v1".into());
        let err = Settings::from_config(&c).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBaseUrl(_)));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        let mut c = config();
        c.api_timeout = 0;
        let err = Settings::from_config(&c).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTimeout));
    }
}
