//! Service configuration.
//!
//! A [`ServiceConfig`] is built once at startup from two sources and then
//! shared read-only with every request handler:
//!
//! - an optional YAML file (`--config`) that overrides endpoints, models and
//!   scrape limits; every field has a default so the file may be partial or
//!   absent
//! - [`Credentials`] taken from CLI flags or the environment
//!   (`NEWS_API_KEY`, `OPENAI_API_KEY`, `TOGETHER_API_KEY`)
//!
//! # Example file
//!
//! ```yaml
//! news_api:
//!   base_url: https://newsapi.org/v2
//! summarizer_llm:
//!   model: gpt-4o-mini
//! verifier_llm:
//!   base_url: https://api.together.xyz/v1
//!   temperature: 0.2
//! scrape:
//!   timeout_secs: 15
//! ```

use crate::error::{AgentError, Result};
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use tracing::{info, instrument};

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

/// Desktop browser identity sent when scraping source pages.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NewsApiSettings {
    pub base_url: String,
}

impl Default for NewsApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NEWS_API_BASE_URL.to_string(),
        }
    }
}

/// Connection and sampling settings for one OpenAI-compatible chat endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmSettings {
    pub base_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub top_p: Option<f32>,
}

impl LlmSettings {
    /// OpenAI chat model used for article summaries.
    pub fn summarizer_default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: None,
            temperature: 0.1,
            top_p: None,
        }
    }

    /// Together AI model used for fact checking.
    pub fn verifier_default() -> Self {
        Self {
            base_url: "https://api.together.xyz/v1".to_string(),
            model: "meta-llama/Llama-Vision-Free".to_string(),
            max_tokens: Some(1024),
            temperature: 0.7,
            top_p: Some(0.7),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrapeSettings {
    pub timeout_secs: u64,
    pub max_chars: usize,
    pub user_agent: String,
}

impl ScrapeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_chars: 5000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// Partial LLM settings as they appear in the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct LlmOverrides {
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f32>,
    top_p: Option<f32>,
}

impl LlmOverrides {
    fn apply(self, base: LlmSettings) -> LlmSettings {
        LlmSettings {
            base_url: self.base_url.unwrap_or(base.base_url),
            model: self.model.unwrap_or(base.model),
            max_tokens: self.max_tokens.or(base.max_tokens),
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.or(base.top_p),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    news_api: NewsApiSettings,
    summarizer_llm: LlmOverrides,
    verifier_llm: LlmOverrides,
    scrape: ScrapeSettings,
}

/// API credentials. Never logged; `Debug` only reports which are present.
#[derive(Clone, Default)]
pub struct Credentials {
    pub news_api_key: Option<String>,
    pub openai_api_key: Option<String>,
    pub together_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("news_api_key", &self.news_api_key.is_some())
            .field("openai_api_key", &self.openai_api_key.is_some())
            .field("together_api_key", &self.together_api_key.is_some())
            .finish()
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Fully resolved configuration handed to each service entry point.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub news_api: NewsApiSettings,
    pub summarizer_llm: LlmSettings,
    pub verifier_llm: LlmSettings,
    pub scrape: ScrapeSettings,
    pub credentials: Credentials,
}

impl ServiceConfig {
    /// Defaults for everything except credentials.
    pub fn with_credentials(credentials: Credentials) -> Self {
        Self::from_file_config(FileConfig::default(), credentials)
    }

    /// Load the YAML file at `path` (if any) and attach `credentials`.
    #[instrument(level = "info", skip(credentials))]
    pub fn load(path: Option<&Path>, credentials: Credentials) -> Result<Self> {
        match path {
            Some(path) => {
                let contents = std::fs::read_to_string(path)?;
                let config = Self::from_yaml_str(&contents, credentials)?;
                info!(path = %path.display(), "Loaded configuration file");
                Ok(config)
            }
            None => {
                info!("No configuration file given; using defaults");
                Ok(Self::with_credentials(credentials))
            }
        }
    }

    pub fn from_yaml_str(contents: &str, credentials: Credentials) -> Result<Self> {
        let file: Option<FileConfig> = serde_yaml::from_str(contents)?;
        Ok(Self::from_file_config(file.unwrap_or_default(), credentials))
    }

    fn from_file_config(file: FileConfig, credentials: Credentials) -> Self {
        Self {
            news_api: file.news_api,
            summarizer_llm: file.summarizer_llm.apply(LlmSettings::summarizer_default()),
            verifier_llm: file.verifier_llm.apply(LlmSettings::verifier_default()),
            scrape: file.scrape,
            credentials,
        }
    }

    /// `(news_api_key, openai_api_key)`, or a config error naming what is missing.
    pub fn summarizer_credentials(&self) -> Result<(&str, &str)> {
        let news = present(&self.credentials.news_api_key);
        let openai = present(&self.credentials.openai_api_key);
        match (news, openai) {
            (Some(news), Some(openai)) => Ok((news, openai)),
            _ => {
                let missing: Vec<&str> = [("NEWS_API_KEY", news), ("OPENAI_API_KEY", openai)]
                    .into_iter()
                    .filter(|(_, v)| v.is_none())
                    .map(|(name, _)| name)
                    .collect();
                Err(AgentError::Config(format!(
                    "API keys not found in environment variables: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    pub fn verifier_credential(&self) -> Result<&str> {
        present(&self.credentials.together_api_key).ok_or_else(|| {
            AgentError::Config(
                "API key not found in environment variables: TOGETHER_API_KEY".to_string(),
            )
        })
    }
}
