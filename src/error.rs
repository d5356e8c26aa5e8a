//! Error types shared by both services.
//!
//! Scrape failures have no variant: an unreachable or empty page is a normal
//! outcome of verification and is modelled as `Option::None` in
//! [`crate::scrapers`]. Malformed LLM output is likewise absorbed by
//! [`crate::extraction`] and never surfaces here.

use thiserror::Error;

/// Main error type for fetch, summarize and verify operations.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A credential or setting required by a service is missing.
    #[error("configuration error: {0}")]
    Config(String),

    /// The news listing API did not return a usable response.
    #[error("NewsAPI request failed: {0}")]
    Fetch(String),

    /// A caller-supplied query could not be normalized.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The LLM endpoint answered with a non-success status or an unusable body.
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Transport failure, with the request URL (and its `apiKey`) stripped.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for AgentError {
    fn from(e: reqwest::Error) -> Self {
        AgentError::Http(e.without_url())
    }
}

pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_carries_upstream_message() {
        let err = AgentError::Fetch("Your API key is invalid.".to_string());
        assert_eq!(
            err.to_string(),
            "NewsAPI request failed: Your API key is invalid."
        );
    }

    #[test]
    fn test_json_error_converts() {
        let parse: std::result::Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: AgentError = parse.unwrap_err().into();
        assert!(matches!(err, AgentError::Json(_)));
    }
}
