//! NewsAPI fetcher.
//!
//! Normalizes a [`ContentQuery`] into a [`NewsApiRequest`], injects the
//! service's own credential and a page-size cap, and returns the first page
//! of [`RawArticle`]s.
//!
//! # Query forms
//!
//! | Form | Example | Endpoint |
//! |------|---------|----------|
//! | Descriptor | `https://newsapi.org/v2/top-headlines?country=us` | last path segment |
//! | Parameters | `{"endpoint": "everything", "q": "crypto"}` | `endpoint` key, default `everything` |
//!
//! A caller-supplied `apiKey` is dropped in both forms.

use crate::error::{AgentError, Result};
use crate::models::{
    ContentQuery, NewsApiRequest, RawArticle, decode_descriptor, is_credential_param,
    redact_descriptor,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info, instrument};
use url::Url;

pub const DEFAULT_ENDPOINT: &str = "everything";
pub const DEFAULT_MAX_ARTICLES: u32 = 5;

/// NewsAPI refuses page sizes above this.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Clamp a requested article count into `1..=MAX_PAGE_SIZE`.
pub fn clamp_max_articles(requested: u32) -> u32 {
    requested.clamp(1, MAX_PAGE_SIZE)
}

/// Decompose a NewsAPI-style URL into endpoint and parameters.
///
/// The first value of a repeated key wins and blank values are dropped.
pub fn parse_descriptor(descriptor: &str) -> Result<NewsApiRequest> {
    let decoded = decode_descriptor(descriptor);
    let parsed = Url::parse(&decoded)?;
    let endpoint = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default()
        .to_string();
    if endpoint.is_empty() {
        return Err(AgentError::InvalidQuery(format!(
            "no endpoint in descriptor: {}",
            redact_descriptor(&decoded)
        )));
    }

    let mut params = BTreeMap::new();
    for (key, value) in parsed.query_pairs() {
        if value.is_empty() || is_credential_param(&key) {
            continue;
        }
        params
            .entry(key.into_owned())
            .or_insert_with(|| value.into_owned());
    }
    Ok(NewsApiRequest { endpoint, params })
}

/// Turn a parameter mapping into a request, pulling out `endpoint`.
pub fn normalize_parameters(mut mapping: Map<String, Value>) -> NewsApiRequest {
    let endpoint = match mapping.remove("endpoint") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        _ => DEFAULT_ENDPOINT.to_string(),
    };
    let params = mapping
        .into_iter()
        .filter(|(key, _)| !is_credential_param(key))
        .filter_map(|(key, value)| param_value(value).map(|v| (key, v)))
        .collect();
    NewsApiRequest { endpoint, params }
}

fn param_value(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Resolve a caller query once, at the boundary.
pub fn normalize(query: &ContentQuery) -> Result<NewsApiRequest> {
    match query {
        ContentQuery::ByDescriptor(descriptor) => parse_descriptor(descriptor),
        ContentQuery::ByParameters(mapping) => Ok(normalize_parameters(mapping.clone())),
    }
}

#[derive(Deserialize)]
struct ListingBody {
    articles: Option<Vec<RawArticle>>,
    message: Option<String>,
}

/// Client for the NewsAPI listing endpoints.
pub struct NewsFetcher {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsFetcher {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    /// Fetch at most `max_articles` raw records for `query`.
    ///
    /// # Errors
    ///
    /// [`AgentError::Fetch`] when NewsAPI answers with a non-success status or
    /// a body without `articles`; no partial list is returned in that case.
    #[instrument(level = "info", skip_all, fields(max_articles = max_articles))]
    pub async fn fetch(&self, query: &ContentQuery, max_articles: u32) -> Result<Vec<RawArticle>> {
        let mut request = normalize(query)?;
        let max_articles = clamp_max_articles(max_articles);
        let url = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            request.endpoint
        );
        info!(endpoint = %request.endpoint, params = ?request.params, "Fetching NewsAPI listing");

        request
            .params
            .insert("pageSize".to_string(), max_articles.to_string());
        request
            .params
            .insert("apiKey".to_string(), self.api_key.clone());
        let response = self.client.get(&url).query(&request.params).send().await?;

        let status = response.status();
        let body: Option<ListingBody> = response.json().await.ok();

        if !status.is_success() {
            let message = body
                .and_then(|b| b.message)
                .unwrap_or_else(|| "Unknown error".to_string());
            error!(%status, %message, "NewsAPI request failed");
            return Err(AgentError::Fetch(message));
        }

        let mut articles = body.and_then(|b| b.articles).ok_or_else(|| {
            error!(%status, "NewsAPI response has no articles");
            AgentError::Fetch("response did not contain articles".to_string())
        })?;
        articles.truncate(max_articles as usize);

        info!(count = articles.len(), "Fetched NewsAPI articles");
        debug!(titles = ?articles.iter().map(|a| &a.title).collect::<Vec<_>>(), "Article titles");
        Ok(articles)
    }
}

impl fmt::Debug for NewsFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsFetcher")
            .field("base_url", &self.base_url)
            .finish()
    }
}
