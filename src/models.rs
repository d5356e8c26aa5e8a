//! Data models for queries, articles and their reduced representations.
//!
//! This module defines the structures that flow through both pipelines:
//! - [`ContentQuery`]: caller query, resolved once at the HTTP/CLI boundary
//! - [`NewsApiRequest`]: normalized endpoint + parameters sent to NewsAPI
//! - [`RawArticle`]: one listing record as returned by NewsAPI
//! - [`SummaryResult`]: an article after LLM summarization
//! - [`VerificationResult`] / [`VerificationOutcome`]: the verifier's judgement
//! - [`NewsResponse`]: the JSON envelope returned by the summarizer service
//!
//! Nothing here is persisted; every value lives for one request.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Confidence at or above which a claim counts as verified.
pub const VERIFIED_THRESHOLD: f64 = 0.7;

/// A caller-specified search request.
///
/// Either an opaque NewsAPI-style URL (`https://newsapi.org/v2/everything?q=...`)
/// or a direct parameter mapping whose optional `endpoint` key names the
/// listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentQuery {
    ByDescriptor(String),
    ByParameters(Map<String, Value>),
}

impl ContentQuery {
    /// Resolve the `url`/`params` pair of a request body.
    ///
    /// A non-empty `url` wins; otherwise a non-empty `params` mapping is used.
    /// Returns `None` when neither is usable.
    pub fn from_parts(url: Option<String>, params: Option<Map<String, Value>>) -> Option<Self> {
        match (url, params) {
            (Some(url), _) if !url.trim().is_empty() => Some(Self::ByDescriptor(url)),
            (_, Some(params)) if !params.is_empty() => Some(Self::ByParameters(params)),
            _ => None,
        }
    }
}

impl fmt::Display for ContentQuery {
    /// Human-readable form used as `query_info`.
    ///
    /// Credential parameters are left out so they are never echoed back.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ByDescriptor(url) => write!(f, "{}", redact_descriptor(url)),
            Self::ByParameters(params) => {
                let visible: Map<String, Value> = params
                    .iter()
                    .filter(|(k, _)| !is_credential_param(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                write!(f, "{}", Value::Object(visible))
            }
        }
    }
}

/// Undo whole-string percent-encoding of a descriptor.
///
/// Callers sometimes pass `https%3A%2F%2Fnewsapi.org%2Fv2%2F...`; a descriptor
/// that already contains `://` is returned untouched.
pub fn decode_descriptor(descriptor: &str) -> String {
    let trimmed = descriptor.trim();
    if trimmed.contains("://") {
        return trimmed.to_string();
    }
    match urlencoding::decode(trimmed) {
        Ok(decoded) if decoded.contains("://") => decoded.into_owned(),
        _ => trimmed.to_string(),
    }
}

/// Descriptor with any credential parameter removed, for display.
pub(crate) fn redact_descriptor(descriptor: &str) -> String {
    let decoded = decode_descriptor(descriptor);
    let Ok(mut parsed) = url::Url::parse(&decoded) else {
        return decoded;
    };
    if !parsed.query_pairs().any(|(k, _)| is_credential_param(&k)) {
        return decoded;
    }
    let kept: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(k, _)| !is_credential_param(k))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    if kept.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(kept);
    }
    parsed.to_string()
}

/// True for the NewsAPI credential parameter in any letter case.
pub fn is_credential_param(key: &str) -> bool {
    key.eq_ignore_ascii_case("apiKey")
}

/// A query normalized into a NewsAPI endpoint and flat string parameters.
///
/// Parameters are kept in a `BTreeMap` so the outbound query string is stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsApiRequest {
    pub endpoint: String,
    pub params: BTreeMap<String, String>,
}

/// The `source` object of a NewsAPI article.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ArticleSource {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
}

/// A raw article record as listed by NewsAPI.
///
/// Consumed once by the summarizer. `content` and `description` are often
/// `null` upstream and are kept optional.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawArticle {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default)]
    pub source: ArticleSource,
    #[serde(rename = "publishedAt", default, deserialize_with = "null_as_default")]
    pub published_at: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
}

impl RawArticle {
    /// Text to summarize: the body, falling back to the description.
    ///
    /// Empty strings count as absent.
    pub fn summarizable_text(&self) -> Option<&str> {
        self.content
            .as_deref()
            .filter(|c| !c.is_empty())
            .or_else(|| self.description.as_deref().filter(|d| !d.is_empty()))
    }
}

/// An article after summarization.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SummaryResult {
    pub title: String,
    pub source: String,
    pub published_date: String,
    pub summary: String,
    pub url: String,
}

/// A structured fact-checking judgement.
///
/// Either fully populated from a parsed LLM reply or replaced wholesale by a
/// fallback; `is_verified` is always derived from `confidence_score`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VerificationResult {
    pub confidence_score: f64,
    #[serde(rename = "isVerified")]
    pub is_verified: bool,
    pub matching_details: Vec<String>,
    pub discrepancies: Vec<String>,
}

impl VerificationResult {
    /// Build a result whose verified flag follows [`VERIFIED_THRESHOLD`].
    pub fn judged(
        confidence_score: f64,
        matching_details: Vec<String>,
        discrepancies: Vec<String>,
    ) -> Self {
        Self {
            confidence_score,
            is_verified: confidence_score >= VERIFIED_THRESHOLD,
            matching_details,
            discrepancies,
        }
    }

    /// The fixed low-confidence shape used when no judgement could be obtained.
    pub fn fallback(discrepancy: impl Into<String>) -> Self {
        Self {
            confidence_score: 0.5,
            is_verified: false,
            matching_details: Vec::new(),
            discrepancies: vec![discrepancy.into()],
        }
    }
}

/// Result of the verification pipeline.
///
/// `Unverified` is produced when the source page could not be scraped; no
/// LLM call is made in that case.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum VerificationOutcome {
    Judged(VerificationResult),
    Unverified {
        verification_status: &'static str,
        confidence_score: u8,
        error: String,
    },
}

impl VerificationOutcome {
    pub fn unverified(error: impl Into<String>) -> Self {
        Self::Unverified {
            verification_status: "unverified",
            confidence_score: 0,
            error: error.into(),
        }
    }
}

/// JSON envelope returned by the summarizer endpoints.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsResponse {
    pub status: String,
    pub query_info: String,
    pub summaries: Vec<SummaryResult>,
    pub timestamp: String,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_article_deserialization_with_nulls() {
        let raw = json!({
            "source": { "id": null, "name": "BBC News" },
            "author": null,
            "title": "Markets rally",
            "description": "Stocks rose on Friday.",
            "url": "https://bbc.co.uk/news/1",
            "publishedAt": "2025-02-09T10:00:00Z",
            "content": null
        });
        let article: RawArticle = serde_json::from_value(raw).unwrap();
        assert_eq!(article.source.name, "BBC News");
        assert_eq!(article.published_at, "2025-02-09T10:00:00Z");
        assert!(article.content.is_none());
        assert_eq!(article.summarizable_text(), Some("Stocks rose on Friday."));
    }

    #[test]
    fn test_raw_article_null_title() {
        let article: RawArticle =
            serde_json::from_value(json!({ "title": null, "url": "https://x.test" })).unwrap();
        assert_eq!(article.title, "");
        assert_eq!(article.source.name, "");
    }

    #[test]
    fn test_summarizable_text_prefers_content() {
        let article = RawArticle {
            content: Some("Body".to_string()),
            description: Some("Desc".to_string()),
            ..Default::default()
        };
        assert_eq!(article.summarizable_text(), Some("Body"));
    }

    #[test]
    fn test_summarizable_text_empty_strings_are_absent() {
        let article = RawArticle {
            content: Some(String::new()),
            description: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(article.summarizable_text(), None);
    }

    #[test]
    fn test_judged_threshold() {
        assert!(VerificationResult::judged(0.7, vec![], vec![]).is_verified);
        assert!(VerificationResult::judged(0.95, vec![], vec![]).is_verified);
        assert!(!VerificationResult::judged(0.69, vec![], vec![]).is_verified);
    }

    #[test]
    fn test_verification_result_wire_names() {
        let result = VerificationResult::fallback("Invalid LLM response structure");
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["confidence_score"], json!(0.5));
        assert_eq!(value["isVerified"], json!(false));
        assert_eq!(value["matching_details"], json!([]));
        assert_eq!(
            value["discrepancies"],
            json!(["Invalid LLM response structure"])
        );
    }

    #[test]
    fn test_unverified_outcome_shape() {
        let outcome = VerificationOutcome::unverified("Unable to scrape website content");
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["verification_status"], "unverified");
        assert_eq!(value["confidence_score"], json!(0));
        assert_eq!(value["error"], "Unable to scrape website content");
    }

    #[test]
    fn test_content_query_from_parts() {
        let params = json!({ "q": "bitcoin" }).as_object().cloned();
        assert_eq!(
            ContentQuery::from_parts(Some("https://newsapi.org/v2/everything?q=a".into()), params.clone()),
            Some(ContentQuery::ByDescriptor("https://newsapi.org/v2/everything?q=a".into()))
        );
        assert!(matches!(
            ContentQuery::from_parts(Some(String::new()), params),
            Some(ContentQuery::ByParameters(_))
        ));
        assert_eq!(ContentQuery::from_parts(None, Some(Map::new())), None);
        assert_eq!(ContentQuery::from_parts(None, None), None);
    }

    #[test]
    fn test_query_info_hides_credentials() {
        let params = json!({ "endpoint": "everything", "q": "ai", "apiKey": "secret" })
            .as_object()
            .cloned()
            .unwrap();
        let info = ContentQuery::ByParameters(params).to_string();
        assert!(info.contains("\"q\":\"ai\""));
        assert!(!info.contains("secret"));
    }

    #[test]
    fn test_descriptor_display_hides_credentials() {
        let query = ContentQuery::ByDescriptor(
            "https://newsapi.org/v2/top-headlines?country=us&apiKey=secret".to_string(),
        );
        assert_eq!(
            query.to_string(),
            "https://newsapi.org/v2/top-headlines?country=us"
        );
    }

    #[test]
    fn test_decode_descriptor() {
        assert_eq!(
            decode_descriptor("https%3A%2F%2Fnewsapi.org%2Fv2%2Feverything%3Fq%3Dai"),
            "https://newsapi.org/v2/everything?q=ai"
        );
        assert_eq!(
            decode_descriptor(" https://newsapi.org/v2/everything?q=a%20b "),
            "https://newsapi.org/v2/everything?q=a%20b"
        );
        assert_eq!(decode_descriptor("not a url"), "not a url");
    }
}
