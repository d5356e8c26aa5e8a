//! Summarizer service handlers.

use super::error::ApiError;
use super::state::SummarizerState;
use crate::fetcher::DEFAULT_MAX_ARTICLES;
use crate::models::{ContentQuery, NewsResponse};
use crate::outputs::json::news_response;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

fn default_max_articles() -> u32 {
    DEFAULT_MAX_ARTICLES
}

#[derive(Debug, Deserialize)]
pub struct NewsRequest {
    pub url: Option<String>,
    pub params: Option<Map<String, Value>>,
    #[serde(default = "default_max_articles")]
    pub max_articles: u32,
}

#[derive(Debug, Deserialize)]
pub struct TopHeadlinesQuery {
    pub country: Option<String>,
    pub category: Option<String>,
    pub q: Option<String>,
    #[serde(default = "default_max_articles")]
    pub max_articles: u32,
}

impl TopHeadlinesQuery {
    /// Parameter mapping for the `top-headlines` endpoint, or `None` when no
    /// filter was given.
    fn parameters(&self) -> Option<Map<String, Value>> {
        let mut params = Map::new();
        for (key, value) in [
            ("country", &self.country),
            ("category", &self.category),
            ("q", &self.q),
        ] {
            if let Some(value) = value {
                params.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        if params.is_empty() {
            return None;
        }
        params.insert("endpoint".to_string(), json!("top-headlines"));
        Some(params)
    }
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "status": "active",
        "message": "News Summarizer API is running"
    }))
}

pub async fn summarize(
    State(state): State<SummarizerState>,
    Json(req): Json<NewsRequest>,
) -> Result<Json<NewsResponse>, ApiError> {
    let agent = state.agent()?;
    let query = ContentQuery::from_parts(req.url, req.params)
        .ok_or_else(|| ApiError::bad_request("Either url or params must be provided"))?;

    info!(query = %query, max_articles = req.max_articles, "Summarize request");
    let summaries = agent.process_news(&query, req.max_articles).await?;
    Ok(Json(news_response(query.to_string(), summaries)))
}

pub async fn top_headlines(
    State(state): State<SummarizerState>,
    Query(params): Query<TopHeadlinesQuery>,
) -> Result<Json<NewsResponse>, ApiError> {
    let agent = state.agent()?;
    let mapping = params.parameters().ok_or_else(|| {
        ApiError::bad_request("At least one parameter (country, category, or q) must be provided")
    })?;

    let query = ContentQuery::ByParameters(mapping);
    info!(query = %query, max_articles = params.max_articles, "Top headlines request");
    let summaries = agent.process_news(&query, params.max_articles).await?;
    Ok(Json(news_response(query.to_string(), summaries)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::NewsFetcher;
    use crate::server::summarizer_router;
    use crate::summarizer::NewsSummarizer;
    use crate::testing::{ScriptedChat, spawn_stub};
    use axum::{
        Router,
        body::{Body, to_bytes},
        extract::RawQuery,
        http::{Request, StatusCode},
        routing::get,
    };
    use reqwest::Client;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn offline_app() -> Router {
        let fetcher = NewsFetcher::new(Client::new(), "http://127.0.0.1:9/v2", "service-secret");
        let agent = NewsSummarizer::new(fetcher, Arc::new(ScriptedChat::default()));
        summarizer_router(SummarizerState::new(Some(agent)))
    }

    /// NewsAPI stub that records the raw query string of the last request.
    async fn news_api(seen: Arc<Mutex<Option<String>>>) -> String {
        let app = Router::new().route(
            "/v2/{endpoint}",
            get(move |RawQuery(query): RawQuery| {
                let seen = seen.clone();
                async move {
                    *seen.lock().unwrap() = query;
                    Json(json!({
                        "status": "ok",
                        "articles": [
                            { "source": { "name": "BBC News" }, "title": "Rates hold", "publishedAt": "2025-02-09T10:00:00Z", "url": "https://bbc.co.uk/1", "content": "The bank held rates." }
                        ]
                    }))
                }
            }),
        );
        spawn_stub(app).await
    }

    #[tokio::test]
    async fn test_root_liveness() {
        let (status, body) = call(offline_app(), get_request("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "active", "message": "News Summarizer API is running"}));
    }

    #[tokio::test]
    async fn test_summarize_requires_url_or_params() {
        let (status, body) = call(offline_app(), post_json("/summarize", json!({"max_articles": 3}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Either url or params must be provided");
    }

    #[tokio::test]
    async fn test_top_headlines_requires_filter() {
        let (status, body) = call(offline_app(), get_request("/top-headlines?max_articles=2")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["detail"],
            "At least one parameter (country, category, or q) must be provided"
        );
    }

    #[tokio::test]
    async fn test_uninitialized_agent() {
        let app = summarizer_router(SummarizerState::default());
        let (status, body) = call(app.clone(), get_request("/top-headlines?country=us")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "News agent not properly initialized. Check server logs.");

        let (status, _) = call(app, post_json("/summarize", json!({"url": "https://newsapi.org/v2/everything?q=x"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_fetch_error_becomes_detail() {
        let (status, body) = call(
            offline_app(),
            post_json("/summarize", json!({"params": {"q": "bitcoin"}})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("HTTP error"));
        assert!(!detail.contains("service-secret"));
    }

    #[tokio::test]
    async fn test_invalid_descriptor_detail_hides_caller_key() {
        let (status, body) = call(
            offline_app(),
            post_json("/summarize", json!({"url": "https://newsapi.org/?apiKey=caller-secret"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("invalid query"));
        assert!(!detail.contains("caller-secret"));
    }

    #[tokio::test]
    async fn test_summarize_by_url_hides_credential() {
        let seen = Arc::new(Mutex::new(None));
        let base = news_api(seen.clone()).await;
        let llm = Arc::new(ScriptedChat::texts(&["Rates were held."]));
        let agent = NewsSummarizer::new(
            NewsFetcher::new(Client::new(), format!("{}/v2", base), "server-key"),
            llm.clone(),
        );
        let app = summarizer_router(SummarizerState::new(Some(agent)));

        let url = format!("{}/v2/everything?q=rates&apiKey=caller-key", base);
        let (status, body) = call(app, post_json("/summarize", json!({"url": url, "max_articles": 1}))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert_eq!(body["summaries"][0]["summary"], "Rates were held.");
        assert_eq!(body["summaries"][0]["source"], "BBC News");
        assert!(!body["query_info"].as_str().unwrap().contains("caller-key"));
        let sent = seen.lock().unwrap().clone().unwrap();
        assert!(sent.contains("apiKey=server-key"));
        assert!(!sent.contains("caller-key"));
        assert!(sent.contains("pageSize=1"));
    }

    #[tokio::test]
    async fn test_top_headlines_builds_parameters() {
        let seen = Arc::new(Mutex::new(None));
        let base = news_api(seen.clone()).await;
        let agent = NewsSummarizer::new(
            NewsFetcher::new(Client::new(), format!("{}/v2", base), "k"),
            Arc::new(ScriptedChat::texts(&["Summary."])),
        );
        let app = summarizer_router(SummarizerState::new(Some(agent)));

        let (status, body) = call(app, get_request("/top-headlines?country=us&category=business")).await;
        assert_eq!(status, StatusCode::OK);
        let info: Value = serde_json::from_str(body["query_info"].as_str().unwrap()).unwrap();
        assert_eq!(info["endpoint"], "top-headlines");
        assert_eq!(info["country"], "us");
        let sent = seen.lock().unwrap().clone().unwrap();
        assert!(sent.contains("category=business"));
        assert!(sent.contains("pageSize=5"));
        assert!(!sent.contains("endpoint"));
    }
}
