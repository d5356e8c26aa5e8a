//! Verifier service handlers.

use super::state::VerifierState;
use crate::models::{VerificationOutcome, VerificationResult};
use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::error;

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub headline: String,
    pub description: String,
    pub source_url: String,
}

pub async fn root() -> Json<Value> {
    Json(json!({
        "service": "News Verification API",
        "status": "operational"
    }))
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Verify a claim against its cited page.
///
/// Always answers 200 with the judgement shape: an unscraped page scores 0
/// with empty lists, and a verification task that dies reports the failure
/// as its only discrepancy.
pub async fn verify_news(
    State(state): State<VerifierState>,
    Json(req): Json<VerifyRequest>,
) -> Json<VerificationResult> {
    let verifier = state.verifier.clone();
    let task = tokio::spawn(async move {
        verifier
            .verify(&req.headline, &req.description, &req.source_url)
            .await
    });

    let result = match task.await {
        Ok(VerificationOutcome::Judged(result)) => result,
        Ok(VerificationOutcome::Unverified { .. }) => VerificationResult::judged(0.0, Vec::new(), Vec::new()),
        Err(e) => {
            error!(error = %e, "Verification task failed");
            VerificationResult::judged(0.0, Vec::new(), vec![format!("Verification failed: {}", e)])
        }
    };
    Json(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScrapeSettings;
    use crate::scrapers::PageScraper;
    use crate::server::verifier_router;
    use crate::testing::{ScriptedChat, spawn_stub};
    use crate::verifier::NewsVerifier;
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, StatusCode},
        response::Html,
        routing::get,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn app(llm: Arc<ScriptedChat>) -> Router {
        let scraper = PageScraper::new(&ScrapeSettings::default()).unwrap();
        verifier_router(VerifierState::new(NewsVerifier::new(scraper, Some(llm))))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn verify_request(source_url: &str) -> Request<Body> {
        let body = json!({
            "headline": "Bitcoin Fails To Rise Above $98,000",
            "description": "Bitcoin price stood at $97,317.23 on Friday.",
            "source_url": source_url
        });
        Request::builder()
            .method("POST")
            .uri("/verify-news")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_liveness_routes() {
        let llm = Arc::new(ScriptedChat::default());
        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let (status, body) = call(app(llm.clone()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"service": "News Verification API", "status": "operational"}));

        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, body) = call(app(llm), request).await;
        assert_eq!(body, json!({"status": "healthy"}));
    }

    #[tokio::test]
    async fn test_unscraped_source_scores_zero() {
        let llm = Arc::new(ScriptedChat::default());
        let (status, body) = call(app(llm.clone()), verify_request("http://127.0.0.1:9/gone")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["confidence_score"], json!(0.0));
        assert_eq!(body["isVerified"], false);
        assert_eq!(body["matching_details"], json!([]));
        assert_eq!(body["discrepancies"], json!([]));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_verify_news_returns_judgement() {
        let page = Router::new().route(
            "/story",
            get(|| async { Html("<html><body><article class=\"article\">Bitcoin price stood at $97,317.23.</article></body></html>") }),
        );
        let base = spawn_stub(page).await;
        let llm = Arc::new(ScriptedChat::texts(&[
            "{\"confidence_score\": 0.4, \"matching_details\": [], \"discrepancies\": [\"headline overstates\"]}",
        ]));

        let (status, body) = call(app(llm.clone()), verify_request(&format!("{}/story", base))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["confidence_score"], json!(0.4));
        assert_eq!(body["isVerified"], false);
        assert_eq!(body["discrepancies"], json!(["headline overstates"]));
        assert_eq!(llm.calls(), 1);
    }
}
