//! HTTP surface of both services.
//!
//! Each service gets its own axum [`Router`]; both carry permissive CORS and
//! request tracing.

pub mod error;
pub mod state;
pub mod summarize;
pub mod verify;

use crate::error::Result;
use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

pub use state::{SummarizerState, VerifierState};

pub const SUMMARIZER_ADDR: &str = "0.0.0.0:8000";
pub const VERIFIER_ADDR: &str = "0.0.0.0:8001";

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Router of the news summarizer service.
pub fn summarizer_router(state: SummarizerState) -> Router {
    Router::new()
        .route("/", get(summarize::root))
        .route("/summarize", post(summarize::summarize))
        .route("/top-headlines", get(summarize::top_headlines))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Router of the news verification service.
pub fn verifier_router(state: VerifierState) -> Router {
    Router::new()
        .route("/", get(verify::root))
        .route("/health", get(verify::health))
        .route("/verify-news", post(verify::verify_news))
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

/// Bind `addr` and serve `app` until the process stops.
pub async fn serve(app: Router, addr: &str) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}
