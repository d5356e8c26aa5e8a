//! # News Agents
//!
//! Two small LLM-backed services over news content:
//!
//! - **summarizer**: lists articles from NewsAPI for a caller query and asks a
//!   chat model for a 2-3 sentence summary of each one
//! - **verifier**: scrapes the page a claim cites and asks a chat model for a
//!   structured fact-check judgement, retrying malformed replies a bounded
//!   number of times
//!
//! Both run as HTTP services, and each has a one-shot CLI counterpart
//! (`digest` and `verify`).
//!
//! ## Usage
//!
//! ```sh
//! news_agents summarizer                      # 0.0.0.0:8000
//! news_agents verifier                        # 0.0.0.0:8001
//! news_agents digest --url "https://newsapi.org/v2/top-headlines?country=us"
//! ```

use clap::Parser;
use reqwest::Client;
use std::error::Error;
use std::sync::Arc;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod config;
mod error;
mod extraction;
mod fetcher;
mod llm;
mod models;
mod outputs;
mod scrapers;
mod server;
mod summarizer;
#[cfg(test)]
mod testing;
mod utils;
mod verifier;

use cli::{Cli, Command, DigestArgs};
use config::ServiceConfig;
use error::AgentError;
use fetcher::NewsFetcher;
use llm::{ChatCompletion, OpenAiChat};
use outputs::text::{format_results, write_report};
use scrapers::PageScraper;
use server::{SummarizerState, VerifierState, summarizer_router, verifier_router};
use summarizer::NewsSummarizer;
use verifier::NewsVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    let args = Cli::parse();
    info!(command = ?args.command, "news_agents starting up");

    let config = ServiceConfig::load(args.config.as_deref(), args.credentials())?;

    match args.command {
        Command::Summarizer { addr } => {
            let agent = match build_summarizer(&config) {
                Ok(agent) => Some(agent),
                Err(e) => {
                    error!(error = %e, "Summarizer not initialized; requests will fail until restarted with credentials");
                    None
                }
            };
            server::serve(summarizer_router(SummarizerState::new(agent)), &addr).await?;
        }
        Command::Verifier { addr } => {
            let verifier = build_verifier(&config)?;
            server::serve(verifier_router(VerifierState::new(verifier)), &addr).await?;
        }
        Command::Digest(digest) => run_digest(&config, &digest).await?,
        Command::Verify {
            headline,
            description,
            source_url,
        } => {
            let verifier = build_verifier(&config)?;
            let outcome = verifier.verify(&headline, &description, &source_url).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    info!(
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "news_agents finished"
    );
    Ok(())
}

/// Build the summarizer from configuration; fails when a key is missing.
fn build_summarizer(config: &ServiceConfig) -> Result<NewsSummarizer, AgentError> {
    let (news_api_key, openai_api_key) = config.summarizer_credentials()?;
    let client = Client::builder().build()?;
    let fetcher = NewsFetcher::new(client.clone(), config.news_api.base_url.clone(), news_api_key);
    let llm = OpenAiChat::new(client, config.summarizer_llm.clone(), openai_api_key);
    info!(model = %llm.model(), "Summarizer initialized");
    Ok(NewsSummarizer::new(fetcher, Arc::new(llm)))
}

/// Build the verifier; a missing model key degrades to the fallback judgement.
fn build_verifier(config: &ServiceConfig) -> Result<NewsVerifier, AgentError> {
    let scraper = PageScraper::new(&config.scrape)?;
    let llm: Option<Arc<dyn ChatCompletion>> = match config.verifier_credential() {
        Ok(key) => {
            let chat = OpenAiChat::new(Client::builder().build()?, config.verifier_llm.clone(), key);
            info!(model = %chat.model(), "Verifier model initialized");
            Some(Arc::new(chat))
        }
        Err(e) => {
            error!(error = %e, "Verifier running without a model");
            None
        }
    };
    Ok(NewsVerifier::new(scraper, llm))
}

#[instrument(level = "info", skip_all, fields(max_articles = digest.max_articles))]
async fn run_digest(config: &ServiceConfig, digest: &DigestArgs) -> Result<(), AgentError> {
    let query = digest
        .query()
        .ok_or_else(|| AgentError::InvalidQuery("either --url or --param must be given".to_string()))?;
    let summarizer = build_summarizer(config)?;

    let summaries = summarizer.process_news(&query, digest.max_articles).await?;
    let report = format_results(&summaries, Some(&query.to_string()));
    println!("{}", report);

    if let Some(dir) = &digest.output_dir {
        let path = write_report(dir, &report).await?;
        println!("Results saved to {}", path);
    }
    Ok(())
}
