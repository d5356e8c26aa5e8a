//! Command-line interface definitions for the news agents.
//!
//! Credentials come from flags or, more usually, the environment. Global
//! options may appear before or after the subcommand.

use crate::config::Credentials;
use crate::fetcher::DEFAULT_MAX_ARTICLES;
use crate::models::ContentQuery;
use crate::server::{SUMMARIZER_ADDR, VERIFIER_ADDR};
use clap::{ArgGroup, Args, Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// News summarizer and verifier services.
///
/// # Examples
///
/// ```sh
/// # Serve the summarizer on 0.0.0.0:8000
/// NEWS_API_KEY=... OPENAI_API_KEY=... news_agents summarizer
///
/// # One-off digest saved to ./reports
/// news_agents digest --url "https://newsapi.org/v2/top-headlines?country=us" -o ./reports
///
/// # Check a claim
/// TOGETHER_API_KEY=... news_agents verify --headline "..." --description "..." --source-url https://...
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// NewsAPI key
    #[arg(long, env = "NEWS_API_KEY", global = true, hide_env_values = true)]
    pub news_api_key: Option<String>,

    /// Key for the summarizer's chat model
    #[arg(long, env = "OPENAI_API_KEY", global = true, hide_env_values = true)]
    pub openai_api_key: Option<String>,

    /// Key for the verifier's chat model
    #[arg(long, env = "TOGETHER_API_KEY", global = true, hide_env_values = true)]
    pub together_api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            news_api_key: self.news_api_key.clone(),
            openai_api_key: self.openai_api_key.clone(),
            together_api_key: self.together_api_key.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the news summarizer API
    Summarizer {
        #[arg(long, default_value = SUMMARIZER_ADDR)]
        addr: String,
    },
    /// Serve the news verification API
    Verifier {
        #[arg(long, default_value = VERIFIER_ADDR)]
        addr: String,
    },
    /// Fetch, summarize and print a news digest
    Digest(DigestArgs),
    /// Verify one claim against its source page and print the outcome
    Verify {
        #[arg(long)]
        headline: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        source_url: String,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("query").required(true).args(["url", "params"])))]
pub struct DigestArgs {
    /// NewsAPI-style URL, e.g. https://newsapi.org/v2/everything?q=Apple
    #[arg(long)]
    pub url: Option<String>,

    /// Query parameter as key=value; repeatable. `endpoint=...` selects the endpoint
    #[arg(short, long = "param", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    #[arg(short = 'n', long, default_value_t = DEFAULT_MAX_ARTICLES)]
    pub max_articles: u32,

    /// Also save the report to this directory
    #[arg(short, long)]
    pub output_dir: Option<String>,
}

impl DigestArgs {
    pub fn query(&self) -> Option<ContentQuery> {
        let params: Map<String, Value> = self
            .params
            .iter()
            .map(|(k, v)| (k.clone(), Value::String(v.clone())))
            .collect();
        let params = (!params.is_empty()).then_some(params);
        ContentQuery::from_parts(self.url.clone(), params)
    }
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got `{}`", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty key in `{}`", raw));
    }
    Ok((key.to_string(), value.trim().to_string()))
}
