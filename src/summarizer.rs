//! Summarization path of the content reducer.
//!
//! [`NewsSummarizer`] ties the [`NewsFetcher`] to a chat model: every listed
//! article is reduced to a [`SummaryResult`] in a strict sequential loop.
//! Articles with neither body nor description skip the model entirely, and
//! an article whose summary call fails is logged and dropped without
//! aborting the batch.

use crate::error::{AgentError, Result};
use crate::fetcher::NewsFetcher;
use crate::llm::{ChatCompletion, ChatMessage};
use crate::models::{ContentQuery, RawArticle, SummaryResult};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

pub const NO_CONTENT_SUMMARY: &str = "No content available for summarization.";

/// Prompt for one article.
pub fn summary_prompt(title: &str, content: &str) -> String {
    format!(
        "Please provide a concise summary of the following news article:\n\n\
         Title: {}\n\
         Content: {}\n\n\
         Summary (in 2-3 sentences, focusing on key points and maintaining journalistic neutrality):",
        title, content
    )
}

pub struct NewsSummarizer {
    fetcher: NewsFetcher,
    llm: Arc<dyn ChatCompletion>,
}

impl NewsSummarizer {
    pub fn new(fetcher: NewsFetcher, llm: Arc<dyn ChatCompletion>) -> Self {
        Self { fetcher, llm }
    }

    /// Summarize one raw article.
    #[instrument(level = "info", skip_all, fields(title = %article.title))]
    pub async fn summarize_article(&self, article: &RawArticle) -> Result<SummaryResult> {
        let summary = match article.summarizable_text() {
            None => {
                debug!("Article has no content; skipping model call");
                NO_CONTENT_SUMMARY.to_string()
            }
            Some(content) => {
                let t0 = Instant::now();
                let prompt = summary_prompt(&article.title, content);
                let reply = self.llm.complete(&[ChatMessage::user(prompt)]).await?;
                let text = reply
                    .text()
                    .ok_or_else(|| AgentError::Llm("reply contained no summary text".to_string()))?;
                debug!(elapsed_ms = t0.elapsed().as_millis() as u64, "Summary generated");
                text.trim().to_string()
            }
        };

        Ok(SummaryResult {
            title: article.title.clone(),
            source: article.source.name.clone(),
            published_date: article.published_at.clone(),
            summary,
            url: article.url.clone(),
        })
    }

    /// Summarize a batch in order, dropping articles whose summary fails.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn summarize_all(&self, articles: &[RawArticle]) -> Vec<SummaryResult> {
        let summaries: Vec<SummaryResult> = stream::iter(articles.iter().enumerate())
            .then(|(index, article)| async move {
                match self.summarize_article(article).await {
                    Ok(summary) => Some(summary),
                    Err(e) => {
                        error!(index, title = %article.title, error = %e, "Error processing article; skipping");
                        None
                    }
                }
            })
            .filter_map(|opt| std::future::ready(opt))
            .collect()
            .await;

        info!(
            total = articles.len(),
            successful = summaries.len(),
            failed = articles.len() - summaries.len(),
            "Completed article summaries"
        );
        summaries
    }

    /// Fetch, then summarize, the articles matching `query`.
    pub async fn process_news(
        &self,
        query: &ContentQuery,
        max_articles: u32,
    ) -> Result<Vec<SummaryResult>> {
        let articles = self.fetcher.fetch(query, max_articles).await?;
        Ok(self.summarize_all(&articles).await)
    }
}
