//! Source page scraper used by the verifier.
//!
//! Downloads a page with a browser-like identity and reduces it to plain
//! text:
//!
//! 1. text inside `script`, `style`, `nav`, `header` and `footer` is ignored
//! 2. the main content is every `article`/`div` whose class mentions
//!    `article`, `content`, `main` or `body` (a match nested inside another
//!    match is not counted twice); pages without one fall back to `<body>`
//! 3. text nodes are trimmed, joined with spaces, whitespace is collapsed and
//!    the result is capped at the configured character budget
//!
//! A failed download, an error status or a page with no text all yield
//! `None`; scraping failure is an expected outcome, not an error.

use crate::config::ScrapeSettings;
use crate::error::Result;
use crate::utils::truncate_chars;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};
use tracing::{info, instrument, warn};

static CANDIDATES: Lazy<Selector> =
    Lazy::new(|| Selector::parse("article[class], div[class]").unwrap());
static BODY: Lazy<Selector> = Lazy::new(|| Selector::parse("body").unwrap());
static CONTENT_CLASS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(article|content|main|body)").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

const SKIPPED_TAGS: [&str; 5] = ["script", "style", "nav", "header", "footer"];

fn is_skipped(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|e| SKIPPED_TAGS.contains(&e.name()))
}

fn inside_skipped(element: &ElementRef<'_>) -> bool {
    element.ancestors().any(|a| is_skipped(a.value()))
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .descendants()
        .filter(|node| !node.ancestors().any(|a| is_skipped(a.value())))
        .filter_map(|node| node.value().as_text().map(|t| t.trim()))
        .filter(|t| !t.is_empty())
        .join(" ")
}

/// Reduce an HTML document to at most `max_chars` characters of main text.
pub fn extract_text(html: &str, max_chars: usize) -> Option<String> {
    let document = Html::parse_document(html);

    let mut picked: Vec<ElementRef<'_>> = Vec::new();
    for element in document.select(&CANDIDATES) {
        let class = element.value().attr("class").unwrap_or_default();
        if !CONTENT_CLASS.is_match(class) || inside_skipped(&element) {
            continue;
        }
        if element
            .ancestors()
            .any(|a| picked.iter().any(|p| p.id() == a.id()))
        {
            continue;
        }
        picked.push(element);
    }
    if picked.is_empty() {
        picked.extend(document.select(&BODY));
    }

    let joined = picked
        .into_iter()
        .map(element_text)
        .filter(|t| !t.is_empty())
        .join(" ");
    let collapsed = WHITESPACE.replace_all(&joined, " ");
    let text = truncate_chars(collapsed.trim(), max_chars);
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

/// HTTP client configured for scraping news pages.
#[derive(Debug, Clone)]
pub struct PageScraper {
    client: Client,
    max_chars: usize,
}

impl PageScraper {
    pub fn new(settings: &ScrapeSettings) -> Result<Self> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout())
            .build()?;
        Ok(Self {
            client,
            max_chars: settings.max_chars,
        })
    }

    /// Fetch `url` and return its main text, or `None` on any failure.
    #[instrument(level = "info", skip(self))]
    pub async fn scrape(&self, url: &str) -> Option<String> {
        let html = match self.fetch_html(url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(error = %e, "Scraping failed");
                return None;
            }
        };
        let text = extract_text(&html, self.max_chars);
        match &text {
            Some(t) => info!(chars = t.chars().count(), "Scraped page text"),
            None => warn!("Page contained no extractable text"),
        }
        text
    }

    async fn fetch_html(&self, url: &str) -> Result<String> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}
