//! Verification path of the content reducer.
//!
//! Scrape the cited page first; only when it yields text is the
//! fact-checking model consulted, through the bounded-retry extractor.

use crate::extraction::StructuredExtractor;
use crate::llm::ChatCompletion;
use crate::models::{VerificationOutcome, VerificationResult};
use crate::scrapers::PageScraper;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const SCRAPE_FAILURE: &str = "Unable to scrape website content";
pub const LLM_UNAVAILABLE: &str = "LLM not available for advanced verification";

pub struct NewsVerifier {
    scraper: PageScraper,
    llm: Option<Arc<dyn ChatCompletion>>,
}

impl NewsVerifier {
    /// `llm` is `None` when no credential was configured; verification then
    /// still scrapes but reports the fallback judgement.
    pub fn new(scraper: PageScraper, llm: Option<Arc<dyn ChatCompletion>>) -> Self {
        Self { scraper, llm }
    }

    #[instrument(level = "info", skip_all, fields(%headline, %source_url))]
    pub async fn verify(
        &self,
        headline: &str,
        description: &str,
        source_url: &str,
    ) -> VerificationOutcome {
        let Some(content) = self.scraper.scrape(source_url).await else {
            warn!("Source page could not be scraped; claim stays unverified");
            return VerificationOutcome::unverified(SCRAPE_FAILURE);
        };

        let Some(llm) = &self.llm else {
            warn!("No fact-checking model configured");
            return VerificationOutcome::Judged(VerificationResult::fallback(LLM_UNAVAILABLE));
        };

        let result = StructuredExtractor::new(llm.as_ref())
            .extract(&content, description)
            .await;
        info!(
            confidence_score = result.confidence_score,
            is_verified = result.is_verified,
            "Verification finished"
        );
        VerificationOutcome::Judged(result)
    }
}
