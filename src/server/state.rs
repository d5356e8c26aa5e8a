//! Shared handler state.

use super::error::{AGENT_UNINITIALIZED, ApiError};
use crate::summarizer::NewsSummarizer;
use crate::verifier::NewsVerifier;
use std::sync::Arc;

/// State of the summarizer service.
///
/// `agent` is `None` when startup could not build the summarizer (missing
/// credentials); the service still runs and answers every request with an
/// error.
#[derive(Clone, Default)]
pub struct SummarizerState {
    pub agent: Option<Arc<NewsSummarizer>>,
}

impl SummarizerState {
    pub fn new(agent: Option<NewsSummarizer>) -> Self {
        Self {
            agent: agent.map(Arc::new),
        }
    }

    pub fn agent(&self) -> Result<&NewsSummarizer, ApiError> {
        self.agent
            .as_deref()
            .ok_or_else(|| ApiError::internal(AGENT_UNINITIALIZED))
    }
}

#[derive(Clone)]
pub struct VerifierState {
    pub verifier: Arc<NewsVerifier>,
}

impl VerifierState {
    pub fn new(verifier: NewsVerifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
        }
    }
}
