//! Bounded-retry structured extraction.
//!
//! The fact-checking model is untrusted as a formatter: it sometimes answers
//! with prose, a fenced code block, or JSON that does not parse. This module
//! turns its free-text replies into a [`VerificationResult`] without blocking
//! indefinitely.
//!
//! # State machine
//!
//! ```text
//!            ┌──────────── reply ────────────┐
//!            │                               ▼
//!   Pending{n} ──call──► transition(n, outcome) ──► Succeeded(result)
//!      ▲                         │           └────► FailedTerminal(failure)
//!      │                         ▼
//!   Sleeping{n+1} ◄─── FailedRetryable{n, failure}
//! ```
//!
//! Each reply is validated in order:
//! 1. no usable payload → terminal immediately (structural/API problem)
//! 2. trimmed text not wrapped in `{` … `}` → retryable
//! 3. strict JSON parse failure → retryable
//!
//! Transport failures of the call itself are retryable as well. Attempts are
//! capped at [`MAX_ATTEMPTS`] with a fixed [`RETRY_DELAY`] between them, so
//! the worst case is `MAX_ATTEMPTS × (call latency) + (MAX_ATTEMPTS - 1) × RETRY_DELAY`.

use crate::error::Result;
use crate::llm::{ChatCompletion, ChatMessage, ChatReply};
use crate::models::{VerificationResult, null_as_default};
use crate::utils::{looks_truncated, truncate_chars, truncate_for_log};
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

pub const MAX_ATTEMPTS: u32 = 4;
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Characters of scraped text sent to the model.
pub const REFERENCE_PREFIX_CHARS: usize = 1000;

pub const FACT_CHECK_INSTRUCTION: &str = "You are a fact-checking AI. Compare the scraped content with the original news description and return a JSON output. The JSON format must include: confidence_score (float between 0 and 1), matching_details (list of strings), and discrepancies (list of strings).";

/// Why a single attempt did not produce a judgement.
#[derive(Debug, Clone, PartialEq)]
pub enum Failure {
    /// The reply had no choices or no message text.
    InvalidStructure,
    /// The text was not wrapped in braces.
    NotJson,
    /// The text looked like JSON but did not parse into a judgement.
    Parse(String),
    /// The call itself failed.
    Transport(String),
}

impl Failure {
    fn is_retryable(&self) -> bool {
        !matches!(self, Failure::InvalidStructure)
    }

    /// Discrepancy text reported in the fallback result.
    pub fn discrepancy(&self) -> String {
        match self {
            Failure::InvalidStructure => "Invalid LLM response structure".to_string(),
            Failure::NotJson => "LLM response is not properly formatted JSON".to_string(),
            Failure::Parse(e) => format!("JSON parsing error: {}", e),
            Failure::Transport(e) => e.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    Parsed(VerificationResult),
    Failed(Failure),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionState {
    Pending { attempt: u32 },
    Sleeping { attempt: u32 },
    FailedRetryable { attempt: u32, failure: Failure },
    Succeeded(VerificationResult),
    FailedTerminal(Failure),
}

/// Next state after attempt number `attempt` (1-based) produced `outcome`.
pub fn transition(attempt: u32, max_attempts: u32, outcome: AttemptOutcome) -> ExtractionState {
    match outcome {
        AttemptOutcome::Parsed(result) => ExtractionState::Succeeded(result),
        AttemptOutcome::Failed(failure) if failure.is_retryable() && attempt < max_attempts => {
            ExtractionState::FailedRetryable { attempt, failure }
        }
        AttemptOutcome::Failed(failure) => ExtractionState::FailedTerminal(failure),
    }
}

#[derive(Deserialize)]
struct Judgement {
    confidence_score: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    matching_details: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    discrepancies: Vec<String>,
}

/// Validate one raw reply.
pub fn classify(reply: &Result<ChatReply>) -> AttemptOutcome {
    let reply = match reply {
        Ok(reply) => reply,
        Err(e) => return AttemptOutcome::Failed(Failure::Transport(e.to_string())),
    };
    let Some(text) = reply.text() else {
        return AttemptOutcome::Failed(Failure::InvalidStructure);
    };
    match parse_judgement(text) {
        Ok(result) => AttemptOutcome::Parsed(result),
        Err(failure) => AttemptOutcome::Failed(failure),
    }
}

/// Brace check followed by a strict parse.
pub fn parse_judgement(text: &str) -> std::result::Result<VerificationResult, Failure> {
    let text = text.trim();
    if !text.starts_with('{') || !text.ends_with('}') {
        return Err(Failure::NotJson);
    }
    let cleaned = text.replace('\n', " ");
    let judgement: Judgement = serde_json::from_str(cleaned.trim()).map_err(|e| {
        if looks_truncated(&e) {
            debug!(error = %e, "Reply looks truncated");
        }
        Failure::Parse(e.to_string())
    })?;
    Ok(VerificationResult::judged(
        judgement.confidence_score,
        judgement.matching_details,
        judgement.discrepancies,
    ))
}

/// System + user messages for one claim.
pub fn build_messages(reference: &str, claim: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(FACT_CHECK_INSTRUCTION),
        ChatMessage::user(format!(
            "Scraped Content: {}\n\nOriginal Description: {}\n\nProvide output in JSON format.",
            truncate_chars(reference, REFERENCE_PREFIX_CHARS),
            claim
        )),
    ]
}

/// Drives the state machine against a [`ChatCompletion`] backend.
pub struct StructuredExtractor<'a> {
    llm: &'a dyn ChatCompletion,
    max_attempts: u32,
    retry_delay: Duration,
}

impl<'a> StructuredExtractor<'a> {
    pub fn new(llm: &'a dyn ChatCompletion) -> Self {
        Self {
            llm,
            max_attempts: MAX_ATTEMPTS,
            retry_delay: RETRY_DELAY,
        }
    }

    /// Judge `claim` against `reference`. Never fails: exhaustion and
    /// structural problems yield [`VerificationResult::fallback`].
    #[instrument(level = "info", skip_all, fields(reference_chars = reference.chars().count()))]
    pub async fn extract(&self, reference: &str, claim: &str) -> VerificationResult {
        let messages = build_messages(reference, claim);
        let mut state = ExtractionState::Pending { attempt: 1 };

        loop {
            state = match state {
                ExtractionState::Pending { attempt } => {
                    let reply = self.llm.complete(&messages).await;
                    match &reply {
                        Ok(r) => info!(
                            attempt,
                            raw = %truncate_for_log(r.text().unwrap_or("<no payload>"), 500),
                            "Raw LLM response"
                        ),
                        Err(e) => warn!(attempt, error = %e, "LLM verification call failed"),
                    }
                    transition(attempt, self.max_attempts, classify(&reply))
                }
                ExtractionState::FailedRetryable { attempt, failure } => {
                    warn!(
                        attempt,
                        max = self.max_attempts,
                        reason = %failure.discrepancy(),
                        "Attempt failed; retrying"
                    );
                    ExtractionState::Sleeping {
                        attempt: attempt + 1,
                    }
                }
                ExtractionState::Sleeping { attempt } => {
                    sleep(self.retry_delay).await;
                    ExtractionState::Pending { attempt }
                }
                ExtractionState::Succeeded(result) => {
                    info!(
                        confidence_score = result.confidence_score,
                        is_verified = result.is_verified,
                        "Structured judgement obtained"
                    );
                    return result;
                }
                ExtractionState::FailedTerminal(failure) => {
                    error!(reason = %failure.discrepancy(), "Structured extraction failed; using fallback");
                    return VerificationResult::fallback(failure.discrepancy());
                }
            };
        }
    }
}
