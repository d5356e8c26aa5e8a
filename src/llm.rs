//! LLM chat-completion interaction.
//!
//! Both services talk to OpenAI-compatible `/chat/completions` endpoints
//! (OpenAI for summaries, Together AI for verification). The reducers only
//! see the [`ChatCompletion`] trait, so tests and alternative backends can be
//! swapped in without touching the pipelines.
//!
//! This module performs no retries. Transport failures are returned to the
//! caller; the only retry policy in the crate lives in
//! [`crate::extraction`] and is about malformed output, not transport.

use crate::config::LlmSettings;
use crate::error::{AgentError, Result};
use crate::utils::truncate_for_log;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// One message of a chat conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// The parts of a chat-completion response the reducers look at.
///
/// Every field is optional on the wire: a reply without choices or without
/// message text deserializes fine and is reported by [`ChatReply::text`]
/// as having no payload.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReply {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatReplyMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatReply {
    /// A reply whose first choice carries `text`.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![ChatChoice {
                message: Some(ChatReplyMessage {
                    content: Some(text.into()),
                }),
            }],
        }
    }

    /// Message text of the first choice, if the reply has one.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.message.as_ref())
            .and_then(|message| message.content.as_deref())
    }
}

/// A chat-completion backend.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    /// Send `messages` and return the raw reply.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply>;
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

/// Client for an OpenAI-compatible chat endpoint with bearer authentication.
pub struct OpenAiChat {
    client: Client,
    settings: LlmSettings,
    api_key: String,
}

impl OpenAiChat {
    pub fn new(client: Client, settings: LlmSettings, api_key: impl Into<String>) -> Self {
        Self {
            client,
            settings,
            api_key: api_key.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        )
    }
}

impl fmt::Debug for OpenAiChat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiChat")
            .field("base_url", &self.settings.base_url)
            .field("model", &self.settings.model)
            .finish()
    }
}

#[async_trait]
impl ChatCompletion for OpenAiChat {
    #[instrument(level = "info", skip_all, fields(model = %self.settings.model))]
    async fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply> {
        let t0 = Instant::now();
        let request = ChatRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
            top_p: self.settings.top_p,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                %status,
                elapsed_ms = t0.elapsed().as_millis() as u64,
                body = %truncate_for_log(&body, 300),
                "Chat completion returned an error status"
            );
            return Err(AgentError::Llm(format!(
                "{}: {}",
                status,
                truncate_for_log(&body, 300)
            )));
        }

        let reply: ChatReply = response.json().await?;
        debug!(
            elapsed_ms = t0.elapsed().as_millis() as u64,
            choices = reply.choices.len(),
            "Chat completion finished"
        );
        Ok(reply)
    }
}
