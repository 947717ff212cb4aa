//! OpenAI chat-completions adapter.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use studymate_core::config::ProviderSettings;
use tracing::debug;

use crate::backend::{Completion, CompletionRequest};

pub const OPENAI_LABEL: &str = "OpenAI";

pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    /// `None` when no API key is configured.
    pub fn from_settings(settings: &ProviderSettings, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.api_key() else { return Ok(None) };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building OpenAI HTTP client")?;
        Ok(Some(Self {
            http,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }))
    }

    pub fn model(&self) -> &str { &self.model }

    /// JSON body sent to `/chat/completions`.
    pub fn request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: &request.system },
                ChatMessage { role: "user", content: &request.prompt },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
    }
}

/// Text of the first choice of a chat-completions response.
pub fn parse_chat_response(body: &str) -> anyhow::Result<String> {
    let parsed: ChatResponse = serde_json::from_str(body).context("decoding chat-completions response")?;
    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("response contained no message content"))
}

#[async_trait]
impl Completion for OpenAiClient {
    fn label(&self) -> &str { OPENAI_LABEL }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, max_tokens = request.max_tokens, "openai request");
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(request))
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed: {e}"))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| anyhow!("Failed to read response body: {e}"))?;
        if !status.is_success() {
            bail!("OpenAI returned {status}: {}", snippet(&body));
        }
        parse_chat_response(&body)
    }
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
