//! Google Gemini `generateContent` adapter.

use std::time::Duration;

use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use studymate_core::config::ProviderSettings;
use tracing::debug;

use crate::backend::{Completion, CompletionRequest};
use crate::openai::snippet;

pub const GEMINI_LABEL: &str = "Gemini";

pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiClient {
    /// `None` when no API key is configured.
    pub fn from_settings(settings: &ProviderSettings, timeout: Duration) -> anyhow::Result<Option<Self>> {
        let Some(api_key) = settings.api_key() else { return Ok(None) };
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building Gemini HTTP client")?;
        Ok(Some(Self {
            http,
            api_key: api_key.to_string(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }))
    }

    pub fn model(&self) -> &str { &self.model }

    /// Gemini takes no separate system turn here; the prompt carries everything.
    pub fn request_body(request: &CompletionRequest) -> serde_json::Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature,
            }
        })
    }
}

/// Concatenated text parts of the first candidate.
pub fn parse_generate_response(body: &str) -> anyhow::Result<String> {
    let parsed: GenerateResponse = serde_json::from_str(body).context("decoding generateContent response")?;
    let text: String = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        bail!("response contained no candidate text");
    }
    Ok(text.to_string())
}

#[async_trait]
impl Completion for GeminiClient {
    fn label(&self) -> &str { GEMINI_LABEL }

    async fn complete(&self, request: &CompletionRequest) -> anyhow::Result<String> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        debug!(model = %self.model, max_tokens = request.max_tokens, "gemini request");
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| anyhow!("HTTP request failed: {e}"))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| anyhow!("Failed to read response body: {e}"))?;
        if !status.is_success() {
            bail!("Gemini returned {status}: {}", snippet(&body));
        }
        parse_generate_response(&body)
    }
}
