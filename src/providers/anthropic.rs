//! Anthropic messages adapter.
//!
//! See: <https://docs.anthropic.com/en/api/messages>

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::http::{build_client, check_status, transport_error};
use super::rate_window::{RateLimitConfig, RateWindow};
use super::traits::ModelAdapter;
use crate::telemetry;
use crate::types::GenerateOptions;
use crate::{PromptcError, Result};

/// Default base URL for the Anthropic API.
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Model used when none is configured.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-opus-20240229";

/// Adapter for Anthropic's Claude models.
pub struct AnthropicAdapter {
    api_key: String,
    model: String,
    backend: String,
    http: Client,
    base_url: String,
    rate_window: RateWindow,
}

impl AnthropicAdapter {
    /// Create an adapter for `model` using the given API key.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    /// Create an adapter with a custom base URL (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        let model = model.into();
        Self {
            api_key: api_key.into(),
            backend: format!("anthropic:{model}"),
            model,
            http: build_client(),
            base_url: base_url.into(),
            rate_window: RateWindow::default(),
        }
    }

    /// Replace the call quota (default: 50 calls per minute).
    pub fn rate_limit(mut self, config: RateLimitConfig) -> Self {
        self.rate_window = RateWindow::new(config);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn rate_window(&self) -> &RateWindow {
        &self.rate_window
    }

    async fn send(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        let url = format!("{}/v1/messages", self.base_url);
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: options.max_tokens,
            temperature: options.temperature,
            system: options.system_prompt.as_deref(),
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&self.backend, e))?;
        let response = check_status(&self.backend, response).await?;

        let body: MessagesResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&self.backend, e))?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| PromptcError::Backend {
                backend: self.backend.clone(),
                message: "response contained no text block".to_string(),
            })
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn name(&self) -> &str {
        &self.backend
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.rate_window.acquire(&self.backend)?;
        debug!(backend = %self.backend, prompt_len = prompt.len(), "sending messages request");

        let result = self.send(prompt, options).await;
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::BACKEND_REQUESTS_TOTAL,
            "backend" => self.backend.clone(),
            "status" => status,
        )
        .increment(1);
        result
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}
