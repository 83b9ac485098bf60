//! OpenAI chat-completions adapter.
//!
//! See: <https://platform.openai.com/docs/api-reference/chat>

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

/// Default base URL for the OpenAI API.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Model used when none is configured.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4";

/// System message sent when the caller supplies none.
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful programming assistant.";

/// Adapter for OpenAI's GPT models.
pub struct OpenAiAdapter {
    api_key: String,
    model: String,
    backend: String,
    http: Client,
    base_url: String,
    rate_window: RateWindow,
}

impl OpenAiAdapter {
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
            backend: format!("openai:{model}"),
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
        let url = format!("{}/v1/chat/completions", self.base_url);
        let system = options
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT);

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| transport_error(&self.backend, e))?;
        let response = check_status(&self.backend, response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&self.backend, e))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| PromptcError::Backend {
                backend: self.backend.clone(),
                message: "response contained no message content".to_string(),
            })
    }
}

#[async_trait]
impl ModelAdapter for OpenAiAdapter {
    fn name(&self) -> &str {
        &self.backend
    }

    async fn generate(&self, prompt: &str, options: &GenerateOptions) -> Result<String> {
        self.rate_window.acquire(&self.backend)?;
        debug!(backend = %self.backend, prompt_len = prompt.len(), "sending chat completion");

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
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}
