//! # Chat Completions Client
//!
//! `TextGenerator` over any OpenAI-compatible `/chat/completions` endpoint
//! (OpenRouter by default).

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{CollaboratorError, GenerationRequest, TextGenerator};
use crate::models::ModelConfig;

const SERVICE: &str = "llm";
const REFERER: &str = "http://localhost:8000";
const TITLE: &str = "Deep Research Agent";

/// HTTP client for chat completions
pub struct ChatCompletionsClient {
    client: Client,
    config: ModelConfig,
    api_key: Option<String>,
}

impl ChatCompletionsClient {
    /// Create a client, reading the API key from the provider's env var
    pub fn new(config: ModelConfig) -> anyhow::Result<Self> {
        let api_key = config.api_key_from_env();
        if api_key.is_none() {
            tracing::warn!(
                "{} not found in environment variables; generation calls will fail",
                config.provider.api_key_env()
            );
        }
        Self::with_api_key(config, api_key)
    }

    /// Create a client with an explicit API key
    pub fn with_api_key(config: ModelConfig, api_key: Option<String>) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;
        Ok(Self {
            client,
            config,
            api_key,
        })
    }

    fn request_body(&self, request: &GenerationRequest) -> Value {
        let model = if request.model.trim().is_empty() {
            self.config.model.as_str()
        } else {
            request.model.as_str()
        };
        json!({
            "model": model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.user_prompt },
            ],
            "temperature": self.config.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        })
    }
}

/// Pull the first choice's message text out of a completion response
pub fn extract_content(body: &Value) -> Result<String, CollaboratorError> {
    if let Some(error) = body.get("error") {
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(CollaboratorError::transport(SERVICE, message));
    }

    body.pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| CollaboratorError::parse("completion response has no message content"))
}

#[async_trait]
impl TextGenerator for ChatCompletionsClient {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            CollaboratorError::transport(
                SERVICE,
                format!("{} is not set", self.config.provider.api_key_env()),
            )
        })?;

        let url = format!("{}/chat/completions", self.config.endpoint());
        let body = self.request_body(&request);

        tracing::debug!(url = %url, model = %request.model, max_tokens = request.max_tokens, "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await
            .map_err(|e| CollaboratorError::transport(SERVICE, format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            CollaboratorError::transport(SERVICE, format!("Failed to read response body: {}", e))
        })?;

        if !status.is_success() {
            return Err(CollaboratorError::transport(
                SERVICE,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let json: Value = serde_json::from_str(&text)
            .map_err(|e| CollaboratorError::parse(format!("Invalid JSON: {}", e)))?;
        extract_content(&json)
    }
}
