//! # Deep Research Models
//!
//! Centralized LLM provider configuration. Every supported provider speaks
//! the OpenAI-compatible chat completions protocol, so a provider is reduced
//! to a base URL and the environment variable holding its API key.
//!
//! The per-request model selector is an OpenRouter-style identifier
//! (`vendor/model`), e.g. `openai/gpt-4o-mini`.

use serde::{Deserialize, Serialize};

/// Model used when a request does not name one
pub const DEFAULT_MODEL: &str = "openai/gpt-4o-mini";

/// Supported LLM providers
///
/// - OpenRouter (Gateway) - `OPENROUTER_API_KEY`
/// - OpenAI (GPT) - `OPENAI_API_KEY`
/// - Grok (xAI) - `XAI_API_KEY`
/// - DeepSeek - `DEEPSEEK_API_KEY`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    #[default]
    OpenRouter,
    #[serde(rename = "openai")]
    OpenAI,
    Grok,
    DeepSeek,
}

impl LlmProvider {
    /// Parse a provider id as used in config files and env vars
    pub fn from_id(id: &str) -> Option<LlmProvider> {
        match id.trim().to_ascii_lowercase().as_str() {
            "openrouter" => Some(LlmProvider::OpenRouter),
            "openai" => Some(LlmProvider::OpenAI),
            "grok" | "xai" => Some(LlmProvider::Grok),
            "deepseek" => Some(LlmProvider::DeepSeek),
            _ => None,
        }
    }

    /// Display name for UI
    pub fn display_name(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OpenRouter",
            LlmProvider::OpenAI => "OpenAI",
            LlmProvider::Grok => "Grok",
            LlmProvider::DeepSeek => "DeepSeek",
        }
    }

    /// Default chat completions endpoint root
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "https://openrouter.ai/api/v1",
            LlmProvider::OpenAI => "https://api.openai.com/v1",
            LlmProvider::Grok => "https://api.x.ai/v1",
            LlmProvider::DeepSeek => "https://api.deepseek.com/v1",
        }
    }

    /// Environment variable holding the API key
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::OpenRouter => "OPENROUTER_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Grok => "XAI_API_KEY",
            LlmProvider::DeepSeek => "DEEPSEEK_API_KEY",
        }
    }
}

/// A model offered to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInfo {
    pub id: String,
    pub name: String,
    pub description: String,
}

/// The selectable models offered by the research UI
pub fn available_models() -> Vec<ModelInfo> {
    [
        ("openai/gpt-4o-mini", "GPT-4o Mini", "Fast & Affordable"),
        ("openai/gpt-4o", "GPT-4o", "Most Capable"),
        (
            "anthropic/claude-3.5-sonnet",
            "Claude 3.5 Sonnet",
            "Best Reasoning",
        ),
    ]
    .into_iter()
    .map(|(id, name, description)| ModelInfo {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
    })
    .collect()
}

/// Configuration for LLM access
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelConfig {
    /// LLM provider to use
    pub provider: LlmProvider,
    /// Model used when a run does not select one
    pub model: String,
    /// Optional base URL override for OpenAI-compatible APIs
    pub base_url: Option<String>,
    /// Sampling temperature
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenRouter,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            temperature: default_temperature(),
        }
    }
}

impl ModelConfig {
    /// Effective endpoint root, without a trailing slash
    pub fn endpoint(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.provider.default_base_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// API key from the provider's environment variable
    pub fn api_key_from_env(&self) -> Option<String> {
        std::env::var(self.provider.api_key_env())
            .ok()
            .filter(|k| !k.trim().is_empty())
    }
}
