//! # Collaborator Ports
//!
//! The three external capabilities stages call: text generation, web search
//! and page fetch. Each call returns a typed [`CollaboratorError`] on failure
//! so the calling stage can apply its documented fallback.
//!
//! ## Modules
//!
//! - `llm_client` - OpenAI-compatible chat completions client
//! - `searxng` - SearXNG JSON search client
//! - `page_fetch` - HTTP page fetch with markup stripping

pub mod llm_client;
pub mod page_fetch;
pub mod searxng;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::state::SearchResult;

pub use llm_client::ChatCompletionsClient;
pub use page_fetch::{HttpPageFetcher, TextExtractor};
pub use searxng::SearxngSearch;

/// Failure of a collaborator call
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CollaboratorError {
    /// LLM or search service unreachable or answered with an error
    #[error("{service} transport error: {message}")]
    Transport { service: String, message: String },
    /// A single page could not be retrieved
    #[error("failed to fetch {url}: {message}")]
    Fetch { url: String, message: String },
    /// A response was not the structured data that was asked for
    #[error("unparseable response: {message}")]
    Parse { message: String },
}

impl CollaboratorError {
    pub fn transport(service: impl Into<String>, message: impl ToString) -> Self {
        CollaboratorError::Transport {
            service: service.into(),
            message: message.to_string(),
        }
    }

    pub fn fetch(url: impl Into<String>, message: impl ToString) -> Self {
        CollaboratorError::Fetch {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn parse(message: impl ToString) -> Self {
        CollaboratorError::Parse {
            message: message.to_string(),
        }
    }
}

/// Input of one text generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    /// Model selector, e.g. `openai/gpt-4o-mini`
    pub model: String,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        model: impl Into<String>,
        max_tokens: u32,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            model: model.into(),
            max_tokens,
        }
    }
}

/// Language-model text generation
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, CollaboratorError>;
}

/// Web search
#[async_trait]
pub trait WebSearch: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CollaboratorError>;
}

/// Readable text of a web page
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CollaboratorError>;
}

/// The ports injected into the research graph
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn TextGenerator>,
    pub search: Arc<dyn WebSearch>,
    pub fetcher: Arc<dyn PageFetcher>,
}

impl Collaborators {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        search: Arc<dyn WebSearch>,
        fetcher: Arc<dyn PageFetcher>,
    ) -> Self {
        Self {
            llm,
            search,
            fetcher,
        }
    }

    /// Production ports built from configuration
    pub fn from_config(config: &crate::config::ResearchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(ChatCompletionsClient::new(config.llm.clone())?),
            Arc::new(SearxngSearch::new(&config.search)?),
            Arc::new(HttpPageFetcher::new(&config.fetch)?),
        ))
    }
}
