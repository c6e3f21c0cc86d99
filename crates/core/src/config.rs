//! # Configuration
//!
//! Layered configuration: built-in defaults, then `.deep-research/config.json`
//! when present, then environment overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::models::{LlmProvider, ModelConfig};

/// Default location of the persisted configuration file
pub const CONFIG_PATH: &str = ".deep-research/config.json";

/// Search backend settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Custom SearXNG instance, tried before the public fallbacks
    pub searxng_url: Option<String>,
    /// Results requested per query
    pub max_results: usize,
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            searxng_url: None,
            max_results: 20,
            timeout_secs: 10,
        }
    }
}

/// Page fetch settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    /// Cap on readable text returned per page
    pub max_chars: usize,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_chars: 8000,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Full service configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ResearchConfig {
    pub llm: ModelConfig,
    /// Output budget for every stage but the writer
    pub default_max_tokens: u32,
    /// Output budget for the final report
    pub writer_max_tokens: u32,
    pub search: SearchConfig,
    pub fetch: FetchConfig,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Where the CLI writes reports
    pub report_dir: PathBuf,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            llm: ModelConfig::default(),
            default_max_tokens: 2000,
            writer_max_tokens: 3000,
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://localhost:3000".to_string(),
            ],
            report_dir: PathBuf::from("."),
        }
    }
}

impl ResearchConfig {
    /// Load from [`CONFIG_PATH`] and the process environment.
    ///
    /// A missing or malformed file falls back to defaults.
    pub fn load() -> Self {
        let mut config = match Self::load_from(Path::new(CONFIG_PATH)) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                tracing::warn!("Ignoring config file {}: {:#}", CONFIG_PATH, e);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Read a config file; `Ok(None)` when it does not exist
    pub fn load_from(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    /// Apply environment overrides through `lookup`
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(id) = non_empty("DEEP_RESEARCH_PROVIDER") {
            match LlmProvider::from_id(&id) {
                Some(provider) => self.llm.provider = provider,
                None => tracing::warn!("Unknown provider '{}', keeping {:?}", id, self.llm.provider),
            }
        }
        if let Some(model) = non_empty("DEEP_RESEARCH_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = non_empty("DEEP_RESEARCH_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        if let Some(url) = non_empty("SEARXNG_URL") {
            self.search.searxng_url = Some(url);
        }
    }
}
