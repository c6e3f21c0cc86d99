//! # Page Fetch
//!
//! `PageFetcher` that downloads a page and reduces its markup to readable
//! text: the page is parsed into a DOM, non-content elements are detached,
//! and the remaining text nodes are collapsed and capped.

use async_trait::async_trait;
use kuchiki::traits::*;
use reqwest::Client;
use std::time::Duration;

use super::{CollaboratorError, PageFetcher};
use crate::config::FetchConfig;

/// Elements whose text never reaches the reader
const NON_CONTENT: &str = "script, style, nav, footer";

/// Markup-to-text reducer over a parsed DOM
#[derive(Debug, Clone, Copy, Default)]
pub struct TextExtractor;

impl TextExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Readable text of `html`, at most `max_chars` characters
    pub fn extract(&self, html: &str, max_chars: usize) -> String {
        // The parser decodes named and numeric entities in text nodes
        let document = kuchiki::parse_html().one(html);

        if let Ok(blocks) = document.select(NON_CONTENT) {
            let blocks: Vec<_> = blocks.collect();
            for block in blocks {
                block.as_node().detach();
            }
        }

        let raw = document
            .inclusive_descendants()
            .text_nodes()
            .map(|node| node.borrow().replace('\u{a0}', " "))
            .collect::<Vec<_>>()
            .join("\n");

        let text = raw
            .lines()
            .flat_map(|line| line.trim().split("  "))
            .map(str::trim)
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>()
            .join("\n");

        text.chars().take(max_chars).collect()
    }
}

/// HTTP page fetcher
pub struct HttpPageFetcher {
    client: Client,
    extractor: TextExtractor,
    max_chars: usize,
}

impl HttpPageFetcher {
    pub fn new(config: &FetchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            extractor: TextExtractor::new(),
            max_chars: config.max_chars,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CollaboratorError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CollaboratorError::fetch(url, format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CollaboratorError::fetch(url, format!("HTTP {}", status)));
        }

        let html = response
            .text()
            .await
            .map_err(|e| CollaboratorError::fetch(url, format!("Failed to read body: {}", e)))?;

        Ok(self.extractor.extract(&html, self.max_chars))
    }
}
