//! # SearXNG Search
//!
//! `WebSearch` backed by the SearXNG JSON API. Endpoints are tried in order:
//! the configured instance, a few public instances, then a local instance.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{CollaboratorError, WebSearch};
use crate::config::SearchConfig;
use crate::state::{SearchHit, SearchResult};

const SERVICE: &str = "search";

/// SearXNG search client
pub struct SearxngSearch {
    client: Client,
    endpoints: Vec<String>,
    max_results: usize,
}

impl SearxngSearch {
    pub fn new(config: &SearchConfig) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("deep-research-agent/0.1")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to create HTTP client: {}", e))?;

        Ok(Self {
            client,
            endpoints: endpoints(config.searxng_url.as_deref()),
            max_results: config.max_results,
        })
    }
}

/// Build the ordered list of `/search` endpoints
pub fn endpoints(custom_url: Option<&str>) -> Vec<String> {
    let mut endpoints: Vec<String> = Vec::new();

    // User-configured instance takes priority
    if let Some(custom_url) = custom_url {
        endpoints.push(format!("{}/search", custom_url.trim_end_matches('/')));
    }

    // Public SearXNG instances (subset of reliable ones)
    endpoints.extend([
        "https://searx.be/search".to_string(),
        "https://search.sapti.me/search".to_string(),
        "https://searx.tiekoetter.com/search".to_string(),
    ]);

    endpoints.push("http://localhost:8888/search".to_string());
    endpoints
}

/// Convert a SearXNG response into search results.
///
/// Returns `None` when the payload has no `results` array.
pub fn parse_results(json: &Value, max_results: usize) -> Option<Vec<SearchResult>> {
    let results = json.get("results")?.as_array()?;
    Some(
        results
            .iter()
            .take(max_results)
            .map(|r| match r {
                Value::Object(_) => SearchResult::Hit(SearchHit::new(
                    text_field(r, "title"),
                    text_field(r, "content"),
                    str_field(r, "url"),
                )),
                Value::String(text) => SearchResult::Opaque(text.clone()),
                other => SearchResult::Opaque(other.to_string()),
            })
            .collect(),
    )
}

fn str_field<'a>(value: &'a Value, name: &str) -> &'a str {
    value.get(name).and_then(Value::as_str).unwrap_or("")
}

/// Engines sometimes pass titles and snippets through still HTML-escaped
fn text_field(value: &Value, name: &str) -> String {
    html_escape::decode_html_entities(str_field(value, name)).into_owned()
}

#[async_trait]
impl WebSearch for SearxngSearch {
    async fn search(&self, query: &str) -> Result<Vec<SearchResult>, CollaboratorError> {
        let mut last_error = String::from("no search endpoints configured");

        for endpoint in &self.endpoints {
            let url = format!(
                "{}?q={}&format=json",
                endpoint,
                urlencoding::encode(query)
            );

            let response = match self.client.get(&url).send().await {
                Ok(response) if response.status().is_success() => response,
                Ok(response) => {
                    last_error = format!("{} answered HTTP {}", endpoint, response.status());
                    continue;
                }
                Err(e) => {
                    last_error = format!("{}: {}", endpoint, e);
                    continue;
                }
            };

            match response.json::<Value>().await {
                Ok(json) => {
                    if let Some(results) = parse_results(&json, self.max_results) {
                        tracing::debug!(endpoint = %endpoint, count = results.len(), "Search succeeded");
                        return Ok(results);
                    }
                    last_error = format!("{} returned no results array", endpoint);
                }
                Err(e) => last_error = format!("{}: {}", endpoint, e),
            }
        }

        Err(CollaboratorError::transport(SERVICE, last_error))
    }
}
