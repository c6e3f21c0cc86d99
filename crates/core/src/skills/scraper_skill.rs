//! # Scraper Skill
//!
//! Reads the pages behind the most recent search hits.

use crate::state::{tail, ResearchState, SearchHit, SourceRef, StateUpdate};
use crate::tools::Collaborators;

/// Most recent structured hits considered per cycle
pub const SCRAPE_LIMIT: usize = 15;

/// Characters of page text kept per source
pub const CONTENT_BUDGET: usize = 2000;

pub struct ScraperSkill;

impl ScraperSkill {
    pub async fn run(state: &ResearchState, ports: &Collaborators) -> StateUpdate {
        let hits: Vec<&SearchHit> = state.hits().collect();
        let mut scraped = Vec::new();
        let mut sources = Vec::new();

        for hit in tail(&hits, SCRAPE_LIMIT).iter().filter(|h| h.has_link()) {
            tracing::debug!(url = %hit.link, "Scraping");
            match ports.fetcher.fetch(&hit.link).await {
                Ok(text) => {
                    scraped.push(attributed_content(hit, &text));
                    sources.push(SourceRef {
                        url: hit.link.clone(),
                        title: hit.title.clone(),
                    });
                }
                Err(e) => tracing::warn!(stage = "scrape", error = %e, "Skipping source"),
            }
        }

        let step = format!("Scraped {} pages", scraped.len());
        StateUpdate {
            scraped_content: Some(scraped),
            scraped_urls: Some(sources),
            ..StateUpdate::default()
        }
        .with_step(step)
    }
}

/// Page text truncated to [`CONTENT_BUDGET`] and wrapped with its source
pub fn attributed_content(hit: &SearchHit, text: &str) -> String {
    let excerpt: String = text.chars().take(CONTENT_BUDGET).collect();
    format!(
        "Source: {}\nTitle: {}\nContent: {}...",
        hit.link, hit.title, excerpt
    )
}
