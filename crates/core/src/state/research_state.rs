//! # Research State
//!
//! The single record threaded through every stage of a research run.
//! Created once per run, mutated only through [`ResearchState::apply`],
//! and discarded when the run ends.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::reducer::{merge_map, merge_scalar, merge_seq, StateField};
use super::StateUpdate;

/// Key under which the facts analyzer writes its analysis
pub const FACTS_KEY: &str = "facts";
/// Key under which the trends analyzer writes its analysis
pub const TRENDS_KEY: &str = "trends";
/// Key under which the insights analyzer writes its analysis
pub const INSIGHTS_KEY: &str = "insights";

/// Keys that must all be present before the synthesizer runs
pub const ANALYSIS_KEYS: [&str; 3] = [FACTS_KEY, TRENDS_KEY, INSIGHTS_KEY];

/// A structured web search hit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(default)]
    pub link: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        link: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            link: link.into(),
        }
    }

    /// Whether this hit carries a link the scraper can follow
    pub fn has_link(&self) -> bool {
        !self.link.trim().is_empty()
    }
}

/// One entry of the accumulated search results.
///
/// Search backends occasionally return entries that are not structured hits;
/// those are kept verbatim as opaque text rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchResult {
    Hit(SearchHit),
    Opaque(String),
}

impl SearchResult {
    pub fn as_hit(&self) -> Option<&SearchHit> {
        match self {
            SearchResult::Hit(hit) => Some(hit),
            SearchResult::Opaque(_) => None,
        }
    }
}

impl From<SearchHit> for SearchResult {
    fn from(hit: SearchHit) -> Self {
        SearchResult::Hit(hit)
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchResult::Hit(hit) => {
                let title = if hit.title.is_empty() {
                    "No title"
                } else {
                    hit.title.as_str()
                };
                write!(f, "{}: {} ({})", title, hit.snippet, hit.link)
            }
            SearchResult::Opaque(text) => f.write_str(text),
        }
    }
}

/// The mutable research record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResearchState {
    /// Research topic, set once
    pub topic: String,
    /// LLM identifier used for every generation call in this run
    pub model_selector: String,
    /// Descriptive log of the planning step
    pub plan: Vec<String>,
    /// Audit trail, never shrinks
    pub past_steps: Vec<String>,
    /// Queries of the current planning cycle
    pub search_queries: Vec<String>,
    /// All search results of the run
    pub search_results: Vec<SearchResult>,
    /// All scraped page excerpts of the run
    pub scraped_content: Vec<String>,
    /// One composite note per completed research cycle
    pub research_notes: Vec<String>,
    /// Per-dimension analyses of the current cycle
    pub parallel_analyses: BTreeMap<String, String>,
    /// Final report, empty until the writer runs
    pub report: String,
    /// Loop-termination flag set by the reviewer
    pub is_finished: bool,
    /// Number of reviewer evaluations so far
    pub iteration: u32,
}

impl ResearchState {
    /// Create the initial state of a run
    pub fn new(topic: impl Into<String>, model_selector: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            model_selector: model_selector.into(),
            ..Self::default()
        }
    }

    /// Merge a stage's partial update into the state.
    ///
    /// Each touched field is merged with the rule from the reducer table.
    pub fn apply(&mut self, update: StateUpdate) {
        let StateUpdate {
            topic,
            model_selector,
            plan,
            past_steps,
            search_queries,
            search_results,
            scraped_content,
            scraped_urls: _,
            research_notes,
            parallel_analyses,
            report,
            is_finished,
            iteration,
        } = update;

        if let Some(v) = topic {
            merge_scalar(StateField::Topic, &mut self.topic, v);
        }
        if let Some(v) = model_selector {
            merge_scalar(StateField::ModelSelector, &mut self.model_selector, v);
        }
        if let Some(v) = plan {
            merge_seq(StateField::Plan, &mut self.plan, v);
        }
        if let Some(v) = past_steps {
            merge_seq(StateField::PastSteps, &mut self.past_steps, v);
        }
        if let Some(v) = search_queries {
            merge_seq(StateField::SearchQueries, &mut self.search_queries, v);
        }
        if let Some(v) = search_results {
            merge_seq(StateField::SearchResults, &mut self.search_results, v);
        }
        if let Some(v) = scraped_content {
            merge_seq(StateField::ScrapedContent, &mut self.scraped_content, v);
        }
        if let Some(v) = research_notes {
            merge_seq(StateField::ResearchNotes, &mut self.research_notes, v);
        }
        if let Some(v) = parallel_analyses {
            merge_map(StateField::ParallelAnalyses, &mut self.parallel_analyses, v);
        }
        if let Some(v) = report {
            merge_scalar(StateField::Report, &mut self.report, v);
        }
        if let Some(v) = is_finished {
            merge_scalar(StateField::IsFinished, &mut self.is_finished, v);
        }
        if let Some(v) = iteration {
            merge_scalar(StateField::Iteration, &mut self.iteration, v);
        }
    }

    /// Structured hits only, oldest first
    pub fn hits(&self) -> impl Iterator<Item = &SearchHit> {
        self.search_results.iter().filter_map(SearchResult::as_hit)
    }

    /// Most recent research note, if any cycle has completed
    pub fn latest_note(&self) -> Option<&str> {
        self.research_notes.last().map(String::as_str)
    }

    /// Analysis keys missing from `parallel_analyses`
    pub fn missing_analyses(&self) -> Vec<&'static str> {
        ANALYSIS_KEYS
            .iter()
            .copied()
            .filter(|key| !self.parallel_analyses.contains_key(*key))
            .collect()
    }
}

/// Last `n` items of a slice, in original order
pub fn tail<T>(items: &[T], n: usize) -> &[T] {
    &items[items.len().saturating_sub(n)..]
}
