//! # State Updates
//!
//! Partial updates returned by stages. A `None` field is untouched by the
//! stage; a `Some` field is merged through the reducer table.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::reducer::StateField;
use super::research_state::SearchResult;

/// A page the scraper read, reported for progress events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    pub url: String,
    pub title: String,
}

/// Partial state produced by one stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_steps: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_queries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_results: Option<Vec<SearchResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_content: Option<Vec<String>>,
    /// Event-only: not stored in the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scraped_urls: Option<Vec<SourceRef>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_notes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parallel_analyses: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_finished: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iteration: Option<u32>,
}

impl StateUpdate {
    /// Update carrying a single analysis under `key`
    pub fn analysis(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            parallel_analyses: Some(BTreeMap::from([(key.into(), text.into())])),
            ..Self::default()
        }
    }

    /// Add one audit-trail entry
    pub fn with_step(mut self, step: impl Into<String>) -> Self {
        self.past_steps
            .get_or_insert_with(Vec::new)
            .push(step.into());
        self
    }

    /// Fields this update touches
    pub fn touched_fields(&self) -> Vec<StateField> {
        let mut fields = Vec::new();
        let mut mark = |present: bool, field: StateField| {
            if present {
                fields.push(field);
            }
        };
        mark(self.topic.is_some(), StateField::Topic);
        mark(self.model_selector.is_some(), StateField::ModelSelector);
        mark(self.plan.is_some(), StateField::Plan);
        mark(self.past_steps.is_some(), StateField::PastSteps);
        mark(self.search_queries.is_some(), StateField::SearchQueries);
        mark(self.search_results.is_some(), StateField::SearchResults);
        mark(self.scraped_content.is_some(), StateField::ScrapedContent);
        mark(self.research_notes.is_some(), StateField::ResearchNotes);
        mark(self.parallel_analyses.is_some(), StateField::ParallelAnalyses);
        mark(self.report.is_some(), StateField::Report);
        mark(self.is_finished.is_some(), StateField::IsFinished);
        mark(self.iteration.is_some(), StateField::Iteration);
        fields
    }

    /// The report, if this update carries a non-empty one
    pub fn final_report(&self) -> Option<&str> {
        self.report.as_deref().filter(|r| !r.is_empty())
    }
}
