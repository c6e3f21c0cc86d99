//! # Searcher Skill
//!
//! Runs every planned query against the search port. A failing query
//! contributes no results; the remaining queries still run.

use crate::state::{ResearchState, StateUpdate};
use crate::tools::Collaborators;

pub struct SearcherSkill;

impl SearcherSkill {
    pub async fn run(state: &ResearchState, ports: &Collaborators) -> StateUpdate {
        let mut results = Vec::new();

        for query in &state.search_queries {
            match ports.search.search(query).await {
                Ok(found) => {
                    tracing::debug!(query = %query, count = found.len(), "Search returned results");
                    results.extend(found);
                }
                Err(e) => {
                    tracing::warn!(stage = "search", query = %query, error = %e, "Search failed");
                }
            }
        }

        StateUpdate {
            search_results: Some(results),
            ..StateUpdate::default()
        }
        .with_step(format!("Searched for {} queries", state.search_queries.len()))
    }
}
