//! # Synthesizer Skill
//!
//! Join consumer: folds the three analyses into one research note.

use std::collections::BTreeMap;

use crate::state::{ResearchState, StateUpdate, FACTS_KEY, INSIGHTS_KEY, TRENDS_KEY};

/// Section order and headers of a research note
const SECTIONS: [(&str, &str); 3] = [
    (FACTS_KEY, "### Factual Data and Statistics"),
    (TRENDS_KEY, "### Trends and Market Developments"),
    (INSIGHTS_KEY, "### Expert Analysis and Strategic Implications"),
];

pub struct SynthesizerSkill;

impl SynthesizerSkill {
    /// Append exactly one note built from `parallel_analyses`
    pub fn run(state: &ResearchState) -> StateUpdate {
        let missing = state.missing_analyses();
        if !missing.is_empty() {
            tracing::warn!(stage = "synthesize_parallel", ?missing, "Analyses missing at join");
        }

        StateUpdate {
            research_notes: Some(vec![compose_note(&state.parallel_analyses)]),
            ..StateUpdate::default()
        }
        .with_step("Synthesized parallel analyses into professional research notes")
    }
}

/// Facts, trends and insights under fixed headers; a missing key is empty
pub fn compose_note(analyses: &BTreeMap<String, String>) -> String {
    SECTIONS
        .iter()
        .map(|(key, header)| {
            let body = analyses.get(*key).map(String::as_str).unwrap_or("");
            format!("{}\n{}\n", header, body)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
