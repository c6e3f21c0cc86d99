//! # Writer Skill
//!
//! Terminal stage. Writes the report from every research note with the
//! larger output budget; falls back to the notes themselves under a heading,
//! so the report is never empty.

use crate::skills::prompts::{self, render};
use crate::skills::StageSettings;
use crate::state::{ResearchState, StateUpdate};
use crate::tools::{Collaborators, GenerationRequest};

pub struct WriterSkill;

impl WriterSkill {
    pub async fn run(
        state: &ResearchState,
        ports: &Collaborators,
        settings: &StageSettings,
    ) -> StateUpdate {
        let prompt = render(
            prompts::WRITER,
            &[
                ("topic", &state.topic),
                ("notes", &numbered_notes(&state.research_notes)),
            ],
        );
        let request = GenerationRequest::new(
            prompts::WRITER_SYSTEM,
            prompt,
            &state.model_selector,
            settings.writer_max_tokens,
        );

        let report = match ports.llm.generate(request).await {
            Ok(report) if !report.trim().is_empty() => report,
            Ok(_) => {
                tracing::warn!(stage = "writer", "Model returned an empty report, using notes");
                fallback_report(&state.topic, &state.research_notes)
            }
            Err(e) => {
                tracing::warn!(stage = "writer", error = %e, "Report generation failed, using notes");
                fallback_report(&state.topic, &state.research_notes)
            }
        };

        StateUpdate {
            report: Some(report),
            ..StateUpdate::default()
        }
        .with_step("Wrote comprehensive final report")
    }
}

/// Notes under `### Research Phase i` headers
pub fn numbered_notes(notes: &[String]) -> String {
    notes
        .iter()
        .enumerate()
        .map(|(i, note)| format!("### Research Phase {}\n{}", i + 1, note))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Report made of the raw notes
pub fn fallback_report(topic: &str, notes: &[String]) -> String {
    format!("# Research Report: {}\n\n{}", topic, notes.join("\n\n"))
}
