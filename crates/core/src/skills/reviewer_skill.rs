//! # Reviewer Skill
//!
//! Loop control. Every evaluation advances `iteration` by one and decides
//! `is_finished`:
//!
//! ```text
//! iteration >= ITERATION_CAP  -> finish, no model call
//! otherwise                   -> ask the model
//!     "SUFFICIENT" in answer  -> finish
//!     iteration >= 1          -> finish
//!     call failed             -> finish
//!     else                    -> one more cycle
//! ```
//!
//! Only the first review can send the pipeline back to the planner, so a run
//! has at most two research cycles in practice.

use crate::skills::prompts::{self, render};
use crate::skills::StageSettings;
use crate::state::{ResearchState, StateUpdate};
use crate::tools::{Collaborators, GenerationRequest};

/// Iteration at which the reviewer finishes without asking the model
pub const ITERATION_CAP: u32 = 2;

pub struct ReviewerSkill;

impl ReviewerSkill {
    pub async fn run(
        state: &ResearchState,
        ports: &Collaborators,
        settings: &StageSettings,
    ) -> StateUpdate {
        let iteration = state.iteration;

        let is_finished = if iteration >= ITERATION_CAP {
            tracing::info!(iteration, "Max iterations reached, proceeding to report writing");
            true
        } else {
            let cycle = (iteration + 1).to_string();
            let prompt = render(
                prompts::REVIEWER,
                &[
                    ("topic", &state.topic),
                    ("cycle", &cycle),
                    ("notes", &state.research_notes.join("\n")),
                ],
            );
            let request = GenerationRequest::new(
                prompts::REVIEWER_SYSTEM,
                prompt,
                &state.model_selector,
                settings.default_max_tokens,
            );

            match ports.llm.generate(request).await {
                Ok(decision) => should_finish(&decision, iteration),
                Err(e) => {
                    tracing::warn!(stage = "review", error = %e, "Review failed, finishing");
                    true
                }
            }
        };

        tracing::info!(iteration, is_finished, "Review complete");

        StateUpdate {
            is_finished: Some(is_finished),
            iteration: Some(iteration + 1),
            ..StateUpdate::default()
        }
    }
}

/// Verdict for a model answer given before the evaluation at `iteration`.
///
/// This is a substring match, so `INSUFFICIENT` also finishes the run.
/// Changing that would shift how many cycles existing prompts produce.
pub fn should_finish(decision: &str, iteration: u32) -> bool {
    decision.to_uppercase().contains("SUFFICIENT") || iteration >= 1
}
