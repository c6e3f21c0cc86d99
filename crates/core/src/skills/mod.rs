//! # Research Skills
//!
//! One skill per pipeline stage. Each skill reads the current
//! [`ResearchState`](crate::state::ResearchState), calls the collaborator
//! ports it needs and returns a partial
//! [`StateUpdate`](crate::state::StateUpdate). Skills never fail: a failed
//! collaborator call is replaced by the skill's fallback value.
//!
//! ## Skill Categories
//!
//! **Gathering** (one research cycle):
//! - `PlannerSkill` - Generate search queries
//! - `SearcherSkill` - Run the queries
//! - `ScraperSkill` - Read the most recent hits
//!
//! **Analysis** (fan-out and join):
//! - `AnalystSkill` - Facts, trends or insights over the gathered material
//! - `SynthesizerSkill` - Combine the three analyses into one research note
//!
//! **Control and output:**
//! - `ReviewerSkill` - Decide whether another cycle runs
//! - `WriterSkill` - Write the final report

pub mod prompts;

// Gathering
pub mod planner_skill;
pub mod scraper_skill;
pub mod searcher_skill;

// Analysis
pub mod analyst_skill;
pub mod synthesizer_skill;

// Control and output
pub mod reviewer_skill;
pub mod writer_skill;

pub use analyst_skill::{AnalysisDimension, AnalystSkill, ANALYSIS_PLACEHOLDER};
pub use planner_skill::PlannerSkill;
pub use reviewer_skill::{ReviewerSkill, ITERATION_CAP};
pub use scraper_skill::ScraperSkill;
pub use searcher_skill::SearcherSkill;
pub use synthesizer_skill::SynthesizerSkill;
pub use writer_skill::WriterSkill;

use crate::config::ResearchConfig;

/// Generation budgets shared by the stages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageSettings {
    /// `max_tokens` for every stage but the writer
    pub default_max_tokens: u32,
    /// `max_tokens` for the final report
    pub writer_max_tokens: u32,
}

impl Default for StageSettings {
    fn default() -> Self {
        Self {
            default_max_tokens: 2000,
            writer_max_tokens: 3000,
        }
    }
}

impl From<&ResearchConfig> for StageSettings {
    fn from(config: &ResearchConfig) -> Self {
        Self {
            default_max_tokens: config.default_max_tokens,
            writer_max_tokens: config.writer_max_tokens,
        }
    }
}
