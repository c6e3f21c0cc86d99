//! # State Store
//!
//! The research record threaded through the pipeline and the reducer table
//! that governs how stage updates are merged into it.

pub mod reducer;
pub mod research_state;
pub mod update;

pub use reducer::{MergeRule, StateField};
pub use research_state::{
    tail, ResearchState, SearchHit, SearchResult, ANALYSIS_KEYS, FACTS_KEY, INSIGHTS_KEY,
    TRENDS_KEY,
};
pub use update::{SourceRef, StateUpdate};
