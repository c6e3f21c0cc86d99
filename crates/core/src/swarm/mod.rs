//! # Research Graph Orchestration
//!
//! Drives the research pipeline for one topic.
//!
//! ## Pipeline Flow
//!
//! ```text
//! Planner → Searcher → Scraper → {Facts ∥ Trends ∥ Insights} → Synthesizer → Reviewer
//!    ↑                                                                          │
//!    └────────────────────────────── needs more ───────────────────────────────┤
//!                                                                   finished → Writer
//! ```

pub mod coordinator;
pub mod events;
pub mod pipeline;

pub use coordinator::{EngineError, ResearchGraph};
pub use events::{EngineEvent, ProgressNotification, StageEvent};
pub use pipeline::{Stage, Transition};
