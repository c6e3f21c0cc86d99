//! # Deep Research Core
//!
//! The "Brain" of the Deep Research service - the research graph, its stage
//! skills, the state store and the collaborator clients.
//!
//! ## Architecture
//!
//! - `swarm/` - Research graph engine, stage table and progress events
//! - `skills/` - One skill per stage (planner, searcher, scraper, analysts, ...)
//! - `state/` - Research state, partial updates and the reducer table
//! - `tools/` - Collaborator ports and their HTTP clients
//! - `models` - Centralized LLM provider configuration
//! - `config` - Layered service configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use deep_research_core::config::ResearchConfig;
//! use deep_research_core::state::ResearchState;
//! use deep_research_core::swarm::ResearchGraph;
//!
//! let graph = ResearchGraph::from_config(&ResearchConfig::load())?;
//! let state = graph.run(ResearchState::new("Solid-state batteries", "openai/gpt-4o-mini"), None).await?;
//! println!("{}", state.report);
//! ```

pub mod config;
pub mod models;
pub mod skills;
pub mod state;
pub mod swarm;
pub mod tools;

#[cfg(test)]
pub(crate) mod testing;
