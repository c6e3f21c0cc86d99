//! # Research Events
//!
//! Stage completions produced by the graph and the progress notifications
//! they are turned into for external consumers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::coordinator::EngineError;
use super::pipeline::Stage;
use crate::state::{ResearchState, StateUpdate};

/// One completed stage and the partial update it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageEvent {
    pub stage: Stage,
    pub update: StateUpdate,
    pub completed_at: DateTime<Utc>,
}

impl StageEvent {
    pub fn new(stage: Stage, update: StateUpdate) -> Self {
        Self {
            stage,
            update,
            completed_at: Utc::now(),
        }
    }
}

/// Item of the engine's lazy event sequence
#[derive(Debug)]
pub enum EngineEvent {
    Stage(StageEvent),
    /// Run completed; always the last item on success
    Finished(Box<ResearchState>),
    /// Run aborted; always the last item on failure
    Failed(EngineError),
}

/// Externally consumable progress notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressNotification {
    Update { node: String, message: String },
    Complete { report: String },
    Error { message: String },
}

impl ProgressNotification {
    fn update(stage: Stage, message: impl Into<String>) -> Self {
        ProgressNotification::Update {
            node: stage.name().to_string(),
            message: message.into(),
        }
    }

    /// Error notification for a failure that escaped the engine
    pub fn error(cause: impl fmt::Display) -> Self {
        ProgressNotification::Error {
            message: format!("Research error: {}", cause),
        }
    }

    /// Notifications for one stage completion, in emission order
    pub fn from_stage_event(event: &StageEvent) -> Vec<Self> {
        let stage = event.stage;
        let update = &event.update;

        let mut out: Vec<Self> = match stage {
            Stage::Planner => update
                .search_queries
                .iter()
                .flatten()
                .map(|q| Self::update(stage, format!("Searching for: {}", q)))
                .collect(),
            Stage::Search => vec![Self::update(stage, "Searching...")],
            Stage::Scrape => {
                let sources = update.scraped_urls.as_deref().unwrap_or_default();
                if sources.is_empty() {
                    vec![Self::update(stage, "Reading sources...")]
                } else {
                    sources
                        .iter()
                        .map(|s| Self::update(stage, format!("Scraping: {}", s.url)))
                        .collect()
                }
            }
            Stage::AnalyzeFacts | Stage::AnalyzeTrends | Stage::AnalyzeInsights => {
                vec![Self::update(stage, "ANALYZING")]
            }
            Stage::SynthesizeParallel => vec![Self::update(stage, "SYNTHESIZING")],
            Stage::Writer => vec![Self::update(stage, "WRITING")],
            Stage::Review => vec![Self::update(
                stage,
                format!("✓ Completed: {}", stage.title()),
            )],
        };

        if let Some(report) = update.final_report() {
            out.push(ProgressNotification::Complete {
                report: report.to_string(),
            });
        }
        out
    }

    /// Notifications for any engine event; a finished run adds nothing
    pub fn from_engine_event(event: &EngineEvent) -> Vec<Self> {
        match event {
            EngineEvent::Stage(stage_event) => Self::from_stage_event(stage_event),
            EngineEvent::Finished(_) => Vec::new(),
            EngineEvent::Failed(e) => vec![Self::error(e)],
        }
    }

    /// JSON body of the notification
    pub fn to_json(&self) -> String {
        // Serializing a tagged enum of strings cannot fail
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
