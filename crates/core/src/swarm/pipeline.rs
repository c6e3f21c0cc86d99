//! # Pipeline Stages
//!
//! The closed set of stages and the static edge table between them.
//!
//! ```text
//! planner -> search -> scrape -> { analyze_facts | analyze_trends | analyze_insights }
//!         -> synthesize_parallel -> review -> (planner | writer) -> end
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::skills::AnalysisDimension;

/// Stage of the research graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Generating search queries
    Planner,
    /// Running the queries
    Search,
    /// Reading the latest hits
    Scrape,
    /// Parallel branch: facts and statistics
    AnalyzeFacts,
    /// Parallel branch: trends and developments
    AnalyzeTrends,
    /// Parallel branch: expert insights
    AnalyzeInsights,
    /// Join of the three analyses
    SynthesizeParallel,
    /// Loop control
    Review,
    /// Final report
    Writer,
}

/// Where control goes after a stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Unconditional edge
    To(Stage),
    /// Run `branches` concurrently on one snapshot, then `join`
    FanOut { branches: [Stage; 3], join: Stage },
    /// Conditional edge on `is_finished`
    Branch { on_continue: Stage, on_finish: Stage },
    /// Terminal stage
    End,
}

impl Transition {
    /// Stages directly reachable through this edge
    pub fn successors(&self) -> Vec<Stage> {
        match *self {
            Transition::To(next) => vec![next],
            Transition::FanOut { branches, .. } => branches.to_vec(),
            Transition::Branch {
                on_continue,
                on_finish,
            } => vec![on_continue, on_finish],
            Transition::End => Vec::new(),
        }
    }
}

impl Stage {
    pub const ALL: [Stage; 9] = [
        Stage::Planner,
        Stage::Search,
        Stage::Scrape,
        Stage::AnalyzeFacts,
        Stage::AnalyzeTrends,
        Stage::AnalyzeInsights,
        Stage::SynthesizeParallel,
        Stage::Review,
        Stage::Writer,
    ];

    /// First stage of every run
    pub const ENTRY: Stage = Stage::Planner;

    /// The edge table
    pub fn next(self) -> Transition {
        match self {
            Stage::Planner => Transition::To(Stage::Search),
            Stage::Search => Transition::To(Stage::Scrape),
            Stage::Scrape => Transition::FanOut {
                branches: [
                    Stage::AnalyzeFacts,
                    Stage::AnalyzeTrends,
                    Stage::AnalyzeInsights,
                ],
                join: Stage::SynthesizeParallel,
            },
            Stage::AnalyzeFacts | Stage::AnalyzeTrends | Stage::AnalyzeInsights => {
                Transition::To(Stage::SynthesizeParallel)
            }
            Stage::SynthesizeParallel => Transition::To(Stage::Review),
            Stage::Review => Transition::Branch {
                on_continue: Stage::Planner,
                on_finish: Stage::Writer,
            },
            Stage::Writer => Transition::End,
        }
    }

    /// Direct predecessors, derived from the edge table
    pub fn predecessors(self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|s| s.next().successors().contains(&self))
            .collect()
    }

    /// Wire name, as used in progress notifications
    pub fn name(self) -> &'static str {
        match self {
            Stage::Planner => "planner",
            Stage::Search => "search",
            Stage::Scrape => "scrape",
            Stage::AnalyzeFacts => "analyze_facts",
            Stage::AnalyzeTrends => "analyze_trends",
            Stage::AnalyzeInsights => "analyze_insights",
            Stage::SynthesizeParallel => "synthesize_parallel",
            Stage::Review => "review",
            Stage::Writer => "writer",
        }
    }

    /// Title Case of the wire name, e.g. `Synthesize Parallel`
    pub fn title(self) -> String {
        self.name()
            .split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// The analyst framing run by an analyzer stage
    pub fn analysis_dimension(self) -> Option<AnalysisDimension> {
        match self {
            Stage::AnalyzeFacts => Some(AnalysisDimension::Facts),
            Stage::AnalyzeTrends => Some(AnalysisDimension::Trends),
            Stage::AnalyzeInsights => Some(AnalysisDimension::Insights),
            _ => None,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
