//! # Research Graph
//!
//! Drives one research run through the stage graph: sequential stages, the
//! three-way analyzer fan-out with its join, and the reviewer's loop edge.
//! Every stage update is merged through the reducer table, checked against
//! the state invariants and emitted as a [`StageEvent`].

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::Stream;

use crate::config::ResearchConfig;
use crate::skills::{
    AnalystSkill, PlannerSkill, ReviewerSkill, ScraperSkill, SearcherSkill, StageSettings,
    SynthesizerSkill, WriterSkill, ANALYSIS_PLACEHOLDER,
};
use crate::state::{ResearchState, StateUpdate};
use crate::tools::Collaborators;

use super::events::{EngineEvent, StageEvent};
use super::pipeline::{Stage, Transition};

/// Capacity of the event channels
const EVENT_BUFFER: usize = 64;

/// Conditions that abort a run
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("topic must not be empty")]
    EmptyTopic,
    #[error("invariant violated at {stage}: {detail}")]
    InvariantViolation { stage: Stage, detail: String },
    #[error("research task did not complete: {0}")]
    Cancelled(String),
}

impl EngineError {
    fn violation(stage: Stage, detail: impl Into<String>) -> Self {
        EngineError::InvariantViolation {
            stage,
            detail: detail.into(),
        }
    }
}

/// The research graph with its injected collaborators
#[derive(Clone)]
pub struct ResearchGraph {
    ports: Collaborators,
    settings: StageSettings,
}

impl ResearchGraph {
    pub fn new(ports: Collaborators, settings: StageSettings) -> Self {
        Self { ports, settings }
    }

    /// Graph over the production collaborators
    pub fn from_config(config: &ResearchConfig) -> anyhow::Result<Self> {
        Ok(Self::new(
            Collaborators::from_config(config)?,
            StageSettings::from(config),
        ))
    }

    /// Run to completion, sending one event per completed stage.
    ///
    /// A closed or absent event receiver never affects the run.
    #[tracing::instrument(skip_all, fields(topic = %initial.topic, model = %initial.model_selector))]
    pub async fn run(
        &self,
        initial: ResearchState,
        events: Option<mpsc::Sender<StageEvent>>,
    ) -> Result<ResearchState, EngineError> {
        if initial.topic.trim().is_empty() {
            return Err(EngineError::EmptyTopic);
        }

        let mut state = initial;
        let mut current = Stage::ENTRY;
        tracing::info!("Research started");

        loop {
            tracing::debug!(stage = %current, iteration = state.iteration, "Running stage");
            let update = self.execute(current, &state).await;
            self.commit(current, update, &mut state, &events).await?;

            current = match current.next() {
                Transition::To(next) => next,
                Transition::FanOut { branches, join } => {
                    self.fan_out(branches, join, &mut state, &events).await?;
                    join
                }
                Transition::Branch {
                    on_continue,
                    on_finish,
                } => {
                    if state.is_finished {
                        on_finish
                    } else {
                        tracing::info!(iteration = state.iteration, "Research needs another cycle");
                        on_continue
                    }
                }
                Transition::End => break,
            };
        }

        tracing::info!(
            cycles = state.research_notes.len(),
            report_chars = state.report.len(),
            "Research complete"
        );
        Ok(state)
    }

    /// Lazy event sequence of one run.
    ///
    /// Yields every stage event, then `Finished` or `Failed` as the last
    /// item. Dropping the stream does not stop the run.
    pub fn stream(&self, initial: ResearchState) -> impl Stream<Item = EngineEvent> + Send + 'static {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let graph = self.clone();

        tokio::spawn(async move {
            let (stage_tx, mut stage_rx) = mpsc::channel(EVENT_BUFFER);
            let run = tokio::spawn(async move { graph.run(initial, Some(stage_tx)).await });

            while let Some(event) = stage_rx.recv().await {
                let _ = tx.send(EngineEvent::Stage(event)).await;
            }

            let last = match run.await {
                Ok(Ok(state)) => EngineEvent::Finished(Box::new(state)),
                Ok(Err(e)) => EngineEvent::Failed(e),
                Err(e) => EngineEvent::Failed(EngineError::Cancelled(e.to_string())),
            };
            let _ = tx.send(last).await;
        });

        ReceiverStream::new(rx)
    }

    /// Dispatch table: one skill per stage
    async fn execute(&self, stage: Stage, state: &ResearchState) -> StateUpdate {
        let ports = &self.ports;
        let settings = &self.settings;
        match stage {
            Stage::Planner => PlannerSkill::run(state, ports, settings).await,
            Stage::Search => SearcherSkill::run(state, ports).await,
            Stage::Scrape => ScraperSkill::run(state, ports).await,
            Stage::AnalyzeFacts | Stage::AnalyzeTrends | Stage::AnalyzeInsights => {
                match stage.analysis_dimension() {
                    Some(dimension) => AnalystSkill::run(dimension, state, ports, settings).await,
                    None => StateUpdate::default(),
                }
            }
            Stage::SynthesizeParallel => SynthesizerSkill::run(state),
            Stage::Review => ReviewerSkill::run(state, ports, settings).await,
            Stage::Writer => WriterSkill::run(state, ports, settings).await,
        }
    }

    /// Run `branches` concurrently on one snapshot and merge them in
    /// completion order. A branch whose task died gets the placeholder.
    async fn fan_out(
        &self,
        branches: [Stage; 3],
        join: Stage,
        state: &mut ResearchState,
        events: &Option<mpsc::Sender<StageEvent>>,
    ) -> Result<(), EngineError> {
        let snapshot = Arc::new(state.clone());
        let mut join_set = JoinSet::new();

        // SCATTER
        for stage in branches {
            let graph = self.clone();
            let snapshot = snapshot.clone();
            join_set.spawn(async move {
                let update = graph.execute(stage, &snapshot).await;
                (stage, update)
            });
        }

        // GATHER
        let mut pending = branches.to_vec();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((stage, update)) => {
                    pending.retain(|s| *s != stage);
                    self.commit(stage, update, state, events).await?;
                }
                Err(e) => tracing::error!(error = %e, "Analyzer task failed"),
            }
        }

        for stage in pending {
            let dimension = stage.analysis_dimension().ok_or_else(|| {
                EngineError::violation(stage, "fan-out branch is not an analyzer")
            })?;
            tracing::warn!(stage = %stage, "Substituting placeholder for lost branch");
            let update = StateUpdate::analysis(dimension.key(), ANALYSIS_PLACEHOLDER);
            self.commit(stage, update, state, events).await?;
        }

        let missing = state.missing_analyses();
        if !missing.is_empty() {
            return Err(EngineError::violation(
                join,
                format!("analyses missing at join: {:?}", missing),
            ));
        }
        Ok(())
    }

    /// Merge, validate and emit one stage update
    async fn commit(
        &self,
        stage: Stage,
        update: StateUpdate,
        state: &mut ResearchState,
        events: &Option<mpsc::Sender<StageEvent>>,
    ) -> Result<(), EngineError> {
        if stage != Stage::Writer && update.report.is_some() {
            return Err(EngineError::violation(stage, "only the writer may set the report"));
        }

        let notes_before = state.research_notes.len();
        let iteration_before = state.iteration;
        state.apply(update.clone());

        match stage {
            Stage::Review if state.iteration != iteration_before + 1 => {
                return Err(EngineError::violation(
                    stage,
                    format!(
                        "iteration went from {} to {}",
                        iteration_before, state.iteration
                    ),
                ));
            }
            Stage::SynthesizeParallel if state.research_notes.len() != notes_before + 1 => {
                return Err(EngineError::violation(
                    stage,
                    format!(
                        "research notes went from {} to {}",
                        notes_before,
                        state.research_notes.len()
                    ),
                ));
            }
            Stage::Writer if state.report.is_empty() => {
                return Err(EngineError::violation(stage, "report is empty"));
            }
            _ if stage != Stage::Review && state.iteration != iteration_before => {
                return Err(EngineError::violation(stage, "only the reviewer may change iteration"));
            }
            _ => {}
        }

        tracing::debug!(stage = %stage, fields = ?update.touched_fields(), "Stage complete");
        emit(events, StageEvent::new(stage, update)).await;
        Ok(())
    }
}

async fn emit(events: &Option<mpsc::Sender<StageEvent>>, event: StageEvent) {
    if let Some(tx) = events {
        let _ = tx.send(event).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skills::prompts;
    use crate::state::{FACTS_KEY, INSIGHTS_KEY, TRENDS_KEY};
    use crate::swarm::events::ProgressNotification;
    use crate::testing::{failing_ports, ports, FakeFetcher, FakeSearch, ScriptedLlm};
    use crate::tools::{CollaboratorError, GenerationRequest};
    use tokio_stream::StreamExt;

    /// Model answering each stage by its system prompt
    fn scripted(review_answer: &'static str) -> ScriptedLlm {
        ScriptedLlm::new(move |req: &GenerationRequest| {
            let answer = match req.system_prompt.as_str() {
                prompts::PLANNER_SYSTEM => "[\"q1\", \"q2\"]",
                prompts::REVIEWER_SYSTEM => review_answer,
                prompts::WRITER_SYSTEM => "# Final Report",
                _ => "analysis",
            };
            Ok(answer.to_string())
        })
    }

    fn graph_with(llm: ScriptedLlm) -> (Arc<ScriptedLlm>, ResearchGraph) {
        let llm = Arc::new(llm);
        let collaborators = ports(
            llm.clone(),
            Arc::new(FakeSearch::new(3)),
            Arc::new(FakeFetcher::new()),
        );
        (llm, ResearchGraph::new(collaborators, StageSettings::default()))
    }

    async fn run_collecting(
        graph: &ResearchGraph,
        topic: &str,
    ) -> (Result<ResearchState, EngineError>, Vec<StageEvent>) {
        let (tx, mut rx) = mpsc::channel(1024);
        let result = graph.run(ResearchState::new(topic, "m"), Some(tx)).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        (result, events)
    }

    fn stages(events: &[StageEvent]) -> Vec<Stage> {
        events.iter().map(|e| e.stage).collect()
    }

    #[tokio::test]
    async fn test_sufficient_first_review_runs_one_cycle() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let (result, events) = run_collecting(&graph, "Electric Vehicles").await;
        let state = result.unwrap();

        assert_eq!(state.iteration, 1);
        assert!(state.is_finished);
        assert_eq!(state.research_notes.len(), 1);
        assert_eq!(state.report, "# Final Report");
        assert_eq!(state.search_results.len(), 6);
        assert_eq!(state.scraped_content.len(), 6);

        let order = stages(&events);
        assert_eq!(order.len(), 9);
        assert_eq!(&order[..3], &[Stage::Planner, Stage::Search, Stage::Scrape]);
        let mut analyzers = order[3..6].to_vec();
        analyzers.sort_by_key(|s| s.name());
        assert_eq!(
            analyzers,
            vec![Stage::AnalyzeFacts, Stage::AnalyzeInsights, Stage::AnalyzeTrends]
        );
        assert_eq!(
            &order[6..],
            &[Stage::SynthesizeParallel, Stage::Review, Stage::Writer]
        );
    }

    #[tokio::test]
    async fn test_needs_more_loops_exactly_once() {
        let (llm, graph) = graph_with(scripted("NEEDS_MORE"));
        let (result, events) = run_collecting(&graph, "Heat Pumps").await;
        let state = result.unwrap();

        assert_eq!(state.iteration, 2);
        assert_eq!(state.research_notes.len(), 2);
        assert_eq!(
            stages(&events).iter().filter(|s| **s == Stage::Planner).count(),
            2
        );
        let reviews = llm
            .calls()
            .iter()
            .filter(|c| c.system_prompt == prompts::REVIEWER_SYSTEM)
            .count();
        assert_eq!(reviews, 2);
        // append semantics across cycles
        assert_eq!(state.search_results.len(), 12);
    }

    #[tokio::test]
    async fn test_notes_track_synthesizer_runs() {
        let (_, graph) = graph_with(scripted("NEEDS_MORE"));
        let (result, events) = run_collecting(&graph, "Solar").await;
        let state = result.unwrap();

        let synth_runs = stages(&events)
            .iter()
            .filter(|s| **s == Stage::SynthesizeParallel)
            .count();
        assert_eq!(state.research_notes.len(), synth_runs);

        let mut notes = 0;
        for event in &events {
            let added = event.update.research_notes.as_ref().map_or(0, Vec::len);
            notes += added;
            assert!(added <= 1);
        }
        assert_eq!(notes, synth_runs);
    }

    #[tokio::test]
    async fn test_all_ports_failing_still_reports() {
        let graph = ResearchGraph::new(failing_ports(), StageSettings::default());
        let (result, events) = run_collecting(&graph, "Electric Vehicles").await;
        let state = result.unwrap();

        assert!(!state.report.is_empty());
        assert!(state.report.starts_with("# Research Report: Electric Vehicles"));
        assert!(state.iteration <= 3);
        assert_eq!(
            state.search_queries,
            vec![
                "Electric Vehicles",
                "Electric Vehicles explained",
                "Electric Vehicles latest developments"
            ]
        );
        assert!(state.search_results.is_empty());
        assert_eq!(events.last().map(|e| e.stage), Some(Stage::Writer));
    }

    #[tokio::test]
    async fn test_failed_analyzers_still_join() {
        let llm = ScriptedLlm::new(|req: &GenerationRequest| match req.system_prompt.as_str() {
            prompts::FACTS_SYSTEM | prompts::TRENDS_SYSTEM | prompts::INSIGHTS_SYSTEM => {
                Err(CollaboratorError::transport("llm", "timeout"))
            }
            prompts::REVIEWER_SYSTEM => Ok("SUFFICIENT".to_string()),
            prompts::PLANNER_SYSTEM => Ok("[\"q\"]".to_string()),
            _ => Ok("report".to_string()),
        });
        let (_, graph) = graph_with(llm);
        let (result, _) = run_collecting(&graph, "t").await;
        let state = result.unwrap();

        for key in [FACTS_KEY, TRENDS_KEY, INSIGHTS_KEY] {
            assert_eq!(state.parallel_analyses[key], ANALYSIS_PLACEHOLDER);
        }
        assert_eq!(
            state.research_notes[0].matches(ANALYSIS_PLACEHOLDER).count(),
            3
        );
    }

    #[tokio::test]
    async fn test_panicked_analyzer_gets_placeholder() {
        let llm = ScriptedLlm::new(|req: &GenerationRequest| match req.system_prompt.as_str() {
            prompts::TRENDS_SYSTEM => panic!("trends analyzer crashed"),
            prompts::PLANNER_SYSTEM => Ok("[\"q\"]".to_string()),
            prompts::REVIEWER_SYSTEM => Ok("SUFFICIENT".to_string()),
            prompts::WRITER_SYSTEM => Ok("# Report".to_string()),
            _ => Ok("analysis".to_string()),
        });
        let (_, graph) = graph_with(llm);
        let (result, events) = run_collecting(&graph, "t").await;
        let state = result.unwrap();

        assert_eq!(state.parallel_analyses[TRENDS_KEY], ANALYSIS_PLACEHOLDER);
        assert_eq!(state.parallel_analyses[FACTS_KEY], "analysis");
        assert_eq!(state.parallel_analyses[INSIGHTS_KEY], "analysis");
        assert_eq!(state.report, "# Report");

        let analyzer_events = events
            .iter()
            .filter(|e| e.stage.analysis_dimension().is_some())
            .count();
        assert_eq!(analyzer_events, 3);
        assert!(events.iter().any(|e| e.stage == Stage::AnalyzeTrends));
    }

    #[tokio::test]
    async fn test_analyzers_share_one_snapshot() {
        let (llm, graph) = graph_with(scripted("SUFFICIENT"));
        run_collecting(&graph, "t").await.0.unwrap();

        let shown: Vec<String> = llm
            .calls()
            .into_iter()
            .filter(|c| {
                [prompts::FACTS_SYSTEM, prompts::TRENDS_SYSTEM, prompts::INSIGHTS_SYSTEM]
                    .contains(&c.system_prompt.as_str())
            })
            .map(|c| c.user_prompt.split("Search results:").nth(1).unwrap_or("").to_string())
            .collect();
        assert_eq!(shown.len(), 3);
        assert!(shown.iter().all(|p| p == &shown[0]));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_before_any_stage() {
        let (llm, graph) = graph_with(scripted("SUFFICIENT"));
        let (result, events) = run_collecting(&graph, "   ").await;

        assert!(matches!(result, Err(EngineError::EmptyTopic)));
        assert!(events.is_empty());
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_run_without_listener() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let state = graph
            .run(ResearchState::new("t", "m"), Some(tx))
            .await
            .unwrap();
        assert!(!state.report.is_empty());

        let state = graph.run(ResearchState::new("t", "m"), None).await.unwrap();
        assert!(!state.report.is_empty());
    }

    #[tokio::test]
    async fn test_stream_ends_with_finished() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let items: Vec<EngineEvent> = graph
            .stream(ResearchState::new("Batteries", "m"))
            .collect()
            .await;

        assert_eq!(items.len(), 10);
        match items.last() {
            Some(EngineEvent::Finished(state)) => assert_eq!(state.report, "# Final Report"),
            other => panic!("unexpected last item: {:?}", other),
        }

        let notifications: Vec<ProgressNotification> = items
            .iter()
            .flat_map(ProgressNotification::from_engine_event)
            .collect();
        assert_eq!(
            notifications.last(),
            Some(&ProgressNotification::Complete {
                report: "# Final Report".into()
            })
        );
    }

    #[tokio::test]
    async fn test_stream_fails_on_empty_topic() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let items: Vec<EngineEvent> = graph.stream(ResearchState::new("", "m")).collect().await;

        assert_eq!(items.len(), 1);
        assert!(matches!(items[0], EngineEvent::Failed(EngineError::EmptyTopic)));
    }

    #[tokio::test]
    async fn test_commit_rejects_stalled_reviewer() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let mut state = ResearchState::new("t", "m");
        let update = StateUpdate {
            is_finished: Some(true),
            ..StateUpdate::default()
        };

        let result = graph.commit(Stage::Review, update, &mut state, &None).await;

        assert!(matches!(
            result,
            Err(EngineError::InvariantViolation { stage: Stage::Review, .. })
        ));
    }

    #[tokio::test]
    async fn test_commit_rejects_early_report() {
        let (_, graph) = graph_with(scripted("SUFFICIENT"));
        let mut state = ResearchState::new("t", "m");
        let update = StateUpdate {
            report: Some("too early".into()),
            ..StateUpdate::default()
        };

        let result = graph.commit(Stage::Planner, update, &mut state, &None).await;

        assert!(result.is_err());
        assert!(state.report.is_empty());
    }
}
