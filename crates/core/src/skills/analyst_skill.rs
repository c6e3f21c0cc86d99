//! # Analyst Skill
//!
//! One contract, three framings. Each dimension reads the same window of
//! search results and scraped sources and writes its own key in
//! `parallel_analyses`. A failed generation writes [`ANALYSIS_PLACEHOLDER`]
//! so the join never waits on a missing key.

use crate::skills::prompts::{self, render};
use crate::skills::StageSettings;
use crate::state::{
    tail, ResearchState, SearchResult, StateUpdate, FACTS_KEY, INSIGHTS_KEY, TRENDS_KEY,
};
use crate::tools::{Collaborators, GenerationRequest};

/// Written under a dimension's key when its generation fails
pub const ANALYSIS_PLACEHOLDER: &str = "Analysis pending...";

/// Most recent search results shown to an analyst
pub const RESULTS_WINDOW: usize = 20;

/// Most recent scraped sources shown to an analyst
pub const SOURCES_WINDOW: usize = 10;

/// Analytical framing of one analyst instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisDimension {
    Facts,
    Trends,
    Insights,
}

impl AnalysisDimension {
    pub const ALL: [AnalysisDimension; 3] = [
        AnalysisDimension::Facts,
        AnalysisDimension::Trends,
        AnalysisDimension::Insights,
    ];

    /// Key written in `parallel_analyses`
    pub fn key(self) -> &'static str {
        match self {
            AnalysisDimension::Facts => FACTS_KEY,
            AnalysisDimension::Trends => TRENDS_KEY,
            AnalysisDimension::Insights => INSIGHTS_KEY,
        }
    }

    fn system_prompt(self) -> &'static str {
        match self {
            AnalysisDimension::Facts => prompts::FACTS_SYSTEM,
            AnalysisDimension::Trends => prompts::TRENDS_SYSTEM,
            AnalysisDimension::Insights => prompts::INSIGHTS_SYSTEM,
        }
    }

    fn template(self) -> &'static str {
        match self {
            AnalysisDimension::Facts => prompts::ANALYST_FACTS,
            AnalysisDimension::Trends => prompts::ANALYST_TRENDS,
            AnalysisDimension::Insights => prompts::ANALYST_INSIGHTS,
        }
    }
}

pub struct AnalystSkill;

impl AnalystSkill {
    pub async fn run(
        dimension: AnalysisDimension,
        state: &ResearchState,
        ports: &Collaborators,
        settings: &StageSettings,
    ) -> StateUpdate {
        let prompt = render(
            dimension.template(),
            &[
                ("topic", &state.topic),
                ("results", &format_results(&state.search_results)),
                ("sources", &tail(&state.scraped_content, SOURCES_WINDOW).join("\n\n")),
            ],
        );
        let request = GenerationRequest::new(
            dimension.system_prompt(),
            prompt,
            &state.model_selector,
            settings.default_max_tokens,
        );

        let text = match ports.llm.generate(request).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(stage = dimension.key(), error = %e, "Analysis failed, writing placeholder");
                ANALYSIS_PLACEHOLDER.to_string()
            }
        };

        StateUpdate::analysis(dimension.key(), text)
    }
}

/// Bullet list of the latest [`RESULTS_WINDOW`] results
pub fn format_results(results: &[SearchResult]) -> String {
    tail(results, RESULTS_WINDOW)
        .iter()
        .map(|r| format!("- {}", r))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SearchHit;
    use crate::testing::{hits, ports, FakeFetcher, FakeSearch, ScriptedLlm};
    use std::sync::Arc;

    #[test]
    fn test_format_results_window() {
        let mut results = hits(25);
        results.push(SearchResult::Opaque("raw entry".into()));
        results.push(SearchResult::Hit(SearchHit::new("", "snip", "https://a.test")));

        let text = format_results(&results);
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), RESULTS_WINDOW);
        assert_eq!(lines[0], "- Source 7: snippet 7 (https://source.test/7)");
        assert_eq!(lines[18], "- raw entry");
        assert_eq!(lines[19], "- No title: snip (https://a.test)");
    }

    #[tokio::test]
    async fn test_each_dimension_writes_its_key() {
        let llm = Arc::new(ScriptedLlm::new(|req| Ok(req.system_prompt.clone())));
        let collaborators = ports(llm, Arc::new(FakeSearch::new(0)), Arc::new(FakeFetcher::new()));
        let state = ResearchState::new("t", "m");

        for dimension in AnalysisDimension::ALL {
            let update =
                AnalystSkill::run(dimension, &state, &collaborators, &StageSettings::default())
                    .await;
            let analyses = update.parallel_analyses.unwrap();
            assert_eq!(analyses.len(), 1);
            assert_eq!(analyses[dimension.key()], dimension.system_prompt());
        }
    }

    #[tokio::test]
    async fn test_failure_writes_placeholder() {
        let collaborators = ports(
            Arc::new(ScriptedLlm::failing()),
            Arc::new(FakeSearch::new(0)),
            Arc::new(FakeFetcher::new()),
        );
        let state = ResearchState::new("t", "m");

        let update = AnalystSkill::run(
            AnalysisDimension::Trends,
            &state,
            &collaborators,
            &StageSettings::default(),
        )
        .await;

        assert_eq!(
            update.parallel_analyses.unwrap()[TRENDS_KEY],
            ANALYSIS_PLACEHOLDER
        );
    }

    #[tokio::test]
    async fn test_prompt_uses_latest_sources() {
        let llm = Arc::new(ScriptedLlm::always("ok"));
        let collaborators = ports(llm.clone(), Arc::new(FakeSearch::new(0)), Arc::new(FakeFetcher::new()));
        let mut state = ResearchState::new("Solar", "m");
        state.scraped_content = (0..12).map(|i| format!("source-{:02}", i)).collect();

        AnalystSkill::run(AnalysisDimension::Facts, &state, &collaborators, &StageSettings::default())
            .await;

        let prompt = &llm.calls()[0].user_prompt;
        assert!(prompt.contains("Topic: Solar"));
        assert!(!prompt.contains("source-01"));
        assert!(prompt.contains("source-02\n\nsource-03"));
        assert!(prompt.contains("source-11"));
    }

    #[tokio::test]
    async fn test_placeholder_tokens_in_inputs_stay_literal() {
        let llm = Arc::new(ScriptedLlm::always("ok"));
        let collaborators = ports(llm.clone(), Arc::new(FakeSearch::new(0)), Arc::new(FakeFetcher::new()));
        let mut state = ResearchState::new("Rust {sources}", "m");
        state.search_results = vec![SearchResult::Hit(SearchHit::new(
            "Guide",
            "see {sources} here",
            "https://a.test",
        ))];
        state.scraped_content = vec!["SCRAPED_PAGE_BODY".into()];

        AnalystSkill::run(AnalysisDimension::Facts, &state, &collaborators, &StageSettings::default())
            .await;

        let prompt = &llm.calls()[0].user_prompt;
        assert_eq!(prompt.matches("SCRAPED_PAGE_BODY").count(), 1);
        assert!(prompt.contains("Topic: Rust {sources}"));
        assert!(prompt.contains("see {sources} here"));
    }
}
