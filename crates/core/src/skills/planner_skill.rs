//! # Planner Skill
//!
//! Turns the topic (and, after the first cycle, the latest research note)
//! into a list of search queries. A response that is not a JSON array of
//! strings is replaced by a deterministic default list derived from the topic.

use crate::skills::prompts::{self, render};
use crate::skills::StageSettings;
use crate::state::{ResearchState, StateUpdate};
use crate::tools::{CollaboratorError, Collaborators, GenerationRequest};

/// Planner skill for generating search queries
pub struct PlannerSkill;

impl PlannerSkill {
    pub async fn run(
        state: &ResearchState,
        ports: &Collaborators,
        settings: &StageSettings,
    ) -> StateUpdate {
        let first_cycle = state.iteration == 0;
        let prompt = if first_cycle {
            render(prompts::PLANNER_INITIAL, &[("topic", &state.topic)])
        } else {
            render(
                prompts::PLANNER_FOLLOWUP,
                &[
                    ("topic", &state.topic),
                    ("previous", state.latest_note().unwrap_or("None")),
                ],
            )
        };

        let request = GenerationRequest::new(
            prompts::PLANNER_SYSTEM,
            prompt,
            &state.model_selector,
            settings.default_max_tokens,
        );

        let queries = match ports.llm.generate(request).await {
            Ok(text) => parse_queries(&text),
            Err(e) => Err(e),
        }
        .unwrap_or_else(|e| {
            tracing::warn!(stage = "planner", error = %e, "Using default search queries");
            default_queries(&state.topic, first_cycle)
        });

        tracing::info!(count = queries.len(), iteration = state.iteration, "Planned search queries");

        StateUpdate {
            plan: Some(vec!["Research plan created".to_string()]),
            past_steps: Some(vec![format!("Generated {} search queries", queries.len())]),
            search_queries: Some(queries),
            ..StateUpdate::default()
        }
    }
}

/// Parse a model response as a JSON array of query strings.
///
/// Markdown code fences are stripped first. Blank entries are dropped and an
/// array left empty is rejected.
pub fn parse_queries(text: &str) -> Result<Vec<String>, CollaboratorError> {
    let cleaned = text.replace("```json", "").replace("```", "");
    let queries: Vec<String> = serde_json::from_str(cleaned.trim()).map_err(|e| {
        CollaboratorError::parse(format!("expected a JSON array of strings: {}", e))
    })?;

    let queries: Vec<String> = queries
        .into_iter()
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .collect();

    if queries.is_empty() {
        return Err(CollaboratorError::parse("query list is empty"));
    }
    Ok(queries)
}

/// Queries used when the model's answer is unusable
pub fn default_queries(topic: &str, first_cycle: bool) -> Vec<String> {
    if first_cycle {
        vec![
            topic.to_string(),
            format!("{} explained", topic),
            format!("{} latest developments", topic),
        ]
    } else {
        vec![format!("{} in-depth analysis", topic)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ports, FakeFetcher, FakeSearch, ScriptedLlm};
    use std::sync::Arc;

    fn with_llm(llm: ScriptedLlm) -> (Arc<ScriptedLlm>, Collaborators) {
        let llm = Arc::new(llm);
        let collaborators = ports(
            llm.clone(),
            Arc::new(FakeSearch::new(0)),
            Arc::new(FakeFetcher::new()),
        );
        (llm, collaborators)
    }

    #[test]
    fn test_parse_fenced_array() {
        let text = "```json\n[\"ev battery costs\", \"ev charging networks\"]\n```";
        assert_eq!(
            parse_queries(text).unwrap(),
            vec!["ev battery costs", "ev charging networks"]
        );
    }

    #[test]
    fn test_parse_rejects_non_arrays() {
        assert!(parse_queries("{\"queries\": [\"a\"]}").is_err());
        assert!(parse_queries("Here are some queries: a, b").is_err());
        assert!(parse_queries("[1, 2]").is_err());
        assert!(parse_queries("[\"  \"]").is_err());
    }

    #[tokio::test]
    async fn test_malformed_response_falls_back_on_first_cycle() {
        let (_, collaborators) = with_llm(ScriptedLlm::always("not json at all"));
        let state = ResearchState::new("Electric Vehicles", "openai/gpt-4o-mini");

        let update = PlannerSkill::run(&state, &collaborators, &StageSettings::default()).await;

        assert_eq!(
            update.search_queries.unwrap(),
            vec![
                "Electric Vehicles",
                "Electric Vehicles explained",
                "Electric Vehicles latest developments"
            ]
        );
        assert_eq!(update.past_steps.unwrap(), vec!["Generated 3 search queries"]);
        assert_eq!(update.plan.unwrap(), vec!["Research plan created"]);
    }

    #[tokio::test]
    async fn test_transport_error_falls_back_on_later_cycle() {
        let (_, collaborators) = with_llm(ScriptedLlm::failing());
        let mut state = ResearchState::new("Electric Vehicles", "m");
        state.iteration = 1;

        let update = PlannerSkill::run(&state, &collaborators, &StageSettings::default()).await;

        assert_eq!(
            update.search_queries.unwrap(),
            vec!["Electric Vehicles in-depth analysis"]
        );
    }

    #[tokio::test]
    async fn test_followup_prompt_carries_latest_note() {
        let (llm, collaborators) = with_llm(ScriptedLlm::always("[\"gap one\", \"gap two\"]"));
        let mut state = ResearchState::new("Solar", "openai/gpt-4o");
        state.iteration = 1;
        state.research_notes = vec!["old note".into(), "latest note".into()];

        let update = PlannerSkill::run(&state, &collaborators, &StageSettings::default()).await;

        assert_eq!(update.search_queries.unwrap(), vec!["gap one", "gap two"]);
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].user_prompt.contains("latest note"));
        assert!(!calls[0].user_prompt.contains("old note"));
        assert_eq!(calls[0].model, "openai/gpt-4o");
        assert_eq!(calls[0].max_tokens, 2000);
    }
}
