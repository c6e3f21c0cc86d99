//! # Reducer Table
//!
//! Per-field merge rules applied when a stage's partial update is folded
//! into the running [`ResearchState`](super::ResearchState).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How an incoming value is combined with the current one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeRule {
    /// Replace the current value
    Overwrite,
    /// Extend the current sequence, no deduplication
    Append,
    /// Key-wise union, incoming keys win
    MapUnion,
}

/// Identity of a state field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    Topic,
    ModelSelector,
    Plan,
    PastSteps,
    SearchQueries,
    SearchResults,
    ScrapedContent,
    ResearchNotes,
    ParallelAnalyses,
    Report,
    IsFinished,
    Iteration,
}

impl StateField {
    /// Every field, in declaration order
    pub const ALL: [StateField; 12] = [
        StateField::Topic,
        StateField::ModelSelector,
        StateField::Plan,
        StateField::PastSteps,
        StateField::SearchQueries,
        StateField::SearchResults,
        StateField::ScrapedContent,
        StateField::ResearchNotes,
        StateField::ParallelAnalyses,
        StateField::Report,
        StateField::IsFinished,
        StateField::Iteration,
    ];

    /// The reducer table
    pub const fn merge_rule(self) -> MergeRule {
        match self {
            StateField::PastSteps
            | StateField::SearchResults
            | StateField::ScrapedContent
            | StateField::ResearchNotes => MergeRule::Append,
            StateField::ParallelAnalyses => MergeRule::MapUnion,
            StateField::Topic
            | StateField::ModelSelector
            | StateField::Plan
            | StateField::SearchQueries
            | StateField::Report
            | StateField::IsFinished
            | StateField::Iteration => MergeRule::Overwrite,
        }
    }
}

/// Merge a sequence field
pub(crate) fn merge_seq<T>(field: StateField, current: &mut Vec<T>, incoming: Vec<T>) {
    match field.merge_rule() {
        MergeRule::Append => current.extend(incoming),
        MergeRule::Overwrite | MergeRule::MapUnion => *current = incoming,
    }
}

/// Merge a map field
pub(crate) fn merge_map(
    field: StateField,
    current: &mut BTreeMap<String, String>,
    incoming: BTreeMap<String, String>,
) {
    match field.merge_rule() {
        MergeRule::MapUnion | MergeRule::Append => current.extend(incoming),
        MergeRule::Overwrite => *current = incoming,
    }
}

/// Merge a scalar field; scalars only ever overwrite
pub(crate) fn merge_scalar<T>(field: StateField, current: &mut T, incoming: T) {
    debug_assert_eq!(field.merge_rule(), MergeRule::Overwrite);
    *current = incoming;
}
