//! Default prompt templates bundled at compile time.
//!
//! Templates use `{name}` placeholders filled by [`render`].

/// Planner, first cycle
pub const PLANNER_INITIAL: &str = include_str!("defaults/planner_initial.md");

/// Planner, follow-up cycles
pub const PLANNER_FOLLOWUP: &str = include_str!("defaults/planner_followup.md");

/// Facts analyst - data points and statistics
pub const ANALYST_FACTS: &str = include_str!("defaults/analyst_facts.md");

/// Trends analyst - developments and projections
pub const ANALYST_TRENDS: &str = include_str!("defaults/analyst_trends.md");

/// Insights analyst - expert perspectives and implications
pub const ANALYST_INSIGHTS: &str = include_str!("defaults/analyst_insights.md");

/// Reviewer - sufficiency verdict
pub const REVIEWER: &str = include_str!("defaults/reviewer.md");

/// Writer - final report
pub const WRITER: &str = include_str!("defaults/writer.md");

pub const PLANNER_SYSTEM: &str =
    "You are an expert research planner with deep analytical skills.";
pub const FACTS_SYSTEM: &str = "You are a data extraction specialist.";
pub const TRENDS_SYSTEM: &str = "You are a trends analyst.";
pub const INSIGHTS_SYSTEM: &str = "You are an insights analyst.";
pub const REVIEWER_SYSTEM: &str = "You are a research quality evaluator.";
pub const WRITER_SYSTEM: &str =
    "You are an expert technical writer and researcher known for clear, comprehensive reports.";

/// Fill `{name}` placeholders in one left-to-right pass.
///
/// Inserted values are never rescanned, so a topic or snippet that happens
/// to contain `{sources}` stays literal. Unknown `{...}` runs are kept as is.
pub fn render(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let filled = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });

        match filled {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}
