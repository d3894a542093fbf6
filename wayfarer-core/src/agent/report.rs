//! Telemetry bundle and first-person status narratives.

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::LazyLock;
use tokio::time::timeout;

use super::context::AgentContext;
use crate::memory::MemoryStore;
use crate::oracle::{DecisionOracle, OracleRequest, RequestKind};
use crate::perception::{PerceptionSnapshot, PerceptionSummary};

/// Periodic telemetry emitted by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentReport {
    pub reflection: String,

    /// `"[priority] text"`, at most five
    pub goals: Vec<String>,

    /// Plan step text, at most five
    pub plans: Vec<String>,
}

impl AgentReport {
    pub fn from_memory(memory: &MemoryStore) -> Self {
        Self {
            reflection: memory
                .latest_reflection()
                .map(|r| r.text.clone())
                .unwrap_or_default(),
            goals: memory.goals().iter().map(|g| g.to_string()).collect(),
            plans: memory.plans().iter().map(|p| p.text().to_string()).collect(),
        }
    }
}

impl AgentContext {
    pub fn report(&self) -> AgentReport {
        AgentReport::from_memory(&self.memory)
    }

    /// Answer a status query in the first person.
    ///
    /// Uses the oracle's text with markdown structure removed; falls back to
    /// a narrative assembled from memory if the oracle fails, times out or
    /// returns nothing usable.
    pub async fn narrative(&self, oracle: &dyn DecisionOracle, question: Option<&str>) -> String {
        let perception = self
            .last_snapshot
            .as_deref()
            .map(|s| PerceptionSummary::render(s).to_prompt_text());
        let request = OracleRequest::new(RequestKind::Narrative, &self.id, self.cycle)
            .with_prompt(question.unwrap_or(
                "Describe in the first person where you are, what you are doing and why.",
            ))
            .with_context(json!({
                "report": self.report(),
                "perception": perception,
                "recent_actions": self.memory.recent_log(3).iter().map(|e| e.summary()).collect::<Vec<_>>(),
            }));

        let answer = match timeout(self.config.cycle.reflection_timeout, oracle.decide(&request)).await
        {
            Ok(Ok(decision)) => decision.as_text().map(strip_markup),
            Ok(Err(e)) => {
                tracing::warn!(agent_id = %self.id, error = %e, "Narrative oracle failed");
                None
            }
            Err(_) => {
                tracing::warn!(agent_id = %self.id, "Narrative oracle timed out");
                None
            }
        };

        answer
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| fallback_narrative(&self.memory, self.last_snapshot.as_deref()))
    }
}

/// First-person narrative built from memory alone.
pub fn fallback_narrative(memory: &MemoryStore, snapshot: Option<&PerceptionSnapshot>) -> String {
    let mut parts = Vec::new();
    match snapshot.and_then(|s| s.position()) {
        Some(position) => parts.push(format!("I am at {}.", position)),
        None => parts.push("I am not sure exactly where I am.".to_string()),
    }
    match memory.top_goal() {
        Some(goal) => parts.push(format!("My main goal is to {}.", lowercase_first(&goal.text))),
        None => parts.push("I have no goal right now.".to_string()),
    }
    if let Some(step) = memory.plans().first() {
        parts.push(format!("Next I plan to {}.", lowercase_first(step.text())));
    }
    if let Some(last) = memory.recent_log(1).first() {
        parts.push(format!(
            "My last action was {} and it ended in {}.",
            last.action(),
            last.outcome()
        ));
    }
    parts.join(" ")
}

fn lowercase_first(text: &str) -> String {
    let text = text.trim().trim_end_matches('.');
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Remove headers, bullets, emphasis and code fences; collapse to one paragraph.
pub fn strip_markup(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*```.*$").unwrap());
    static HEADER_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s{0,3}#{1,6}\s*").unwrap());
    static BULLET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)^\s*(?:[-*+]|\d+[.)])\s+").unwrap());
    static EMPHASIS_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\*\*|__|\*|`").unwrap());

    let text = FENCE_RE.replace_all(text, "");
    let text = HEADER_RE.replace_all(&text, "");
    let text = BULLET_RE.replace_all(&text, "");
    let text = EMPHASIS_RE.replace_all(&text, "");

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{Goal, PlanStep, Priority};

    #[test]
    fn test_strip_markup() {
        let raw = "## Status\n\n- I am **near** the `mill`\n- Heading *east*\n```\ncode\n```\n1. Then rest";
        assert_eq!(
            strip_markup(raw),
            "Status I am near the mill Heading east code Then rest"
        );
    }

    #[test]
    fn test_report_formats_goals() {
        let mut memory = MemoryStore::default();
        memory.replace_goals(vec![Goal::new("Reach Quinn", Priority::High)]);
        memory.replace_plans(vec![PlanStep::new("Walk east")]);
        memory.append_reflection("Quinn is east.", None, false);

        let report = AgentReport::from_memory(&memory);
        assert_eq!(report.goals, vec!["[high] Reach Quinn"]);
        assert_eq!(report.plans, vec!["Walk east"]);
        assert_eq!(report.reflection, "Quinn is east.");
    }

    #[test]
    fn test_fallback_narrative() {
        let mut memory = MemoryStore::default();
        memory.replace_goals(vec![Goal::new("Reach Quinn", Priority::High)]);
        memory.replace_plans(vec![PlanStep::new("Walk east.")]);

        let text = fallback_narrative(&memory, None);
        assert_eq!(
            text,
            "I am not sure exactly where I am. My main goal is to reach Quinn. Next I plan to walk east."
        );
    }
}
