//! Goals, plan steps and the cap rules applied when they are replaced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Hard cap on concurrent goals.
pub const GOAL_CAP: usize = 5;

/// Hard cap on plan steps.
pub const PLAN_CAP: usize = 5;

/// Goal urgency. Ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    /// Lenient label parsing; `None` for anything unrecognized.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "high" | "urgent" | "critical" | "h" => Some(Self::High),
            "medium" | "normal" | "mid" | "m" => Some(Self::Medium),
            "low" | "minor" | "l" => Some(Self::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A priority-tagged objective.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub text: String,
    pub priority: Priority,
}

impl Goal {
    pub fn new(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into().trim().to_string(),
            priority,
        }
    }

    /// Parse `"[priority] text"`. A missing or unknown tag yields medium.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if let Some(rest) = raw.strip_prefix('[')
            && let Some((tag, text)) = rest.split_once(']')
        {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            return Some(Self::new(text, Priority::parse(tag).unwrap_or_default()));
        }

        Some(Self::new(raw, Priority::Medium))
    }

    /// Identity key: case-insensitive, whitespace-collapsed text.
    pub fn key(&self) -> String {
        normalize_key(&self.text)
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.priority, self.text)
    }
}

/// One ordered action-intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanStep {
    text: String,
}

impl PlanStep {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into().trim().to_string(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn key(&self) -> String {
        normalize_key(&self.text)
    }
}

impl fmt::Display for PlanStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

impl From<&str> for PlanStep {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// What a replace operation had to discard to satisfy the invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Truncation<T> {
    /// Entries dropped because the cap was exceeded
    pub dropped: Vec<T>,
    /// Entries merged into an earlier entry with the same text
    pub duplicates: usize,
    /// Blank entries discarded
    pub blanks: usize,
}

impl<T> Default for Truncation<T> {
    fn default() -> Self {
        Self {
            dropped: Vec::new(),
            duplicates: 0,
            blanks: 0,
        }
    }
}

impl<T> Truncation<T> {
    /// Nothing had to be repaired.
    pub fn is_clean(&self) -> bool {
        self.dropped.is_empty() && self.duplicates == 0 && self.blanks == 0
    }
}

pub(crate) fn normalize_key(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Merge an incoming full goal list with the current one.
///
/// Duplicates collapse into their first occurrence at the highest priority
/// seen. Over the cap, the lowest priority goes first and, among equals, the
/// one emitted earliest in `incoming`. Which goals survive depends only on
/// `incoming`, so merging the same list twice is a no-op. Survivors already
/// held keep their relative order; new goals follow in incoming order.
pub(crate) fn merge_goals(current: &[Goal], incoming: Vec<Goal>) -> (Vec<Goal>, Truncation<Goal>) {
    let mut report = Truncation::default();
    let mut deduped: Vec<Goal> = Vec::with_capacity(incoming.len());

    for goal in incoming {
        if goal.text.trim().is_empty() {
            report.blanks += 1;
            continue;
        }
        let key = goal.key();
        if let Some(existing) = deduped.iter_mut().find(|g| g.key() == key) {
            existing.priority = existing.priority.max(goal.priority);
            report.duplicates += 1;
        } else {
            deduped.push(goal);
        }
    }

    report.dropped = enforce_goal_cap(&mut deduped, GOAL_CAP);

    let mut ordered: Vec<Goal> = current
        .iter()
        .filter_map(|held| deduped.iter().find(|g| g.key() == held.key()).cloned())
        .collect();
    for goal in deduped {
        if !ordered.iter().any(|g| g.key() == goal.key()) {
            ordered.push(goal);
        }
    }
    (ordered, report)
}

/// Drop goals until `cap` remain: lowest priority first, earliest first among equals.
pub(crate) fn enforce_goal_cap(goals: &mut Vec<Goal>, cap: usize) -> Vec<Goal> {
    let mut dropped = Vec::new();
    while goals.len() > cap {
        let Some(lowest) = goals.iter().map(|g| g.priority).min() else {
            break;
        };
        let Some(idx) = goals.iter().position(|g| g.priority == lowest) else {
            break;
        };
        dropped.push(goals.remove(idx));
    }
    dropped
}

/// Clean an incoming plan: blanks and duplicates removed, steps past the cap
/// (in execution order) dropped.
pub(crate) fn normalize_plans(incoming: Vec<PlanStep>) -> (Vec<PlanStep>, Truncation<PlanStep>) {
    let mut report = Truncation::default();
    let mut steps: Vec<PlanStep> = Vec::with_capacity(PLAN_CAP);

    for step in incoming {
        if step.text.is_empty() {
            report.blanks += 1;
            continue;
        }
        if steps.iter().any(|s| s.key() == step.key()) {
            report.duplicates += 1;
            continue;
        }
        steps.push(step);
    }

    if steps.len() > PLAN_CAP {
        report.dropped = steps.split_off(PLAN_CAP);
    }
    (steps, report)
}
