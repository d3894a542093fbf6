//! Bounded per-agent memory.

use chrono::Utc;
use std::collections::VecDeque;

use super::entries::{ActionLogEntry, NavigationPoint, Outcome, Reflection};
use super::goals::{Goal, PlanStep, Truncation, merge_goals, normalize_key, normalize_plans};
use crate::config::MemoryConfig;
use crate::reflection::Tier;

/// Goals, plans, reflections, action log and navigation points of one agent.
///
/// Caps are enforced when data is written, so every reader sees a state that
/// already satisfies them.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    config: MemoryConfig,
    goals: Vec<Goal>,
    plans: Vec<PlanStep>,
    reflections: VecDeque<Reflection>,
    action_log: VecDeque<ActionLogEntry>,
    navigation: Vec<NavigationPoint>,
    next_reflection: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(MemoryConfig::default())
    }
}

impl MemoryStore {
    pub fn new(config: MemoryConfig) -> Self {
        Self {
            reflections: VecDeque::with_capacity(config.reflection_window),
            action_log: VecDeque::with_capacity(config.action_log_window),
            config,
            goals: Vec::new(),
            plans: Vec::new(),
            navigation: Vec::new(),
            next_reflection: 1,
        }
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    // Goals and plans

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn plans(&self) -> &[PlanStep] {
        &self.plans
    }

    /// Replace the goal set, applying dedupe and the cap.
    pub fn replace_goals(&mut self, incoming: Vec<Goal>) -> Truncation<Goal> {
        let (goals, report) = merge_goals(&self.goals, incoming);
        if !report.dropped.is_empty() {
            tracing::debug!(
                dropped = report.dropped.len(),
                "Goal cap reached, lowest priority dropped"
            );
        }
        self.goals = goals;
        report
    }

    /// Replace the plan, applying dedupe and the cap.
    pub fn replace_plans(&mut self, incoming: Vec<PlanStep>) -> Truncation<PlanStep> {
        let (plans, report) = normalize_plans(incoming);
        if !report.dropped.is_empty() {
            tracing::debug!(dropped = report.dropped.len(), "Plan cap reached");
        }
        self.plans = plans;
        report
    }

    /// Goal with the highest priority; the earliest one among equals.
    pub fn top_goal(&self) -> Option<&Goal> {
        self.goals
            .iter()
            .rev()
            .max_by_key(|g| g.priority)
    }

    // Reflections

    pub fn reflections(&self) -> impl DoubleEndedIterator<Item = &Reflection> {
        self.reflections.iter()
    }

    pub fn latest_reflection(&self) -> Option<&Reflection> {
        self.reflections.back()
    }

    /// Append a reflection, evicting the oldest once the window is full.
    pub fn append_reflection(
        &mut self,
        text: impl Into<String>,
        tier: Option<Tier>,
        deferred: bool,
    ) -> &Reflection {
        let reflection = Reflection {
            sequence: self.next_reflection,
            text: text.into(),
            recorded_at: Utc::now(),
            tier,
            deferred,
        };
        self.next_reflection += 1;
        push_bounded(&mut self.reflections, reflection, self.config.reflection_window);
        // Window is at least one entry (validated config), so back() is the new one.
        &self.reflections[self.reflections.len() - 1]
    }

    // Action log

    pub fn action_log(&self) -> impl DoubleEndedIterator<Item = &ActionLogEntry> {
        self.action_log.iter()
    }

    pub fn log_len(&self) -> usize {
        self.action_log.len()
    }

    /// The `n` most recent entries, oldest first.
    pub fn recent_log(&self, n: usize) -> Vec<&ActionLogEntry> {
        let skip = self.action_log.len().saturating_sub(n);
        self.action_log.iter().skip(skip).collect()
    }

    pub fn last_failure(&self) -> Option<&ActionLogEntry> {
        self.action_log
            .iter()
            .rev()
            .find(|e| e.outcome() == Outcome::Failure)
    }

    pub fn append_log(&mut self, entry: ActionLogEntry) {
        push_bounded(&mut self.action_log, entry, self.config.action_log_window);
    }

    /// Consecutive most-recent failures of `action` aimed at `target` under
    /// `fingerprint`. Any other outcome or fingerprint for that pair ends the run.
    pub fn failure_streak(&self, action: &str, target: Option<&str>, fingerprint: &str) -> usize {
        let target_key = target.map(normalize_key);
        self.action_log
            .iter()
            .rev()
            .filter(|e| {
                e.action().eq_ignore_ascii_case(action) && e.target().map(normalize_key) == target_key
            })
            .take_while(|e| e.outcome() == Outcome::Failure && e.fingerprint() == fingerprint)
            .count()
    }

    // Navigation points

    pub fn navigation_points(&self) -> &[NavigationPoint] {
        &self.navigation
    }

    pub fn navigation_point(&self, name: &str) -> Option<&NavigationPoint> {
        let key = normalize_key(name);
        self.navigation.iter().find(|p| normalize_key(&p.name) == key)
    }

    /// Add a point, replacing any point with the same name.
    pub fn add_navigation_point(&mut self, point: NavigationPoint) {
        if point.name.is_empty() {
            tracing::debug!("Ignoring unnamed navigation point");
            return;
        }
        let key = normalize_key(&point.name);
        match self.navigation.iter_mut().find(|p| normalize_key(&p.name) == key) {
            Some(existing) => *existing = point,
            None => self.navigation.push(point),
        }
    }

    pub fn remove_navigation_point(&mut self, name: &str) -> Option<NavigationPoint> {
        let key = normalize_key(name);
        let idx = self.navigation.iter().position(|p| normalize_key(&p.name) == key)?;
        Some(self.navigation.remove(idx))
    }

    pub(crate) fn restore(
        &mut self,
        goals: Vec<Goal>,
        plans: Vec<PlanStep>,
        reflections: Vec<Reflection>,
        action_log: Vec<ActionLogEntry>,
        navigation: Vec<NavigationPoint>,
    ) {
        self.goals.clear();
        self.replace_goals(goals);
        self.replace_plans(plans);

        self.next_reflection = reflections.iter().map(|r| r.sequence + 1).max().unwrap_or(1);
        self.reflections.clear();
        for reflection in reflections {
            push_bounded(&mut self.reflections, reflection, self.config.reflection_window);
        }

        self.action_log.clear();
        for entry in action_log {
            push_bounded(&mut self.action_log, entry, self.config.action_log_window);
        }

        self.navigation.clear();
        for point in navigation {
            self.add_navigation_point(point);
        }
    }
}

fn push_bounded<T>(queue: &mut VecDeque<T>, item: T, window: usize) {
    let window = window.max(1);
    while queue.len() >= window {
        queue.pop_front();
    }
    queue.push_back(item);
}
