//! The reflection engine: one type, configured per tier.

use serde_json::{Value, json};

use super::mapping::map_output;
use super::tier::{Tier, TierProfile};
use crate::action::ActionSpace;
use crate::error::Result;
use crate::memory::{Goal, MemoryStore, PlanStep, Truncation, merge_goals, normalize_plans};
use crate::oracle::{DecisionOracle, OracleDecision, OracleRequest, RequestKind, decode_json};
use crate::perception::{PerceptionSnapshot, PerceptionSummary};

/// Inputs to one reflection. Borrowed for the duration of the call.
#[derive(Clone, Copy)]
pub struct ReflectionContext<'a> {
    pub agent_id: &'a str,
    pub cycle: u64,
    pub snapshot: &'a PerceptionSnapshot,
    pub memory: &'a MemoryStore,
    pub action_space: &'a ActionSpace,
}

/// Staged result of a reflection, committed to the store at the phase boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct ReflectionOutcome {
    pub tier: Tier,
    pub reflection: String,

    /// Final goal set, already deduplicated and capped
    pub goals: Vec<Goal>,

    /// Final plan, already deduplicated and capped
    pub plans: Vec<PlanStep>,

    /// Human-readable description of every repair applied to the oracle output
    pub repairs: Vec<String>,
}

impl ReflectionOutcome {
    /// Write goals, plans and the note into the store.
    pub fn commit(&self, store: &mut MemoryStore) {
        // Already capped, so these replacements never drop anything.
        store.replace_goals(self.goals.clone());
        store.replace_plans(self.plans.clone());
        store.append_reflection(self.reflection.clone(), Some(self.tier), false);
    }
}

/// Maps `(snapshot, memory, inventory, action space)` to a note plus revised
/// goals and plans, through the decision oracle.
#[derive(Debug, Clone)]
pub struct ReflectionEngine {
    profile: TierProfile,
}

impl ReflectionEngine {
    pub fn new(profile: TierProfile) -> Self {
        Self { profile }
    }

    pub fn junior() -> Self {
        Self::new(TierProfile::junior())
    }

    pub fn senior() -> Self {
        Self::new(TierProfile::senior())
    }

    pub fn profile(&self) -> &TierProfile {
        &self.profile
    }

    /// Ask the oracle and map its answer. Oracle failures are repaired, not
    /// propagated; only the caller's timeout can stop a reflection.
    pub async fn reflect(
        &self,
        ctx: &ReflectionContext<'_>,
        oracle: &dyn DecisionOracle,
    ) -> ReflectionOutcome {
        let request = self.build_request(ctx);
        let decision = oracle.decide(&request).await;
        self.interpret(ctx, decision)
    }

    pub fn build_request(&self, ctx: &ReflectionContext<'_>) -> OracleRequest {
        let prompt = match self.profile.tier {
            Tier::Junior => "Reflect briefly on the last actions and the immediate surroundings.",
            Tier::Senior => "Review the goals and plan against everything observed and done so far.",
        };
        OracleRequest::new(
            RequestKind::Reflection {
                tier: self.profile.tier,
            },
            ctx.agent_id,
            ctx.cycle,
        )
        .with_prompt(prompt)
        .with_context(self.context_json(ctx))
    }

    fn context_json(&self, ctx: &ReflectionContext<'_>) -> Value {
        let profile = &self.profile;
        let perception = if profile.local_only {
            PerceptionSummary::render(&ctx.snapshot.local_slice())
        } else {
            PerceptionSummary::render(ctx.snapshot)
        };

        let log: Vec<String> = match profile.log_entries {
            Some(n) => ctx.memory.recent_log(n).iter().map(|e| e.summary()).collect(),
            None => ctx.memory.action_log().map(|e| e.summary()).collect(),
        };
        let reflections: Vec<&str> = {
            let all: Vec<&str> = ctx.memory.reflections().map(|r| r.text.as_str()).collect();
            let skip = profile.reflections.map_or(0, |n| all.len().saturating_sub(n));
            all[skip..].to_vec()
        };
        let inventory: Vec<String> = ctx
            .snapshot
            .inventory()
            .iter()
            .map(|(name, item)| format!("{} x{}", name, item.count))
            .collect();

        let mut context = json!({
            "tier": profile.tier,
            "cycle": ctx.cycle,
            "perception": perception.to_prompt_text(),
            "recent_actions": log,
            "reflections": reflections,
            "inventory": inventory,
            "goals": ctx.memory.goals().iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            "plans": ctx.memory.plans().iter().map(|p| p.text()).collect::<Vec<_>>(),
        });
        if !profile.local_only {
            context["navigation_points"] = json!(ctx.memory.navigation_points());
            context["action_space"] = ctx.action_space.json_schema();
        } else {
            context["actions"] = json!(ctx.action_space.iter().map(|a| &a.name).collect::<Vec<_>>());
        }
        context
    }

    /// Deterministic mapping from an oracle result to a staged outcome.
    pub fn interpret(
        &self,
        ctx: &ReflectionContext<'_>,
        decision: Result<OracleDecision>,
    ) -> ReflectionOutcome {
        let mut repairs = Vec::new();
        let value = match decision {
            Ok(OracleDecision::Structured(value)) => value,
            Ok(OracleDecision::Text(text)) => decode_json(&text).unwrap_or(Value::String(text)),
            Err(e) => {
                repairs.push(format!("oracle failed ({}); kept current state", e));
                Value::Null
            }
        };

        let mapped = map_output(&value);
        repairs.extend(mapped.repairs);

        let current_goals = ctx.memory.goals();
        let current_plans = ctx.memory.plans();
        let (goals, plans) = if self.profile.edits_goals {
            let (goals, goal_report) = merge_goals(
                current_goals,
                mapped.goals.unwrap_or_else(|| current_goals.to_vec()),
            );
            let (plans, plan_report) = normalize_plans(
                mapped.plans.unwrap_or_else(|| current_plans.to_vec()),
            );
            describe_truncation("goal", &goal_report, &mut repairs);
            describe_truncation("plan step", &plan_report, &mut repairs);
            (goals, plans)
        } else {
            if mapped.goals.is_some() || mapped.plans.is_some() {
                repairs.push(format!("{} tier may not edit goals or plans; ignored", self.profile.tier));
            }
            (current_goals.to_vec(), current_plans.to_vec())
        };

        let mut reflection = match mapped.reflection {
            Some(text) => text,
            None => {
                if !matches!(value, Value::Null) {
                    repairs.push("missing reflection; wrote summary note".to_string());
                }
                summary_note(ctx)
            }
        };
        if self.profile.annotates {
            for note in tactical_annotations(ctx) {
                reflection.push(' ');
                reflection.push_str(&note);
            }
        }

        for repair in &repairs {
            tracing::warn!(
                agent_id = %ctx.agent_id,
                cycle = ctx.cycle,
                tier = %self.profile.tier,
                repair = %repair,
                "Reflection output repaired"
            );
        }

        ReflectionOutcome {
            tier: self.profile.tier,
            reflection,
            goals,
            plans,
            repairs,
        }
    }
}

fn describe_truncation<T: std::fmt::Display>(
    what: &str,
    report: &Truncation<T>,
    repairs: &mut Vec<String>,
) {
    for dropped in &report.dropped {
        repairs.push(format!("{} cap exceeded; dropped '{}'", what, dropped));
    }
    if report.duplicates > 0 {
        repairs.push(format!("merged {} duplicate {}(s)", report.duplicates, what));
    }
    if report.blanks > 0 {
        repairs.push(format!("dropped {} blank {}(s)", report.blanks, what));
    }
}

/// Note written when the oracle gives none.
fn summary_note(ctx: &ReflectionContext<'_>) -> String {
    let position = ctx.snapshot.position().unwrap_or("an unknown place");
    let focus = ctx
        .memory
        .plans()
        .first()
        .map(|p| p.text().to_string())
        .or_else(|| ctx.memory.top_goal().map(|g| g.text.clone()))
        .unwrap_or_else(|| "nothing in particular".to_string());
    let last = ctx
        .memory
        .recent_log(1)
        .first()
        .map(|e| e.summary())
        .unwrap_or_else(|| "none".to_string());
    format!(
        "Cycle {}: at {}, focused on {}. Last action: {}.",
        ctx.cycle, position, focus, last
    )
}

/// Blocked headings, the last failed action, and tools the current step
/// needs but the inventory lacks.
pub(crate) fn tactical_annotations(ctx: &ReflectionContext<'_>) -> Vec<String> {
    let mut notes = Vec::new();

    let blocked = ctx.snapshot.blocked_headings();
    if !blocked.is_empty() {
        let names: Vec<&str> = blocked.iter().map(|h| h.as_str()).collect();
        notes.push(format!("Blocked: {}.", names.join(", ")));
    }

    if let Some(failed) = ctx.memory.last_failure() {
        notes.push(format!("Last failure: {}.", failed.summary()));
    }

    if let Some(step) = ctx.memory.plans().first() {
        for tool in required_tools(step.text()) {
            if !holds_tool(ctx.snapshot, &tool) {
                notes.push(format!("Missing {} for '{}'.", tool, step.text()));
            }
        }
    }

    notes
}

/// Items a step names with "with ..." or "using ...".
fn required_tools(step: &str) -> Vec<String> {
    const ARTICLES: &[&str] = &["a", "an", "the", "my", "some"];
    let lowered = step.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '-'))
        .filter(|w| !w.is_empty())
        .collect();

    let mut tools = Vec::new();
    let mut i = 0;
    while i < words.len() {
        if matches!(words[i], "with" | "using") {
            let mut j = i + 1;
            while j < words.len() && ARTICLES.contains(&words[j]) {
                j += 1;
            }
            let end = words[j..]
                .iter()
                .position(|w| matches!(*w, "and" | "then" | "to" | "from" | "at" | "near"))
                .map_or(words.len(), |p| j + p);
            if j < end {
                tools.push(words[j..end].join(" "));
            }
            i = end;
        } else {
            i += 1;
        }
    }
    tools
}

fn holds_tool(snapshot: &PerceptionSnapshot, tool: &str) -> bool {
    let inventory = snapshot.inventory();
    if inventory.holds(tool) {
        return true;
    }
    // "iron pickaxe" is satisfied by "pickaxe" and vice versa.
    let last = tool.rsplit(' ').next().unwrap_or(tool);
    let suffix = format!(" {}", last);
    inventory.iter().any(|(name, item)| {
        let name = name.to_lowercase();
        item.count > 0 && (name == last || name.ends_with(&suffix))
    })
}
