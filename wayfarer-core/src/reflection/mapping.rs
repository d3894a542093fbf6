//! Duck-typed oracle output to typed goals, plans and note.
//!
//! Nothing here rejects. Every deviation is repaired and described in the
//! returned repair list.

use serde_json::Value;

use crate::memory::{Goal, PlanStep, Priority};

const GOAL_TEXT_KEYS: &[&str] = &["text", "goal", "description"];
const PLAN_TEXT_KEYS: &[&str] = &["step", "text", "description", "action"];

/// Mapped oracle output before caps are applied.
#[derive(Debug, Default)]
pub(crate) struct MappedOutput {
    pub reflection: Option<String>,
    /// `None` keeps the current goals
    pub goals: Option<Vec<Goal>>,
    /// `None` keeps the current plan
    pub plans: Option<Vec<PlanStep>>,
    pub repairs: Vec<String>,
}

pub(crate) fn map_output(value: &Value) -> MappedOutput {
    let mut out = MappedOutput::default();

    let object = match value {
        Value::Object(map) => map,
        Value::String(text) => {
            out.reflection = non_blank(text);
            out.repairs.push("output was plain text; used as reflection".to_string());
            return out;
        }
        other => {
            out.repairs
                .push(format!("output was {}, expected an object", type_name(other)));
            return out;
        }
    };

    match object.get("reflection") {
        Some(Value::String(text)) => out.reflection = non_blank(text),
        Some(Value::Null) | None => {}
        Some(other) => {
            out.repairs
                .push(format!("reflection was {}, expected a string", type_name(other)));
        }
    }

    out.goals = match object.get("goals") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| map_goal(i, item, &mut out.repairs))
                .collect(),
        ),
        Some(other) => {
            out.repairs.push(format!(
                "goals was {}, expected an array; kept current goals",
                type_name(other)
            ));
            None
        }
    };

    out.plans = match object.get("plans") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| map_plan(i, item, &mut out.repairs))
                .collect(),
        ),
        Some(Value::String(single)) => {
            out.repairs.push("plans was a single string; wrapped".to_string());
            non_blank(single).map(|s| vec![PlanStep::new(s)])
        }
        Some(other) => {
            out.repairs.push(format!(
                "plans was {}, expected an array; kept current plan",
                type_name(other)
            ));
            None
        }
    };

    out
}

fn map_goal(index: usize, item: &Value, repairs: &mut Vec<String>) -> Option<Goal> {
    match item {
        Value::String(raw) => {
            let goal = Goal::parse(raw);
            if goal.is_none() {
                repairs.push(format!("goal #{} was blank; dropped", index));
            }
            goal
        }
        Value::Object(map) => {
            let Some(text) = first_string(map, GOAL_TEXT_KEYS) else {
                repairs.push(format!("goal #{} had no text; dropped", index));
                return None;
            };
            let priority = match map.get("priority") {
                Some(Value::String(label)) => Priority::parse(label).unwrap_or_else(|| {
                    repairs.push(format!(
                        "goal '{}' had unknown priority '{}'; using medium",
                        text, label
                    ));
                    Priority::Medium
                }),
                Some(Value::Number(n)) => priority_from_rank(n.as_i64().unwrap_or(2)),
                _ => Priority::Medium,
            };
            Some(Goal::new(text, priority))
        }
        other => {
            repairs.push(format!("goal #{} was {}; dropped", index, type_name(other)));
            None
        }
    }
}

fn map_plan(index: usize, item: &Value, repairs: &mut Vec<String>) -> Option<PlanStep> {
    let text = match item {
        Value::String(raw) => non_blank(raw),
        Value::Object(map) => first_string(map, PLAN_TEXT_KEYS),
        other => {
            repairs.push(format!("plan step #{} was {}; dropped", index, type_name(other)));
            return None;
        }
    };
    if text.is_none() {
        repairs.push(format!("plan step #{} was blank; dropped", index));
    }
    text.map(PlanStep::new)
}

/// 1 is most urgent.
fn priority_from_rank(rank: i64) -> Priority {
    match rank {
        i64::MIN..=1 => Priority::High,
        2 => Priority::Medium,
        _ => Priority::Low,
    }
}

fn first_string(map: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| map.get(*k).and_then(Value::as_str))
        .and_then(non_blank)
}

fn non_blank(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mixed_goal_shapes() {
        let out = map_output(&json!({
            "reflection": "  Quinn is east  ",
            "goals": [
                "[high] Reach Quinn",
                {"text": "Gather wood", "priority": "LOW"},
                {"goal": "Find shelter", "priority": "someday"},
                {"priority": "high"},
                42,
                "   "
            ]
        }));

        assert_eq!(out.reflection.as_deref(), Some("Quinn is east"));
        let goals = out.goals.unwrap();
        assert_eq!(
            goals,
            vec![
                Goal::new("Reach Quinn", Priority::High),
                Goal::new("Gather wood", Priority::Low),
                Goal::new("Find shelter", Priority::Medium),
            ]
        );
        assert_eq!(out.repairs.len(), 4);
        assert!(out.plans.is_none());
    }

    #[test]
    fn test_plan_shapes() {
        let out = map_output(&json!({
            "plans": ["go east", {"step": "talk to Quinn"}, {"text": "rest"}, {"other": 1}, null]
        }));
        let plans: Vec<_> = out.plans.unwrap().iter().map(|p| p.text().to_string()).collect();
        assert_eq!(plans, vec!["go east", "talk to Quinn", "rest"]);
        assert_eq!(out.repairs.len(), 2);
        assert!(out.goals.is_none());
        assert!(out.reflection.is_none());
    }

    #[test]
    fn test_wrong_container_types_keep_state() {
        let out = map_output(&json!({"goals": "eat", "plans": 3}));
        assert!(out.goals.is_none());
        assert!(out.plans.is_none());
        assert_eq!(out.repairs.len(), 2);

        let out = map_output(&json!({"plans": "cross the bridge"}));
        assert_eq!(out.plans.unwrap()[0].text(), "cross the bridge");
    }

    #[test]
    fn test_plain_text_output() {
        let out = map_output(&json!("All clear ahead."));
        assert_eq!(out.reflection.as_deref(), Some("All clear ahead."));
        assert!(out.goals.is_none());
    }

    #[test]
    fn test_numeric_priority() {
        let out = map_output(&json!({"goals": [{"text": "a", "priority": 1}, {"text": "b", "priority": 3}]}));
        let goals = out.goals.unwrap();
        assert_eq!(goals[0].priority, Priority::High);
        assert_eq!(goals[1].priority, Priority::Low);
    }
}
