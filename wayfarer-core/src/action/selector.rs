//! Validation and selection of the one action emitted per cycle.

use serde::Serialize;
use serde_json::{Map, Value, json};

use super::heading::{alternate_heading, explore_heading};
use super::intent::{derive_candidate, intent_text, mentions};
use super::invocation::ActionInvocation;
use super::space::{ActionDefinition, ActionSpace, ParameterKind, PreconditionClass};
use crate::error::{Result, WayfarerError};
use crate::memory::MemoryStore;
use crate::oracle::{DecisionOracle, OracleDecision, OracleRequest, RequestKind, decode_json};
use crate::perception::{Heading, PerceptionSnapshot, PerceptionSummary};

/// Inputs to one selection.
#[derive(Clone, Copy)]
pub struct SelectionContext<'a> {
    pub agent_id: &'a str,
    pub cycle: u64,
    pub snapshot: &'a PerceptionSnapshot,
    pub memory: &'a MemoryStore,
    pub action_space: &'a ActionSpace,
}

/// Where the emitted action came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionSource {
    Oracle,
    Plan,
    Exploration,
    Fallback,
}

/// A candidate replaced by a safer action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Substitution {
    pub from: ActionInvocation,
    pub to: ActionInvocation,
    pub reason: String,
}

/// A candidate that did not survive the gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub candidate: ActionInvocation,
    pub source: SelectionSource,
    pub reason: String,
}

/// The selected action plus its trace.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub invocation: ActionInvocation,
    pub source: SelectionSource,
    pub substitutions: Vec<Substitution>,
    pub rejected: Vec<Rejection>,
}

/// Emits exactly one action per cycle, enforcing visibility, interaction
/// range and obstacle preconditions.
#[derive(Debug, Clone)]
pub struct ActionSelector {
    cooldown_threshold: usize,
}

impl Default for ActionSelector {
    fn default() -> Self {
        Self::new(1)
    }
}

struct Gated {
    invocation: ActionInvocation,
    substitutions: Vec<Substitution>,
}

type GateResult = std::result::Result<Gated, String>;

impl ActionSelector {
    /// `cooldown_threshold` failures of one action and target under an
    /// unchanged snapshot suppress that pair. Zero disables the cooldown.
    pub fn new(cooldown_threshold: usize) -> Self {
        Self { cooldown_threshold }
    }

    /// Ask the oracle for a proposal, then resolve. An oracle error leaves
    /// the plan-derived and exploration candidates.
    pub async fn select(
        &self,
        ctx: &SelectionContext<'_>,
        oracle: &dyn DecisionOracle,
    ) -> Result<Selection> {
        let request = self.build_request(ctx);
        let proposal = match oracle.decide(&request).await {
            Ok(decision) => parse_proposal(&decision),
            Err(e) => {
                tracing::warn!(
                    agent_id = %ctx.agent_id,
                    cycle = ctx.cycle,
                    error = %e,
                    "Selection oracle failed, continuing without a proposal"
                );
                None
            }
        };
        self.resolve(ctx, proposal)
    }

    pub fn build_request(&self, ctx: &SelectionContext<'_>) -> OracleRequest {
        let context = json!({
            "perception": PerceptionSummary::render(ctx.snapshot).to_prompt_text(),
            "goals": ctx.memory.goals().iter().map(|g| g.to_string()).collect::<Vec<_>>(),
            "plans": ctx.memory.plans().iter().map(|p| p.text()).collect::<Vec<_>>(),
            "latest_reflection": ctx.memory.latest_reflection().map(|r| r.text.as_str()),
            "recent_actions": ctx.memory.recent_log(5).iter().map(|e| e.summary()).collect::<Vec<_>>(),
            "navigation_points": ctx.memory.navigation_points(),
            "action_space": ctx.action_space.json_schema(),
        });
        OracleRequest::new(RequestKind::Selection, ctx.agent_id, ctx.cycle)
            .with_prompt("Choose the single next action that best continues the current plan.")
            .with_context(context)
    }

    /// Deterministic candidate ordering, gating and fallback.
    pub fn resolve(
        &self,
        ctx: &SelectionContext<'_>,
        proposal: Option<ActionInvocation>,
    ) -> Result<Selection> {
        let intent = intent_text(ctx.memory);
        let planned = intent
            .as_deref()
            .and_then(|text| derive_candidate(text, ctx.snapshot, ctx.memory, ctx.action_space));

        let continues_plan = match (&proposal, &planned, intent.as_deref()) {
            (Some(p), Some(plan), _) if p.same_intent(plan) => true,
            (Some(p), _, Some(text)) => p.target().is_some_and(|t| mentions(text, t)),
            _ => false,
        };

        let mut candidates = Vec::with_capacity(2);
        match (proposal, planned) {
            (Some(p), Some(plan)) if continues_plan => {
                candidates.push((p, SelectionSource::Oracle));
                candidates.push((plan, SelectionSource::Plan));
            }
            (Some(p), Some(plan)) => {
                candidates.push((plan, SelectionSource::Plan));
                candidates.push((p, SelectionSource::Oracle));
            }
            (Some(p), None) => candidates.push((p, SelectionSource::Oracle)),
            (None, Some(plan)) => candidates.push((plan, SelectionSource::Plan)),
            (None, None) => {}
        }

        let mut rejected = Vec::new();
        for (candidate, source) in candidates {
            match self.gate(ctx, &candidate) {
                Ok(gated) => {
                    if let Some(reason) = self.cooled_down(ctx, &gated.invocation) {
                        rejected.push(Rejection {
                            candidate,
                            source,
                            reason,
                        });
                        continue;
                    }
                    for sub in &gated.substitutions {
                        tracing::debug!(
                            agent_id = %ctx.agent_id,
                            cycle = ctx.cycle,
                            from = %sub.from,
                            to = %sub.to,
                            reason = %sub.reason,
                            "Action substituted"
                        );
                    }
                    return Ok(Selection {
                        invocation: gated.invocation,
                        source,
                        substitutions: gated.substitutions,
                        rejected,
                    });
                }
                Err(reason) => {
                    tracing::debug!(
                        agent_id = %ctx.agent_id,
                        cycle = ctx.cycle,
                        action = %candidate,
                        reason = %reason,
                        "Candidate rejected"
                    );
                    rejected.push(Rejection {
                        candidate,
                        source,
                        reason,
                    });
                }
            }
        }

        self.fallback(ctx, rejected)
    }

    fn fallback(&self, ctx: &SelectionContext<'_>, rejected: Vec<Rejection>) -> Result<Selection> {
        let space = ctx.action_space;

        if let Some(heading) = explore_heading(ctx.snapshot)
            && let Some(invocation) = space
                .first_of(PreconditionClass::MoveInDirection)
                .and_then(|def| def.invoke_with(ParameterKind::Direction, heading.as_str()))
            && self.cooled_down(ctx, &invocation).is_none()
        {
            return Ok(Selection {
                invocation,
                source: SelectionSource::Exploration,
                substitutions: Vec::new(),
                rejected,
            });
        }

        let idle = space
            .iter()
            .filter(|def| def.precondition == PreconditionClass::Unconstrained)
            .map(|def| ActionInvocation::new(&def.name))
            .find(|inv| space.get(&inv.name).is_some_and(|def| def.validate(inv).is_ok()));
        if let Some(invocation) = idle {
            return Ok(Selection {
                invocation,
                source: SelectionSource::Fallback,
                substitutions: Vec::new(),
                rejected,
            });
        }

        let reasons: Vec<String> = rejected
            .iter()
            .map(|r| format!("{}: {}", r.candidate, r.reason))
            .collect();
        Err(WayfarerError::NoViableAction(if reasons.is_empty() {
            "no candidate, no open heading and no unconstrained action".to_string()
        } else {
            reasons.join("; ")
        }))
    }

    fn cooled_down(&self, ctx: &SelectionContext<'_>, invocation: &ActionInvocation) -> Option<String> {
        if self.cooldown_threshold == 0 {
            return None;
        }
        let failures = ctx.memory.failure_streak(
            &invocation.name,
            invocation.target(),
            ctx.snapshot.fingerprint(),
        );
        (failures >= self.cooldown_threshold).then(|| {
            format!(
                "failed {} time(s) under unchanged conditions",
                failures
            )
        })
    }

    fn gate(&self, ctx: &SelectionContext<'_>, candidate: &ActionInvocation) -> GateResult {
        let def = ctx
            .action_space
            .get(&candidate.name)
            .ok_or_else(|| format!("'{}' is not in the action space", candidate.name))?;
        let invocation = ActionInvocation {
            name: def.name.clone(),
            arguments: candidate.arguments.clone(),
        };

        match def.precondition {
            PreconditionClass::Talk | PreconditionClass::Collect => {
                self.gate_interaction(ctx, def, invocation)
            }
            PreconditionClass::MoveToTarget => self.gate_move_to_target(ctx, def, invocation),
            PreconditionClass::MoveInDirection => {
                let param = required_param(def, ParameterKind::Direction)?;
                let raw = invocation
                    .argument_str(&param.name)
                    .ok_or_else(|| format!("'{}' has no direction", def.name))?;
                let heading = Heading::parse(raw)
                    .ok_or_else(|| format!("'{}' is not a heading", raw))?;
                let invocation = with_arg(invocation, &param.name, heading.as_str());
                self.gate_heading(ctx, def, invocation, heading, Vec::new())
            }
            PreconditionClass::Navigate => {
                let param = required_param(def, ParameterKind::Point)?;
                let name = invocation
                    .argument_str(&param.name)
                    .ok_or_else(|| format!("'{}' has no navigation point", def.name))?;
                let point = ctx
                    .memory
                    .navigation_point(name)
                    .ok_or_else(|| format!("'{}' is not a known navigation point", name))?;
                let heading = point.heading;
                let invocation = with_arg(invocation, &param.name, point.name.as_str());
                match heading {
                    Some(h) => self.gate_heading(ctx, def, invocation, h, Vec::new()),
                    None => validated(def, invocation, Vec::new()),
                }
            }
            PreconditionClass::Unconstrained => validated(def, invocation, Vec::new()),
        }
    }

    fn gate_interaction(
        &self,
        ctx: &SelectionContext<'_>,
        def: &ActionDefinition,
        invocation: ActionInvocation,
    ) -> GateResult {
        let param = required_param(def, ParameterKind::Target)?;
        let target = invocation
            .argument_str(&param.name)
            .or_else(|| invocation.target())
            .ok_or_else(|| format!("'{}' has no target", def.name))?;
        let observed = ctx
            .snapshot
            .locate(target)
            .ok_or_else(|| format!("target '{}' is not observable", target))?;
        let invocation = with_arg(invocation, &param.name, observed.name);

        if observed.bearing.distance.is_interaction_range() {
            return validated(def, invocation, Vec::new());
        }

        let mover = ctx
            .action_space
            .first_of(PreconditionClass::MoveToTarget)
            .ok_or_else(|| {
                format!(
                    "'{}' is {} away and no movement action exists",
                    observed.name, observed.bearing.distance
                )
            })?;
        let approach = mover
            .invoke_with(ParameterKind::Target, observed.name)
            .ok_or_else(|| format!("'{}' takes no target", mover.name))?;
        let substitution = Substitution {
            from: invocation,
            to: approach.clone(),
            reason: format!(
                "'{}' is {}, outside interaction range",
                observed.name, observed.bearing.distance
            ),
        };
        let mut gated = self.gate_move_to_target(ctx, mover, approach)?;
        gated.substitutions.insert(0, substitution);
        Ok(gated)
    }

    fn gate_move_to_target(
        &self,
        ctx: &SelectionContext<'_>,
        def: &ActionDefinition,
        invocation: ActionInvocation,
    ) -> GateResult {
        let param = required_param(def, ParameterKind::Target)?;
        let target = invocation
            .argument_str(&param.name)
            .or_else(|| invocation.target())
            .ok_or_else(|| format!("'{}' has no target", def.name))?;
        let observed = ctx
            .snapshot
            .locate(target)
            .ok_or_else(|| format!("destination '{}' is not observable", target))?;
        let invocation = with_arg(invocation, &param.name, observed.name);

        match observed.bearing.direction {
            Some(heading) => self.gate_heading(ctx, def, invocation, heading, Vec::new()),
            None => validated(def, invocation, Vec::new()),
        }
    }

    /// Pass `invocation` if `heading` is open, otherwise detour along the
    /// nearest open heading.
    fn gate_heading(
        &self,
        ctx: &SelectionContext<'_>,
        def: &ActionDefinition,
        invocation: ActionInvocation,
        heading: Heading,
        mut substitutions: Vec<Substitution>,
    ) -> GateResult {
        if !ctx.snapshot.signal(heading).is_intense() {
            return validated(def, invocation, substitutions);
        }

        let alternate = alternate_heading(ctx.snapshot, heading)
            .ok_or_else(|| format!("{} is blocked and no heading is open", heading))?;
        let walker = ctx
            .action_space
            .first_of(PreconditionClass::MoveInDirection)
            .ok_or_else(|| format!("{} is blocked and no directional movement exists", heading))?;
        let detour = walker
            .invoke_with(ParameterKind::Direction, alternate.as_str())
            .ok_or_else(|| format!("'{}' takes no direction", walker.name))?;

        substitutions.push(Substitution {
            from: invocation,
            to: detour.clone(),
            reason: format!("{} reads intense; detouring {}", heading, alternate),
        });
        validated(walker, detour, substitutions)
    }
}

fn required_param(
    def: &ActionDefinition,
    kind: ParameterKind,
) -> std::result::Result<&super::space::ParameterSpec, String> {
    def.parameter_of(kind)
        .ok_or_else(|| format!("'{}' declares no {:?} parameter", def.name, kind))
}

fn with_arg(mut invocation: ActionInvocation, key: &str, value: &str) -> ActionInvocation {
    invocation
        .arguments
        .insert(key.to_string(), Value::String(value.to_string()));
    invocation
}

fn validated(
    def: &ActionDefinition,
    invocation: ActionInvocation,
    substitutions: Vec<Substitution>,
) -> GateResult {
    def.validate(&invocation).map_err(|e| e.to_string())?;
    Ok(Gated {
        invocation,
        substitutions,
    })
}

/// Map a duck-typed oracle answer onto an invocation.
///
/// Accepts `{action|name, arguments|args|parameters}`, extra top-level
/// string fields as arguments, a list of such objects (first wins), or text
/// containing any of these.
pub(crate) fn parse_proposal(decision: &OracleDecision) -> Option<ActionInvocation> {
    let value = match decision {
        OracleDecision::Structured(v) => v.clone(),
        OracleDecision::Text(t) => decode_json(t).ok()?,
    };
    let object = match value {
        Value::Array(items) => items.into_iter().find(Value::is_object)?,
        other => other,
    };
    let Value::Object(map) = object else {
        return None;
    };

    let (name_key, name) = ["action", "name", "tool"].iter().find_map(|k| {
        map.get(*k)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| (*k, n.to_string()))
    })?;

    let mut arguments: Map<String, Value> = ["arguments", "args", "parameters"]
        .iter()
        .find_map(|k| map.get(*k).and_then(Value::as_object))
        .cloned()
        .unwrap_or_default();
    for (key, value) in &map {
        if key == name_key || matches!(key.as_str(), "arguments" | "args" | "parameters") {
            continue;
        }
        if value.is_string() || value.is_number() {
            arguments.entry(key.clone()).or_insert_with(|| value.clone());
        }
    }

    Some(ActionInvocation { name, arguments })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{ActionLogEntry, Goal, NavigationPoint, Outcome, PlanStep, Priority};
    use crate::oracle::{ScriptedOracle, ScriptedResponse};
    use crate::perception::{
        PerceptionIngestor, RawCharacter, RawDisplacement, RawObstacleReading, RawPlacement,
        RawSensorBundle, RawSignal,
    };

    fn quinn_at(direction: &str, distance: f64) -> RawCharacter {
        RawCharacter {
            name: Some("Quinn".to_string()),
            placement: RawPlacement {
                direction: Some(direction.to_string()),
                distance: Some(distance),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn intense(heading: &str) -> RawObstacleReading {
        RawObstacleReading {
            heading: heading.to_string(),
            signal: Some(RawSignal::Strength(0.9)),
        }
    }

    fn memory_reaching_quinn() -> MemoryStore {
        let mut memory = MemoryStore::default();
        memory.replace_goals(vec![Goal::new("Reach Quinn", Priority::High)]);
        memory
    }

    fn select_with(
        raw: &RawSensorBundle,
        memory: &MemoryStore,
        proposal: Option<ActionInvocation>,
    ) -> Result<Selection> {
        let snapshot = PerceptionIngestor::default().ingest(1, raw);
        let space = ActionSpace::standard();
        let ctx = SelectionContext {
            agent_id: "agent-1",
            cycle: 1,
            snapshot: &snapshot,
            memory,
            action_space: &space,
        };
        ActionSelector::default().resolve(&ctx, proposal)
    }

    #[test]
    fn test_far_target_substitutes_approach() {
        let raw = RawSensorBundle {
            characters: vec![quinn_at("east", 60.0)],
            ..Default::default()
        };
        let proposal = ActionInvocation::new("talk_to").with_argument("target", "quinn");

        let selection = select_with(&raw, &memory_reaching_quinn(), Some(proposal)).unwrap();

        assert_eq!(selection.invocation.name, "move_to_target");
        assert_eq!(selection.invocation.target(), Some("Quinn"));
        assert_eq!(selection.source, SelectionSource::Oracle);
        assert_eq!(selection.substitutions.len(), 1);
        assert_eq!(selection.substitutions[0].from.name, "talk_to");
    }

    #[test]
    fn test_near_target_allows_interaction() {
        let raw = RawSensorBundle {
            characters: vec![quinn_at("east", 3.0)],
            ..Default::default()
        };
        let proposal = ActionInvocation::new("talk_to")
            .with_argument("target", "Quinn")
            .with_argument("content", "Hello there");

        let selection = select_with(&raw, &memory_reaching_quinn(), Some(proposal)).unwrap();

        assert_eq!(selection.invocation.name, "talk_to");
        assert_eq!(selection.invocation.target(), Some("Quinn"));
        assert!(selection.substitutions.is_empty());
    }

    #[test]
    fn test_intense_heading_detours() {
        let raw = RawSensorBundle {
            obstacles: vec![intense("north")],
            characters: vec![quinn_at("north", 40.0)],
            displacement: vec![RawDisplacement {
                heading: Some("north".to_string()),
                distance: Some(3.0),
            }],
            ..Default::default()
        };

        let selection = select_with(&raw, &memory_reaching_quinn(), None).unwrap();

        assert_eq!(selection.invocation.name, "move_in_direction");
        let heading = selection.invocation.heading().unwrap();
        assert_ne!(heading, Heading::North);
        assert_ne!(heading, Heading::South);
        assert_eq!(selection.source, SelectionSource::Plan);
    }

    #[test]
    fn test_unobservable_target_is_rejected() {
        let raw = RawSensorBundle::default();
        let proposal = ActionInvocation::new("talk_to").with_argument("target", "Ghost");

        let selection = select_with(&raw, &MemoryStore::default(), Some(proposal)).unwrap();

        assert_eq!(selection.rejected.len(), 1);
        assert!(selection.rejected[0].reason.contains("not observable"));
        assert_ne!(selection.invocation.name, "talk_to");
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        let raw = RawSensorBundle::default();
        let proposal = ActionInvocation::new("teleport");

        let selection = select_with(&raw, &MemoryStore::default(), Some(proposal)).unwrap();

        assert!(selection.rejected[0].reason.contains("not in the action space"));
        assert_eq!(selection.source, SelectionSource::Exploration);
    }

    #[test]
    fn test_proposal_inconsistent_with_plan_goes_second() {
        let raw = RawSensorBundle {
            characters: vec![
                quinn_at("east", 60.0),
                RawCharacter {
                    name: Some("Mara".to_string()),
                    placement: RawPlacement {
                        direction: Some("west".to_string()),
                        distance: Some(4.0),
                        ..Default::default()
                    },
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let proposal = ActionInvocation::new("talk_to").with_argument("target", "Mara");

        let selection = select_with(&raw, &memory_reaching_quinn(), Some(proposal)).unwrap();

        assert_eq!(selection.source, SelectionSource::Plan);
        assert_eq!(selection.invocation.target(), Some("Quinn"));
    }

    #[test]
    fn test_navigation_requires_known_point() {
        let raw = RawSensorBundle::default();
        let mut memory = MemoryStore::default();
        memory.replace_plans(vec![PlanStep::new("Navigate to the Old Mill")]);

        let proposal = ActionInvocation::new("navigate_to").with_argument("point", "Old Mill");
        let selection = select_with(&raw, &memory, Some(proposal.clone())).unwrap();
        assert!(selection.rejected.iter().any(|r| r.reason.contains("navigation point")));

        memory.add_navigation_point(NavigationPoint::new("Old Mill").with_heading(Heading::West));
        let selection = select_with(&raw, &memory, Some(proposal)).unwrap();
        assert_eq!(selection.invocation.name, "navigate_to");
        assert_eq!(selection.invocation.argument_str("point"), Some("Old Mill"));
    }

    #[test]
    fn test_repeated_failure_cools_down() {
        let raw = RawSensorBundle {
            characters: vec![quinn_at("east", 3.0)],
            ..Default::default()
        };
        let snapshot = PerceptionIngestor::default().ingest(1, &raw);
        let mut memory = memory_reaching_quinn();
        let mut args = Map::new();
        args.insert("target".to_string(), json!("Quinn"));
        memory.append_log(ActionLogEntry::new(
            1,
            "move_to_target",
            args,
            Outcome::Failure,
            None,
            snapshot.fingerprint(),
        ));

        let selection = select_with(&raw, &memory, None).unwrap();

        assert_ne!(selection.invocation.name, "move_to_target");
        assert!(selection.rejected[0].reason.contains("unchanged conditions"));
    }

    #[test]
    fn test_nothing_viable_errors() {
        let raw = RawSensorBundle {
            obstacles: ["n", "ne", "e", "se", "s", "sw", "w", "nw"]
                .into_iter()
                .map(intense)
                .collect(),
            ..Default::default()
        };
        let snapshot = PerceptionIngestor::default().ingest(1, &raw);
        let memory = MemoryStore::default();
        let space = ActionSpace::new(
            ActionSpace::standard()
                .iter()
                .filter(|a| a.precondition != PreconditionClass::Unconstrained)
                .cloned()
                .collect(),
        );
        let ctx = SelectionContext {
            agent_id: "agent-1",
            cycle: 1,
            snapshot: &snapshot,
            memory: &memory,
            action_space: &space,
        };

        let err = ActionSelector::default().resolve(&ctx, None).unwrap_err();
        assert!(matches!(err, WayfarerError::NoViableAction(_)));
    }

    #[test]
    fn test_parse_proposal_shapes() {
        let nested = OracleDecision::Structured(json!({
            "action": "talk_to",
            "arguments": {"target": "Quinn"}
        }));
        assert_eq!(
            parse_proposal(&nested).unwrap().target(),
            Some("Quinn")
        );

        let flat = OracleDecision::Text(
            "```json\n[{\"name\": \"collect\", \"target\": \"Berries\"}]\n```".to_string(),
        );
        let parsed = parse_proposal(&flat).unwrap();
        assert_eq!(parsed.name, "collect");
        assert_eq!(parsed.target(), Some("Berries"));

        assert!(parse_proposal(&OracleDecision::Text("no idea".to_string())).is_none());
    }

    #[test]
    fn test_parse_proposal_keeps_name_as_target() {
        let decision = OracleDecision::Structured(json!({"action": "talk_to", "name": "Quinn"}));
        let parsed = parse_proposal(&decision).unwrap();
        assert_eq!(parsed.name, "talk_to");
        assert_eq!(parsed.target(), Some("Quinn"));

        let raw = RawSensorBundle {
            characters: vec![quinn_at("east", 3.0)],
            ..Default::default()
        };
        let selection = select_with(&raw, &memory_reaching_quinn(), Some(parsed)).unwrap();
        assert_eq!(selection.invocation.name, "talk_to");
        assert_eq!(selection.invocation.argument_str("target"), Some("Quinn"));
        assert_eq!(selection.source, SelectionSource::Oracle);
    }

    #[test]
    fn test_plan_step_heading_into_obstacle_detours() {
        let raw = RawSensorBundle {
            obstacles: vec![intense("north")],
            displacement: vec![RawDisplacement {
                heading: Some("north".to_string()),
                distance: Some(3.0),
            }],
            ..Default::default()
        };
        let mut memory = MemoryStore::default();
        memory.replace_plans(vec![PlanStep::new("Move north")]);

        let selection = select_with(&raw, &memory, None).unwrap();

        assert_eq!(selection.source, SelectionSource::Plan);
        assert_eq!(selection.invocation.name, "move_in_direction");
        let heading = selection.invocation.heading().unwrap();
        assert_ne!(heading, Heading::North);
        assert_ne!(heading, Heading::South);
        assert_eq!(selection.substitutions.len(), 1);
        assert_eq!(selection.substitutions[0].from.heading(), Some(Heading::North));
    }

    #[tokio::test]
    async fn test_select_survives_oracle_failure() {
        let raw = RawSensorBundle {
            characters: vec![quinn_at("east", 60.0)],
            ..Default::default()
        };
        let snapshot = PerceptionIngestor::default().ingest(1, &raw);
        let memory = memory_reaching_quinn();
        let space = ActionSpace::standard();
        let ctx = SelectionContext {
            agent_id: "agent-1",
            cycle: 1,
            snapshot: &snapshot,
            memory: &memory,
            action_space: &space,
        };

        let selection = ActionSelector::default()
            .select(&ctx, &ScriptedOracle::new())
            .await
            .unwrap();
        assert_eq!(selection.source, SelectionSource::Plan);
        assert_eq!(selection.invocation.name, "move_to_target");

        let oracle = ScriptedOracle::new().fixed(
            "selection",
            ScriptedResponse::value(json!({"action": "move_to_target", "arguments": {"target": "Quinn"}})),
        );
        let selection = ActionSelector::default().select(&ctx, &oracle).await.unwrap();
        assert_eq!(selection.source, SelectionSource::Oracle);
    }
}
