use super::*;
use crate::action::ActuatorReport;
use crate::config::{CycleConfig, WayfarerConfig};
use crate::memory::{Goal, Outcome, Priority};
use crate::oracle::{ScriptedOracle, ScriptedResponse};
use crate::perception::{
    RawCharacter, RawNavigationPoint, RawPlacement, RawSensorBundle,
};
use crate::reflection::Tier;
use serde_json::json;
use std::time::Duration;

fn world_with_quinn(distance: f64) -> ScriptedEnvironment {
    ScriptedEnvironment::new(vec![RawSensorBundle {
        position: Some("Crossroads".to_string()),
        characters: vec![RawCharacter {
            name: Some("Quinn".to_string()),
            placement: RawPlacement {
                direction: Some("east".to_string()),
                distance: Some(distance),
                ..Default::default()
            },
            ..Default::default()
        }],
        ..Default::default()
    }])
}

fn oracle() -> ScriptedOracle {
    ScriptedOracle::new()
        .fixed("reflection", ScriptedResponse::value(json!({"reflection": "Looking for Quinn."})))
        .fixed(
            "selection",
            ScriptedResponse::value(json!({"action": "talk_to", "arguments": {"target": "Quinn"}})),
        )
}

fn agent_with(cycle: CycleConfig) -> AgentContext {
    let config = WayfarerConfig {
        cycle,
        ..Default::default()
    };
    let mut agent = AgentContext::builder()
        .id("wayfarer-1")
        .config(config)
        .build()
        .unwrap();
    agent
        .memory_mut()
        .replace_goals(vec![Goal::new("Reach Quinn", Priority::High)]);
    agent
}

fn short_timeouts() -> CycleConfig {
    CycleConfig {
        reflection_timeout: Duration::from_millis(50),
        selection_timeout: Duration::from_millis(50),
        actuator_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_cycle_approaches_far_target() {
    let mut agent = agent_with(CycleConfig::default());
    let actuator = ScriptedActuator::new();

    let report = agent
        .run_cycle(&world_with_quinn(60.0), &actuator, &oracle())
        .await;

    assert!(report.is_completed());
    assert_eq!(report.tier, Tier::Senior);
    let action = report.action.unwrap();
    assert_eq!(action.name, "move_to_target");
    assert_eq!(action.target(), Some("Quinn"));
    assert_eq!(report.outcome, Some(Outcome::Success));
    assert_eq!(agent.memory().log_len(), 1);
    assert_eq!(agent.memory().latest_reflection().unwrap().text, "Looking for Quinn.");
    assert_eq!(actuator.executed().await.len(), 1);
}

#[tokio::test]
async fn test_cycle_talks_to_near_target() {
    let mut agent = agent_with(CycleConfig::default());

    let report = agent
        .run_cycle(&world_with_quinn(3.0), &ScriptedActuator::new(), &oracle())
        .await;

    assert_eq!(report.action.unwrap().name, "talk_to");
    assert!(report.substitutions.is_empty());
}

#[tokio::test]
async fn test_reflection_timeout_aborts_with_deferred_marker() {
    let mut agent = agent_with(short_timeouts());
    let slow = oracle().with_delay(Duration::from_millis(500));
    let actuator = ScriptedActuator::new();

    let report = agent.run_cycle(&world_with_quinn(60.0), &actuator, &slow).await;

    assert!(matches!(
        report.status,
        CycleStatus::Aborted { phase: Phase::Reflect, .. }
    ));
    let marker = agent.memory().latest_reflection().unwrap();
    assert!(marker.deferred);
    assert_eq!(marker.text, "cycle 1 skipped: reflect timed out");
    assert_eq!(agent.memory().log_len(), 0);
    assert_eq!(agent.memory().goals().len(), 1);
    assert_eq!(actuator.call_count(), 0);
}

#[tokio::test]
async fn test_actuator_timeout_keeps_committed_reflection() {
    let mut agent = agent_with(short_timeouts());
    let actuator = ScriptedActuator::new().with_delay(Duration::from_millis(500));

    let report = agent
        .run_cycle(&world_with_quinn(60.0), &actuator, &oracle())
        .await;

    assert!(matches!(
        report.status,
        CycleStatus::Aborted { phase: Phase::Execute, .. }
    ));
    let reflections: Vec<_> = agent.memory().reflections().collect();
    assert_eq!(reflections.len(), 2);
    assert_eq!(reflections[0].text, "Looking for Quinn.");
    assert!(reflections[1].deferred);
    assert_eq!(agent.memory().log_len(), 0);
}

#[tokio::test]
async fn test_failed_action_is_not_repeated_under_same_conditions() {
    let mut agent = agent_with(CycleConfig::default());
    let actuator = ScriptedActuator::new()
        .report("talk_to", ActuatorReport::with_status("failed").message("Quinn ignored you"));
    let world = world_with_quinn(3.0);
    let oracle = oracle();

    let first = agent.run_cycle(&world, &actuator, &oracle).await;
    let second = agent.run_cycle(&world, &actuator, &oracle).await;

    assert_eq!(first.action.unwrap().name, "talk_to");
    assert_eq!(first.outcome, Some(Outcome::Failure));
    assert_ne!(second.action.unwrap().name, "talk_to");
}

#[tokio::test]
async fn test_sense_failure_aborts() {
    let mut agent = agent_with(CycleConfig::default());
    let empty = ScriptedEnvironment::new(Vec::new());

    let report = agent
        .run_cycle(&empty, &ScriptedActuator::new(), &oracle())
        .await;

    assert!(matches!(
        report.status,
        CycleStatus::Aborted { phase: Phase::Sense, .. }
    ));
    assert_eq!(agent.memory().reflections().count(), 0);
}

#[tokio::test]
async fn test_navigation_points_are_absorbed() {
    let mut agent = agent_with(CycleConfig::default());
    let world = ScriptedEnvironment::new(vec![RawSensorBundle {
        navigation_points: vec![RawNavigationPoint {
            name: "Old Mill".to_string(),
            direction: Some("west".to_string()),
            distance: Some(50.0),
            note: Some("grain".to_string()),
        }],
        ..Default::default()
    }]);

    agent.run_cycle(&world, &ScriptedActuator::new(), &oracle()).await;

    let point = agent.memory().navigation_point("old mill").unwrap();
    assert_eq!(point.heading, Some(crate::perception::Heading::West));
    assert_eq!(point.distance, crate::perception::DistanceBand::Far);
}

#[tokio::test]
async fn test_reflection_timeout_leaves_sensor_state_uncommitted() {
    let mut agent = agent_with(short_timeouts());
    let world = ScriptedEnvironment::new(vec![RawSensorBundle {
        navigation_points: vec![RawNavigationPoint {
            name: "Old Mill".to_string(),
            direction: Some("west".to_string()),
            distance: Some(50.0),
            note: None,
        }],
        action_space: crate::action::ActionSpace::new(vec![crate::action::ActionDefinition::new(
            "wait",
            crate::action::PreconditionClass::Unconstrained,
        )]),
        ..Default::default()
    }]);
    let slow = oracle().with_delay(Duration::from_millis(500));

    let report = agent.run_cycle(&world, &ScriptedActuator::new(), &slow).await;

    assert!(matches!(
        report.status,
        CycleStatus::Aborted { phase: Phase::Reflect, .. }
    ));
    assert!(agent.memory().navigation_points().is_empty());
    assert_eq!(agent.action_space().len(), crate::action::ActionSpace::standard().len());

    agent.run_cycle(&world, &ScriptedActuator::new(), &oracle()).await;
    assert!(agent.memory().navigation_point("old mill").is_some());
    assert_eq!(agent.action_space().len(), 1);
}

#[tokio::test]
async fn test_tier_cadence() {
    let mut agent = agent_with(CycleConfig {
        senior_every: 2,
        ..Default::default()
    });

    let reports = agent
        .run_cycles(3, &world_with_quinn(60.0), &ScriptedActuator::new(), &oracle())
        .await;

    let tiers: Vec<Tier> = reports.iter().map(|r| r.tier).collect();
    assert_eq!(tiers, vec![Tier::Senior, Tier::Junior, Tier::Senior]);
    assert_eq!(agent.cycle(), 3);
}

#[tokio::test]
async fn test_narrative_strips_markup_and_falls_back() {
    let agent = agent_with(CycleConfig::default());

    let oracle = ScriptedOracle::new()
        .fixed("narrative", ScriptedResponse::text("## Me\n- I am **looking** for Quinn."));
    assert_eq!(
        agent.narrative(&oracle, None).await,
        "Me I am looking for Quinn."
    );

    let text = agent.narrative(&ScriptedOracle::new(), None).await;
    assert!(text.contains("My main goal is to reach Quinn."));
}
