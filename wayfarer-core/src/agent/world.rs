//! The two collaborators an agent talks to besides the oracle.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use crate::action::{ActionInvocation, ActuatorReport};
use crate::error::{Result, WayfarerError};
use crate::perception::RawSensorBundle;

/// Source of raw sensor data, one bundle per cycle.
#[async_trait]
pub trait Environment: Send + Sync {
    async fn sense(&self) -> Result<RawSensorBundle>;
}

/// Executes the selected action in the world.
#[async_trait]
pub trait Actuator: Send + Sync {
    async fn execute(&self, invocation: &ActionInvocation) -> Result<ActuatorReport>;
}

/// Replays sensor frames in order; the last frame repeats once the queue runs dry.
pub struct ScriptedEnvironment {
    frames: Mutex<VecDeque<RawSensorBundle>>,
    last: Mutex<Option<RawSensorBundle>>,
}

impl ScriptedEnvironment {
    pub fn new(frames: impl IntoIterator<Item = RawSensorBundle>) -> Self {
        Self {
            frames: Mutex::new(frames.into_iter().collect()),
            last: Mutex::new(None),
        }
    }
}

#[async_trait]
impl Environment for ScriptedEnvironment {
    async fn sense(&self) -> Result<RawSensorBundle> {
        let next = self.frames.lock().await.pop_front();
        let mut last = self.last.lock().await;
        if let Some(frame) = next {
            *last = Some(frame.clone());
            return Ok(frame);
        }
        last.clone()
            .ok_or_else(|| WayfarerError::Environment("no sensor frames scripted".to_string()))
    }
}

/// Actuator behaviour keyed by action name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorScript {
    /// Report per action name
    pub reports: HashMap<String, ActuatorReport>,

    /// Report for actions without an entry
    pub fallback: ActuatorReport,

    /// Simulated latency per call
    pub delay_ms: u64,
}

/// Deterministic actuator double.
pub struct ScriptedActuator {
    script: ActuatorScript,
    executed: Mutex<Vec<ActionInvocation>>,
    call_count: AtomicUsize,
}

impl ScriptedActuator {
    pub fn new() -> Self {
        Self::from_script(ActuatorScript {
            fallback: ActuatorReport::with_status("success"),
            ..Default::default()
        })
    }

    pub fn from_script(script: ActuatorScript) -> Self {
        Self {
            script,
            executed: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    pub fn report(mut self, action: impl Into<String>, report: ActuatorReport) -> Self {
        self.script.reports.insert(action.into(), report);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.script.delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    pub async fn executed(&self) -> Vec<ActionInvocation> {
        self.executed.lock().await.clone()
    }
}

impl Default for ScriptedActuator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Actuator for ScriptedActuator {
    async fn execute(&self, invocation: &ActionInvocation) -> Result<ActuatorReport> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        if self.script.delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.script.delay_ms)).await;
        }
        self.executed.lock().await.push(invocation.clone());
        Ok(self
            .script
            .reports
            .get(&invocation.name)
            .cloned()
            .unwrap_or_else(|| self.script.fallback.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_environment_repeats_last_frame() {
        let env = ScriptedEnvironment::new(vec![
            RawSensorBundle {
                position: Some("Gate".to_string()),
                ..Default::default()
            },
            RawSensorBundle {
                position: Some("Bridge".to_string()),
                ..Default::default()
            },
        ]);

        assert_eq!(env.sense().await.unwrap().position.as_deref(), Some("Gate"));
        assert_eq!(env.sense().await.unwrap().position.as_deref(), Some("Bridge"));
        assert_eq!(env.sense().await.unwrap().position.as_deref(), Some("Bridge"));
    }

    #[tokio::test]
    async fn test_empty_environment_errors() {
        let env = ScriptedEnvironment::new(Vec::new());
        assert!(matches!(env.sense().await, Err(WayfarerError::Environment(_))));
    }

    #[tokio::test]
    async fn test_actuator_reports_by_action() {
        let actuator = ScriptedActuator::new()
            .report("talk_to", ActuatorReport::with_status("failed").message("too far"));

        let talk = actuator
            .execute(&ActionInvocation::new("talk_to").with_argument("target", "Quinn"))
            .await
            .unwrap();
        let wait = actuator.execute(&ActionInvocation::new("wait")).await.unwrap();

        assert_eq!(talk.message.as_deref(), Some("too far"));
        assert_eq!(wait.status.as_deref(), Some("success"));
        assert_eq!(actuator.call_count(), 2);
        assert_eq!(actuator.executed().await[0].name, "talk_to");
    }
}
