//! Ingest → Reflect → Select → Execute → Log.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::time::timeout;

use super::context::AgentContext;
use super::world::{Actuator, Environment};
use crate::action::{
    ActionInvocation, ActionLogRecorder, ActuatorReport, SelectionContext, SelectionSource,
    Substitution,
};
use crate::error::WayfarerError;
use crate::memory::Outcome;
use crate::oracle::DecisionOracle;
use crate::reflection::{ReflectionContext, Tier};

/// Cycle phase that can abort a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Sense,
    Reflect,
    Select,
    Execute,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sense => "sense",
            Self::Reflect => "reflect",
            Self::Select => "select",
            Self::Execute => "execute",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CycleStatus {
    Completed,
    Aborted { phase: Phase, reason: String },
}

/// What happened during one cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CycleReport {
    pub cycle: u64,
    pub tier: Tier,
    pub status: CycleStatus,

    /// Action handed to the actuator, if the cycle got that far
    pub action: Option<ActionInvocation>,
    pub source: Option<SelectionSource>,
    pub outcome: Option<Outcome>,
    pub substitutions: Vec<Substitution>,

    /// Repairs applied to the reflection output
    pub repairs: Vec<String>,
}

impl CycleReport {
    fn new(cycle: u64, tier: Tier) -> Self {
        Self {
            cycle,
            tier,
            status: CycleStatus::Completed,
            action: None,
            source: None,
            outcome: None,
            substitutions: Vec::new(),
            repairs: Vec::new(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, CycleStatus::Completed)
    }
}

impl AgentContext {
    /// Run one full cycle.
    ///
    /// Never fails: collaborator errors and timeouts end the cycle as
    /// [`CycleStatus::Aborted`] and leave the last committed memory in place.
    /// Sensor-reported navigation points and action space are committed with
    /// the reflection; once committed they survive a later abort.
    pub async fn run_cycle(
        &mut self,
        environment: &dyn Environment,
        actuator: &dyn Actuator,
        oracle: &dyn DecisionOracle,
    ) -> CycleReport {
        self.cycle += 1;
        let cycle = self.cycle;
        let tier = Tier::for_cycle(cycle, self.config.cycle.senior_every);
        let mut report = CycleReport::new(cycle, tier);

        tracing::debug!(agent_id = %self.id, cycle, tier = %tier, "Cycle started");

        // Ingest
        let raw = match environment.sense().await {
            Ok(raw) => raw,
            Err(e) => return self.abort(report, Phase::Sense, e.to_string()),
        };
        let snapshot = Arc::new(self.ingestor.ingest(cycle, &raw));
        let absorbed = self.absorb(&raw);
        let preview = absorbed.preview(&self.memory);
        self.last_snapshot = Some(Arc::clone(&snapshot));

        // Reflect
        let reflection_ctx = ReflectionContext {
            agent_id: &self.id,
            cycle,
            snapshot: &snapshot,
            memory: preview.as_ref().unwrap_or(&self.memory),
            action_space: absorbed.action_space(&self.action_space),
        };
        let staged = timeout(
            self.config.cycle.reflection_timeout,
            self.engine_for(tier).reflect(&reflection_ctx, oracle),
        )
        .await;
        let outcome = match staged {
            Ok(outcome) => outcome,
            Err(_) => return self.time_out(report, Phase::Reflect),
        };
        absorbed.commit(&mut self.memory, &mut self.action_space);
        outcome.commit(&mut self.memory);
        report.repairs = outcome.repairs;
        tracing::debug!(agent_id = %self.id, cycle, tier = %tier, "Reflection committed");

        // Select
        let selection_ctx = SelectionContext {
            agent_id: &self.id,
            cycle,
            snapshot: &snapshot,
            memory: &self.memory,
            action_space: &self.action_space,
        };
        let selected = timeout(
            self.config.cycle.selection_timeout,
            self.selector.select(&selection_ctx, oracle),
        )
        .await;
        let selection = match selected {
            Ok(Ok(selection)) => selection,
            Ok(Err(e)) => return self.abort(report, Phase::Select, e.to_string()),
            Err(_) => return self.time_out(report, Phase::Select),
        };
        report.source = Some(selection.source);
        report.substitutions = selection.substitutions;
        let invocation = selection.invocation;

        // Execute
        let executed = timeout(
            self.config.cycle.actuator_timeout,
            actuator.execute(&invocation),
        )
        .await;
        let actuator_report = match executed {
            Ok(Ok(r)) => r,
            Ok(Err(e)) => ActuatorReport::with_status("error").message(e.to_string()),
            Err(_) => {
                report.action = Some(invocation);
                return self.time_out(report, Phase::Execute);
            }
        };

        // Log
        let outcome = ActionLogRecorder::record(
            &mut self.memory,
            &invocation,
            &actuator_report,
            snapshot.fingerprint(),
            cycle,
        );
        tracing::info!(
            agent_id = %self.id,
            cycle,
            tier = %tier,
            action = %invocation,
            outcome = %outcome,
            "Cycle completed"
        );

        report.action = Some(invocation);
        report.outcome = Some(outcome);
        report
    }

    /// Run `n` cycles back to back.
    pub async fn run_cycles(
        &mut self,
        n: u64,
        environment: &dyn Environment,
        actuator: &dyn Actuator,
        oracle: &dyn DecisionOracle,
    ) -> Vec<CycleReport> {
        let mut reports = Vec::with_capacity(n as usize);
        for _ in 0..n {
            reports.push(self.run_cycle(environment, actuator, oracle).await);
        }
        reports
    }

    fn abort(&mut self, mut report: CycleReport, phase: Phase, reason: String) -> CycleReport {
        tracing::warn!(
            agent_id = %self.id,
            cycle = report.cycle,
            phase = %phase,
            reason = %reason,
            "Cycle aborted"
        );
        report.status = CycleStatus::Aborted { phase, reason };
        report
    }

    /// Abort on a timed-out suspension point and leave a deferred marker.
    fn time_out(&mut self, report: CycleReport, phase: Phase) -> CycleReport {
        let error = match phase {
            Phase::Execute => WayfarerError::ActuatorTimeout {
                action: report
                    .action
                    .as_ref()
                    .map(|a| a.name.clone())
                    .unwrap_or_default(),
            },
            _ => WayfarerError::OracleTimeout {
                phase: phase.to_string(),
            },
        };
        self.memory.append_reflection(
            format!("cycle {} skipped: {} timed out", report.cycle, phase),
            None,
            true,
        );
        self.abort(report, phase, error.to_string())
    }
}
