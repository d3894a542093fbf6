//! Many independent agents, each on its own task.

use std::sync::Arc;
use tokio::task::JoinSet;

use crate::agent::{Actuator, AgentContext, CycleReport, Environment};
use crate::error::{Result, WayfarerError};
use crate::oracle::DecisionOracle;

/// One agent with its own world connection.
pub struct FleetMember {
    pub agent: AgentContext,
    pub environment: Arc<dyn Environment>,
    pub actuator: Arc<dyn Actuator>,
}

/// Cycle reports of one agent from a fleet run.
#[derive(Debug, Clone)]
pub struct FleetRun {
    pub agent_id: String,
    pub reports: Vec<CycleReport>,
}

/// Runs agents concurrently. Agents share only the stateless oracle.
pub struct Fleet {
    members: Vec<FleetMember>,
    oracle: Arc<dyn DecisionOracle>,
}

impl Fleet {
    pub fn new(oracle: Arc<dyn DecisionOracle>) -> Self {
        Self {
            members: Vec::new(),
            oracle,
        }
    }

    pub fn with_agent(
        mut self,
        agent: AgentContext,
        environment: Arc<dyn Environment>,
        actuator: Arc<dyn Actuator>,
    ) -> Self {
        self.members.push(FleetMember {
            agent,
            environment,
            actuator,
        });
        self
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn agents(&self) -> impl Iterator<Item = &AgentContext> {
        self.members.iter().map(|m| &m.agent)
    }

    pub fn agent(&self, id: &str) -> Option<&AgentContext> {
        self.agents().find(|a| a.id() == id)
    }

    /// Run `cycles` cycles of every agent concurrently.
    ///
    /// Results come back in insertion order. A panicking agent task is
    /// dropped from the fleet and reported as an error once every other
    /// agent has finished.
    pub async fn run(&mut self, cycles: u64) -> Result<Vec<FleetRun>> {
        let mut tasks = JoinSet::new();
        for (index, mut member) in std::mem::take(&mut self.members).into_iter().enumerate() {
            let oracle = Arc::clone(&self.oracle);
            tasks.spawn(async move {
                let reports = member
                    .agent
                    .run_cycles(
                        cycles,
                        member.environment.as_ref(),
                        member.actuator.as_ref(),
                        oracle.as_ref(),
                    )
                    .await;
                (index, member, reports)
            });
        }

        let mut finished = Vec::with_capacity(tasks.len());
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(done) => finished.push(done),
                Err(e) => {
                    tracing::error!(error = %e, "Agent task failed");
                    failures.push(e.to_string());
                }
            }
        }
        finished.sort_by_key(|(index, _, _)| *index);

        let mut runs = Vec::with_capacity(finished.len());
        for (_, member, reports) in finished {
            runs.push(FleetRun {
                agent_id: member.agent.id().to_string(),
                reports,
            });
            self.members.push(member);
        }

        tracing::info!(agents = runs.len(), cycles, "Fleet run finished");

        if failures.is_empty() {
            Ok(runs)
        } else {
            Err(WayfarerError::Other(format!(
                "{} agent task(s) failed: {}",
                failures.len(),
                failures.join("; ")
            )))
        }
    }
}
