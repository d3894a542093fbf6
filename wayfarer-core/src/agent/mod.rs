//! The per-agent cycle driver.
//!
//! An [`AgentContext`] is the explicit state threaded through every phase of
//! a cycle. The environment, actuator and oracle are borrowed per call, so a
//! single oracle can serve any number of agents.

mod context;
mod cycle;
mod report;
mod world;

#[cfg(test)]
mod tests;

pub use context::{AgentBuilder, AgentContext};
pub use cycle::{CycleReport, CycleStatus, Phase};
pub use report::{AgentReport, fallback_narrative, strip_markup};
pub use world::{
    ActuatorScript, Actuator, Environment, ScriptedActuator, ScriptedEnvironment,
};
