//! # Wayfarer
//!
//! The bounded-memory reasoning loop of an embodied agent in a simulated
//! world. Each cycle the agent:
//! - ingests noisy, qualitative sensor data into an immutable snapshot
//! - reflects on recent events and revises at most five goals and five plan steps
//! - selects exactly one action that passes visibility, range and obstacle gates
//! - executes it and logs the classified outcome
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wayfarer_core::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let mut agent = AgentContext::builder()
//!         .id("wayfarer-1")
//!         .config(WayfarerConfig::load()?)
//!         .build()?;
//!     agent
//!         .memory_mut()
//!         .replace_goals(vec![Goal::new("Reach Quinn", Priority::High)]);
//!
//!     let world = ScriptedEnvironment::new(vec![RawSensorBundle::default()]);
//!     let actuator = ScriptedActuator::new();
//!     let oracle = ScriptedOracle::new();
//!
//!     let report = agent.run_cycle(&world, &actuator, &oracle).await;
//!     println!("{:?}", report.action);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `llm-openai`: OpenAI-compatible chat-completions provider for [`oracle::LlmOracle`]

pub mod action;
pub mod agent;
pub mod config;
pub mod error;
pub mod fleet;
pub mod llm;
pub mod memory;
pub mod oracle;
pub mod perception;
pub mod reflection;

/// Current library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{
        ActionDefinition, ActionInvocation, ActionLogRecorder, ActionSelector, ActionSpace,
        ActuatorReport, ParameterKind, ParameterSpec, PreconditionClass, Selection,
        SelectionSource,
    };
    pub use crate::agent::{
        Actuator, AgentBuilder, AgentContext, AgentReport, CycleReport, CycleStatus, Environment,
        Phase, ScriptedActuator, ScriptedEnvironment,
    };
    pub use crate::config::{
        ConfigBuilder, CycleConfig, MemoryConfig, OracleConfig, OracleProvider, PerceptionConfig,
        WayfarerConfig,
    };
    pub use crate::error::{Result, WayfarerError};
    pub use crate::fleet::{Fleet, FleetRun};
    pub use crate::llm::{LLMProvider, LLMRequest, LLMResponse, Message, MessageRole};
    pub use crate::memory::{
        ActionLogEntry, Goal, MemoryBundle, MemoryStore, NavigationPoint, Outcome, PlanStep,
        Priority, Reflection,
    };
    pub use crate::oracle::{
        DecisionOracle, LlmOracle, OracleDecision, OracleRequest, OracleScript, RequestKind,
        ScriptedOracle, ScriptedResponse,
    };
    pub use crate::perception::{
        DistanceBand, Heading, PerceptionIngestor, PerceptionSnapshot, PerceptionSummary,
        RawSensorBundle, SignalLevel,
    };
    pub use crate::reflection::{ReflectionEngine, ReflectionOutcome, Tier, TierProfile};
}
