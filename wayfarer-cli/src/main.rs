//! Wayfarer CLI - config inspection, memory bundles and offline simulation

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wayfarer_core::agent::ActuatorScript;
use wayfarer_core::prelude::*;

#[derive(Parser)]
#[command(name = "wayfarer")]
#[command(about = "Bounded-memory agent loop tools", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML or JSON); defaults to wayfarer.toml plus WAYFARER_* env vars
    #[arg(short, long, global = true, env = "WAYFARER_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Version information
    Version,
    /// Print the effective configuration as JSON
    Config,
    /// Print the telemetry report of a saved memory bundle
    Inspect {
        /// Memory bundle file
        bundle: PathBuf,
    },
    /// Run one agent against a scripted world
    Simulate {
        /// Scenario file (JSON)
        scenario: PathBuf,

        /// Number of cycles to run
        #[arg(short = 'n', long, default_value_t = 5)]
        cycles: u64,

        /// Save the final memory bundle here
        #[arg(long)]
        save: Option<PathBuf>,

        /// Resume from this memory bundle
        #[arg(long)]
        resume: Option<PathBuf>,
    },
}

/// Offline simulation input.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Scenario {
    agent_id: Option<String>,

    /// `"[priority] text"` goals seeded before the first cycle
    goals: Vec<String>,
    plans: Vec<String>,

    /// Sensor frames, one per cycle; the last one repeats
    frames: Vec<RawSensorBundle>,
    actuator: Option<ActuatorScript>,
    oracle: OracleScript,
}

fn load_config(path: Option<&Path>) -> Result<WayfarerConfig> {
    let config = match path {
        Some(path) => WayfarerConfig::from_file(path)?,
        None => WayfarerConfig::load()?,
    };
    Ok(config)
}

fn build_oracle(config: &WayfarerConfig, script: OracleScript) -> Result<Arc<dyn DecisionOracle>> {
    match config.oracle.provider {
        OracleProvider::Scripted => Ok(Arc::new(ScriptedOracle::from_script(script))),
        #[cfg(feature = "llm-openai")]
        OracleProvider::OpenAI => {
            let provider = wayfarer_core::llm::providers::OpenAIProvider::from_config(&config.oracle)?;
            Ok(Arc::new(LlmOracle::from_config(Arc::new(provider), &config.oracle)))
        }
        #[cfg(not(feature = "llm-openai"))]
        OracleProvider::OpenAI => {
            anyhow::bail!("the openai oracle needs a build with the `llm-openai` feature")
        }
    }
}

async fn simulate(
    config: WayfarerConfig,
    scenario_path: &Path,
    cycles: u64,
    save: Option<&Path>,
    resume: Option<&Path>,
) -> Result<()> {
    let file = std::fs::File::open(scenario_path)
        .with_context(|| format!("Failed to open scenario {}", scenario_path.display()))?;
    let scenario: Scenario = serde_json::from_reader(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to parse scenario {}", scenario_path.display()))?;

    let mut builder = AgentContext::builder().config(config.clone());
    if let Some(id) = &scenario.agent_id {
        builder = builder.id(id);
    }
    if let Some(path) = resume {
        builder = builder.memory(MemoryStore::load(config.memory.clone(), path)?);
    }
    let mut agent = builder.build()?;

    if !scenario.goals.is_empty() {
        let goals = scenario.goals.iter().filter_map(|g| Goal::parse(g)).collect();
        let report = agent.memory_mut().replace_goals(goals);
        if !report.is_clean() {
            tracing::warn!(dropped = report.dropped.len(), "Scenario goals were truncated");
        }
    }
    if !scenario.plans.is_empty() {
        let plans = scenario.plans.iter().map(|p| PlanStep::new(p)).collect();
        agent.memory_mut().replace_plans(plans);
    }

    let environment = ScriptedEnvironment::new(scenario.frames);
    let actuator = match scenario.actuator {
        Some(script) => ScriptedActuator::from_script(script),
        None => ScriptedActuator::new(),
    };
    let oracle = build_oracle(&config, scenario.oracle)?;

    println!("agent {}", agent.id());
    for _ in 0..cycles {
        let report = agent
            .run_cycle(&environment, &actuator, oracle.as_ref())
            .await;
        match &report.status {
            CycleStatus::Completed => {
                let action = report
                    .action
                    .as_ref()
                    .map(|a| a.to_string())
                    .unwrap_or_default();
                let outcome = report.outcome.unwrap_or_default();
                println!("cycle {:>3} [{}] {} -> {}", report.cycle, report.tier, action, outcome);
            }
            CycleStatus::Aborted { phase, reason } => {
                println!("cycle {:>3} [{}] aborted in {}: {}", report.cycle, report.tier, phase, reason);
            }
        }
        for sub in &report.substitutions {
            println!("          substituted {} -> {} ({})", sub.from, sub.to, sub.reason);
        }
    }

    println!("{}", serde_json::to_string_pretty(&agent.report())?);

    if let Some(path) = save {
        agent.save(path)?;
        println!("memory saved to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("wayfarer {}", env!("CARGO_PKG_VERSION"));
            println!("wayfarer-core {}", wayfarer_core::VERSION);
        }
        Commands::Config => {
            let config = load_config(cli.config.as_deref())?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Commands::Inspect { bundle } => {
            let config = load_config(cli.config.as_deref())?;
            let memory = MemoryStore::load(config.memory, &bundle)
                .with_context(|| format!("Failed to load bundle {}", bundle.display()))?;
            println!("{}", serde_json::to_string_pretty(&AgentReport::from_memory(&memory))?);
            println!(
                "{} reflection(s), {} logged action(s), {} navigation point(s)",
                memory.reflections().count(),
                memory.log_len(),
                memory.navigation_points().len()
            );
        }
        Commands::Simulate {
            scenario,
            cycles,
            save,
            resume,
        } => {
            let config = load_config(cli.config.as_deref())?;
            simulate(config, &scenario, cycles, save.as_deref(), resume.as_deref()).await?;
        }
    }

    Ok(())
}
