//! Configuration types for Wayfarer

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{Result, WayfarerError};

/// Main configuration for an agent loop
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WayfarerConfig {
    /// Memory store windows
    pub memory: MemoryConfig,

    /// Perception banding thresholds
    pub perception: PerceptionConfig,

    /// Cycle timeouts and tier cadence
    pub cycle: CycleConfig,

    /// Decision oracle provider
    pub oracle: OracleConfig,
}

/// Memory store configuration.
///
/// Goal and plan caps are fixed at five and are not configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Number of reflections retained for context reuse
    pub reflection_window: usize,

    /// Number of action log entries retained
    pub action_log_window: usize,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            reflection_window: 5,
            action_log_window: 20,
        }
    }
}

/// Thresholds used to turn raw numbers into qualitative bands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Upper bound of the near (interaction) band
    pub near_distance: f64,

    /// Upper bound of the mid band
    pub mid_distance: f64,

    /// Upper bound of the far band; anything beyond is distant
    pub far_distance: f64,

    /// Elevation deltas within +/- this value are level
    pub level_tolerance: f64,

    /// Obstacle signal strength thresholds
    pub signal: SignalThresholds,

    /// Odometry magnitude thresholds
    pub odometry: OdometryThresholds,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            near_distance: 10.0,
            mid_distance: 30.0,
            far_distance: 80.0,
            level_tolerance: 2.0,
            signal: SignalThresholds::default(),
            odometry: OdometryThresholds::default(),
        }
    }
}

/// Lower bounds for each obstacle signal level on a `[0, 1]` strength scale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalThresholds {
    pub moderate: f64,
    pub strong: f64,
    pub intense: f64,
}

impl Default for SignalThresholds {
    fn default() -> Self {
        Self {
            moderate: 0.25,
            strong: 0.5,
            intense: 0.75,
        }
    }
}

/// Upper bounds for odometry magnitude bands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OdometryThresholds {
    pub still: f64,
    pub short: f64,
    pub medium: f64,
}

impl Default for OdometryThresholds {
    fn default() -> Self {
        Self {
            still: 0.5,
            short: 5.0,
            medium: 20.0,
        }
    }
}

/// Per-cycle bounds and policies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Bound on the reflection oracle call
    #[serde(with = "humantime_serde")]
    pub reflection_timeout: Duration,

    /// Bound on the selection oracle call
    #[serde(with = "humantime_serde")]
    pub selection_timeout: Duration,

    /// Bound on the actuator call
    #[serde(with = "humantime_serde")]
    pub actuator_timeout: Duration,

    /// Run the senior tier every N cycles (1 = every cycle, 0 = never)
    pub senior_every: u64,

    /// Failures of the same action+target under an unchanged snapshot before
    /// the selector stops reissuing it
    pub failure_cooldown_threshold: usize,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            reflection_timeout: Duration::from_secs(30),
            selection_timeout: Duration::from_secs(30),
            actuator_timeout: Duration::from_secs(10),
            senior_every: 3,
            failure_cooldown_threshold: 1,
        }
    }
}

/// Oracle provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OracleProvider {
    /// Deterministic scripted decisions (tests, offline simulation)
    #[default]
    Scripted,
    /// OpenAI-compatible chat completions
    OpenAI,
}

/// Oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    /// Provider type
    pub provider: OracleProvider,

    /// Model name
    pub model: String,

    /// Base URL (for compatible endpoints)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// API key (prefer env vars)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// Sampling temperature
    pub temperature: f32,

    /// Completion token budget
    pub max_tokens: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            provider: OracleProvider::Scripted,
            model: "gpt-4o-mini".to_string(),
            base_url: None,
            api_key: None,
            temperature: 0.2,
            max_tokens: 800,
        }
    }
}

/// Builder for WayfarerConfig
pub struct ConfigBuilder {
    config: WayfarerConfig,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        Self {
            config: WayfarerConfig::default(),
        }
    }

    /// Set memory configuration
    pub fn memory(mut self, config: MemoryConfig) -> Self {
        self.config.memory = config;
        self
    }

    /// Set perception configuration
    pub fn perception(mut self, config: PerceptionConfig) -> Self {
        self.config.perception = config;
        self
    }

    /// Set cycle configuration
    pub fn cycle(mut self, config: CycleConfig) -> Self {
        self.config.cycle = config;
        self
    }

    /// Set oracle configuration
    pub fn oracle(mut self, config: OracleConfig) -> Self {
        self.config.oracle = config;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<WayfarerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl WayfarerConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Loads in this order:
    /// 1. Default configuration
    /// 2. `wayfarer.toml` in the working directory
    /// 3. The file named by `WAYFARER_CONFIG_PATH`
    /// 4. `WAYFARER_`-prefixed environment variables (`__` separates sections)
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration source is invalid.
    pub fn load() -> Result<Self> {
        use figment::{
            Figment,
            providers::{Env, Format, Serialized, Toml},
        };

        let mut figment = Figment::from(Serialized::defaults(WayfarerConfig::default()))
            .merge(Toml::file("wayfarer.toml"));

        if let Ok(path) = std::env::var("WAYFARER_CONFIG_PATH") {
            figment = figment.merge(Toml::file(path));
        }

        let config: WayfarerConfig = figment
            .merge(Env::prefixed("WAYFARER_").split("__"))
            .extract()
            .map_err(|e| {
                WayfarerError::Configuration(format!("Failed to load configuration: {}", e))
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path (TOML or JSON by extension).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        use figment::{
            Figment,
            providers::{Format, Json, Serialized, Toml},
        };

        let path = path.as_ref();
        let figment = Figment::from(Serialized::defaults(WayfarerConfig::default()));
        let figment = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => figment.merge(Json::file(path)),
            _ => figment.merge(Toml::file(path)),
        };

        let config: WayfarerConfig = figment.extract().map_err(|e| {
            WayfarerError::Configuration(format!("Failed to load configuration file: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if windows are empty or thresholds are not increasing.
    pub fn validate(&self) -> Result<()> {
        if self.memory.reflection_window == 0 || self.memory.action_log_window == 0 {
            return Err(WayfarerError::Configuration(
                "memory windows must hold at least one entry".to_string(),
            ));
        }

        let p = &self.perception;
        if !(p.near_distance > 0.0 && p.near_distance < p.mid_distance && p.mid_distance < p.far_distance)
        {
            return Err(WayfarerError::Configuration(format!(
                "distance thresholds must increase: near={} mid={} far={}",
                p.near_distance, p.mid_distance, p.far_distance
            )));
        }

        let s = &p.signal;
        if !(0.0 < s.moderate && s.moderate < s.strong && s.strong < s.intense && s.intense <= 1.0) {
            return Err(WayfarerError::Configuration(format!(
                "signal thresholds must increase within (0, 1]: moderate={} strong={} intense={}",
                s.moderate, s.strong, s.intense
            )));
        }

        let o = &p.odometry;
        if !(0.0 <= o.still && o.still < o.short && o.short < o.medium) {
            return Err(WayfarerError::Configuration(
                "odometry thresholds must increase".to_string(),
            ));
        }

        if p.level_tolerance < 0.0 {
            return Err(WayfarerError::Configuration(
                "level tolerance must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}
