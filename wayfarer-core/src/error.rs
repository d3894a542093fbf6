//! Error types for Wayfarer operations

/// Result type for Wayfarer operations
pub type Result<T> = std::result::Result<T, WayfarerError>;

/// Error types for the agent loop.
///
/// None of these are fatal to the process. The cycle driver converts them into
/// an aborted cycle and keeps the last committed memory state.
#[derive(Debug, thiserror::Error)]
pub enum WayfarerError {
    /// Missing or partial sensor fields (resolved to conservative defaults)
    #[error("Sensor gap: {0}")]
    SensorGap(String),

    /// A distance/visibility/obstacle gate failed
    #[error("Precondition failed for '{action}': {reason}")]
    Precondition { action: String, reason: String },

    /// The oracle did not answer within its bound
    #[error("Oracle timed out during {phase}")]
    OracleTimeout { phase: String },

    /// The actuator did not answer within its bound
    #[error("Actuator timed out executing '{action}'")]
    ActuatorTimeout { action: String },

    /// Oracle output that could not be mapped onto the expected structure
    #[error("Malformed oracle output: {0}")]
    MalformedOracleOutput(String),

    /// No candidate survived the precondition gate and no fallback exists
    #[error("No viable action: {0}")]
    NoViableAction(String),

    /// Oracle transport or provider failure
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Environment collaborator failure
    #[error("Environment error: {0}")]
    Environment(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Memory bundle persistence error
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl WayfarerError {
    /// Whether the error came from a bounded suspension point running out of time.
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            WayfarerError::OracleTimeout { .. } | WayfarerError::ActuatorTimeout { .. }
        )
    }
}

impl From<String> for WayfarerError {
    fn from(s: String) -> Self {
        WayfarerError::Other(s)
    }
}

impl From<&str> for WayfarerError {
    fn from(s: &str) -> Self {
        WayfarerError::Other(s.to_string())
    }
}

impl From<anyhow::Error> for WayfarerError {
    fn from(err: anyhow::Error) -> Self {
        WayfarerError::Other(err.to_string())
    }
}
