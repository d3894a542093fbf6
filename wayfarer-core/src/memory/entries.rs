//! Append-only records held by the memory store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use crate::perception::{DistanceBand, Heading};
use crate::reflection::Tier;

/// One entry of the rolling reflection window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reflection {
    pub sequence: u64,
    pub text: String,
    pub recorded_at: DateTime<Utc>,

    /// Tier that produced the note; `None` for markers written by the cycle driver
    pub tier: Option<Tier>,

    /// Placeholder for a reflection that could not run this cycle
    #[serde(default)]
    pub deferred: bool,
}

/// Classified result of an executed action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Success,
    Failure,
    Partial,
    #[default]
    Unknown,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Record of one executed action. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    cycle: u64,
    action: String,
    arguments: Map<String, Value>,
    outcome: Outcome,
    message: Option<String>,
    timestamp: DateTime<Utc>,
    fingerprint: String,
}

impl ActionLogEntry {
    pub fn new(
        cycle: u64,
        action: impl Into<String>,
        arguments: Map<String, Value>,
        outcome: Outcome,
        message: Option<String>,
        fingerprint: impl Into<String>,
    ) -> Self {
        Self {
            cycle,
            action: action.into(),
            arguments,
            outcome,
            message,
            timestamp: Utc::now(),
            fingerprint: fingerprint.into(),
        }
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn arguments(&self) -> &Map<String, Value> {
        &self.arguments
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Fingerprint of the snapshot the action was chosen under.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// The argument naming what the action was aimed at, if any.
    pub fn target(&self) -> Option<&str> {
        ["target", "name", "point", "direction"]
            .iter()
            .find_map(|key| self.arguments.get(*key).and_then(Value::as_str))
    }

    /// `"action(target) -> outcome"` one-liner for prompts and notes.
    pub fn summary(&self) -> String {
        let target = self.target().map(|t| format!("({})", t)).unwrap_or_default();
        match self.message() {
            Some(msg) if !msg.trim().is_empty() => {
                format!("{}{} -> {}: {}", self.action, target, self.outcome, msg.trim())
            }
            _ => format!("{}{} -> {}", self.action, target, self.outcome),
        }
    }
}

/// A remembered place, kept until explicitly removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationPoint {
    pub name: String,
    pub heading: Option<Heading>,
    #[serde(default)]
    pub distance: DistanceBand,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl NavigationPoint {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            heading: None,
            distance: DistanceBand::Unknown,
            note: None,
        }
    }

    pub fn with_heading(mut self, heading: Heading) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn with_distance(mut self, distance: DistanceBand) -> Self {
        self.distance = distance;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}
