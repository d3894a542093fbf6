//! Classifying actuator reports into the action log.

use serde::{Deserialize, Serialize};

use super::invocation::ActionInvocation;
use crate::memory::{ActionLogEntry, MemoryStore, Outcome};

const SUCCESS_WORDS: &[&str] = &["ok", "success", "succeeded", "done", "completed"];
const FAILURE_WORDS: &[&str] = &[
    "fail", "failed", "failure", "error", "invalid", "blocked", "rejected",
];
const PARTIAL_WORDS: &[&str] = &["partial", "interrupted", "in_progress", "incomplete"];

/// What the actuator said about an executed action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ActuatorReport {
    pub status: Option<String>,
    pub code: Option<u16>,
    pub message: Option<String>,
}

impl ActuatorReport {
    pub fn with_status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Default::default()
        }
    }

    pub fn with_code(code: u16) -> Self {
        Self {
            code: Some(code),
            ..Default::default()
        }
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Appends one classified entry per executed action.
pub struct ActionLogRecorder;

impl ActionLogRecorder {
    /// Status text first, then the HTTP-like code, else unknown.
    ///
    /// Within the status text, failure words win over partial words, which
    /// win over success words.
    pub fn classify(report: &ActuatorReport) -> Outcome {
        if let Some(status) = report.status.as_deref() {
            let lowered = status.to_ascii_lowercase();
            let tokens: Vec<&str> = lowered
                .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                .filter(|t| !t.is_empty())
                .collect();
            let any = |words: &[&str]| tokens.iter().any(|t| words.contains(t));

            if any(FAILURE_WORDS) {
                return Outcome::Failure;
            }
            if any(PARTIAL_WORDS) {
                return Outcome::Partial;
            }
            if any(SUCCESS_WORDS) {
                return Outcome::Success;
            }
        }

        match report.code {
            Some(206) => Outcome::Partial,
            Some(200..=299) => Outcome::Success,
            Some(400..=599) => Outcome::Failure,
            _ => Outcome::Unknown,
        }
    }

    /// Classify `report` and append exactly one entry to the store.
    pub fn record(
        store: &mut MemoryStore,
        invocation: &ActionInvocation,
        report: &ActuatorReport,
        fingerprint: &str,
        cycle: u64,
    ) -> Outcome {
        let outcome = Self::classify(report);
        let entry = ActionLogEntry::new(
            cycle,
            invocation.name.clone(),
            invocation.arguments.clone(),
            outcome,
            report.message.clone(),
            fingerprint,
        );
        tracing::debug!(
            cycle,
            action = %invocation.name,
            outcome = %outcome,
            "Action outcome recorded"
        );
        store.append_log(entry);
        outcome
    }
}
