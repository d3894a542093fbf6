//! The decision oracle: an opaque, stateless `request -> decision` seam.
//!
//! The loop never depends on how decisions are produced. Tests and the
//! offline simulator use [`ScriptedOracle`]; [`LlmOracle`] asks a
//! chat-completion model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::reflection::Tier;

mod decode;
mod llm;
mod scripted;

pub use decode::decode_json;
pub use llm::LlmOracle;
pub use scripted::{OracleScript, ScriptedOracle, ScriptedResponse};

/// What the oracle is being asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RequestKind {
    /// Reflection text plus revised goals and plans
    Reflection { tier: Tier },
    /// One proposed action
    Selection,
    /// Free-form first-person status report
    Narrative,
}

impl RequestKind {
    /// Coarse family name: `reflection`, `selection` or `narrative`.
    pub fn family(&self) -> &'static str {
        match self {
            Self::Reflection { .. } => "reflection",
            Self::Selection => "selection",
            Self::Narrative => "narrative",
        }
    }

    /// Fine key; reflection requests include the tier (`reflection.junior`).
    pub fn key(&self) -> String {
        match self {
            Self::Reflection { tier } => format!("reflection.{}", tier),
            other => other.family().to_string(),
        }
    }
}

/// One call to the oracle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleRequest {
    #[serde(flatten)]
    pub kind: RequestKind,
    pub agent_id: String,
    pub cycle: u64,

    /// Instruction text
    pub prompt: String,

    /// Structured context (snapshot, memory view, action space)
    pub context: Value,
}

impl OracleRequest {
    pub fn new(kind: RequestKind, agent_id: impl Into<String>, cycle: u64) -> Self {
        Self {
            kind,
            agent_id: agent_id.into(),
            cycle,
            prompt: String::new(),
            context: Value::Null,
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }
}

/// The oracle's answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OracleDecision {
    /// Duck-typed JSON, mapped onto typed values by the caller
    Structured(Value),
    Text(String),
}

impl OracleDecision {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Structured(v) => Some(v),
            Self::Text(_) => None,
        }
    }

    /// Text content: the string itself, or a JSON string value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            Self::Structured(Value::String(s)) => Some(s),
            Self::Structured(_) => None,
        }
    }
}

/// Source of reflections, action proposals and narratives.
///
/// Implementations must be safe to share across agents; per-agent state
/// lives in the agent context, never here.
#[async_trait]
pub trait DecisionOracle: Send + Sync {
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision>;

    fn name(&self) -> &str {
        "oracle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_kind_keys() {
        let kind = RequestKind::Reflection { tier: Tier::Senior };
        assert_eq!(kind.family(), "reflection");
        assert_eq!(kind.key(), "reflection.senior");
        assert_eq!(RequestKind::Selection.key(), "selection");
    }

    #[test]
    fn test_request_serializes_flat() {
        let request = OracleRequest::new(RequestKind::Reflection { tier: Tier::Junior }, "a1", 3)
            .with_prompt("reflect");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["kind"], "reflection");
        assert_eq!(value["tier"], "junior");
        assert_eq!(value["cycle"], 3);
    }

    #[test]
    fn test_decision_text_access() {
        assert_eq!(OracleDecision::Text("hi".into()).as_text(), Some("hi"));
        assert_eq!(OracleDecision::Structured(json!("hi")).as_text(), Some("hi"));
        assert!(OracleDecision::Structured(json!({"a": 1})).as_text().is_none());
    }
}
