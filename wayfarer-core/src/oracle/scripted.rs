//! Deterministic oracle for tests and offline simulation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

use super::{DecisionOracle, OracleDecision, OracleRequest};
use crate::error::{Result, WayfarerError};

/// Predetermined answer to one request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptedResponse {
    /// Structured decision
    pub value: Option<Value>,

    /// Text decision, used when no value is given
    pub text: Option<String>,

    /// Fail the call with this oracle error
    pub error: Option<String>,

    /// Simulated latency in milliseconds
    pub delay_ms: u64,
}

impl ScriptedResponse {
    pub fn value(value: Value) -> Self {
        Self {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    fn resolve(&self) -> Result<OracleDecision> {
        if let Some(message) = &self.error {
            return Err(WayfarerError::Oracle(message.clone()));
        }
        match (&self.value, &self.text) {
            (Some(value), _) => Ok(OracleDecision::Structured(value.clone())),
            (None, Some(text)) => Ok(OracleDecision::Text(text.clone())),
            (None, None) => Ok(OracleDecision::Structured(Value::Null)),
        }
    }
}

/// Serializable script: queued answers consumed in order, then fixed ones.
///
/// Keys are request kinds: `reflection`, `reflection.junior`,
/// `reflection.senior`, `selection`, `narrative`. A tier-specific key is
/// consulted before the family key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleScript {
    pub queued: HashMap<String, Vec<ScriptedResponse>>,
    pub fixed: HashMap<String, ScriptedResponse>,

    /// Latency added to every call
    pub delay_ms: u64,
}

/// Oracle that replays an [`OracleScript`] and records every request.
pub struct ScriptedOracle {
    queued: Mutex<HashMap<String, VecDeque<ScriptedResponse>>>,
    fixed: HashMap<String, ScriptedResponse>,
    delay: Duration,
    call_count: AtomicUsize,
    history: Mutex<Vec<OracleRequest>>,
}

impl Default for ScriptedOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedOracle {
    pub fn new() -> Self {
        Self {
            queued: Mutex::new(HashMap::new()),
            fixed: HashMap::new(),
            delay: Duration::ZERO,
            call_count: AtomicUsize::new(0),
            history: Mutex::new(Vec::new()),
        }
    }

    pub fn from_script(script: OracleScript) -> Self {
        let queued = script
            .queued
            .into_iter()
            .map(|(k, v)| (k, v.into_iter().collect()))
            .collect();
        Self {
            queued: Mutex::new(queued),
            fixed: script.fixed,
            delay: Duration::from_millis(script.delay_ms),
            ..Self::new()
        }
    }

    /// Queue an answer for `key`, consumed once.
    pub fn queue(mut self, key: impl Into<String>, response: ScriptedResponse) -> Self {
        self.queued
            .get_mut()
            .entry(key.into())
            .or_default()
            .push_back(response);
        self
    }

    /// Answer every request for `key` with `response` once its queue is empty.
    pub fn fixed(mut self, key: impl Into<String>, response: ScriptedResponse) -> Self {
        self.fixed.insert(key.into(), response);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Every request received, oldest first.
    pub async fn history(&self) -> Vec<OracleRequest> {
        self.history.lock().await.clone()
    }

    async fn next_response(&self, request: &OracleRequest) -> Option<ScriptedResponse> {
        let keys = [request.kind.key(), request.kind.family().to_string()];
        {
            let mut queued = self.queued.lock().await;
            for key in &keys {
                if let Some(response) = queued.get_mut(key).and_then(|q| q.pop_front()) {
                    return Some(response);
                }
            }
        }
        keys.iter().find_map(|k| self.fixed.get(k).cloned())
    }
}

#[async_trait]
impl DecisionOracle for ScriptedOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        self.history.lock().await.push(request.clone());

        let response = self.next_response(request).await;
        let delay = self.delay + Duration::from_millis(response.as_ref().map_or(0, |r| r.delay_ms));
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        match response {
            Some(response) => response.resolve(),
            None => Err(WayfarerError::Oracle(format!(
                "no scripted decision for '{}'",
                request.kind.key()
            ))),
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::RequestKind;
    use crate::reflection::Tier;
    use serde_json::json;

    fn request(kind: RequestKind) -> OracleRequest {
        OracleRequest::new(kind, "agent", 1)
    }

    #[tokio::test]
    async fn test_queue_then_fixed() {
        let oracle = ScriptedOracle::new()
            .queue("selection", ScriptedResponse::value(json!({"action": "wait"})))
            .fixed("selection", ScriptedResponse::value(json!({"action": "explore"})));

        let first = oracle.decide(&request(RequestKind::Selection)).await.unwrap();
        let second = oracle.decide(&request(RequestKind::Selection)).await.unwrap();
        assert_eq!(first.as_value().unwrap()["action"], "wait");
        assert_eq!(second.as_value().unwrap()["action"], "explore");
        assert_eq!(oracle.call_count(), 2);
        assert_eq!(oracle.history().await.len(), 2);
    }

    #[tokio::test]
    async fn test_tier_key_before_family() {
        let oracle = ScriptedOracle::new()
            .fixed("reflection", ScriptedResponse::text("generic"))
            .fixed("reflection.senior", ScriptedResponse::text("senior"));

        let senior = RequestKind::Reflection { tier: Tier::Senior };
        let junior = RequestKind::Reflection { tier: Tier::Junior };
        assert_eq!(oracle.decide(&request(senior)).await.unwrap().as_text(), Some("senior"));
        assert_eq!(oracle.decide(&request(junior)).await.unwrap().as_text(), Some("generic"));
    }

    #[tokio::test]
    async fn test_missing_and_error_responses() {
        let oracle = ScriptedOracle::new().queue("narrative", ScriptedResponse::error("offline"));
        assert!(oracle.decide(&request(RequestKind::Narrative)).await.is_err());
        let err = oracle.decide(&request(RequestKind::Selection)).await.unwrap_err();
        assert!(err.to_string().contains("selection"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_applied() {
        let oracle = ScriptedOracle::new()
            .fixed("selection", ScriptedResponse::value(json!({})).with_delay(500));
        let started = tokio::time::Instant::now();
        oracle.decide(&request(RequestKind::Selection)).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(500));
    }

    #[test]
    fn test_script_deserializes() {
        let script: OracleScript = serde_json::from_str(
            r#"{"queued": {"selection": [{"value": {"action": "wait"}}]},
                "fixed": {"narrative": {"text": "All quiet."}}}"#,
        )
        .unwrap();
        assert_eq!(script.queued["selection"].len(), 1);
        assert_eq!(script.fixed["narrative"].text.as_deref(), Some("All quiet."));
    }
}
