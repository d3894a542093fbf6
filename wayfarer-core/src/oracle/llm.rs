//! Oracle backed by a chat-completion model.

use async_trait::async_trait;
use std::sync::Arc;

use super::decode::decode_json;
use super::{DecisionOracle, OracleDecision, OracleRequest, RequestKind};
use crate::config::OracleConfig;
use crate::error::Result;
use crate::llm::{LLMProvider, LLMRequest};
use crate::reflection::Tier;

const REFLECTION_FORMAT: &str = r#"Respond with JSON only:
{"reflection": "<short note>", "goals": ["[high|medium|low] <goal>", ...], "plans": ["<step>", ...]}
At most 5 goals and 5 plan steps. Omit "goals" or "plans" to keep them unchanged."#;

const SELECTION_FORMAT: &str = r#"Respond with JSON only:
{"action": "<action name from the action space>", "arguments": {"<parameter>": "<value>"}}"#;

/// Renders requests into prompts, calls the provider, decodes the answer.
pub struct LlmOracle {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl LlmOracle {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        let defaults = OracleConfig::default();
        Self {
            provider,
            temperature: defaults.temperature,
            max_tokens: defaults.max_tokens,
        }
    }

    pub fn from_config(provider: Arc<dyn LLMProvider>, config: &OracleConfig) -> Self {
        Self {
            provider,
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    fn system_prompt(kind: &RequestKind) -> &'static str {
        match kind {
            RequestKind::Reflection { tier: Tier::Junior } => {
                "You are the short-range tactical sense of an explorer agent. \
                 Note what just happened nearby and what blocks progress."
            }
            RequestKind::Reflection { tier: Tier::Senior } => {
                "You are the strategic planner of an explorer agent. \
                 Review goals and plans against what the agent perceives and has done."
            }
            RequestKind::Selection => {
                "You choose the single next action for an explorer agent from its action space."
            }
            RequestKind::Narrative => {
                "You are an explorer agent. Report your status in the first person, in plain prose."
            }
        }
    }

    fn user_prompt(request: &OracleRequest) -> String {
        let context = serde_json::to_string_pretty(&request.context).unwrap_or_default();
        let format = match request.kind {
            RequestKind::Reflection { .. } => REFLECTION_FORMAT,
            RequestKind::Selection => SELECTION_FORMAT,
            RequestKind::Narrative => "",
        };
        format!("{}\n\n# Context\n{}\n\n{}", request.prompt, context, format)
            .trim()
            .to_string()
    }
}

#[async_trait]
impl DecisionOracle for LlmOracle {
    async fn decide(&self, request: &OracleRequest) -> Result<OracleDecision> {
        let llm_request =
            LLMRequest::with_system_prompt(Self::system_prompt(&request.kind), Self::user_prompt(request))
                .temperature(self.temperature)
                .max_tokens(self.max_tokens);

        let response = self.provider.generate_request(&llm_request).await?;
        if let Some(usage) = &response.usage {
            tracing::debug!(
                agent_id = %request.agent_id,
                kind = %request.kind.key(),
                total_tokens = usage.total_tokens,
                "Oracle call completed"
            );
        }

        match request.kind {
            RequestKind::Narrative => Ok(OracleDecision::Text(response.content)),
            _ => decode_json(&response.content).map(OracleDecision::Structured),
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WayfarerError;
    use crate::llm::{LLMResponse, ModelInfo};
    use serde_json::json;
    use std::sync::Mutex;

    struct CannedProvider {
        reply: String,
        seen: Mutex<Vec<LLMRequest>>,
    }

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn generate_request(&self, request: &LLMRequest) -> Result<LLMResponse> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(LLMResponse {
                content: self.reply.clone(),
                usage: None,
            })
        }

        fn model_info(&self) -> ModelInfo {
            ModelInfo {
                provider: "canned".to_string(),
                model_name: "canned".to_string(),
            }
        }
    }

    fn oracle(reply: &str) -> (LlmOracle, Arc<CannedProvider>) {
        let provider = Arc::new(CannedProvider {
            reply: reply.to_string(),
            seen: Mutex::new(Vec::new()),
        });
        (LlmOracle::new(provider.clone()), provider)
    }

    #[tokio::test]
    async fn test_selection_decodes_fenced_json() {
        let (oracle, provider) = oracle("```json\n{\"action\": \"talk_to\", \"arguments\": {\"target\": \"Quinn\"},}\n```");
        let request = OracleRequest::new(RequestKind::Selection, "a", 1)
            .with_prompt("Pick one action.")
            .with_context(json!({"goals": ["[high] Reach Quinn"]}));

        let decision = oracle.decide(&request).await.unwrap();
        assert_eq!(decision.as_value().unwrap()["action"], "talk_to");

        let seen = provider.seen.lock().unwrap();
        assert!(seen[0].messages[1].content.contains("Reach Quinn"));
        assert!(seen[0].messages[1].content.contains("\"action\""));
    }

    #[tokio::test]
    async fn test_narrative_passes_text() {
        let (oracle, _) = oracle("I am heading east.");
        let request = OracleRequest::new(RequestKind::Narrative, "a", 1);
        let decision = oracle.decide(&request).await.unwrap();
        assert_eq!(decision.as_text(), Some("I am heading east."));
    }

    #[tokio::test]
    async fn test_garbage_is_malformed() {
        let (oracle, _) = oracle("I cannot decide.");
        let request = OracleRequest::new(RequestKind::Reflection { tier: Tier::Senior }, "a", 1);
        let err = oracle.decide(&request).await.unwrap_err();
        assert!(matches!(err, WayfarerError::MalformedOracleOutput(_)));
    }
}
