//! OpenAI chat-completions implementation of [`ReasoningEngine`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{EngineError, ReasoningEngine};
use crate::config::EngineConfig;
use crate::memory::{Turn, AI_PREFIX, HUMAN_PREFIX};

/// Default endpoint for OpenAI chat completions.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

/// Engine that talks to an OpenAI-compatible chat-completions API.
pub struct OpenAIEngine {
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    tools: Vec<String>,
    client: Client,
}

impl OpenAIEngine {
    /// Create an engine from configuration plus a resolved API key.
    pub fn from_config(cfg: &EngineConfig, api_key: String) -> Result<Self, EngineError> {
        Self::with_endpoint(cfg, api_key, cfg.endpoint.clone())
    }

    /// Create an engine against an explicit endpoint (used by tests to
    /// point at a mock server).
    pub fn with_endpoint(
        cfg: &EngineConfig,
        api_key: String,
        endpoint: String,
    ) -> Result<Self, EngineError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            api_key,
            endpoint,
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
            tools: cfg.tools.clone(),
            client,
        })
    }

    /// Render the turn history plus the new prompt as an
    /// OpenAI-format message array.
    fn build_messages(&self, context: &[Turn], prompt: &str) -> Vec<serde_json::Value> {
        let mut messages = Vec::with_capacity(context.len() * 2 + 2);

        let mut system = String::from(
            "You are a helpful conversational assistant. \
             Answer the user directly and concisely.",
        );
        if !self.tools.is_empty() {
            system.push_str(&format!(
                " You may consult these auxiliary tools when useful: {}.",
                self.tools.join(", ")
            ));
        }
        messages.push(json!({ "role": "system", "content": system }));

        for turn in context {
            let human = turn.key.strip_prefix(HUMAN_PREFIX).unwrap_or(&turn.key);
            let ai = turn.value.strip_prefix(AI_PREFIX).unwrap_or(&turn.value);
            messages.push(json!({ "role": "user", "content": human }));
            messages.push(json!({ "role": "assistant", "content": ai }));
        }

        messages.push(json!({ "role": "user", "content": prompt }));
        messages
    }
}

#[async_trait]
impl ReasoningEngine for OpenAIEngine {
    async fn complete(&self, context: &[Turn], prompt: &str) -> Result<String, EngineError> {
        let body = json!({
            "model": self.model,
            "messages": self.build_messages(context, prompt),
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });

        debug!(model = %self.model, turns = context.len(), "sending completion request");

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(EngineError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| EngineError::Malformed(e.to_string()))?;

        let content = json["choices"][0]["message"]["content"]
            .as_str()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| EngineError::Malformed("no completion content".to_string()))?;

        Ok(content.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_messages_strips_role_prefixes() {
        let cfg = EngineConfig::default();
        let engine =
            OpenAIEngine::with_endpoint(&cfg, "k".into(), DEFAULT_ENDPOINT.into()).unwrap();
        let context = vec![Turn::exchange("hi", "hello")];
        let messages = engine.build_messages(&context, "how are you?");

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "hi");
        assert_eq!(messages[2]["role"], "assistant");
        assert_eq!(messages[2]["content"], "hello");
        assert_eq!(messages[3]["content"], "how are you?");
    }

    #[test]
    fn system_prompt_mentions_configured_tools() {
        let cfg = EngineConfig::default();
        let engine =
            OpenAIEngine::with_endpoint(&cfg, "k".into(), DEFAULT_ENDPOINT.into()).unwrap();
        let messages = engine.build_messages(&[], "hi");
        let system = messages[0]["content"].as_str().unwrap();
        assert!(system.contains("search"));
        assert!(system.contains("calculator"));
    }
}
