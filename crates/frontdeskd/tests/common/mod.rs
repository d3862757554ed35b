//! Shared fixtures for the integration suites: a scripted model provider
//! and a fully wired turn engine backed by the demo practice data.

use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use frontdesk_common::config::AgentConfig;
use frontdesk_common::directory::SlotStore;
use frontdesk_common::llm::{ChatRequest, ChatResponse, ToolCallRequest};
use frontdesk_common::AgentError;
use frontdeskd::llm::ModelProvider;
use frontdeskd::seed;
use frontdeskd::turn::TurnEngine;

/// Pops pre-configured responses in order; repeats the last one when the
/// script runs out (so the post-hoc judge call never panics).
pub struct ScriptedProvider {
    script: Mutex<Vec<ChatResponse>>,
    last: ChatResponse,
}

impl ScriptedProvider {
    pub fn new(mut responses: Vec<ChatResponse>) -> Self {
        let last = responses.last().cloned().unwrap_or_default();
        responses.reverse();
        Self {
            script: Mutex::new(responses),
            last,
        }
    }
}

#[async_trait]
impl ModelProvider for ScriptedProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        // The post-hoc judge call must not consume the scripted turn; answer
        // it with fixed scores so the scripts stay aligned with the cortex.
        if request
            .messages
            .first()
            .map(|m| m.content.contains("auditing a medical front-desk agent"))
            .unwrap_or(false)
        {
            return Ok(ChatResponse {
                text: r#"{"overall_score": 8, "clinical_safety": 9, "patient_experience": 8, "efficiency": 7, "reasoning": "scripted"}"#.to_string(),
                tool_calls: vec![],
            });
        }
        let mut script = self.script.lock().unwrap();
        Ok(script.pop().unwrap_or_else(|| self.last.clone()))
    }
    async fn is_available(&self) -> bool {
        true
    }
    fn name(&self) -> &str {
        "scripted"
    }
}

/// Provider that always fails; exercises degraded paths.
pub struct DeadProvider;

#[async_trait]
impl ModelProvider for DeadProvider {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, AgentError> {
        Err(AgentError::Provider("down".to_string()))
    }
    async fn is_available(&self) -> bool {
        false
    }
    fn name(&self) -> &str {
        "dead"
    }
}

pub fn tool_call(name: &str, args: serde_json::Value) -> ChatResponse {
    ChatResponse {
        text: String::new(),
        tool_calls: vec![ToolCallRequest {
            name: name.to_string(),
            arguments: args,
        }],
    }
}

pub fn final_text(text: &str) -> ChatResponse {
    ChatResponse {
        text: text.to_string(),
        tool_calls: vec![],
    }
}

/// Test config with the spool pointed at a throwaway directory.
pub fn test_config(spool: &tempfile::TempDir) -> AgentConfig {
    let mut config = AgentConfig::with_defaults();
    config.spool_dir = spool.path().to_string_lossy().to_string();
    config
}

/// A turn engine over the demo directory with the given provider.
pub fn engine(provider: Arc<dyn ModelProvider>, spool: &tempfile::TempDir) -> TurnEngine {
    TurnEngine::new(
        test_config(spool),
        provider,
        Arc::new(seed::demo_directory()),
        seed::demo_slots(),
    )
}

/// Same, but sharing an externally owned slot store between engines.
pub fn engine_with_slots(
    provider: Arc<dyn ModelProvider>,
    slots: SlotStore,
    spool: &tempfile::TempDir,
) -> TurnEngine {
    TurnEngine::new(
        test_config(spool),
        provider,
        Arc::new(seed::demo_directory()),
        slots,
    )
}
