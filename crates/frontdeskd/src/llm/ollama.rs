//! Ollama chat provider.
//!
//! Robust parsing that tolerates common model output variations: tool calls
//! in the native `tool_calls` field, tool calls embedded in the text as JSON,
//! arguments as objects or as serialized strings, and prose wrapped around
//! JSON. Malformed arguments degrade to an empty object rather than failing
//! the call.

use async_trait::async_trait;
use frontdesk_common::llm::{
    ChatRequest, ChatResponse, ChatRole, ToolCallRequest,
};
use frontdesk_common::AgentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::ModelProvider;

#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

/// Ollama-backed model provider with a per-call timeout.
pub struct OllamaProvider {
    http_client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    pub fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    fn role_str(role: ChatRole) -> &'static str {
        match role {
            ChatRole::System => "system",
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
            ChatRole::Tool => "tool",
        }
    }

    /// Render the declarative tool catalog as Ollama function specs.
    fn render_tools(request: &ChatRequest) -> Option<Vec<Value>> {
        if request.tools.is_empty() {
            return None;
        }
        let specs = request
            .tools
            .iter()
            .map(|t| {
                let mut properties = serde_json::Map::new();
                let mut required = Vec::new();
                for p in &t.parameters {
                    properties.insert(
                        p.name.clone(),
                        serde_json::json!({
                            "type": p.param_type,
                            "description": p.description,
                        }),
                    );
                    if p.required {
                        required.push(Value::String(p.name.clone()));
                    }
                }
                serde_json::json!({
                    "type": "function",
                    "function": {
                        "name": t.name,
                        "description": t.description,
                        "parameters": {
                            "type": "object",
                            "properties": properties,
                            "required": required,
                        }
                    }
                })
            })
            .collect();
        Some(specs)
    }

    /// Parse a single raw tool-call value. Arguments may be an object or a
    /// serialized string; anything else becomes an empty object.
    fn parse_tool_call(raw: &Value) -> Option<ToolCallRequest> {
        let function = raw.get("function").unwrap_or(raw);
        let name = function.get("name").and_then(|n| n.as_str())?.to_string();
        let arguments = match function.get("arguments") {
            Some(Value::Object(map)) => Value::Object(map.clone()),
            Some(Value::String(s)) => serde_json::from_str::<Value>(s)
                .ok()
                .filter(Value::is_object)
                .unwrap_or_else(|| serde_json::json!({})),
            _ => serde_json::json!({}),
        };
        Some(ToolCallRequest { name, arguments })
    }

    /// Some models emit `{"tool_calls": [...]}` as text instead of using the
    /// native field. Extract those, tolerating surrounding prose.
    fn tool_calls_from_text(text: &str) -> Vec<ToolCallRequest> {
        let json_text = match (text.find('{'), text.rfind('}')) {
            (Some(start), Some(end)) if end > start => &text[start..=end],
            _ => return Vec::new(),
        };
        let Ok(v) = serde_json::from_str::<Value>(json_text) else {
            return Vec::new();
        };
        v.get("tool_calls")
            .and_then(|tc| tc.as_array())
            .map(|arr| arr.iter().filter_map(Self::parse_tool_call).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ModelProvider for OllamaProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        let url = format!("{}/api/chat", self.endpoint);

        let mut options = serde_json::Map::new();
        if let Some(t) = request.options.temperature {
            options.insert("temperature".to_string(), serde_json::json!(t));
        }
        if let Some(n) = request.options.max_tokens {
            options.insert("num_predict".to_string(), serde_json::json!(n));
        }

        let body = OllamaChatRequest {
            model: self.model.clone(),
            messages: request
                .messages
                .iter()
                .map(|m| OllamaMessage {
                    role: Self::role_str(m.role).to_string(),
                    content: m.content.clone(),
                    tool_calls: None,
                })
                .collect(),
            stream: false,
            tools: Self::render_tools(&request),
            options: if options.is_empty() {
                None
            } else {
                Some(Value::Object(options))
            },
        };

        info!(
            "[>]  LLM CALL [{}] ({} messages, {} tools)",
            self.model,
            request.messages.len(),
            request.tools.len()
        );

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AgentError::Provider(format!("request to {} failed: {}", self.model, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AgentError::Provider(format!(
                "{} returned {}: {}",
                self.model, status, error_text
            )));
        }

        let chat: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| AgentError::Provider(format!("unparseable response: {}", e)))?;

        let mut tool_calls: Vec<ToolCallRequest> = chat
            .message
            .tool_calls
            .as_deref()
            .unwrap_or_default()
            .iter()
            .filter_map(Self::parse_tool_call)
            .collect();

        // Fall back to text-embedded tool calls when the native field is empty.
        if tool_calls.is_empty() {
            tool_calls = Self::tool_calls_from_text(&chat.message.content);
            if !tool_calls.is_empty() {
                debug!("extracted {} tool call(s) from text", tool_calls.len());
            }
        }

        info!(
            "[<]  LLM RESPONSE ({} chars, {} tool calls)",
            chat.message.content.len(),
            tool_calls.len()
        );

        let text = if tool_calls.is_empty() {
            chat.message.content
        } else {
            // Tool-call turns keep any accompanying reasoning text only.
            strip_tool_call_json(&chat.message.content)
        };

        Ok(ChatResponse { text, tool_calls })
    }

    async fn is_available(&self) -> bool {
        let url = format!("{}/api/tags", self.endpoint);
        match self.http_client.get(&url).send().await {
            Ok(r) => r.status().is_success(),
            Err(e) => {
                warn!("[-]  provider {} unavailable: {}", self.model, e);
                false
            }
        }
    }

    fn name(&self) -> &str {
        &self.model
    }
}

/// Remove an embedded tool-call JSON object, keeping surrounding prose.
fn strip_tool_call_json(text: &str) -> String {
    match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            format!("{}{}", &text[..start], &text[end + 1..])
                .trim()
                .to_string()
        }
        _ => text.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use frontdesk_common::llm::{ToolParamSpec, ToolSpec};

    #[test]
    fn test_parse_tool_call_object_args() {
        let raw = serde_json::json!({
            "function": {"name": "find_slots", "arguments": {"clinician": "Dr Patel"}}
        });
        let call = OllamaProvider::parse_tool_call(&raw).unwrap();
        assert_eq!(call.name, "find_slots");
        assert_eq!(call.arguments["clinician"], "Dr Patel");
    }

    #[test]
    fn test_parse_tool_call_string_args() {
        let raw = serde_json::json!({
            "function": {"name": "book_appointment", "arguments": "{\"slot_id\": \"S1\"}"}
        });
        let call = OllamaProvider::parse_tool_call(&raw).unwrap();
        assert_eq!(call.arguments["slot_id"], "S1");
    }

    #[test]
    fn test_parse_tool_call_malformed_args_become_empty() {
        let raw = serde_json::json!({
            "function": {"name": "save_memory", "arguments": "not json at all"}
        });
        let call = OllamaProvider::parse_tool_call(&raw).unwrap();
        assert_eq!(call.arguments, serde_json::json!({}));
    }

    #[test]
    fn test_parse_tool_call_missing_name() {
        let raw = serde_json::json!({"function": {"arguments": {}}});
        assert!(OllamaProvider::parse_tool_call(&raw).is_none());
    }

    #[test]
    fn test_tool_calls_from_text() {
        let text = r#"Let me check. {"tool_calls": [{"name": "lookup_patient", "arguments": {"patient_id": "P001"}}]}"#;
        let calls = OllamaProvider::tool_calls_from_text(text);
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "lookup_patient");
    }

    #[test]
    fn test_tool_calls_from_plain_text() {
        assert!(OllamaProvider::tool_calls_from_text("Your appointment is booked.").is_empty());
    }

    #[test]
    fn test_render_tools() {
        let request = ChatRequest {
            messages: vec![],
            tools: vec![ToolSpec {
                name: "find_slots".to_string(),
                description: "search".to_string(),
                parameters: vec![ToolParamSpec {
                    name: "date".to_string(),
                    param_type: "string".to_string(),
                    required: true,
                    description: "preferred date".to_string(),
                }],
            }],
            options: Default::default(),
        };
        let tools = OllamaProvider::render_tools(&request).unwrap();
        assert_eq!(tools[0]["function"]["name"], "find_slots");
        assert_eq!(tools[0]["function"]["parameters"]["required"][0], "date");
    }

    #[test]
    fn test_strip_tool_call_json() {
        let text = r#"Checking now. {"tool_calls": []} One moment."#;
        assert_eq!(strip_tool_call_json(text), "Checking now.  One moment.".trim());
    }
}
