//! Model-call wire contract.
//!
//! Role-tagged messages plus an optional function-calling catalog in, free
//! text and/or tool-call requests out. Providers translate this to their own
//! transport; the cortex only ever sees these types.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }

    pub fn tool(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParamSpec {
    pub name: String,
    /// "string" | "number" | "boolean"
    pub param_type: String,
    pub required: bool,
    pub description: String,
}

/// Declarative tool description surfaced to the model as a catalog entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub parameters: Vec<ToolParamSpec>,
}

impl ToolSpec {
    /// Render for embedding in a system instruction.
    pub fn render(&self) -> String {
        let params = if self.parameters.is_empty() {
            "none".to_string()
        } else {
            self.parameters
                .iter()
                .map(|p| {
                    format!(
                        "{} ({}{}) - {}",
                        p.name,
                        p.param_type,
                        if p.required { ", required" } else { "" },
                        p.description
                    )
                })
                .collect::<Vec<_>>()
                .join("; ")
        };
        format!("- {}: {} | parameters: {}", self.name, self.description, params)
    }
}

/// Sampling options passed through to the provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SamplingOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolSpec>,
    #[serde(default)]
    pub options: SamplingOptions,
}

/// A tool invocation requested by the model. Arguments arrive as raw JSON
/// and are parsed defensively at the execution site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub arguments: serde_json::Value,
}

/// Provider response: free text, tool-call requests, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRequest>,
}

impl ChatResponse {
    /// No tool calls means the text is the final answer.
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}
