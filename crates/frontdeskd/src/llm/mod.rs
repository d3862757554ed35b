//! Model provider abstraction.
//!
//! The cortex only talks to `ModelProvider`; production wires an Ollama
//! client behind a primary->fallback chain, tests use a scripted provider.
//! A turn can never hang on inference: each provider call carries its own
//! timeout and the chain degrades to a typed error the turn layer turns into
//! a fixed apology.

pub mod ollama;

use async_trait::async_trait;
use frontdesk_common::llm::{ChatRequest, ChatResponse};
use frontdesk_common::AgentError;
use tracing::warn;

pub use ollama::OllamaProvider;

/// Minimal interface the reasoning loop needs from a language model.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Submit a chat request; the response is free text and/or tool calls.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError>;

    /// Cheap liveness check for health reporting.
    async fn is_available(&self) -> bool;

    /// Provider name for logs and metadata.
    fn name(&self) -> &str;
}

/// Primary -> secondary provider chain.
///
/// The secondary is tried once after any primary failure; if both fail the
/// error propagates as `AgentError::Provider` and the turn layer substitutes
/// the apology string. Raw errors never reach the caller.
pub struct FallbackProvider {
    primary: Box<dyn ModelProvider>,
    secondary: Box<dyn ModelProvider>,
}

impl FallbackProvider {
    pub fn new(primary: Box<dyn ModelProvider>, secondary: Box<dyn ModelProvider>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl ModelProvider for FallbackProvider {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, AgentError> {
        match self.primary.chat(request.clone()).await {
            Ok(response) => Ok(response),
            Err(primary_err) => {
                warn!(
                    "[-]  primary provider '{}' failed ({}), trying '{}'",
                    self.primary.name(),
                    primary_err,
                    self.secondary.name()
                );
                self.secondary.chat(request).await.map_err(|secondary_err| {
                    AgentError::Provider(format!(
                        "primary: {}; fallback: {}",
                        primary_err, secondary_err
                    ))
                })
            }
        }
    }

    async fn is_available(&self) -> bool {
        self.primary.is_available().await || self.secondary.is_available().await
    }

    fn name(&self) -> &str {
        "fallback_chain"
    }
}
