//! The bounded ReAct orchestration loop.
//!
//! Each iteration submits the system instruction plus the running history to
//! the model. Tool requests execute strictly sequentially in the requested
//! order, each observation appended as a tool turn before the next model
//! call. The loop terminates on a final text answer, or on the step budget:
//! one forced answer-now call, then the fixed apology. A failing tool or an
//! unknown tool name is recorded as a failed step and the loop continues.

use std::sync::Arc;
use std::time::Instant;

use frontdesk_common::llm::{ChatMessage, ChatRequest, SamplingOptions};
use frontdesk_common::plan::{CortexStep, Plan};
use frontdesk_common::prompts::{self, APOLOGY_FALLBACK};
use frontdesk_common::state::MessageRole;
use frontdesk_common::AgentError;
use tracing::{info, warn};

use crate::llm::ModelProvider;
use crate::tools::{ToolContext, ToolRegistry};

/// What the loop produced: the reply text plus the inspectable plan.
#[derive(Debug)]
pub struct CortexOutcome {
    pub response: String,
    pub plan: Plan,
    /// True when the reply is the degraded apology (all providers failed).
    pub degraded: bool,
}

pub struct CortexEngine {
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    step_cap: usize,
}

impl CortexEngine {
    pub fn new(provider: Arc<dyn ModelProvider>, registry: Arc<ToolRegistry>, step_cap: usize) -> Self {
        Self {
            provider,
            registry,
            step_cap,
        }
    }

    /// Run the loop for one turn. The user message is already appended to
    /// the conversation state by the turn orchestrator.
    pub async fn run(&self, ctx: &mut ToolContext, user_message: &str) -> CortexOutcome {
        let mut plan = Plan::new(user_message);
        // Tool observations accumulated this turn, visible to every
        // subsequent model call.
        let mut turn_messages: Vec<ChatMessage> = Vec::new();

        loop {
            let request = self.build_request(ctx, user_message, &turn_messages, None);
            let response = match self.provider.chat(request).await {
                Ok(r) => r,
                Err(e) => {
                    warn!("[-]  cortex model call failed: {}", e);
                    return CortexOutcome {
                        response: APOLOGY_FALLBACK.to_string(),
                        plan,
                        degraded: true,
                    };
                }
            };

            if response.is_final() {
                let text = response.text.trim().to_string();
                if !text.is_empty() {
                    info!(
                        "[=]  cortex final answer after {} step(s)",
                        plan.total_steps()
                    );
                    return CortexOutcome {
                        response: text,
                        plan,
                        degraded: false,
                    };
                }
                // Degenerate: no tools and no text. Force an answer.
                warn!("[!]  empty final response; forcing answer");
                break;
            }

            if !response.text.is_empty() {
                turn_messages.push(ChatMessage::assistant(response.text.clone()));
            }

            // Execute requested tools strictly in order; each observation is
            // recorded before the next tool runs.
            for call in &response.tool_calls {
                if plan.total_steps() >= self.step_cap {
                    warn!("[!]  step budget reached mid-batch; dropping remaining calls");
                    break;
                }

                let started = Instant::now();
                let (observation, success) =
                    match self.registry.execute(&call.name, &call.arguments, ctx).await {
                        Ok(result) => (result.observation, result.success),
                        Err(AgentError::ToolNotFound(name)) => (
                            format!(
                                "Unknown tool '{}'. Available tools: {}.",
                                name,
                                self.registry
                                    .specs()
                                    .iter()
                                    .map(|s| s.name.clone())
                                    .collect::<Vec<_>>()
                                    .join(", ")
                            ),
                            false,
                        ),
                        Err(e) => (format!("Tool execution error: {}", e), false),
                    };

                info!(
                    "[T]  step {} tool={} success={}",
                    plan.total_steps() + 1,
                    call.name,
                    success
                );

                plan.record(CortexStep {
                    step: 0,
                    reasoning: response.text.clone(),
                    tool: call.name.clone(),
                    input: call.arguments.clone(),
                    observation: observation.clone(),
                    success,
                    duration_ms: started.elapsed().as_millis() as u64,
                });

                turn_messages.push(ChatMessage::tool(format!(
                    "[{}] {}",
                    call.name, observation
                )));
            }

            if plan.total_steps() >= self.step_cap {
                break;
            }
        }

        // Budget exhausted (or degenerate empty answer): one forced
        // answer-now call using everything gathered so far.
        info!(
            "[!]  forcing final answer after {} step(s)",
            plan.total_steps()
        );
        let request = self.build_request(
            ctx,
            user_message,
            &turn_messages,
            Some(prompts::forced_answer_prompt()),
        );
        match self.provider.chat(request).await {
            Ok(response) if !response.text.trim().is_empty() => CortexOutcome {
                response: response.text.trim().to_string(),
                plan,
                degraded: false,
            },
            Ok(_) | Err(_) => CortexOutcome {
                response: APOLOGY_FALLBACK.to_string(),
                plan,
                degraded: true,
            },
        }
    }

    /// Assemble the request: system instruction, trailing dialogue, the
    /// current message, this turn's observations, and optionally the forced
    /// answer-now instruction. The forced call carries no tool catalog.
    fn build_request(
        &self,
        ctx: &ToolContext,
        user_message: &str,
        turn_messages: &[ChatMessage],
        forced: Option<String>,
    ) -> ChatRequest {
        let system = prompts::cortex_system_prompt(&ctx.practice, &self.registry.specs(), &ctx.state);

        let mut messages = vec![ChatMessage::system(system)];
        for m in ctx.state.recent_dialogue(8) {
            match m.role {
                MessageRole::User => messages.push(ChatMessage::user(m.content.clone())),
                MessageRole::Assistant => messages.push(ChatMessage::assistant(m.content.clone())),
                MessageRole::Tool => {}
            }
        }
        if !ctx
            .state
            .messages
            .iter()
            .any(|m| m.role == MessageRole::User && m.content == user_message)
        {
            messages.push(ChatMessage::user(user_message.to_string()));
        }
        messages.extend_from_slice(turn_messages);

        let forced_call = forced.is_some();
        if let Some(instruction) = forced {
            messages.push(ChatMessage::system(instruction));
        }

        ChatRequest {
            messages,
            tools: if forced_call {
                Vec::new()
            } else {
                self.registry.specs()
            },
            options: SamplingOptions {
                temperature: Some(0.3),
                max_tokens: None,
            },
        }
    }
}
