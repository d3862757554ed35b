//! Typed failure taxonomy for the agent core.
//!
//! Only `Provider` can surface from the reasoning loop, and the turn layer
//! degrades it to a fixed apology; the rest are recorded and recovered at
//! their call sites.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// Model call failed after the full fallback chain.
    #[error("model provider failed: {0}")]
    Provider(String),

    /// The model requested a tool that is not in the registry.
    #[error("unknown tool: {0}")]
    ToolNotFound(String),

    /// A tool body failed; converted into a failed ToolResult at the call
    /// site, never aborts the loop.
    #[error("tool '{tool}' failed: {message}")]
    ToolExecution { tool: String, message: String },

    /// Three failed identity attempts. Terminal; forces escalation routing.
    #[error("identity verification exhausted after {attempts} attempts")]
    VerificationExhausted { attempts: u32 },

    /// Judge call failed or returned unparseable output.
    #[error("evaluation failed: {0}")]
    Evaluation(String),

    #[error("configuration error: {0}")]
    Config(String),
}
