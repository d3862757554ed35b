//! Shared types and pure logic for the front-desk triage agent.
//!
//! Everything here is deterministic and model-free: the clinical concept
//! library, the red-flag safety catalog, intent rules, identity verification,
//! conversation state with its invariants, and the wire contracts for the
//! model provider and the Turn API.

pub mod concepts;
pub mod config;
pub mod directory;
pub mod error;
pub mod evaluation;
pub mod intent;
pub mod llm;
pub mod plan;
pub mod prompts;
pub mod redflags;
pub mod rpc;
pub mod state;
pub mod verification;

pub use concepts::{extract, urgency_for_weight, ConceptMatch};
pub use config::{AgentConfig, ModelConfig, PracticeConfig};
pub use directory::{
    AppointmentSlot, BookingOutcome, PatientRecord, PracticeDirectory, RepeatMedication,
    ResultSensitivity, SlotStore, TestResult,
};
pub use error::AgentError;
pub use evaluation::TurnEvaluation;
pub use intent::{classify, Classification, Intent};
pub use llm::{
    ChatMessage, ChatRequest, ChatResponse, ChatRole, SamplingOptions, ToolCallRequest,
    ToolParamSpec, ToolSpec,
};
pub use plan::{CortexStep, Plan, MAX_CORTEX_STEPS};
pub use prompts::{
    cortex_system_prompt, forced_answer_prompt, judge_prompt, APOLOGY_FALLBACK,
};
pub use redflags::{
    scan, standard_protocols, EscalationTarget, RedFlagCategory, RedFlagProtocol,
};
pub use rpc::{HealthReport, TurnMetadata, TurnRequest, TurnResponse};
pub use state::{
    ConversationState, Message, MessageMeta, MessageRole, RouteTarget, UrgencyLevel,
    VerifiedIdentity,
};
pub use verification::{
    extract_identity, parse_dob, parse_name, parse_nhs_number, verify, ExtractedIdentity,
    MatchMethod, VerificationResult, MAX_VERIFICATION_ATTEMPTS,
};

/// Crate version, shared by daemon and ctl.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
