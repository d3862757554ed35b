//! Turn API wire types shared by the daemon and the ctl client.

use serde::{Deserialize, Serialize};

use crate::evaluation::TurnEvaluation;
use crate::intent::Intent;
use crate::plan::Plan;
use crate::state::{ConversationState, UrgencyLevel};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnRequest {
    pub message: String,
    /// Round-tripped state for multi-turn conversations; absent on the first
    /// message of a session.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_state: Option<ConversationState>,
}

/// Per-turn metadata surfaced to callers and logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnMetadata {
    pub intent: Intent,
    pub intent_confidence: f64,
    pub urgency: UrgencyLevel,
    pub patient_verified: bool,
    pub escalation_required: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub red_flags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions_taken: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnResponse {
    pub response: String,
    /// Which handler produced the reply ("cortex" or "safety").
    pub agent: String,
    pub metadata: TurnMetadata,
    pub plan: Plan,
    pub evaluation: TurnEvaluation,
    pub conversation_state: ConversationState,
}

/// Daemon health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthReport {
    pub version: String,
    pub provider_available: bool,
    pub registered_tools: usize,
}
