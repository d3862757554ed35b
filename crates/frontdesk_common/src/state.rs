//! Conversation state for a front-desk session.
//!
//! The state is created by the turn orchestrator at session start, passed by
//! value through every turn, and returned mutated. No other component creates
//! or destroys it. Three invariants are enforced here rather than trusted to
//! callers:
//!
//! - urgency and the escalation flag are monotonic within a session
//! - identity is immutable once verified; the verified flag is never unset
//! - the message log is append-only

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::concepts::ConceptMatch;
use crate::intent::Intent;

/// Clinical urgency tier. Ordering matters: `Emergency` is the highest and
/// comparisons drive the monotonic-raise rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum UrgencyLevel {
    #[default]
    Routine,
    /// Should be seen within days.
    Soon,
    /// Same-day clinical attention.
    Urgent,
    /// Immediate escalation (999 / duty clinician / crisis line).
    Emergency,
}

impl UrgencyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Routine => "routine",
            Self::Soon => "soon",
            Self::Urgent => "urgent",
            Self::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Where the current turn is routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RouteTarget {
    #[default]
    FrontDesk,
    /// Emergency escalation handler. Set by the safety engine and never
    /// overridden for the remainder of the turn.
    Escalation,
    DutyClinician,
    Reception,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageRole {
    User,
    Assistant,
    Tool,
}

/// Optional structured annotations carried on a message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MessageMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency: Option<UrgencyLevel>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concept_codes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
}

/// A single turn in the session log. Immutable once appended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MessageMeta>,
}

impl Message {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: MessageMeta) -> Self {
        self.meta = Some(meta);
        self
    }
}

/// Identity fields fixed at verification time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifiedIdentity {
    pub patient_id: String,
    pub full_name: String,
    pub date_of_birth: String,
    /// Which factor combination verified the patient.
    pub method: String,
}

/// The session's evolving record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub session_id: String,
    pub practice_id: String,
    pub patient_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity: Option<VerifiedIdentity>,
    pub verification_attempts: u32,
    pub messages: Vec<Message>,
    pub intent: Intent,
    pub intent_confidence: f64,
    pub route: RouteTarget,
    /// Accumulated concept matches, deduplicated by code.
    pub symptoms: Vec<ConceptMatch>,
    pub urgency: UrgencyLevel,
    /// Names of every red-flag protocol that fired this session.
    pub red_flags: Vec<String>,
    pub safety_netting_applied: Vec<String>,
    pub actions_taken: Vec<String>,
    pub escalation_required: bool,
    pub resolved: bool,
}

impl ConversationState {
    pub fn new(practice_id: impl Into<String>) -> Self {
        Self {
            session_id: Uuid::new_v4().to_string(),
            practice_id: practice_id.into(),
            patient_verified: false,
            identity: None,
            verification_attempts: 0,
            messages: Vec::new(),
            intent: Intent::Unknown,
            intent_confidence: 0.0,
            route: RouteTarget::FrontDesk,
            symptoms: Vec::new(),
            urgency: UrgencyLevel::Routine,
            red_flags: Vec::new(),
            safety_netting_applied: Vec::new(),
            actions_taken: Vec::new(),
            escalation_required: false,
            resolved: false,
        }
    }

    /// Append a message. The log is append-only; there is deliberately no
    /// removal or mutation API.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Raise urgency toward a higher tier. Lower or equal tiers are ignored,
    /// so a turn can never downgrade what the safety engine already set.
    pub fn raise_urgency(&mut self, level: UrgencyLevel) {
        if level > self.urgency {
            self.urgency = level;
        }
    }

    /// Set the escalation flag and route. Sticky for the session.
    pub fn require_escalation(&mut self) {
        self.escalation_required = true;
        self.route = RouteTarget::Escalation;
        self.raise_urgency(UrgencyLevel::Emergency);
    }

    /// Record a successful identity verification. The first verification
    /// wins: later calls cannot replace the identity or clear the flag.
    pub fn mark_verified(&mut self, identity: VerifiedIdentity) {
        if self.patient_verified {
            return;
        }
        self.patient_verified = true;
        self.identity = Some(identity);
    }

    /// Merge newly extracted concepts into the symptom list, skipping codes
    /// already present.
    pub fn merge_symptoms(&mut self, matches: &[ConceptMatch]) {
        for m in matches {
            if !self.symptoms.iter().any(|s| s.code == m.code) {
                self.symptoms.push(m.clone());
            }
        }
    }

    pub fn record_red_flag(&mut self, protocol_id: &str) {
        if !self.red_flags.iter().any(|f| f == protocol_id) {
            self.red_flags.push(protocol_id.to_string());
        }
    }

    pub fn record_action(&mut self, action: impl Into<String>) {
        self.actions_taken.push(action.into());
    }

    pub fn record_safety_netting(&mut self, statement: impl Into<String>) {
        self.safety_netting_applied.push(statement.into());
    }

    /// Update the classified intent, honoring the anti-flap threshold: a new
    /// classification below 0.5 confidence keeps the previous intent.
    pub fn update_intent(&mut self, intent: Intent, confidence: f64) {
        if self.intent == Intent::Unknown || confidence > 0.5 {
            self.intent = intent;
            self.intent_confidence = confidence;
        }
    }

    /// Trailing user/assistant turns for prompt context.
    pub fn recent_dialogue(&self, max: usize) -> Vec<&Message> {
        self.messages
            .iter()
            .filter(|m| m.role != MessageRole::Tool)
            .rev()
            .take(max)
            .collect::<Vec<_>>()
            .into_iter()
            .rev()
            .collect()
    }
}
