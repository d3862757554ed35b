//! Tool registry and execution context.
//!
//! Tools are self-contained operations registered once at startup; the
//! registry is immutable afterwards. Unknown names resolve to a typed error,
//! and an error inside a tool body is converted into a failed `ToolResult`
//! at the call site so the reasoning loop can react instead of crashing.

pub mod admin;
pub mod booking;
pub mod patient;
pub mod prescriptions;
pub mod results;
pub mod triage;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use frontdesk_common::config::PracticeConfig;
use frontdesk_common::directory::{PracticeDirectory, SlotStore};
use frontdesk_common::llm::ToolSpec;
use frontdesk_common::state::ConversationState;
use frontdesk_common::AgentError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

/// Result of a tool execution: a machine payload plus the human-readable
/// observation fed back into the reasoning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    pub data: Value,
    pub observation: String,
}

impl ToolResult {
    pub fn ok(observation: impl Into<String>, data: Value) -> Self {
        Self {
            success: true,
            data,
            observation: observation.into(),
        }
    }

    pub fn fail(observation: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Value::Null,
            observation: observation.into(),
        }
    }
}

/// An episodic memory entry saved during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub session_id: String,
    pub content: String,
    pub saved_at: DateTime<Utc>,
}

/// A clinician-facing flag raised during a turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClinicianAlert {
    pub session_id: String,
    pub severity: String,
    pub reason: String,
    pub raised_at: DateTime<Utc>,
}

/// A follow-up handed to the external task store at turn end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FollowUpTask {
    pub patient_id: String,
    pub description: String,
    pub due: String,
}

/// Shared execution context: the session state plus read-only snapshots and
/// the stores tools may touch. Built fresh at turn start.
pub struct ToolContext {
    pub state: ConversationState,
    pub directory: Arc<PracticeDirectory>,
    pub slots: SlotStore,
    pub practice: PracticeConfig,
    pub memory: Vec<MemoryEntry>,
    pub alerts: Vec<ClinicianAlert>,
    pub followups: Vec<FollowUpTask>,
    /// Set once a verification attempt has been consumed for the current
    /// caller message. One message costs at most one attempt, no matter how
    /// many identity checks run during the turn.
    pub verification_attempted: bool,
}

impl ToolContext {
    pub fn new(
        state: ConversationState,
        directory: Arc<PracticeDirectory>,
        slots: SlotStore,
        practice: PracticeConfig,
    ) -> Self {
        Self {
            state,
            directory,
            slots,
            practice,
            memory: Vec::new(),
            alerts: Vec::new(),
            followups: Vec::new(),
            verification_attempted: false,
        }
    }

    /// The verified patient's record, if any.
    pub fn verified_patient(&self) -> Option<&frontdesk_common::directory::PatientRecord> {
        self.state
            .identity
            .as_ref()
            .and_then(|i| self.directory.find_patient(&i.patient_id))
    }
}

/// A named, schema-described capability.
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Execute with defensively parsed parameters. Returning `Err` is
    /// allowed; the registry converts it into a failed result.
    async fn execute(&self, params: &Value, ctx: &mut ToolContext)
        -> anyhow::Result<ToolResult>;
}

/// Immutable map of registered tools.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
    /// Registration order, kept for stable catalog rendering.
    order: Vec<String>,
}

impl ToolRegistry {
    /// Build the standard registry. Called once at startup.
    pub fn standard() -> Self {
        let mut registry = Self {
            tools: HashMap::new(),
            order: Vec::new(),
        };
        registry.register(Box::new(patient::LookupPatientTool));
        registry.register(Box::new(patient::VerifyIdentityTool));
        registry.register(Box::new(patient::PatientHistoryTool));
        registry.register(Box::new(triage::TriageSymptomsTool));
        registry.register(Box::new(booking::FindSlotsTool));
        registry.register(Box::new(booking::BookAppointmentTool));
        registry.register(Box::new(prescriptions::RequestPrescriptionTool));
        registry.register(Box::new(results::GetTestResultsTool));
        registry.register(Box::new(admin::PracticeFaqTool));
        registry.register(Box::new(triage::RaiseClinicianAlertTool));
        registry.register(Box::new(admin::SaveMemoryTool));
        registry.register(Box::new(booking::ScheduleFollowupTool));
        registry
    }

    fn register(&mut self, tool: Box<dyn Tool>) {
        let name = tool.spec().name;
        self.order.push(name.clone());
        self.tools.insert(name, tool);
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// The declarative catalog, in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(|t| t.spec())
            .collect()
    }

    /// Execute a tool by name. Unknown names yield `ToolNotFound`; a failing
    /// tool body is degraded to a failed result, never an abort.
    pub async fn execute(
        &self,
        name: &str,
        params: &Value,
        ctx: &mut ToolContext,
    ) -> Result<ToolResult, AgentError> {
        let tool = self
            .tools
            .get(name)
            .ok_or_else(|| AgentError::ToolNotFound(name.to_string()))?;

        match tool.execute(params, ctx).await {
            Ok(result) => Ok(result),
            Err(e) => {
                warn!("[-]  tool '{}' failed: {}", name, e);
                Ok(ToolResult::fail(format!("Tool '{}' failed: {}", name, e)))
            }
        }
    }
}

/// Read a string parameter, tolerating absent or non-string values.
pub(crate) fn str_param<'a>(params: &'a Value, key: &str) -> Option<&'a str> {
    params.get(key).and_then(|v| v.as_str()).filter(|s| !s.is_empty())
}

#[cfg(test)]
pub(crate) mod testutil {
    use super::*;
    use chrono::NaiveDate;
    use frontdesk_common::directory::{
        AppointmentSlot, PatientRecord, RepeatMedication, ResultSensitivity, TestResult,
    };
    use frontdesk_common::state::VerifiedIdentity;

    /// A small fixture directory used across tool tests.
    pub fn fixture_directory() -> PracticeDirectory {
        PracticeDirectory {
            patients: vec![PatientRecord {
                patient_id: "P001".to_string(),
                full_name: "Sarah Mitchell".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1985, 5, 3).unwrap(),
                nhs_number: "4857773456".to_string(),
                phone: "07700900123".to_string(),
                repeat_medications: vec![
                    RepeatMedication {
                        name: "salbutamol".to_string(),
                        dose: "100mcg inhaler".to_string(),
                        directions: "two puffs as required".to_string(),
                    },
                    RepeatMedication {
                        name: "sertraline".to_string(),
                        dose: "50mg".to_string(),
                        directions: "one tablet daily".to_string(),
                    },
                ],
                history: vec![
                    "2026-07-12: asthma review, well controlled".to_string(),
                    "2026-03-02: viral URTI, self-care advice".to_string(),
                ],
            }],
            test_results: vec![
                TestResult {
                    patient_id: "P001".to_string(),
                    test_name: "Full blood count".to_string(),
                    taken_on: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
                    sensitivity: ResultSensitivity::Deliverable,
                    summary: "All values within normal range".to_string(),
                },
                TestResult {
                    patient_id: "P001".to_string(),
                    test_name: "Cervical screening".to_string(),
                    taken_on: NaiveDate::from_ymd_opt(2026, 8, 22).unwrap(),
                    sensitivity: ResultSensitivity::ClinicianOnly,
                    summary: "requires clinician discussion".to_string(),
                },
                TestResult {
                    patient_id: "P001".to_string(),
                    test_name: "Thyroid function".to_string(),
                    taken_on: NaiveDate::from_ymd_opt(2026, 8, 27).unwrap(),
                    sensitivity: ResultSensitivity::NotAvailable,
                    summary: String::new(),
                },
            ],
        }
    }

    pub fn fixture_slots() -> SlotStore {
        SlotStore::new(vec![
            AppointmentSlot {
                slot_id: "S1".to_string(),
                clinician: "Dr Patel".to_string(),
                start: NaiveDate::from_ymd_opt(2026, 9, 1)
                    .unwrap()
                    .and_hms_opt(9, 30, 0)
                    .unwrap(),
                available: true,
                booked_for: None,
            },
            AppointmentSlot {
                slot_id: "S2".to_string(),
                clinician: "Dr Okafor".to_string(),
                start: NaiveDate::from_ymd_opt(2026, 9, 1)
                    .unwrap()
                    .and_hms_opt(11, 0, 0)
                    .unwrap(),
                available: true,
                booked_for: None,
            },
        ])
    }

    pub fn context(verified: bool) -> ToolContext {
        let mut state = ConversationState::new("prac-1");
        if verified {
            state.mark_verified(VerifiedIdentity {
                patient_id: "P001".to_string(),
                full_name: "Sarah Mitchell".to_string(),
                date_of_birth: "1985-05-03".to_string(),
                method: "name_dob".to_string(),
            });
        }
        ToolContext::new(
            state,
            Arc::new(fixture_directory()),
            fixture_slots(),
            PracticeConfig::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_registry_contents() {
        let registry = ToolRegistry::standard();
        assert_eq!(registry.len(), 12);
        for name in [
            "lookup_patient",
            "verify_identity",
            "patient_history",
            "triage_symptoms",
            "find_slots",
            "book_appointment",
            "request_prescription",
            "get_test_results",
            "practice_faq",
            "raise_clinician_alert",
            "save_memory",
            "schedule_followup",
        ] {
            assert!(registry.contains(name), "missing tool {}", name);
        }
    }

    #[test]
    fn test_specs_in_registration_order() {
        let registry = ToolRegistry::standard();
        let specs = registry.specs();
        assert_eq!(specs.len(), registry.len());
        assert_eq!(specs[0].name, "lookup_patient");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_typed_error() {
        let registry = ToolRegistry::standard();
        let mut ctx = testutil::context(false);
        let err = registry
            .execute("frobnicate", &serde_json::json!({}), &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ToolNotFound(_)));
    }
}
