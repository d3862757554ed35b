//! Slot search, booking and follow-up scheduling tools.

use async_trait::async_trait;
use frontdesk_common::directory::BookingOutcome;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use serde_json::{json, Value};

use super::{str_param, FollowUpTask, Tool, ToolContext, ToolResult};

/// List available appointment slots.
pub struct FindSlotsTool;

#[async_trait]
impl Tool for FindSlotsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "find_slots".to_string(),
            description: "Search available appointment slots, soonest first.".to_string(),
            parameters: vec![ToolParamSpec {
                name: "clinician".to_string(),
                param_type: "string".to_string(),
                required: false,
                description: "restrict to a preferred clinician".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let clinician = str_param(params, "clinician");
        let mut slots = ctx.slots.available();
        if let Some(c) = clinician {
            let wanted = c.to_lowercase();
            slots.retain(|s| s.clinician.to_lowercase().contains(&wanted));
        }

        if slots.is_empty() {
            return Ok(ToolResult::ok(
                "No matching slots are currently available.",
                json!({"slots": []}),
            ));
        }

        let listed = slots
            .iter()
            .take(5)
            .map(|s| {
                format!(
                    "{}: {} with {}",
                    s.slot_id,
                    s.start.format("%A %e %B at %H:%M"),
                    s.clinician
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        Ok(ToolResult::ok(
            format!("Available slots:\n{}", listed),
            json!({"slots": slots}),
        ))
    }
}

/// Book a slot for the verified caller. Rejected for unverified sessions;
/// the availability check and write are one conditional update in the store.
pub struct BookAppointmentTool;

#[async_trait]
impl Tool for BookAppointmentTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "book_appointment".to_string(),
            description: "Book a specific slot for the verified caller. Requires prior \
                          identity verification and a slot_id from find_slots."
                .to_string(),
            parameters: vec![
                ToolParamSpec {
                    name: "slot_id".to_string(),
                    param_type: "string".to_string(),
                    required: true,
                    description: "the slot to book".to_string(),
                },
                ToolParamSpec {
                    name: "reason".to_string(),
                    param_type: "string".to_string(),
                    required: false,
                    description: "brief reason for the visit".to_string(),
                },
            ],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        if !ctx.state.patient_verified {
            return Ok(ToolResult::fail(
                "Booking requires identity verification. Use verify_identity first.",
            ));
        }
        let Some(slot_id) = str_param(params, "slot_id") else {
            return Ok(ToolResult::fail("Missing slot_id. Use find_slots to pick one."));
        };
        let patient_id = ctx
            .state
            .identity
            .as_ref()
            .map(|i| i.patient_id.clone())
            .unwrap_or_default();

        match ctx.slots.try_book(slot_id, &patient_id) {
            BookingOutcome::Booked {
                slot_id,
                clinician,
                start,
            } => {
                ctx.state.record_action(format!("booked:{}", slot_id));
                Ok(ToolResult::ok(
                    format!("Booked {} with {} for {}.", start, clinician, patient_id),
                    json!({"slot_id": slot_id, "clinician": clinician, "start": start}),
                ))
            }
            BookingOutcome::SlotUnavailable { slot_id } => Ok(ToolResult::fail(format!(
                "Slot {} is no longer available. Use find_slots for alternatives.",
                slot_id
            ))),
            BookingOutcome::UnknownSlot { slot_id } => Ok(ToolResult::fail(format!(
                "Slot {} does not exist. Use find_slots for current availability.",
                slot_id
            ))),
        }
    }
}

/// Hand a follow-up to the external task store.
pub struct ScheduleFollowupTool;

#[async_trait]
impl Tool for ScheduleFollowupTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "schedule_followup".to_string(),
            description: "Schedule a follow-up contact for the verified caller (handled by \
                          the practice task system)."
                .to_string(),
            parameters: vec![
                ToolParamSpec {
                    name: "description".to_string(),
                    param_type: "string".to_string(),
                    required: true,
                    description: "what the follow-up is for".to_string(),
                },
                ToolParamSpec {
                    name: "due".to_string(),
                    param_type: "string".to_string(),
                    required: false,
                    description: "when it is due, e.g. 'in 2 weeks' (default 'in 1 week')"
                        .to_string(),
                },
            ],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(identity) = ctx.state.identity.clone() else {
            return Ok(ToolResult::fail(
                "Follow-ups require identity verification. Use verify_identity first.",
            ));
        };
        let description = str_param(params, "description").unwrap_or("follow-up").to_string();
        let due = str_param(params, "due").unwrap_or("in 1 week").to_string();

        ctx.followups.push(FollowUpTask {
            patient_id: identity.patient_id.clone(),
            description: description.clone(),
            due: due.clone(),
        });
        ctx.state.record_action("followup_scheduled");

        Ok(ToolResult::ok(
            format!("Follow-up scheduled {} for {}: {}", due, identity.full_name, description),
            json!({"due": due, "description": description}),
        ))
    }
}
