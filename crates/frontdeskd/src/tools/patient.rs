//! Patient lookup, identity verification and history tools.

use async_trait::async_trait;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use frontdesk_common::state::VerifiedIdentity;
use frontdesk_common::verification::{self, MAX_VERIFICATION_ATTEMPTS};
use serde_json::{json, Value};

use super::{str_param, Tool, ToolContext, ToolResult};

/// Look up the verified caller's demographic record.
pub struct LookupPatientTool;

#[async_trait]
impl Tool for LookupPatientTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "lookup_patient".to_string(),
            description: "Retrieve the verified caller's registration details (name, DOB, \
                          phone, registered medications). Requires prior identity verification."
                .to_string(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(patient) = ctx.verified_patient() else {
            return Ok(ToolResult::fail(
                "Caller is not verified. Use verify_identity first.",
            ));
        };
        let data = json!({
            "patient_id": patient.patient_id,
            "full_name": patient.full_name,
            "date_of_birth": patient.date_of_birth.to_string(),
            "phone": patient.phone,
            "repeat_medications": patient.repeat_medications,
        });
        let observation = format!(
            "Patient {} ({}), DOB {}, phone {}. {} repeat medication(s) on file.",
            patient.full_name,
            patient.patient_id,
            patient.date_of_birth,
            patient.phone,
            patient.repeat_medications.len()
        );
        Ok(ToolResult::ok(observation, data))
    }
}

/// Attempt identity verification from free text containing identity details.
pub struct VerifyIdentityTool;

#[async_trait]
impl Tool for VerifyIdentityTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "verify_identity".to_string(),
            description: "Verify the caller's identity from stated details. Needs at least \
                          two of: full name, date of birth, NHS number. Three failed attempts \
                          require hand-off to a human."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "details".to_string(),
                param_type: "string".to_string(),
                required: true,
                description: "the caller's own words containing their identity details"
                    .to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        if ctx.state.patient_verified {
            let name = ctx
                .state
                .identity
                .as_ref()
                .map(|i| i.full_name.clone())
                .unwrap_or_default();
            return Ok(ToolResult::ok(
                format!("Caller already verified as {}.", name),
                json!({"verified": true}),
            ));
        }

        // One caller message costs at most one attempt. If the turn's
        // identity pre-pass already consumed it, report that instead of
        // burning a second one on the same input.
        if ctx.verification_attempted {
            return Ok(ToolResult::fail(format!(
                "An identity check already ran for this message (attempt {}/{}) and the \
                 details did not match. Ask the caller for corrected details before \
                 trying again.",
                ctx.state.verification_attempts, MAX_VERIFICATION_ATTEMPTS
            )));
        }

        let details = str_param(params, "details").unwrap_or("");
        let attempt = ctx.state.verification_attempts + 1;
        let result = verification::verify(details, attempt, &ctx.directory);

        if result.verified {
            let patient_id = result.patient_id.clone().unwrap_or_default();
            let patient = ctx.directory.find_patient(&patient_id).cloned();
            if let Some(p) = patient {
                ctx.state.mark_verified(VerifiedIdentity {
                    patient_id: p.patient_id.clone(),
                    full_name: p.full_name.clone(),
                    date_of_birth: p.date_of_birth.to_string(),
                    method: result
                        .method
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                });
                ctx.state.record_action("identity_verified");
                return Ok(ToolResult::ok(
                    format!(
                        "Identity verified: {} ({}) via {}.",
                        p.full_name,
                        p.patient_id,
                        result.method.map(|m| m.as_str()).unwrap_or("unknown")
                    ),
                    json!({"verified": true, "patient_id": p.patient_id}),
                ));
            }
        }

        ctx.state.verification_attempts = attempt;
        ctx.verification_attempted = true;
        let reason = result
            .failure_reason
            .unwrap_or_else(|| "details did not match".to_string());

        if result.exhausted {
            ctx.state.record_action("verification_exhausted");
            return Ok(ToolResult::fail(format!(
                "Verification failed on attempt {}/{} ({}). No further attempts allowed - \
                 escalate to a human member of staff.",
                attempt, MAX_VERIFICATION_ATTEMPTS, reason
            )));
        }

        Ok(ToolResult::fail(format!(
            "Verification failed on attempt {}/{} ({}). Ask the caller to restate their \
             full name plus date of birth or NHS number.",
            attempt, MAX_VERIFICATION_ATTEMPTS, reason
        )))
    }
}

/// Retrieve recent encounter history for the verified caller.
pub struct PatientHistoryTool;

#[async_trait]
impl Tool for PatientHistoryTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "patient_history".to_string(),
            description: "Recent encounter history for the verified caller.".to_string(),
            parameters: vec![],
        }
    }

    async fn execute(&self, _params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(patient) = ctx.verified_patient() else {
            return Ok(ToolResult::fail(
                "Caller is not verified. Use verify_identity first.",
            ));
        };
        if patient.history.is_empty() {
            return Ok(ToolResult::ok(
                "No recent encounters on file.",
                json!({"history": []}),
            ));
        }
        let observation = format!("Recent encounters:\n{}", patient.history.join("\n"));
        Ok(ToolResult::ok(observation, json!({"history": patient.history})))
    }
}
