//! Repeat prescription submission.
//!
//! A request is only accepted when the medication is on the caller's
//! authorized repeat list. Anything else is rejected with the authorized
//! list and a clinician hand-off suggestion - never a silent substitution.

use async_trait::async_trait;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use serde_json::{json, Value};

use super::{str_param, Tool, ToolContext, ToolResult};

pub struct RequestPrescriptionTool;

#[async_trait]
impl Tool for RequestPrescriptionTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "request_prescription".to_string(),
            description: "Submit a repeat prescription request for the verified caller. Only \
                          medications on their authorized repeat list are accepted."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "medication".to_string(),
                param_type: "string".to_string(),
                required: true,
                description: "the medication being requested".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(patient) = ctx.verified_patient().cloned() else {
            return Ok(ToolResult::fail(
                "Prescription requests require identity verification. Use verify_identity first.",
            ));
        };
        let Some(requested) = str_param(params, "medication") else {
            return Ok(ToolResult::fail("Missing medication name."));
        };
        let wanted = requested.to_lowercase();

        let matched = patient
            .repeat_medications
            .iter()
            .find(|m| wanted.contains(&m.name.to_lowercase()) || m.name.to_lowercase().contains(&wanted));

        match matched {
            Some(med) => {
                ctx.state
                    .record_action(format!("prescription_requested:{}", med.name));
                Ok(ToolResult::ok(
                    format!(
                        "Repeat prescription submitted for {} {} ({}). Ready at the usual \
                         pharmacy in 2 working days.",
                        med.name, med.dose, med.directions
                    ),
                    json!({"medication": med.name, "dose": med.dose}),
                ))
            }
            None => {
                let authorized = if patient.repeat_medications.is_empty() {
                    "none on file".to_string()
                } else {
                    patient
                        .repeat_medications
                        .iter()
                        .map(|m| format!("{} {}", m.name, m.dose))
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                Ok(ToolResult::fail(format!(
                    "'{}' is not on the caller's authorized repeat list ({}). A new or changed \
                     medication needs a clinician - offer to book a GP appointment instead.",
                    requested, authorized
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testutil::context;

    #[tokio::test]
    async fn test_requires_verification() {
        let mut ctx = context(false);
        let r = RequestPrescriptionTool
            .execute(&json!({"medication": "salbutamol"}), &mut ctx)
            .await
            .unwrap();
        assert!(!r.success);
        assert!(r.observation.contains("verification"));
    }

    #[tokio::test]
    async fn test_on_repeat_list_accepted() {
        let mut ctx = context(true);
        let r = RequestPrescriptionTool
            .execute(&json!({"medication": "salbutamol inhaler"}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert!(r.observation.contains("salbutamol"));
        assert!(ctx
            .state
            .actions_taken
            .contains(&"prescription_requested:salbutamol".to_string()));
    }

    #[tokio::test]
    async fn test_off_list_rejected_with_alternatives() {
        let mut ctx = context(true);
        let r = RequestPrescriptionTool
            .execute(&json!({"medication": "diazepam"}), &mut ctx)
            .await
            .unwrap();
        assert!(!r.success);
        // Rejection lists the authorized repeats.
        assert!(r.observation.contains("salbutamol"));
        assert!(r.observation.contains("sertraline"));
        assert!(r.observation.contains("clinician"));
        // And no prescription action was recorded.
        assert!(ctx
            .state
            .actions_taken
            .iter()
            .all(|a| !a.starts_with("prescription_requested")));
    }

    #[tokio::test]
    async fn test_missing_medication_param() {
        let mut ctx = context(true);
        let r = RequestPrescriptionTool
            .execute(&json!({}), &mut ctx)
            .await
            .unwrap();
        assert!(!r.success);
    }
}
