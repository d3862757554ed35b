//! Symptom triage scoring and clinician alerting tools.

use async_trait::async_trait;
use chrono::Utc;
use frontdesk_common::concepts;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use serde_json::{json, Value};

use super::{str_param, ClinicianAlert, Tool, ToolContext, ToolResult};

/// Score described symptoms against the concept library and update urgency.
pub struct TriageSymptomsTool;

#[async_trait]
impl Tool for TriageSymptomsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "triage_symptoms".to_string(),
            description: "Score the caller's described symptoms for urgency. Classifies and \
                          routes only - never diagnoses."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "description".to_string(),
                param_type: "string".to_string(),
                required: true,
                description: "the caller's symptom description in their own words".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let description = str_param(params, "description").unwrap_or("");
        let matches = concepts::extract(description);

        if matches.is_empty() {
            return Ok(ToolResult::ok(
                "No recognized symptom concepts in the description. Urgency unchanged.",
                json!({"matches": [], "urgency": ctx.state.urgency}),
            ));
        }

        ctx.state.merge_symptoms(&matches);
        let top_weight = matches[0].urgency_weight;
        ctx.state
            .raise_urgency(concepts::urgency_for_weight(top_weight));

        let listed = matches
            .iter()
            .map(|m| format!("{} (weight {})", m.display, m.urgency_weight))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(ToolResult::ok(
            format!(
                "Recognized: {}. Session urgency is now {}.",
                listed, ctx.state.urgency
            ),
            json!({
                "matches": matches,
                "top_weight": top_weight,
                "urgency": ctx.state.urgency,
            }),
        ))
    }
}

/// Raise a clinician-facing flag on the session.
pub struct RaiseClinicianAlertTool;

#[async_trait]
impl Tool for RaiseClinicianAlertTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "raise_clinician_alert".to_string(),
            description: "Flag this conversation for clinician review. Use for anything \
                          concerning that does not fit another tool."
                .to_string(),
            parameters: vec![
                ToolParamSpec {
                    name: "reason".to_string(),
                    param_type: "string".to_string(),
                    required: true,
                    description: "why the clinician should look at this".to_string(),
                },
                ToolParamSpec {
                    name: "severity".to_string(),
                    param_type: "string".to_string(),
                    required: false,
                    description: "routine | urgent | emergency (default urgent)".to_string(),
                },
            ],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let reason = str_param(params, "reason").unwrap_or("unspecified").to_string();
        let severity = str_param(params, "severity").unwrap_or("urgent").to_string();

        ctx.alerts.push(ClinicianAlert {
            session_id: ctx.state.session_id.clone(),
            severity: severity.clone(),
            reason: reason.clone(),
            raised_at: Utc::now(),
        });
        ctx.state.record_action(format!("clinician_alert:{}", severity));

        Ok(ToolResult::ok(
            format!("Clinician alert raised ({}): {}", severity, reason),
            json!({"severity": severity, "reason": reason}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testutil::context;
    use frontdesk_common::state::UrgencyLevel;

    #[tokio::test]
    async fn test_triage_raises_urgency() {
        let mut ctx = context(false);
        let r = TriageSymptomsTool
            .execute(
                &json!({"description": "terrible headache and I keep vomiting"}),
                &mut ctx,
            )
            .await
            .unwrap();
        assert!(r.success);
        assert_eq!(ctx.state.urgency, UrgencyLevel::Soon);
        assert!(!ctx.state.symptoms.is_empty());
    }

    #[tokio::test]
    async fn test_triage_never_lowers_urgency() {
        let mut ctx = context(false);
        ctx.state.raise_urgency(UrgencyLevel::Emergency);
        TriageSymptomsTool
            .execute(&json!({"description": "a mild cough"}), &mut ctx)
            .await
            .unwrap();
        assert_eq!(ctx.state.urgency, UrgencyLevel::Emergency);
    }

    #[tokio::test]
    async fn test_triage_no_matches() {
        let mut ctx = context(false);
        let r = TriageSymptomsTool
            .execute(&json!({"description": "just ringing to say thanks"}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert!(r.observation.contains("No recognized"));
    }

    #[tokio::test]
    async fn test_alert_recorded() {
        let mut ctx = context(false);
        let r = RaiseClinicianAlertTool
            .execute(
                &json!({"reason": "patient mentioned worsening mood", "severity": "urgent"}),
                &mut ctx,
            )
            .await
            .unwrap();
        assert!(r.success);
        assert_eq!(ctx.alerts.len(), 1);
        assert!(ctx
            .state
            .actions_taken
            .contains(&"clinician_alert:urgent".to_string()));
    }

    #[tokio::test]
    async fn test_alert_defaults() {
        let mut ctx = context(false);
        // Malformed params: missing everything.
        let r = RaiseClinicianAlertTool
            .execute(&json!({}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert_eq!(ctx.alerts[0].severity, "urgent");
    }
}
