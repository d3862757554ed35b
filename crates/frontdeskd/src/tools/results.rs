//! Tiered test-result disclosure.
//!
//! Three tiers: deliverable directly, clinician-callback only, not yet
//! available. Cancer, STI and pregnancy-class results are always
//! clinician-only regardless of how they were filed.

use async_trait::async_trait;
use frontdesk_common::directory::ResultSensitivity;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use serde_json::{json, Value};

use super::{str_param, Tool, ToolContext, ToolResult};

/// Test-name fragments that force clinician-only disclosure.
const RESTRICTED_CLASSES: &[&str] = &[
    "cancer",
    "biopsy",
    "oncology",
    "cervical",
    "smear",
    "psa",
    "hiv",
    "chlamydia",
    "gonorrhoea",
    "syphilis",
    "sti",
    "pregnancy",
    "hcg",
];

fn is_restricted_class(test_name: &str) -> bool {
    let lowered = test_name.to_lowercase();
    RESTRICTED_CLASSES.iter().any(|c| lowered.contains(c))
}

pub struct GetTestResultsTool;

#[async_trait]
impl Tool for GetTestResultsTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "get_test_results".to_string(),
            description: "Retrieve the verified caller's test results. Sensitive results are \
                          disclosed only via clinician callback."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "test_name".to_string(),
                param_type: "string".to_string(),
                required: false,
                description: "restrict to a specific test".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(patient) = ctx.verified_patient() else {
            return Ok(ToolResult::fail(
                "Test results require identity verification. Use verify_identity first.",
            ));
        };
        let patient_id = patient.patient_id.clone();

        let filter = str_param(params, "test_name").map(|s| s.to_lowercase());
        let results: Vec<_> = ctx
            .directory
            .results_for(&patient_id)
            .into_iter()
            .filter(|r| {
                filter
                    .as_deref()
                    .map(|f| r.test_name.to_lowercase().contains(f))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();

        if results.is_empty() {
            return Ok(ToolResult::ok(
                "No test results on file for that request.",
                json!({"results": []}),
            ));
        }

        let mut lines = Vec::new();
        let mut disclosed = Vec::new();
        for r in &results {
            // Restricted classes override however the lab filed the result.
            let tier = if is_restricted_class(&r.test_name) {
                ResultSensitivity::ClinicianOnly
            } else {
                r.sensitivity
            };
            match tier {
                ResultSensitivity::Deliverable => {
                    lines.push(format!(
                        "{} ({}): {}",
                        r.test_name, r.taken_on, r.summary
                    ));
                    disclosed.push(r.test_name.clone());
                }
                ResultSensitivity::ClinicianOnly => {
                    lines.push(format!(
                        "{} ({}): available, but needs a clinician to talk it through - \
                         a callback will be arranged. Do not read this result out.",
                        r.test_name, r.taken_on
                    ));
                }
                ResultSensitivity::NotAvailable => {
                    lines.push(format!(
                        "{} ({}): not back from the lab yet.",
                        r.test_name, r.taken_on
                    ));
                }
            }
        }

        ctx.state.record_action("test_results_checked");
        Ok(ToolResult::ok(
            lines.join("\n"),
            json!({"disclosed": disclosed, "total": results.len()}),
        ))
    }
}
