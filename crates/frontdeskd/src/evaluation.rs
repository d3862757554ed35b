//! Post-hoc self-evaluation.
//!
//! A second, independent model call judges the completed transcript. Any
//! failure - provider down, prose instead of JSON, missing fields - yields
//! the neutral default; evaluation can never block the primary response.

use std::sync::Arc;

use frontdesk_common::evaluation::TurnEvaluation;
use frontdesk_common::llm::{ChatMessage, ChatRequest, SamplingOptions};
use frontdesk_common::plan::Plan;
use frontdesk_common::prompts;
use serde_json::Value;
use tracing::warn;

use crate::llm::ModelProvider;

pub struct Evaluator {
    provider: Arc<dyn ModelProvider>,
}

impl Evaluator {
    pub fn new(provider: Arc<dyn ModelProvider>) -> Self {
        Self { provider }
    }

    pub async fn evaluate(
        &self,
        user_message: &str,
        final_response: &str,
        plan: &Plan,
    ) -> TurnEvaluation {
        let prompt = prompts::judge_prompt(user_message, final_response, plan);
        let request = ChatRequest {
            messages: vec![ChatMessage::user(prompt)],
            tools: vec![],
            options: SamplingOptions {
                temperature: Some(0.0),
                max_tokens: Some(512),
            },
        };

        let text = match self.provider.chat(request).await {
            Ok(response) => response.text,
            Err(e) => {
                warn!("[-]  judge call failed, using neutral scores: {}", e);
                return TurnEvaluation::neutral();
            }
        };

        match parse_judge_output(&text) {
            Some(evaluation) => evaluation,
            None => {
                warn!("[-]  unparseable judge output, using neutral scores");
                TurnEvaluation::neutral()
            }
        }
    }
}

/// Pull the JSON object out of the judge's reply, tolerating wrapped prose.
fn parse_judge_output(text: &str) -> Option<TurnEvaluation> {
    let json_text = match (text.find('{'), text.rfind('}')) {
        (Some(start), Some(end)) if end > start => &text[start..=end],
        _ => return None,
    };
    let v: Value = serde_json::from_str(json_text).ok()?;
    Some(TurnEvaluation::from_json_value(&v))
}
