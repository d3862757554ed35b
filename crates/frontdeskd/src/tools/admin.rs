//! Administrative Q&A and episodic memory tools.

use async_trait::async_trait;
use chrono::Utc;
use frontdesk_common::llm::{ToolParamSpec, ToolSpec};
use serde_json::{json, Value};

use super::{str_param, MemoryEntry, Tool, ToolContext, ToolResult};

/// Keyword-routed canned answers for practice admin questions.
pub struct PracticeFaqTool;

#[async_trait]
impl Tool for PracticeFaqTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "practice_faq".to_string(),
            description: "Answer administrative questions: opening hours, contact details, \
                          registration, sick notes, travel vaccinations."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "question".to_string(),
                param_type: "string".to_string(),
                required: true,
                description: "the caller's administrative question".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let question = str_param(params, "question").unwrap_or("").to_lowercase();
        let p = &ctx.practice;

        let answer = if question.contains("hour") || question.contains("open") || question.contains("close") {
            format!("{} is open {}.", p.name, p.opening_hours)
        } else if question.contains("phone") || question.contains("call") || question.contains("number") {
            format!("You can reach {} on {}.", p.name, p.phone)
        } else if question.contains("address") || question.contains("where") || question.contains("park") {
            format!("{} is at {}. Patient parking is available on site.", p.name, p.address)
        } else if question.contains("register") {
            format!(
                "To register with {}, bring photo ID and proof of address to reception, or \
                 complete the registration form on our website. Registration takes about two \
                 working days.",
                p.name
            )
        } else if question.contains("sick note") || question.contains("fit note") {
            "Fit notes need a GP's sign-off. For the first 7 days of illness you can \
             self-certify; beyond that, request a fit note via reception and a GP will \
             prepare it within two working days."
                .to_string()
        } else if question.contains("travel") || question.contains("vaccin") {
            "Travel vaccinations are by appointment with our practice nurse. Book at least \
             six weeks before travel where possible."
                .to_string()
        } else {
            return Ok(ToolResult::fail(format!(
                "No FAQ entry matches that question. Suggest the caller phones {} on {}.",
                p.name, p.phone
            )));
        };

        Ok(ToolResult::ok(answer.clone(), json!({"answer": answer})))
    }
}

/// Save an episodic memory about this conversation.
pub struct SaveMemoryTool;

#[async_trait]
impl Tool for SaveMemoryTool {
    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: "save_memory".to_string(),
            description: "Save a short note about this conversation for future contacts \
                          (preferences, context worth remembering)."
                .to_string(),
            parameters: vec![ToolParamSpec {
                name: "content".to_string(),
                param_type: "string".to_string(),
                required: true,
                description: "the note to remember".to_string(),
            }],
        }
    }

    async fn execute(&self, params: &Value, ctx: &mut ToolContext) -> anyhow::Result<ToolResult> {
        let Some(content) = str_param(params, "content") else {
            return Ok(ToolResult::fail("Nothing to save: content was empty."));
        };
        ctx.memory.push(MemoryEntry {
            session_id: ctx.state.session_id.clone(),
            content: content.to_string(),
            saved_at: Utc::now(),
        });
        ctx.state.record_action("memory_saved");
        Ok(ToolResult::ok(
            "Noted for future contacts.",
            json!({"saved": content}),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testutil::context;

    #[tokio::test]
    async fn test_faq_opening_hours() {
        let mut ctx = context(false);
        let r = PracticeFaqTool
            .execute(&json!({"question": "what time do you open?"}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert!(r.observation.contains(&ctx.practice.opening_hours));
    }

    #[tokio::test]
    async fn test_faq_sick_note() {
        let mut ctx = context(false);
        let r = PracticeFaqTool
            .execute(&json!({"question": "I need a sick note for work"}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert!(r.observation.contains("self-certify"));
    }

    #[tokio::test]
    async fn test_faq_no_match_fails_with_phone() {
        let mut ctx = context(false);
        let r = PracticeFaqTool
            .execute(&json!({"question": "do you sell sandwiches"}), &mut ctx)
            .await
            .unwrap();
        assert!(!r.success);
        assert!(r.observation.contains(&ctx.practice.phone));
    }

    #[tokio::test]
    async fn test_save_memory() {
        let mut ctx = context(false);
        let r = SaveMemoryTool
            .execute(&json!({"content": "prefers morning appointments"}), &mut ctx)
            .await
            .unwrap();
        assert!(r.success);
        assert_eq!(ctx.memory.len(), 1);
        assert_eq!(ctx.memory[0].content, "prefers morning appointments");
    }

    #[tokio::test]
    async fn test_save_memory_empty() {
        let mut ctx = context(false);
        let r = SaveMemoryTool.execute(&json!({}), &mut ctx).await.unwrap();
        assert!(!r.success);
        assert!(ctx.memory.is_empty());
    }
}
