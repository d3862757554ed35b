//! Per-turn orchestration.
//!
//! Fixed order, no overlap: safety scan first (always, synchronously, with
//! no code path around it), then either the emergency short-circuit or the
//! normal pipeline of concept extraction, intent classification, a
//! verification attempt, and the cortex loop. The reply is closed with
//! safety netting, judged, and spooled fire-and-forget.

use std::sync::Arc;
use std::time::Instant;

use frontdesk_common::concepts;
use frontdesk_common::config::AgentConfig;
use frontdesk_common::directory::{PracticeDirectory, SlotStore};
use frontdesk_common::intent::{self, Intent};
use frontdesk_common::plan::CortexStep;
use frontdesk_common::redflags;
use frontdesk_common::rpc::{TurnMetadata, TurnRequest, TurnResponse};
use frontdesk_common::state::{
    ConversationState, Message, MessageMeta, MessageRole, RouteTarget, UrgencyLevel,
};
use frontdesk_common::verification::{self, MAX_VERIFICATION_ATTEMPTS};
use serde_json::json;
use tracing::{info, warn};

use crate::cortex::CortexEngine;
use crate::evaluation::Evaluator;
use crate::llm::ModelProvider;
use crate::persistence::SessionSpool;
use crate::tools::{ToolContext, ToolRegistry};

/// Safety-netting closures by urgency tier.
fn safety_netting_for(urgency: UrgencyLevel) -> Option<&'static str> {
    match urgency {
        UrgencyLevel::Emergency => None, // emergency script carries its own
        UrgencyLevel::Urgent => Some(
            "If your symptoms get worse, you feel much more unwell, or you develop chest pain, \
             difficulty breathing, or confusion, call 999 straight away.",
        ),
        UrgencyLevel::Soon => Some(
            "If things get worse before you're seen, or you're worried, call us back or \
             ring 111 for advice. Call 999 if you develop severe symptoms.",
        ),
        UrgencyLevel::Routine => None,
    }
}

pub struct TurnEngine {
    config: AgentConfig,
    provider: Arc<dyn ModelProvider>,
    registry: Arc<ToolRegistry>,
    directory: Arc<PracticeDirectory>,
    slots: SlotStore,
    spool: SessionSpool,
}

impl TurnEngine {
    pub fn new(
        config: AgentConfig,
        provider: Arc<dyn ModelProvider>,
        directory: Arc<PracticeDirectory>,
        slots: SlotStore,
    ) -> Self {
        let spool = SessionSpool::new(config.spool_dir.clone());
        Self {
            config,
            provider,
            registry: Arc::new(ToolRegistry::standard()),
            directory,
            slots,
            spool,
        }
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub async fn provider_available(&self) -> bool {
        self.provider.is_available().await
    }

    /// Process one inbound message and produce the reply plus mutated state.
    pub async fn process_turn(&self, request: TurnRequest) -> TurnResponse {
        let turn_started = Instant::now();
        let mut state = request
            .conversation_state
            .unwrap_or_else(|| ConversationState::new(self.config.practice.name.clone()));

        info!(
            "[>]  turn session={} message={} chars",
            state.session_id,
            request.message.len()
        );

        state.push_message(Message::new(MessageRole::User, request.message.clone()));

        let mut ctx = ToolContext::new(
            state,
            Arc::clone(&self.directory),
            self.slots.clone(),
            self.config.practice.clone(),
        );

        // Safety scan. Always first, always synchronous; everything else
        // branches AFTER this returns.
        let red_flags = redflags::scan(&request.message);

        let (response_text, agent, plan) = if !red_flags.is_empty() {
            let outcome = self.emergency_turn(&request.message, &red_flags, &mut ctx).await;
            (outcome.0, "safety", outcome.1)
        } else {
            let outcome = self.standard_turn(&request.message, &mut ctx).await;
            (outcome.0, "cortex", outcome.1)
        };

        // Judge the finished transcript; failures degrade to neutral scores.
        let evaluation = Evaluator::new(Arc::clone(&self.provider))
            .evaluate(&request.message, &response_text, &plan)
            .await;

        let mut final_state = ctx.state;
        final_state.push_message(
            Message::new(MessageRole::Assistant, response_text.clone()).with_meta(MessageMeta {
                intent: Some(final_state.intent),
                urgency: Some(final_state.urgency),
                concept_codes: final_state.symptoms.iter().map(|s| s.code.clone()).collect(),
                actions: final_state.actions_taken.clone(),
            }),
        );

        // Fire-and-forget persistence; a spool failure never fails the turn.
        {
            let spool = self.spool.clone();
            let state = final_state.clone();
            let response = response_text.clone();
            let memory = std::mem::take(&mut ctx.memory);
            let alerts = std::mem::take(&mut ctx.alerts);
            let followups = std::mem::take(&mut ctx.followups);
            tokio::spawn(async move {
                spool.persist(&state, &response, &memory, &alerts, &followups);
            });
        }

        info!(
            "[<]  turn session={} agent={} urgency={} steps={} in {}ms",
            final_state.session_id,
            agent,
            final_state.urgency,
            plan.total_steps(),
            turn_started.elapsed().as_millis()
        );

        TurnResponse {
            response: response_text,
            agent: agent.to_string(),
            metadata: TurnMetadata {
                intent: final_state.intent,
                intent_confidence: final_state.intent_confidence,
                urgency: final_state.urgency,
                patient_verified: final_state.patient_verified,
                escalation_required: final_state.escalation_required,
                red_flags: final_state.red_flags.clone(),
                actions_taken: final_state.actions_taken.clone(),
            },
            plan,
            evaluation,
            conversation_state: final_state,
        }
    }

    /// Emergency short-circuit: scripted response from the highest-priority
    /// protocol, clinician alert and memory save recorded as plan steps, no
    /// model involvement in the reply.
    async fn emergency_turn(
        &self,
        message: &str,
        red_flags: &[redflags::RedFlagProtocol],
        ctx: &mut ToolContext,
    ) -> (String, frontdesk_common::plan::Plan) {
        let lead = &red_flags[0];
        warn!(
            "[!]  RED FLAG session={} protocols={:?}",
            ctx.state.session_id,
            red_flags.iter().map(|p| p.id.as_str()).collect::<Vec<_>>()
        );

        ctx.state.require_escalation();
        ctx.state.update_intent(Intent::Emergency, 0.99);
        for protocol in red_flags {
            ctx.state.record_red_flag(&protocol.id);
        }
        ctx.state.merge_symptoms(&concepts::extract(message));

        let mut plan = frontdesk_common::plan::Plan::new(format!(
            "emergency escalation: {}",
            lead.category.as_str()
        ));

        // Deterministic escalation chain through the same registry the
        // cortex uses, so the plan is a complete record of actions.
        for (tool, params) in [
            (
                "raise_clinician_alert",
                json!({
                    "reason": format!("red flag {} ({})", lead.id, lead.category.as_str()),
                    "severity": "emergency",
                }),
            ),
            (
                "save_memory",
                json!({
                    "content": format!(
                        "Emergency escalation ({}): caller reported \"{}\"",
                        lead.category.as_str(),
                        message
                    ),
                }),
            ),
        ] {
            let started = Instant::now();
            match self.registry.execute(tool, &params, ctx).await {
                Ok(result) => plan.record(CortexStep {
                    step: 0,
                    reasoning: "emergency protocol chain".to_string(),
                    tool: tool.to_string(),
                    input: params,
                    observation: result.observation,
                    success: result.success,
                    duration_ms: started.elapsed().as_millis() as u64,
                }),
                Err(e) => plan.record(CortexStep {
                    step: 0,
                    reasoning: "emergency protocol chain".to_string(),
                    tool: tool.to_string(),
                    input: params,
                    observation: format!("escalation step failed: {}", e),
                    success: false,
                    duration_ms: started.elapsed().as_millis() as u64,
                }),
            }
        }

        let response = format!("{} {}", lead.immediate_action, lead.scripted_response);
        ctx.state
            .record_safety_netting(lead.immediate_action.clone());

        (response, plan)
    }

    /// The normal pipeline: concepts, intent, a verification attempt when
    /// identity details are present, then the cortex loop.
    async fn standard_turn(
        &self,
        message: &str,
        ctx: &mut ToolContext,
    ) -> (String, frontdesk_common::plan::Plan) {
        // Concept extraction and monotonic urgency recalculation.
        let matches = concepts::extract(message);
        if let Some(top) = matches.first() {
            ctx.state
                .raise_urgency(concepts::urgency_for_weight(top.urgency_weight));
        }
        ctx.state.merge_symptoms(&matches);

        // Intent classification against the trailing assistant turns.
        let prior: Vec<String> = ctx
            .state
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::Assistant)
            .rev()
            .take(3)
            .map(|m| m.content.clone())
            .collect();
        let classification = intent::classify(message, &prior);
        info!(
            "[I]  intent={} confidence={:.2} ({})",
            classification.intent, classification.confidence, classification.reasoning
        );
        ctx.state
            .update_intent(classification.intent, classification.confidence);

        // Verification attempt when the message carries enough identity
        // factors and the session still needs one.
        if !ctx.state.patient_verified
            && verification::extract_identity(message).factor_count() >= 2
        {
            let attempt = ctx.state.verification_attempts + 1;
            let result = verification::verify(message, attempt, &ctx.directory);
            if result.verified {
                if let Some(patient) = result
                    .patient_id
                    .as_deref()
                    .and_then(|id| ctx.directory.find_patient(id))
                {
                    let identity = frontdesk_common::state::VerifiedIdentity {
                        patient_id: patient.patient_id.clone(),
                        full_name: patient.full_name.clone(),
                        date_of_birth: patient.date_of_birth.to_string(),
                        method: result
                            .method
                            .map(|m| m.as_str().to_string())
                            .unwrap_or_default(),
                    };
                    ctx.state.mark_verified(identity);
                    ctx.state.record_action("identity_verified");
                    info!("[V]  verified as {}", patient.patient_id);
                }
            } else {
                ctx.state.verification_attempts = attempt;
                ctx.verification_attempted = true;
                if result.exhausted {
                    // Terminal: routed to reception staff for in-person ID
                    // checks, not the clinical escalation queue. No further
                    // prompts, no cortex.
                    warn!(
                        "[!]  verification exhausted after {} attempts",
                        MAX_VERIFICATION_ATTEMPTS
                    );
                    ctx.state.route = RouteTarget::Reception;
                    ctx.state.record_action("verification_exhausted");
                    let plan = frontdesk_common::plan::Plan::new("verification hand-off");
                    return (
                        format!(
                            "I'm sorry - I haven't been able to confirm your identity after {} \
                             attempts, so for your security I can't go further here. A member of \
                             our reception team will help you directly: please call {} or visit \
                             the practice with photo ID.",
                            MAX_VERIFICATION_ATTEMPTS, self.config.practice.phone
                        ),
                        plan,
                    );
                }
            }
        }

        // The reasoning loop.
        let engine = CortexEngine::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.registry),
            self.config.step_cap,
        );
        let outcome = engine.run(ctx, message).await;
        let mut response = outcome.response;

        // Close clinical replies with safety netting (once per statement).
        if !outcome.degraded && !ctx.state.symptoms.is_empty() {
            if let Some(netting) = safety_netting_for(ctx.state.urgency) {
                if !ctx
                    .state
                    .safety_netting_applied
                    .iter()
                    .any(|s| s == netting)
                {
                    response = format!("{}\n\n{}", response, netting);
                    ctx.state.record_safety_netting(netting);
                }
            }
        }

        (response, outcome.plan)
    }
}
