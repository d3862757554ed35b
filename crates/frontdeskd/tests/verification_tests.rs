//! Identity verification through the full turn pipeline: the two-factor
//! pre-pass, the attempt cap, and the immutability of a verified identity.

mod common;

use std::sync::Arc;

use common::{engine, final_text, tool_call, ScriptedProvider};
use frontdesk_common::rpc::TurnRequest;
use frontdesk_common::state::RouteTarget;
use serde_json::json;

fn request(message: &str) -> TurnRequest {
    TurnRequest {
        message: message.to_string(),
        conversation_state: None,
    }
}

#[tokio::test]
async fn test_two_factor_message_verifies_inline() {
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![final_text(
            "Thanks Sarah, you're verified. How can I help?",
        )])),
        &spool,
    );

    let response = engine
        .process_turn(request("Hi, my name is Sarah Mitchell, born 03/05/1985"))
        .await;

    assert!(response.metadata.patient_verified);
    let identity = response.conversation_state.identity.as_ref().unwrap();
    assert_eq!(identity.patient_id, "P001");
    assert_eq!(identity.method, "name_dob");
    assert!(response
        .metadata
        .actions_taken
        .contains(&"identity_verified".to_string()));
}

#[tokio::test]
async fn test_nhs_number_and_dob_verify() {
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![final_text("You're verified.")])),
        &spool,
    );

    let response = engine
        .process_turn(request(
            "my NHS number is 485 777 3456 and I was born on the third of May 1985",
        ))
        .await;

    assert!(response.metadata.patient_verified);
    assert_eq!(
        response.conversation_state.identity.as_ref().unwrap().method,
        "nhs_dob"
    );
}

#[tokio::test]
async fn test_single_factor_does_not_consume_an_attempt() {
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![final_text(
            "Could I take your date of birth as well, please?",
        )])),
        &spool,
    );

    let response = engine
        .process_turn(request("my name is Sarah Mitchell"))
        .await;

    assert!(!response.metadata.patient_verified);
    assert_eq!(response.conversation_state.verification_attempts, 0);
}

#[tokio::test]
async fn test_one_message_costs_one_attempt() {
    // The pre-pass consumes the attempt; a verify_identity call inside the
    // same turn must not consume a second one for the same message.
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![
            tool_call(
                "verify_identity",
                json!({"details": "I'm John Smith, born 01/01/1990"}),
            ),
            final_text("Those details don't match what we have; could you check them?"),
        ])),
        &spool,
    );

    let response = engine
        .process_turn(request("I'm John Smith, born 01/01/1990"))
        .await;

    assert!(!response.metadata.patient_verified);
    assert_eq!(response.conversation_state.verification_attempts, 1);
    assert!(!response.plan.steps[0].success);
    assert!(response.plan.steps[0].observation.contains("already ran"));
}

#[tokio::test]
async fn test_third_failed_attempt_is_terminal() {
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![final_text(
            "Those details don't match; could you double-check?",
        )])),
        &spool,
    );

    let wrong = "I'm John Smith, born 01/01/1990";
    let first = engine.process_turn(request(wrong)).await;
    assert_eq!(first.conversation_state.verification_attempts, 1);

    let second = engine
        .process_turn(TurnRequest {
            message: wrong.to_string(),
            conversation_state: Some(first.conversation_state),
        })
        .await;
    assert_eq!(second.conversation_state.verification_attempts, 2);

    let third = engine
        .process_turn(TurnRequest {
            message: wrong.to_string(),
            conversation_state: Some(second.conversation_state),
        })
        .await;

    assert!(!third.metadata.patient_verified);
    assert_eq!(third.conversation_state.verification_attempts, 3);
    assert_eq!(third.conversation_state.route, RouteTarget::Reception);
    // Terminal hand-off: a fixed message with the practice phone, no cortex.
    assert!(third.response.contains("reception"));
    assert!(third.response.contains("0117 496 0000"));
    assert_eq!(third.plan.total_steps(), 0);
    assert!(third
        .metadata
        .actions_taken
        .contains(&"verification_exhausted".to_string()));
}

#[tokio::test]
async fn test_verified_identity_survives_later_turns() {
    let spool = tempfile::tempdir().unwrap();
    let engine = engine(
        Arc::new(ScriptedProvider::new(vec![final_text("Noted.")])),
        &spool,
    );

    let first = engine
        .process_turn(request("Sarah Mitchell here, date of birth 03/05/1985"))
        .await;
    assert!(first.metadata.patient_verified);

    // A later message with someone else's details cannot replace the identity.
    let second = engine
        .process_turn(TurnRequest {
            message: "actually I'm John Smith, born 01/01/1990".to_string(),
            conversation_state: Some(first.conversation_state),
        })
        .await;

    assert!(second.metadata.patient_verified);
    assert_eq!(
        second.conversation_state.identity.as_ref().unwrap().patient_id,
        "P001"
    );
}
