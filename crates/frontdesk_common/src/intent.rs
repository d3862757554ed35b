//! Weighted keyword intent classification.
//!
//! Deterministic scoring over an ordered rule table: each rule counts phrase
//! matches in the lowercased message and produces
//! `base_weight + 0.03 * (matches - 1)` capped at 0.99. The highest-scoring
//! rule wins; ties go to declaration order. A context fallback infers a
//! clinical intent from open conversation history when nothing matches.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Emergency,
    Appointment,
    Prescription,
    TestResults,
    AdminQuery,
    ClinicalQuery,
    Verification,
    Greeting,
    #[default]
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Emergency => "emergency",
            Self::Appointment => "appointment",
            Self::Prescription => "prescription",
            Self::TestResults => "test_results",
            Self::AdminQuery => "admin_query",
            Self::ClinicalQuery => "clinical_query",
            Self::Verification => "verification",
            Self::Greeting => "greeting",
            Self::Unknown => "unknown",
        }
    }

    /// Intents that require identity verification before acting.
    pub fn requires_verification(&self) -> bool {
        matches!(
            self,
            Self::Appointment | Self::Prescription | Self::TestResults
        )
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Classification output with the winning rule's reasoning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_intent: Option<String>,
    pub reasoning: String,
}

struct IntentRule {
    intent: Intent,
    base_weight: f64,
    sub_intent: Option<&'static str>,
    phrases: &'static [&'static str],
}

/// Ordered rule table. Declaration order breaks score ties.
const RULES: &[IntentRule] = &[
    IntentRule {
        intent: Intent::Emergency,
        base_weight: 0.95,
        sub_intent: None,
        phrases: &[
            "emergency", "ambulance", "999", "dying", "unconscious", "not breathing",
        ],
    },
    IntentRule {
        intent: Intent::Appointment,
        base_weight: 0.85,
        sub_intent: Some("book"),
        phrases: &[
            "book an appointment", "book a gp", "book appointment", "make an appointment",
            "see a doctor", "see the doctor", "see a gp", "appointment please",
            "need an appointment", "schedule an appointment", "book me in",
        ],
    },
    IntentRule {
        intent: Intent::Appointment,
        base_weight: 0.8,
        sub_intent: Some("change"),
        phrases: &[
            "cancel my appointment", "reschedule", "move my appointment",
            "change my appointment",
        ],
    },
    IntentRule {
        intent: Intent::Prescription,
        base_weight: 0.85,
        sub_intent: Some("repeat"),
        phrases: &[
            "repeat prescription", "prescription", "my medication", "need more of my",
            "run out of my", "refill", "my tablets", "my inhaler", "repeat meds",
        ],
    },
    IntentRule {
        intent: Intent::TestResults,
        base_weight: 0.85,
        sub_intent: None,
        phrases: &[
            "test results", "blood test results", "my results", "results back",
            "results of my", "blood results", "scan results",
        ],
    },
    IntentRule {
        intent: Intent::Verification,
        base_weight: 0.75,
        sub_intent: None,
        phrases: &[
            "my date of birth is", "my dob is", "my nhs number", "date of birth",
            "i was born on", "my name is",
        ],
    },
    IntentRule {
        intent: Intent::AdminQuery,
        base_weight: 0.7,
        sub_intent: None,
        phrases: &[
            "opening hours", "what time do you open", "what time do you close",
            "are you open", "phone number", "address", "where are you", "car park",
            "parking", "register as a patient", "how do i register", "sick note",
            "fit note", "travel vaccin", "update my address", "change my number",
        ],
    },
    IntentRule {
        intent: Intent::ClinicalQuery,
        base_weight: 0.65,
        sub_intent: None,
        phrases: &[
            "pain", "hurts", "symptom", "feeling unwell", "not feeling well", "worried about",
            "rash", "cough", "fever", "headache", "dizzy", "tired", "sick", "ache",
        ],
    },
    IntentRule {
        intent: Intent::Greeting,
        base_weight: 0.6,
        sub_intent: None,
        phrases: &["hello", "hi there", "good morning", "good afternoon", "hiya"],
    },
];

/// Phrases in recent assistant turns that indicate an open clinical thread,
/// used for the context fallback.
const OPEN_CLINICAL_HINTS: &[&str] = &[
    "how long have you",
    "tell me more about",
    "any other symptoms",
    "where is the pain",
    "on a scale of",
];

/// Classify a message against prior assistant turns.
pub fn classify(message: &str, prior_assistant_turns: &[String]) -> Classification {
    let lowered = message.to_lowercase();

    let mut best: Option<(f64, &IntentRule, usize)> = None;
    for rule in RULES {
        let matches = rule
            .phrases
            .iter()
            .filter(|p| lowered.contains(**p))
            .count();
        if matches == 0 {
            continue;
        }
        let confidence = (rule.base_weight + 0.03 * (matches as f64 - 1.0)).min(0.99);
        // Strictly-greater keeps the earlier rule on ties.
        let better = match best {
            Some((score, _, _)) => confidence > score,
            None => true,
        };
        if better {
            best = Some((confidence, rule, matches));
        }
    }

    if let Some((confidence, rule, matches)) = best {
        return Classification {
            intent: rule.intent,
            confidence,
            sub_intent: rule.sub_intent.map(|s| s.to_string()),
            reasoning: format!(
                "matched {} phrase(s) for {} (base {:.2})",
                matches, rule.intent, rule.base_weight
            ),
        };
    }

    // No rule matched: if the conversation shows an open clinical question,
    // assume the patient is answering it.
    let open_thread = prior_assistant_turns.iter().any(|turn| {
        let t = turn.to_lowercase();
        OPEN_CLINICAL_HINTS.iter().any(|h| t.contains(h))
    });
    if open_thread {
        return Classification {
            intent: Intent::ClinicalQuery,
            confidence: 0.6,
            sub_intent: Some("context_inferred".to_string()),
            reasoning: "no direct match; open clinical thread in history".to_string(),
        };
    }

    Classification {
        intent: Intent::Unknown,
        confidence: 0.3,
        sub_intent: None,
        reasoning: "no phrase matches".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_appointment() {
        let c = classify("I'd like to book an appointment with a GP please", &[]);
        assert_eq!(c.intent, Intent::Appointment);
        assert!(c.confidence >= 0.85);
    }

    #[test]
    fn test_classify_prescription() {
        let c = classify("I need a repeat prescription for my inhaler", &[]);
        assert_eq!(c.intent, Intent::Prescription);
        // Two phrase hits: base 0.85 + 0.03
        assert!((c.confidence - 0.88).abs() < 1e-9);
    }

    #[test]
    fn test_multiple_matches_raise_confidence() {
        let single = classify("my results", &[]);
        let double = classify("are my blood test results back yet, the results of my test?", &[]);
        assert_eq!(single.intent, Intent::TestResults);
        assert_eq!(double.intent, Intent::TestResults);
        assert!(double.confidence > single.confidence);
    }

    #[test]
    fn test_confidence_capped() {
        let msg = "emergency ambulance 999 dying unconscious not breathing \
                   emergency ambulance 999";
        let c = classify(msg, &[]);
        assert!(c.confidence <= 0.99);
    }

    #[test]
    fn test_emergency_beats_clinical() {
        let c = classify("pain everywhere, call an ambulance, this is an emergency", &[]);
        assert_eq!(c.intent, Intent::Emergency);
    }

    #[test]
    fn test_unknown_low_confidence() {
        let c = classify("the quick brown fox", &[]);
        assert_eq!(c.intent, Intent::Unknown);
        assert!((c.confidence - 0.3).abs() < 1e-9);
    }

    #[test]
    fn test_context_fallback() {
        let history = vec!["How long have you had this, and any other symptoms?".to_string()];
        let c = classify("about three days now", &history);
        assert_eq!(c.intent, Intent::ClinicalQuery);
        assert!((c.confidence - 0.6).abs() < 1e-9);
        assert_eq!(c.sub_intent.as_deref(), Some("context_inferred"));
    }

    #[test]
    fn test_no_context_fallback_without_hints() {
        let history = vec!["Your appointment is confirmed.".to_string()];
        let c = classify("about three days now", &history);
        assert_eq!(c.intent, Intent::Unknown);
    }

    #[test]
    fn test_requires_verification() {
        assert!(Intent::Appointment.requires_verification());
        assert!(Intent::Prescription.requires_verification());
        assert!(Intent::TestResults.requires_verification());
        assert!(!Intent::AdminQuery.requires_verification());
        assert!(!Intent::Emergency.requires_verification());
    }
}
