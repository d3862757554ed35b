//! Red-flag protocols - deterministic emergency detection.
//!
//! The scan runs before anything else on every turn and overrides all other
//! routing for the remainder of the turn. Matching is case-insensitive
//! substring matching against curated phrases; no model involvement, no
//! ranking heuristics. Determinism is a safety requirement.
//!
//! Category priority is an explicit rank on `RedFlagCategory`, not catalog
//! declaration order, so a reordered catalog cannot change which script is
//! used when several protocols fire at once.

use serde::{Deserialize, Serialize};

/// Clinical category of a red flag, with a fixed escalation priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RedFlagCategory {
    Cardiac,
    Respiratory,
    Neurological,
    SuicidalIdeation,
    Safeguarding,
    Haemorrhage,
    Allergic,
    Seizure,
    Oncology,
}

impl RedFlagCategory {
    /// Lower rank = higher clinical priority when multiple protocols fire.
    pub fn priority_rank(&self) -> u8 {
        match self {
            Self::Cardiac => 0,
            Self::Respiratory => 1,
            Self::Neurological => 2,
            Self::SuicidalIdeation => 3,
            Self::Safeguarding => 4,
            Self::Haemorrhage => 5,
            Self::Allergic => 6,
            Self::Seizure => 7,
            Self::Oncology => 8,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cardiac => "cardiac",
            Self::Respiratory => "respiratory",
            Self::Neurological => "neurological",
            Self::SuicidalIdeation => "suicidal_ideation",
            Self::Safeguarding => "safeguarding",
            Self::Haemorrhage => "haemorrhage",
            Self::Allergic => "allergic",
            Self::Seizure => "seizure",
            Self::Oncology => "oncology",
        }
    }
}

/// Who an escalation is handed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationTarget {
    EmergencyServices,
    DutyClinician,
    CrisisLine,
    SafeguardingLead,
}

/// A zero-tolerance emergency pattern with its scripted handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedFlagProtocol {
    pub id: String,
    pub category: RedFlagCategory,
    pub trigger_phrases: Vec<String>,
    /// Short imperative for the patient, e.g. "Call 999 now".
    pub immediate_action: String,
    /// Full scripted response used verbatim for the highest-priority match.
    pub scripted_response: String,
    pub escalation_target: EscalationTarget,
}

macro_rules! protocol {
    ($id:expr, $cat:expr, $target:expr, $action:expr, $script:expr, [$($phrase:expr),+ $(,)?]) => {
        RedFlagProtocol {
            id: $id.to_string(),
            category: $cat,
            trigger_phrases: vec![$($phrase.to_string()),+],
            immediate_action: $action.to_string(),
            scripted_response: $script.to_string(),
            escalation_target: $target,
        }
    };
}

/// The standard red-flag catalog. Static, reviewed data.
pub fn standard_protocols() -> Vec<RedFlagProtocol> {
    vec![
        protocol!(
            "rf-cardiac-chest-pain",
            RedFlagCategory::Cardiac,
            EscalationTarget::EmergencyServices,
            "Call 999 immediately",
            "This could be a heart attack. Please call 999 now, or ask someone near you to call. \
             Do not drive yourself. If you have aspirin and are not allergic, chew one 300mg tablet \
             while you wait. Stay on the line with the 999 operator.",
            ["chest pain", "crushing chest", "chest tightness", "pain spreading to my arm",
             "pain in my jaw", "arm is tingling", "left arm numb", "elephant on my chest"]
        ),
        protocol!(
            "rf-respiratory-distress",
            RedFlagCategory::Respiratory,
            EscalationTarget::EmergencyServices,
            "Call 999 immediately",
            "Severe difficulty breathing is an emergency. Please call 999 now. Sit upright, \
             try to stay calm, and if you have a prescribed inhaler use it while you wait for the ambulance.",
            ["can't breathe", "cannot breathe", "struggling to breathe", "gasping for air",
             "lips turning blue", "choking"]
        ),
        protocol!(
            "rf-stroke",
            RedFlagCategory::Neurological,
            EscalationTarget::EmergencyServices,
            "Call 999 immediately - FAST",
            "These symptoms could mean a stroke. Call 999 immediately. Note the time the symptoms \
             started - the ambulance team will ask. Do not eat or drink anything while you wait.",
            ["face drooping", "face has dropped", "slurred speech", "speech is slurred",
             "can't lift my arm", "arm weakness", "sudden severe headache",
             "worst headache of my life", "one side of my body"]
        ),
        protocol!(
            "rf-suicidal-ideation",
            RedFlagCategory::SuicidalIdeation,
            EscalationTarget::CrisisLine,
            "Immediate crisis support",
            "I'm really glad you told me - that took courage, and you deserve support right now. \
             If you are in immediate danger please call 999. You can also call the Samaritans free \
             on 116 123, any time, day or night. I am alerting our duty clinician now so someone \
             from the practice will contact you today. You are not alone in this.",
            ["want to end my life", "kill myself", "suicidal", "don't want to be here anymore",
             "end it all", "better off without me", "taken an overdose", "overdose"]
        ),
        protocol!(
            "rf-safeguarding",
            RedFlagCategory::Safeguarding,
            EscalationTarget::SafeguardingLead,
            "Safeguarding referral",
            "Thank you for telling me - what you've described is serious and you deserve to be safe. \
             I am flagging this to our safeguarding lead who will contact you urgently and in \
             confidence. If you are in immediate danger, please call 999.",
            ["afraid of my partner", "he hits me", "she hits me", "being abused",
             "not safe at home", "someone is hurting me", "hurting my child"]
        ),
        protocol!(
            "rf-haemorrhage",
            RedFlagCategory::Haemorrhage,
            EscalationTarget::EmergencyServices,
            "Call 999 immediately",
            "Heavy uncontrolled bleeding is an emergency. Call 999 now. Apply firm continuous \
             pressure to the wound with a clean cloth and keep the injured area raised if you can.",
            ["bleeding heavily", "won't stop bleeding", "blood everywhere", "vomiting blood",
             "coughing up a lot of blood"]
        ),
        protocol!(
            "rf-anaphylaxis",
            RedFlagCategory::Allergic,
            EscalationTarget::EmergencyServices,
            "Call 999 immediately - use adrenaline pen if prescribed",
            "This sounds like a severe allergic reaction. Call 999 now. If you have an adrenaline \
             auto-injector (EpiPen), use it immediately in the outer thigh. Lie down with your legs \
             raised unless breathing is easier sitting up.",
            ["throat is closing", "tongue swelling", "tongue is swelling", "lips swelling",
             "anaphylaxis", "anaphylactic", "allergic and can't breathe"]
        ),
        protocol!(
            "rf-seizure",
            RedFlagCategory::Seizure,
            EscalationTarget::EmergencyServices,
            "Call 999 if seizure ongoing or first-ever",
            "If someone is having a seizure now, or this is a first-ever seizure, call 999. \
             Do not restrain them or put anything in their mouth. Cushion their head and time \
             the seizure - longer than 5 minutes is an emergency.",
            ["having a seizure", "is fitting", "won't stop fitting", "first seizure",
             "seizure won't stop", "still convulsing"]
        ),
        protocol!(
            "rf-oncology-urgent",
            RedFlagCategory::Oncology,
            EscalationTarget::DutyClinician,
            "Urgent clinician review",
            "The combination of symptoms you've described needs prompt review by a clinician. \
             I am flagging your message to our duty clinician, who will call you today to arrange \
             an urgent appointment. If anything worsens suddenly, call 111 or 999.",
            ["lump and losing weight", "lump and night sweats", "coughing up blood for weeks",
             "blood in my stool and weight loss"]
        ),
    ]
}

/// Scan text for red flags. Returns every matching protocol, sorted by
/// category priority (then catalog order within a category). Empty means no
/// emergency signal.
pub fn scan(text: &str) -> Vec<RedFlagProtocol> {
    let lowered = text.to_lowercase();
    let mut matched: Vec<RedFlagProtocol> = standard_protocols()
        .into_iter()
        .filter(|p| p.trigger_phrases.iter().any(|t| lowered.contains(t.as_str())))
        .collect();
    matched.sort_by_key(|p| p.category.priority_rank());
    matched
}
