//! SNOMED-style clinical concept library.
//!
//! A static catalog of phrase-to-code mappings with urgency weights. Pure
//! data plus a deterministic matcher: the catalog is separate from the
//! matching function so it can be tested exhaustively without the reasoning
//! loop.

use serde::{Deserialize, Serialize};

use crate::state::UrgencyLevel;

/// A clinical concept with its trigger phrases and urgency weight (0-10).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConceptMatch {
    pub code: String,
    pub display: String,
    pub category: String,
    pub red_flag: bool,
    pub urgency_weight: u8,
    pub trigger_phrases: Vec<String>,
}

/// Map an urgency weight to a tier: >=9 emergency, >=7 urgent, >=4 soon.
pub fn urgency_for_weight(weight: u8) -> UrgencyLevel {
    match weight {
        9..=u8::MAX => UrgencyLevel::Emergency,
        7..=8 => UrgencyLevel::Urgent,
        4..=6 => UrgencyLevel::Soon,
        _ => UrgencyLevel::Routine,
    }
}

macro_rules! concept {
    ($code:expr, $display:expr, $category:expr, $red:expr, $weight:expr, [$($phrase:expr),+ $(,)?]) => {
        ConceptMatch {
            code: $code.to_string(),
            display: $display.to_string(),
            category: $category.to_string(),
            red_flag: $red,
            urgency_weight: $weight,
            trigger_phrases: vec![$($phrase.to_string()),+],
        }
    };
}

/// The standard concept catalog. Read-only at runtime.
pub fn standard_catalog() -> Vec<ConceptMatch> {
    vec![
        concept!("29857009", "Chest pain", "cardiovascular", true, 10,
            ["chest pain", "chest pains", "pain in my chest", "chest hurts", "crushing chest"]),
        concept!("267036007", "Dyspnoea", "respiratory", true, 9,
            ["can't breathe", "cannot breathe", "short of breath", "shortness of breath", "struggling to breathe", "breathless"]),
        concept!("271594007", "Syncope", "neurological", true, 9,
            ["passed out", "fainted", "blacked out", "collapsed", "lost consciousness"]),
        concept!("44695005", "Facial droop", "neurological", true, 10,
            ["face drooping", "face has dropped", "droopy face", "one side of my face"]),
        concept!("26544005", "Muscle weakness", "neurological", true, 9,
            ["arm weakness", "weak arm", "can't lift my arm", "leg gone weak", "arm is tingling"]),
        concept!("6471006", "Suicidal thoughts", "mental_health", true, 10,
            ["want to end my life", "suicidal", "kill myself", "don't want to be here anymore", "end it all"]),
        concept!("89659001", "Haemoptysis", "respiratory", true, 8,
            ["coughing up blood", "blood when i cough"]),
        concept!("405729008", "Haematochezia", "gastrointestinal", true, 7,
            ["blood in my stool", "blood in my poo", "bleeding from my bottom", "rectal bleeding"]),
        concept!("25064002", "Headache", "neurological", false, 4,
            ["headache", "head hurts", "my head is pounding", "migraine"]),
        concept!("95668009", "Thunderclap headache", "neurological", true, 10,
            ["worst headache of my life", "sudden severe headache", "thunderclap headache"]),
        concept!("386661006", "Fever", "general", false, 4,
            ["fever", "high temperature", "temperature of", "burning up"]),
        concept!("49727002", "Cough", "respiratory", false, 2,
            ["cough", "coughing"]),
        concept!("267102003", "Sore throat", "respiratory", false, 2,
            ["sore throat", "throat hurts"]),
        concept!("21522001", "Abdominal pain", "gastrointestinal", false, 5,
            ["stomach pain", "tummy ache", "abdominal pain", "stomach ache", "belly hurts"]),
        concept!("422587007", "Nausea", "gastrointestinal", false, 3,
            ["nausea", "feel sick", "feeling sick", "nauseous"]),
        concept!("422400008", "Vomiting", "gastrointestinal", false, 4,
            ["vomiting", "throwing up", "been sick", "keep vomiting"]),
        concept!("62315008", "Diarrhoea", "gastrointestinal", false, 3,
            ["diarrhoea", "diarrhea", "loose stools"]),
        concept!("271807003", "Rash", "dermatological", false, 3,
            ["rash", "skin rash", "itchy skin", "spots on my skin"]),
        concept!("247441003", "Non-blanching rash", "dermatological", true, 9,
            ["rash that doesn't fade", "rash that won't go away with a glass", "non-blanching rash"]),
        concept!("84229001", "Fatigue", "general", false, 2,
            ["tired all the time", "exhausted", "fatigue", "no energy"]),
        concept!("161891005", "Back pain", "musculoskeletal", false, 3,
            ["back pain", "back ache", "my back hurts"]),
        concept!("68962001", "Muscle pain", "musculoskeletal", false, 2,
            ["muscle pain", "aching muscles", "body aches"]),
        concept!("247373008", "Earache", "ent", false, 2,
            ["earache", "ear pain", "ear hurts"]),
        concept!("162397003", "Dysuria", "genitourinary", false, 4,
            ["burning when i pee", "pain when urinating", "stings when i wee"]),
        concept!("34436003", "Haematuria", "genitourinary", true, 7,
            ["blood in my urine", "blood in my pee", "blood when i urinate"]),
        concept!("248062006", "Dizziness", "neurological", false, 4,
            ["dizzy", "dizziness", "lightheaded", "room spinning"]),
        concept!("302866003", "Hypoglycaemia symptoms", "endocrine", false, 6,
            ["shaky and sweaty", "blood sugar is low", "hypo"]),
        concept!("271825005", "Weight loss", "general", false, 6,
            ["losing weight without trying", "unexplained weight loss", "lost a lot of weight"]),
        concept!("248234008", "Lump", "oncology", false, 6,
            ["found a lump", "lump in my", "swelling that won't go"]),
        concept!("40917007", "Confusion", "neurological", true, 8,
            ["suddenly confused", "confused and drowsy", "not making sense", "disoriented"]),
        concept!("91175000", "Seizure", "neurological", true, 9,
            ["seizure", "convulsion", "having a fit", "had a fit", "fitting"]),
        concept!("39579001", "Anaphylaxis", "allergy", true, 10,
            ["throat is closing", "tongue swelling", "lips swelling", "anaphylaxis", "anaphylactic"]),
        concept!("417746004", "Injury", "trauma", false, 4,
            ["injured", "sprained", "twisted my ankle", "pulled a muscle"]),
        concept!("125605004", "Fracture suspected", "trauma", false, 7,
            ["think it's broken", "might be broken", "heard a crack"]),
        concept!("48694002", "Anxiety", "mental_health", false, 4,
            ["anxious", "anxiety", "panic attack", "panicking"]),
        concept!("35489007", "Low mood", "mental_health", false, 5,
            ["depressed", "low mood", "feeling down", "can't cope"]),
    ]
}

/// Extract all concepts whose trigger phrases appear in the text.
/// Case-insensitive substring matching, deduplicated by code, sorted
/// descending by urgency weight.
pub fn extract(text: &str) -> Vec<ConceptMatch> {
    let lowered = text.to_lowercase();
    let mut matches: Vec<ConceptMatch> = Vec::new();

    for concept in standard_catalog() {
        let hit = concept
            .trigger_phrases
            .iter()
            .any(|p| lowered.contains(p.as_str()));
        if hit && !matches.iter().any(|m| m.code == concept.code) {
            matches.push(concept);
        }
    }

    matches.sort_by(|a, b| b.urgency_weight.cmp(&a.urgency_weight));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_codes_unique() {
        let catalog = standard_catalog();
        let mut codes: Vec<_> = catalog.iter().map(|c| c.code.clone()).collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), catalog.len());
    }

    #[test]
    fn test_catalog_weights_in_range() {
        for c in standard_catalog() {
            assert!(c.urgency_weight <= 10, "weight out of range for {}", c.code);
            assert!(!c.trigger_phrases.is_empty());
        }
    }

    #[test]
    fn test_extract_chest_pain() {
        let matches = extract("I've been having really bad chest pains since this morning");
        assert!(matches.iter().any(|m| m.code == "29857009"));
        assert!(matches[0].red_flag);
    }

    #[test]
    fn test_extract_sorted_by_weight() {
        let matches = extract("I have a cough and chest pain");
        assert!(matches.len() >= 2);
        for pair in matches.windows(2) {
            assert!(pair[0].urgency_weight >= pair[1].urgency_weight);
        }
        assert_eq!(matches[0].code, "29857009");
    }

    #[test]
    fn test_extract_dedupes_codes() {
        let matches = extract("chest pain, awful chest pains, my chest hurts");
        let count = matches.iter().filter(|m| m.code == "29857009").count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_extract_case_insensitive() {
        let matches = extract("CHEST PAIN and I CANNOT BREATHE");
        assert!(matches.iter().any(|m| m.code == "29857009"));
        assert!(matches.iter().any(|m| m.code == "267036007"));
    }

    #[test]
    fn test_extract_no_match() {
        assert!(extract("what time do you open on saturdays?").is_empty());
    }

    #[test]
    fn test_admin_wording_is_not_a_symptom() {
        // "fit note" and "confused about" are everyday admin phrasing and
        // must not trip the seizure or confusion concepts.
        assert!(extract("I need a fit note for work please").is_empty());
        assert!(extract("I'm a bit confused about my bill").is_empty());
        assert!(extract("do you do fitness checks for new patients?").is_empty());
    }

    #[test]
    fn test_seizure_and_confusion_phrases_still_match() {
        assert!(extract("my son is having a fit")
            .iter()
            .any(|m| m.code == "91175000"));
        assert!(extract("she had a seizure an hour ago")
            .iter()
            .any(|m| m.code == "91175000"));
        assert!(extract("dad is suddenly confused and not making sense")
            .iter()
            .any(|m| m.code == "40917007"));
    }

    #[test]
    fn test_urgency_for_weight_tiers() {
        assert_eq!(urgency_for_weight(10), UrgencyLevel::Emergency);
        assert_eq!(urgency_for_weight(9), UrgencyLevel::Emergency);
        assert_eq!(urgency_for_weight(8), UrgencyLevel::Urgent);
        assert_eq!(urgency_for_weight(7), UrgencyLevel::Urgent);
        assert_eq!(urgency_for_weight(6), UrgencyLevel::Soon);
        assert_eq!(urgency_for_weight(4), UrgencyLevel::Soon);
        assert_eq!(urgency_for_weight(3), UrgencyLevel::Routine);
        assert_eq!(urgency_for_weight(0), UrgencyLevel::Routine);
    }
}
