//! Multi-factor patient identity verification.
//!
//! Extracts candidate name, date of birth and NHS number from free text with
//! tolerant parsing (numeric dates in several formats, month names, spoken
//! ordinals like "third of May 1985", spaced or unspaced identifiers), then
//! matches against the patient directory. Verification succeeds on any of
//! name+DOB, NHS+DOB, name+NHS, or all three.
//!
//! The attempt cap is a hard invariant: attempt 3 on non-matching input is
//! terminal and requires human escalation, never another retry prompt.

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::directory::{PatientRecord, PracticeDirectory};

/// Compile a hardcoded pattern once and cache it for the process lifetime.
fn cached(cell: &'static OnceLock<Regex>, pattern: &'static str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("hardcoded pattern compiles"))
}

/// Hard cap on verification attempts. Not configurable per call.
pub const MAX_VERIFICATION_ATTEMPTS: u32 = 3;

/// Which factor combination verified the patient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    NameDob,
    NhsDob,
    NameNhs,
    FullMatch,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NameDob => "name_dob",
            Self::NhsDob => "nhs_dob",
            Self::NameNhs => "name_nhs",
            Self::FullMatch => "full_match",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<MatchMethod>,
    pub attempt: u32,
    /// True when the attempt cap has been reached; the caller must hand off
    /// to a human instead of prompting again.
    pub exhausted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

/// Candidate identity fields pulled from free text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedIdentity {
    pub name: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub nhs_number: Option<String>,
}

impl ExtractedIdentity {
    pub fn factor_count(&self) -> usize {
        [
            self.name.is_some(),
            self.date_of_birth.is_some(),
            self.nhs_number.is_some(),
        ]
        .iter()
        .filter(|b| **b)
        .count()
    }
}

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const SPOKEN_ORDINALS: &[(&str, u32)] = &[
    ("first", 1),
    ("second", 2),
    ("third", 3),
    ("fourth", 4),
    ("fifth", 5),
    ("sixth", 6),
    ("seventh", 7),
    ("eighth", 8),
    ("ninth", 9),
    ("tenth", 10),
    ("eleventh", 11),
    ("twelfth", 12),
    ("thirteenth", 13),
    ("fourteenth", 14),
    ("fifteenth", 15),
    ("sixteenth", 16),
    ("seventeenth", 17),
    ("eighteenth", 18),
    ("nineteenth", 19),
    ("twentieth", 20),
    ("twenty first", 21),
    ("twenty-first", 21),
    ("twenty second", 22),
    ("twenty-second", 22),
    ("twenty third", 23),
    ("twenty-third", 23),
    ("twenty fourth", 24),
    ("twenty-fourth", 24),
    ("twenty fifth", 25),
    ("twenty-fifth", 25),
    ("twenty sixth", 26),
    ("twenty-sixth", 26),
    ("twenty seventh", 27),
    ("twenty-seventh", 27),
    ("twenty eighth", 28),
    ("twenty-eighth", 28),
    ("twenty ninth", 29),
    ("twenty-ninth", 29),
    ("thirtieth", 30),
    ("thirty first", 31),
    ("thirty-first", 31),
];

fn month_number(token: &str) -> Option<u32> {
    let t = token.to_lowercase();
    MONTHS
        .iter()
        .find(|(name, _)| t == *name || (t.len() >= 3 && name.starts_with(&t)))
        .map(|(_, n)| *n)
}

/// Parse a DOB from free text. Accepted forms, first match wins:
/// - numeric: 03/05/1985, 3-5-1985, 1985-05-03
/// - month name: 3 May 1985, May 3 1985, 3rd of May 1985
/// - spoken ordinal: "third of May 1985"
pub fn parse_dob(text: &str) -> Option<NaiveDate> {
    let lowered = text.to_lowercase();

    // ISO-ish: 1985-05-03
    static ISO: OnceLock<Regex> = OnceLock::new();
    let iso = cached(&ISO, r"\b(19|20)(\d{2})-(\d{1,2})-(\d{1,2})\b");
    if let Some(c) = iso.captures(&lowered) {
        let year: i32 = format!("{}{}", &c[1], &c[2]).parse().ok()?;
        let month: u32 = c[3].parse().ok()?;
        let day: u32 = c[4].parse().ok()?;
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    // UK numeric: 03/05/1985 or 3-5-85
    static NUMERIC: OnceLock<Regex> = OnceLock::new();
    let numeric = cached(&NUMERIC, r"\b(\d{1,2})[/\-.](\d{1,2})[/\-.](\d{2,4})\b");
    if let Some(c) = numeric.captures(&lowered) {
        let day: u32 = c[1].parse().ok()?;
        let month: u32 = c[2].parse().ok()?;
        let mut year: i32 = c[3].parse().ok()?;
        if year < 100 {
            year += if year <= 26 { 2000 } else { 1900 };
        }
        if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(d);
        }
    }

    // "3rd of May 1985", "3 May 1985"
    static DAY_MONTH: OnceLock<Regex> = OnceLock::new();
    let day_month = cached(
        &DAY_MONTH,
        r"\b(\d{1,2})(?:st|nd|rd|th)?\s+(?:of\s+)?([a-z]+)\s+(\d{4})\b",
    );
    if let Some(c) = day_month.captures(&lowered) {
        if let Some(month) = month_number(&c[2]) {
            let day: u32 = c[1].parse().ok()?;
            let year: i32 = c[3].parse().ok()?;
            if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(d);
            }
        }
    }

    // "May 3 1985", "May 3rd, 1985"
    static MONTH_DAY: OnceLock<Regex> = OnceLock::new();
    let month_day = cached(
        &MONTH_DAY,
        r"\b([a-z]+)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
    );
    if let Some(c) = month_day.captures(&lowered) {
        if let Some(month) = month_number(&c[1]) {
            let day: u32 = c[2].parse().ok()?;
            let year: i32 = c[3].parse().ok()?;
            if let Some(d) = NaiveDate::from_ymd_opt(year, month, day) {
                return Some(d);
            }
        }
    }

    // Spoken ordinal: "third of may 1985". Longest ordinals first so
    // "twenty third" is not read as "third".
    let mut ordinals: Vec<&(&str, u32)> = SPOKEN_ORDINALS.iter().collect();
    ordinals.sort_by_key(|(word, _)| std::cmp::Reverse(word.len()));
    static ORDINAL_TAIL: OnceLock<Regex> = OnceLock::new();
    let tail = cached(&ORDINAL_TAIL, r"^\s+(?:of\s+)?([a-z]+)\s+(\d{4})");
    for (word, day) in ordinals {
        if let Some(pos) = lowered.find(word) {
            let rest = &lowered[pos + word.len()..];
            if let Some(c) = tail.captures(rest) {
                if let Some(month) = month_number(&c[1]) {
                    let year: i32 = c[2].parse().ok()?;
                    if let Some(d) = NaiveDate::from_ymd_opt(year, month, *day) {
                        return Some(d);
                    }
                }
            }
        }
    }

    None
}

/// Parse an NHS-style 10-digit identifier, spaced (485 777 3456) or not.
pub fn parse_nhs_number(text: &str) -> Option<String> {
    static NHS: OnceLock<Regex> = OnceLock::new();
    let re = cached(&NHS, r"\b(\d{3})[\s\-]?(\d{3})[\s\-]?(\d{4})\b");
    // Skip candidates that are actually dates (already consumed elsewhere).
    for c in re.captures_iter(text) {
        let joined = format!("{}{}{}", &c[1], &c[2], &c[3]);
        if joined.len() == 10 {
            return Some(joined);
        }
    }
    None
}

/// Pull a candidate full name from phrases like "my name is ..." or
/// "this is ...", falling back to a capitalized first-last pair.
pub fn parse_name(text: &str) -> Option<String> {
    static STATED: OnceLock<Regex> = OnceLock::new();
    let stated = cached(
        &STATED,
        r"(?i)(?:my name is|this is|i am|i'm|it's)\s+([A-Za-z][A-Za-z'\-]+(?:\s+[A-Za-z][A-Za-z'\-]+){1,2})",
    );
    if let Some(c) = stated.captures(text) {
        return Some(normalize_name(&c[1]));
    }

    static PAIR: OnceLock<Regex> = OnceLock::new();
    let pair = cached(&PAIR, r"\b([A-Z][a-z'\-]+)\s+([A-Z][a-z'\-]+)\b");
    if let Some(c) = pair.captures(text) {
        return Some(normalize_name(&format!("{} {}", &c[1], &c[2])));
    }
    None
}

fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Extract all candidate identity factors from one message.
pub fn extract_identity(text: &str) -> ExtractedIdentity {
    ExtractedIdentity {
        name: parse_name(text),
        date_of_birth: parse_dob(text),
        nhs_number: parse_nhs_number(text),
    }
}

fn matches_patient(candidate: &ExtractedIdentity, patient: &PatientRecord) -> Option<MatchMethod> {
    let name_ok = candidate
        .name
        .as_deref()
        .map(|n| patient.full_name.to_lowercase() == n)
        .unwrap_or(false);
    let dob_ok = candidate
        .date_of_birth
        .map(|d| patient.date_of_birth == d)
        .unwrap_or(false);
    let nhs_ok = candidate
        .nhs_number
        .as_deref()
        .map(|n| patient.nhs_number == n)
        .unwrap_or(false);

    match (name_ok, dob_ok, nhs_ok) {
        (true, true, true) => Some(MatchMethod::FullMatch),
        (true, true, false) => Some(MatchMethod::NameDob),
        (false, true, true) => Some(MatchMethod::NhsDob),
        (true, false, true) => Some(MatchMethod::NameNhs),
        _ => None,
    }
}

/// Attempt identity verification against the directory.
///
/// `attempt` is 1-based and counts failed attempts across the session. At
/// attempt >= `MAX_VERIFICATION_ATTEMPTS` a non-matching input is terminal.
pub fn verify(text: &str, attempt: u32, directory: &PracticeDirectory) -> VerificationResult {
    let candidate = extract_identity(text);

    if candidate.factor_count() >= 2 {
        for patient in &directory.patients {
            if let Some(method) = matches_patient(&candidate, patient) {
                return VerificationResult {
                    verified: true,
                    patient_id: Some(patient.patient_id.clone()),
                    method: Some(method),
                    attempt,
                    exhausted: false,
                    failure_reason: None,
                };
            }
        }
    }

    let reason = if candidate.factor_count() < 2 {
        format!(
            "need at least two of name, date of birth, NHS number ({} provided)",
            candidate.factor_count()
        )
    } else {
        "details did not match our records".to_string()
    };

    VerificationResult {
        verified: false,
        patient_id: None,
        method: None,
        attempt,
        exhausted: attempt >= MAX_VERIFICATION_ATTEMPTS,
        failure_reason: Some(reason),
    }
}
