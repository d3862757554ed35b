//! Post-hoc turn evaluation scores.
//!
//! Produced by an independent judge call over the completed transcript. A
//! parse failure yields the neutral default; evaluation must never block the
//! primary response.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnEvaluation {
    pub overall_score: u8,
    pub clinical_safety: u8,
    pub patient_experience: u8,
    pub efficiency: u8,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub improvements: Vec<String>,
}

impl TurnEvaluation {
    /// All-5s fallback used when the judge fails or returns garbage.
    pub fn neutral() -> Self {
        Self {
            overall_score: 5,
            clinical_safety: 5,
            patient_experience: 5,
            efficiency: 5,
            reasoning: "evaluation unavailable; neutral default".to_string(),
            improvements: Vec::new(),
        }
    }

    /// Lenient parse from a judge's JSON. Missing or out-of-range scores are
    /// clamped to the neutral 5; scores are always kept in 1..=10.
    pub fn from_json_value(v: &Value) -> Self {
        fn score(v: &Value, key: &str) -> u8 {
            v.get(key)
                .and_then(|x| x.as_i64())
                .map(|n| n.clamp(1, 10) as u8)
                .unwrap_or(5)
        }

        Self {
            overall_score: score(v, "overall_score"),
            clinical_safety: score(v, "clinical_safety"),
            patient_experience: score(v, "patient_experience"),
            efficiency: score(v, "efficiency"),
            reasoning: v
                .get("reasoning")
                .and_then(|x| x.as_str())
                .unwrap_or("no reasoning provided")
                .to_string(),
            improvements: v
                .get("improvements")
                .and_then(|x| x.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|i| i.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_neutral_all_fives() {
        let e = TurnEvaluation::neutral();
        assert_eq!(e.overall_score, 5);
        assert_eq!(e.clinical_safety, 5);
        assert_eq!(e.patient_experience, 5);
        assert_eq!(e.efficiency, 5);
    }

    #[test]
    fn test_from_json_value_complete() {
        let v = json!({
            "overall_score": 8,
            "clinical_safety": 10,
            "patient_experience": 7,
            "efficiency": 6,
            "reasoning": "handled safely",
            "improvements": ["offer earlier slot"]
        });
        let e = TurnEvaluation::from_json_value(&v);
        assert_eq!(e.overall_score, 8);
        assert_eq!(e.clinical_safety, 10);
        assert_eq!(e.improvements, vec!["offer earlier slot".to_string()]);
    }

    #[test]
    fn test_from_json_value_clamps_and_defaults() {
        let v = json!({"overall_score": 42, "clinical_safety": 0});
        let e = TurnEvaluation::from_json_value(&v);
        assert_eq!(e.overall_score, 10);
        assert_eq!(e.clinical_safety, 1);
        assert_eq!(e.patient_experience, 5);
        assert_eq!(e.efficiency, 5);
    }
}
