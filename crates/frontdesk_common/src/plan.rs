//! The reasoning loop's inspectable plan.
//!
//! Each model-chosen action becomes a `CortexStep`; the ordered, append-only
//! list is the Plan. Modeling the loop as step-indexed state makes progress,
//! budget and termination unit-testable without a model provider.

use serde::{Deserialize, Serialize};

/// Hard cap on reasoning-loop steps per turn.
pub const MAX_CORTEX_STEPS: usize = 12;

/// One executed action inside the reasoning loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CortexStep {
    pub step: usize,
    /// The model's accompanying reasoning text, if any.
    pub reasoning: String,
    pub tool: String,
    pub input: serde_json::Value,
    pub observation: String,
    pub success: bool,
    pub duration_ms: u64,
}

/// Ordered record of a turn's reasoning.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Plan {
    pub goal: String,
    pub steps: Vec<CortexStep>,
    pub total_duration_ms: u64,
}

// Hand-written so the wire shape carries the step count alongside the steps.
impl Serialize for Plan {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Plan", 4)?;
        s.serialize_field("goal", &self.goal)?;
        s.serialize_field("steps", &self.steps)?;
        s.serialize_field("total_steps", &self.total_steps())?;
        s.serialize_field("total_duration_ms", &self.total_duration_ms)?;
        s.end()
    }
}

impl Plan {
    pub fn new(goal: impl Into<String>) -> Self {
        Self {
            goal: goal.into(),
            steps: Vec::new(),
            total_duration_ms: 0,
        }
    }

    /// Append a step, numbering it after the last one.
    pub fn record(&mut self, mut step: CortexStep) {
        step.step = self.steps.len() + 1;
        self.total_duration_ms += step.duration_ms;
        self.steps.push(step);
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    pub fn budget_exhausted(&self) -> bool {
        self.steps.len() >= MAX_CORTEX_STEPS
    }

    pub fn failed_steps(&self) -> usize {
        self.steps.iter().filter(|s| !s.success).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(tool: &str, success: bool) -> CortexStep {
        CortexStep {
            step: 0,
            reasoning: String::new(),
            tool: tool.to_string(),
            input: serde_json::json!({}),
            observation: "ok".to_string(),
            success,
            duration_ms: 5,
        }
    }

    #[test]
    fn test_record_numbers_steps() {
        let mut plan = Plan::new("book appointment");
        plan.record(step("find_slots", true));
        plan.record(step("book_appointment", true));
        assert_eq!(plan.steps[0].step, 1);
        assert_eq!(plan.steps[1].step, 2);
        assert_eq!(plan.total_steps(), 2);
        assert_eq!(plan.total_duration_ms, 10);
    }

    #[test]
    fn test_budget_exhausted() {
        let mut plan = Plan::new("loop");
        for _ in 0..MAX_CORTEX_STEPS {
            assert!(!plan.budget_exhausted());
            plan.record(step("lookup_patient", true));
        }
        assert!(plan.budget_exhausted());
    }

    #[test]
    fn test_serialized_plan_carries_step_count() {
        let mut plan = Plan::new("book appointment");
        plan.record(step("find_slots", true));
        let v = serde_json::to_value(&plan).unwrap();
        assert_eq!(v["total_steps"], 1);
        let back: Plan = serde_json::from_value(v).unwrap();
        assert_eq!(back.total_steps(), 1);
    }

    #[test]
    fn test_failed_steps_counted() {
        let mut plan = Plan::new("x");
        plan.record(step("a", true));
        plan.record(step("b", false));
        assert_eq!(plan.failed_steps(), 1);
    }
}
