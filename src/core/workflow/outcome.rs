use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Why a step or decision concluded; the key for successor lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    StepComplete,
    StepAbort,
    StepContinue,
    DecisionApprove,
    DecisionDeny,
    DecisionHold,
    DecisionReassign,
    DecisionAcknowledge,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::StepComplete => "step_complete",
            Outcome::StepAbort => "step_abort",
            Outcome::StepContinue => "step_continue",
            Outcome::DecisionApprove => "decision_approve",
            Outcome::DecisionDeny => "decision_deny",
            Outcome::DecisionHold => "decision_hold",
            Outcome::DecisionReassign => "decision_reassign",
            Outcome::DecisionAcknowledge => "decision_acknowledge",
        }
    }

    /// Outcomes that leave a decision unresolved when supplied.
    pub fn is_non_final(&self) -> bool {
        matches!(self, Outcome::DecisionHold | Outcome::DecisionReassign)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Outcome {
    type Err = &'static str;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_lowercase().as_str() {
            "step_complete" => Ok(Outcome::StepComplete),
            "step_abort" => Ok(Outcome::StepAbort),
            "step_continue" => Ok(Outcome::StepContinue),
            "decision_approve" | "approve" => Ok(Outcome::DecisionApprove),
            "decision_deny" | "deny" => Ok(Outcome::DecisionDeny),
            "decision_hold" | "hold" => Ok(Outcome::DecisionHold),
            "decision_reassign" | "reassign" => Ok(Outcome::DecisionReassign),
            "decision_acknowledge" | "acknowledge" => Ok(Outcome::DecisionAcknowledge),
            _ => Err("unrecognized outcome"),
        }
    }
}
