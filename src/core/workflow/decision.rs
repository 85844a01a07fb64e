use super::outcome::Outcome;
use crate::core::auth::Principal;

/// A step that suspends the workflow until a responsible actor supplies an
/// outcome. Every decision registers at least one resolvable outcome.
#[derive(Debug, Clone)]
pub struct Decision {
    title: String,
    actor: Principal,
    default_outcome: Outcome,
    outcomes: Vec<Outcome>,
}

impl Decision {
    /// A decision with an explicit outcome set. The default outcome is
    /// always part of the set.
    pub fn new<T: Into<String>>(
        title: T,
        actor: Principal,
        default_outcome: Outcome,
        mut outcomes: Vec<Outcome>,
    ) -> Self {
        if !outcomes.contains(&default_outcome) {
            outcomes.insert(0, default_outcome);
        }
        Self {
            title: title.into(),
            actor,
            default_outcome,
            outcomes,
        }
    }

    /// The standard approval decision: exactly APPROVE (default) and DENY.
    pub fn simple<T: Into<String>>(title: T, actor: Principal) -> Self {
        Self::new(
            title,
            actor,
            Outcome::DecisionApprove,
            vec![Outcome::DecisionApprove, Outcome::DecisionDeny],
        )
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn actor(&self) -> &Principal {
        &self.actor
    }

    /// Hand the decision to a different actor. Accumulated workflow state is
    /// untouched.
    pub fn reassign(&mut self, actor: Principal) {
        self.actor = actor;
    }

    pub fn default_outcome(&self) -> Outcome {
        self.default_outcome
    }

    /// The outcomes an actor may resolve this decision with.
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn accepts(&self, outcome: Outcome) -> bool {
        self.outcomes.contains(&outcome)
    }
}
