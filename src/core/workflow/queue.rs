use super::step::StepId;
use crate::core::auth::Principal;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// A decision awaiting its actor, visible in the engine-wide queue.
#[derive(Debug, Clone)]
pub struct PendingDecision {
    pub workflow_id: Uuid,
    pub step_id: StepId,
    pub title: String,
    pub actor: Principal,
    pub workflow_title: String,
}

/// Engine-wide inbox of pending decisions.
///
/// Workflows enqueue a decision when they suspend and the calling thread
/// returns; a later, independent request resolves it. Entries keep arrival
/// order so an actor's inbox reads oldest-first.
#[derive(Default)]
pub struct DecisionQueue {
    pending: Mutex<Vec<PendingDecision>>,
}

impl DecisionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    // Entries are self-contained records appended or removed whole, so a
    // guard recovered from a panicked holder is still structurally sound.
    fn lock(&self) -> MutexGuard<'_, Vec<PendingDecision>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn enqueue(&self, decision: PendingDecision) {
        self.lock().push(decision);
    }

    pub fn remove(&self, workflow_id: Uuid, step_id: StepId) {
        self.lock()
            .retain(|entry| !(entry.workflow_id == workflow_id && entry.step_id == step_id));
    }

    pub fn reassign(&self, workflow_id: Uuid, step_id: StepId, actor: Principal) {
        for entry in self.lock().iter_mut() {
            if entry.workflow_id == workflow_id && entry.step_id == step_id {
                entry.actor = actor.clone();
            }
        }
    }

    /// All pending decisions assigned to `actor`, oldest first.
    pub fn pending_for(&self, actor: &Principal) -> Vec<PendingDecision> {
        self.lock()
            .iter()
            .filter(|entry| &entry.actor == actor)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
