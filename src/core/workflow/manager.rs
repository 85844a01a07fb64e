#![allow(clippy::result_large_err)]

use super::outcome::Outcome;
use super::queue::{DecisionQueue, PendingDecision};
use super::{Workflow, WorkflowStatus};
use crate::core::auth::{Authorizer, Principal};
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::info;
use uuid::Uuid;

/// Process-wide table of live workflows.
///
/// Each workflow sits behind its own mutex, so the single cross-thread event
/// a workflow sees (decision resolution) is serialized: under concurrent
/// attempts exactly one resolution wins and the rest get a protocol error.
pub struct WorkflowManager {
    workflows: DashMap<Uuid, Arc<Mutex<Workflow>>>,
    queue: Arc<DecisionQueue>,
    authorizer: Arc<dyn Authorizer>,
}

impl WorkflowManager {
    pub fn new(authorizer: Arc<dyn Authorizer>) -> Self {
        Self {
            workflows: DashMap::new(),
            queue: Arc::new(DecisionQueue::new()),
            authorizer,
        }
    }

    pub fn queue(&self) -> &DecisionQueue {
        &self.queue
    }

    /// Register and start a freshly built workflow. Returns its id and the
    /// status it settled into (completed, aborted, or waiting on a decision).
    pub fn start(&self, workflow: Workflow) -> Result<(Uuid, WorkflowStatus), AppError> {
        let id = workflow.id();
        let entry = Arc::new(Mutex::new(workflow));
        self.workflows.insert(id, Arc::clone(&entry));
        let mut guard = entry.lock().map_err(|_| lock_error(id))?;
        let status = guard.start(&self.queue)?;
        info!(workflow = %id, status = status.as_str(), "workflow started");
        Ok((id, status))
    }

    pub fn status(&self, id: Uuid) -> Result<WorkflowStatus, AppError> {
        let entry = self.get(id)?;
        let guard = entry.lock().map_err(|_| lock_error(id))?;
        Ok(guard.status())
    }

    /// Read one attribute of a workflow's shared context.
    pub fn attribute(&self, id: Uuid, name: &str) -> Result<Option<Value>, AppError> {
        let entry = self.get(id)?;
        let guard = entry.lock().map_err(|_| lock_error(id))?;
        Ok(guard.context().get_attribute(name).cloned())
    }

    /// Resolve the pending decision of workflow `id` as `caller`. The caller
    /// must be entitled to decide for the assigned actor.
    pub fn resolve(
        &self,
        id: Uuid,
        caller: &Principal,
        outcome: Outcome,
    ) -> Result<WorkflowStatus, AppError> {
        let entry = self.get(id)?;
        let mut guard = entry.lock().map_err(|_| lock_error(id))?;
        let actor = guard
            .current_decision()
            .map(|(_, decision)| decision.actor().clone())
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::WorkflowProtocolError,
                    format!("workflow {} has no pending decision", id),
                )
                .with_code("WF-PROTO-001")
            })?;
        if !self.authorizer.may_decide(caller, &actor) {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                format!(
                    "{} is not entitled to decide for {} on workflow {}",
                    caller, actor, id
                ),
            )
            .with_code("WF-AUTH-001"));
        }
        let status = guard.resolve(outcome, &self.queue)?;
        info!(workflow = %id, outcome = %outcome, status = status.as_str(), "decision resolved");
        Ok(status)
    }

    /// Reassign the pending decision of workflow `id` to a new actor.
    pub fn reassign(&self, id: Uuid, actor: Principal) -> Result<(), AppError> {
        let entry = self.get(id)?;
        let mut guard = entry.lock().map_err(|_| lock_error(id))?;
        guard.reassign(actor, &self.queue)
    }

    /// Abort a workflow. Idempotent and safe from any thread.
    pub fn abort(&self, id: Uuid) -> Result<(), AppError> {
        let entry = self.get(id)?;
        let mut guard = entry.lock().map_err(|_| lock_error(id))?;
        guard.abort(&self.queue)
    }

    /// Pending decisions assigned to `actor` across all live workflows.
    pub fn pending_for(&self, actor: &Principal) -> Vec<PendingDecision> {
        self.queue.pending_for(actor)
    }

    /// Drop terminated workflows from the table, returning how many were
    /// removed.
    pub fn prune_terminated(&self) -> usize {
        let before = self.workflows.len();
        self.workflows.retain(|_, entry| {
            entry
                .lock()
                .map(|guard| !guard.status().is_terminal())
                .unwrap_or(false)
        });
        before - self.workflows.len()
    }

    fn get(&self, id: Uuid) -> Result<Arc<Mutex<Workflow>>, AppError> {
        self.workflows
            .get(&id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| {
                AppError::new(
                    ErrorCategory::ValidationError,
                    format!("unknown workflow: {}", id),
                )
                .with_code("WF-LOOKUP-001")
            })
    }
}

fn lock_error(id: Uuid) -> AppError {
    AppError::new(
        ErrorCategory::InternalError,
        format!("workflow {} lock poisoned by a panicked thread", id),
    )
    .with_code("WF-LOCK-001")
}
