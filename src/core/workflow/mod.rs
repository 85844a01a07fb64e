#![allow(clippy::result_large_err)] // Workflow APIs return AppError so protocol violations carry full context.

use crate::core::auth::Principal;
use crate::core::error::AppError;
use crate::core::types::ErrorCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub mod decision;
pub mod manager;
pub mod outcome;
pub mod queue;
pub mod step;

pub use decision::Decision;
pub use manager::WorkflowManager;
pub use outcome::Outcome;
pub use queue::{DecisionQueue, PendingDecision};
pub use step::{StepId, StepRecord, StepState, SuccessorMap, Task, WorkflowContext};

/// Overall status of one workflow instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    #[default]
    Created,
    Running,
    /// Suspended on a pending decision.
    Waiting,
    Completed,
    Aborted,
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStatus::Created => "created",
            WorkflowStatus::Running => "running",
            WorkflowStatus::Waiting => "waiting",
            WorkflowStatus::Completed => "completed",
            WorkflowStatus::Aborted => "aborted",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, WorkflowStatus::Completed | WorkflowStatus::Aborted)
    }
}

enum StepKind {
    Task(Arc<dyn Task>),
    Decision(Decision),
}

struct StepNode {
    kind: StepKind,
    successors: SuccessorMap,
    state: StepState,
}

impl StepNode {
    fn name(&self) -> String {
        match &self.kind {
            StepKind::Task(task) => task.name().to_string(),
            StepKind::Decision(decision) => decision.title().to_string(),
        }
    }
}

/// One running approval process. The workflow exclusively owns its steps in
/// an indexed arena; steps know their workflow only by id.
pub struct Workflow {
    id: Uuid,
    title: String,
    owner: Principal,
    status: WorkflowStatus,
    steps: Vec<StepNode>,
    first: Option<StepId>,
    current: Option<StepId>,
    context: WorkflowContext,
    history: Vec<StepRecord>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl Workflow {
    pub fn new<T: Into<String>>(title: T, owner: Principal) -> Self {
        let id = Uuid::new_v4();
        Self {
            id,
            title: title.into(),
            owner,
            status: WorkflowStatus::Created,
            steps: Vec::new(),
            first: None,
            current: None,
            context: WorkflowContext::new(id),
            history: Vec::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn owner(&self) -> &Principal {
        &self.owner
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn context(&self) -> &WorkflowContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut WorkflowContext {
        &mut self.context
    }

    /// Records of every step executed so far, in execution order.
    pub fn history(&self) -> &[StepRecord] {
        &self.history
    }

    // -- graph construction (before start) --------------------------------

    /// Add an ordinary step; the first step added becomes the entry step.
    pub fn add_task(&mut self, task: Arc<dyn Task>) -> StepId {
        self.push_step(StepKind::Task(task), SuccessorMap::new())
    }

    /// Add a decision step. Every registered outcome starts with an explicit
    /// terminal successor, honoring the at-least-one-mapping invariant.
    pub fn add_decision(&mut self, decision: Decision) -> StepId {
        let mut successors = SuccessorMap::new();
        for outcome in decision.outcomes() {
            successors.insert(*outcome, None);
        }
        self.push_step(StepKind::Decision(decision), successors)
    }

    fn push_step(&mut self, kind: StepKind, successors: SuccessorMap) -> StepId {
        let id = StepId(self.steps.len());
        self.steps.push(StepNode {
            kind,
            successors,
            state: StepState::NotStarted,
        });
        if self.first.is_none() {
            self.first = Some(id);
        }
        id
    }

    pub fn set_first(&mut self, id: StepId) {
        self.first = Some(id);
    }

    /// Route `outcome` of step `from` to step `to`. For decisions the
    /// outcome must be one the decision registered.
    pub fn on_outcome(
        &mut self,
        from: StepId,
        outcome: Outcome,
        to: StepId,
    ) -> Result<(), AppError> {
        if to.0 >= self.steps.len() || from.0 >= self.steps.len() {
            return Err(AppError::new(
                ErrorCategory::ValidationError,
                "successor references a step outside this workflow",
            ));
        }
        let node = &mut self.steps[from.0];
        if let StepKind::Decision(decision) = &node.kind {
            if !decision.accepts(outcome) {
                return Err(AppError::new(
                    ErrorCategory::ValidationError,
                    format!(
                        "decision '{}' does not register outcome {}",
                        decision.title(),
                        outcome
                    ),
                ));
            }
        }
        node.successors.insert(outcome, Some(to));
        Ok(())
    }

    // -- execution --------------------------------------------------------

    /// Begin execution. Runs ordinary steps synchronously until the workflow
    /// completes, aborts, or suspends on a decision (which is enqueued; the
    /// calling thread does not block).
    pub fn start(&mut self, queue: &DecisionQueue) -> Result<WorkflowStatus, AppError> {
        if self.status != WorkflowStatus::Created {
            return Err(self.protocol_error("workflow has already been started"));
        }
        let first = self.first.ok_or_else(|| {
            AppError::new(ErrorCategory::ValidationError, "workflow has no steps")
        })?;
        debug!(workflow = %self.id, title = %self.title, "starting workflow");
        self.status = WorkflowStatus::Running;
        self.current = Some(first);
        self.advance(queue)
    }

    /// Supply the actor's outcome for the pending decision and advance.
    /// Exactly one resolution is accepted; later attempts are protocol
    /// errors and leave the first resolution's effects unchanged.
    pub fn resolve(
        &mut self,
        outcome: Outcome,
        queue: &DecisionQueue,
    ) -> Result<WorkflowStatus, AppError> {
        if self.status.is_terminal() {
            return Err(self.protocol_error("workflow is already terminated"));
        }
        let current = match (self.status, self.current) {
            (WorkflowStatus::Waiting, Some(id)) => id,
            _ => return Err(self.protocol_error("workflow has no pending decision")),
        };
        {
            let node = &self.steps[current.0];
            let decision = match &node.kind {
                StepKind::Decision(decision) => decision,
                StepKind::Task(_) => {
                    return Err(self.protocol_error("current step is not a decision"))
                }
            };
            if node.state != StepState::Pending {
                return Err(self.protocol_error("decision has already been resolved"));
            }
            if !decision.accepts(outcome) {
                let message = format!(
                    "decision '{}' does not accept outcome {}",
                    decision.title(),
                    outcome
                );
                return Err(self.protocol_error(&message));
            }
        }
        if outcome.is_non_final() {
            // Actor defers (or the reassignment is handled separately); the
            // decision stays pending and queued.
            return Ok(self.status);
        }

        let started_at = Utc::now();
        let step_name = self.steps[current.0].name();
        self.steps[current.0].state = StepState::Resolved(outcome);
        self.history.push(StepRecord {
            step: step_name,
            outcome,
            started_at,
            completed_at: Utc::now(),
        });
        queue.remove(self.id, current);
        debug!(workflow = %self.id, outcome = %outcome, "decision resolved");
        self.status = WorkflowStatus::Running;
        self.follow_successor(current, outcome, queue)
    }

    /// Hand the pending decision to a different actor without resetting any
    /// accumulated state.
    pub fn reassign(
        &mut self,
        actor: Principal,
        queue: &DecisionQueue,
    ) -> Result<(), AppError> {
        let current = match (self.status, self.current) {
            (WorkflowStatus::Waiting, Some(id)) => id,
            _ => return Err(self.protocol_error("workflow has no pending decision")),
        };
        let pending = matches!(self.steps[current.0].kind, StepKind::Decision(_))
            && self.steps[current.0].state == StepState::Pending;
        if !pending {
            return Err(self.protocol_error("current step is not a pending decision"));
        }
        if let StepKind::Decision(decision) = &mut self.steps[current.0].kind {
            decision.reassign(actor.clone());
        }
        queue.reassign(self.id, current, actor);
        Ok(())
    }

    /// One-way, idempotent abort. Aborting an already-aborted workflow is a
    /// no-op; aborting a completed one is a protocol error.
    pub fn abort(&mut self, queue: &DecisionQueue) -> Result<(), AppError> {
        match self.status {
            WorkflowStatus::Aborted => Ok(()),
            WorkflowStatus::Completed => {
                Err(self.protocol_error("cannot abort a completed workflow"))
            }
            _ => {
                if let Some(current) = self.current {
                    queue.remove(self.id, current);
                }
                debug!(workflow = %self.id, "workflow aborted");
                self.terminate(WorkflowStatus::Aborted);
                Ok(())
            }
        }
    }

    /// The pending decision, when the workflow is suspended on one.
    pub fn current_decision(&self) -> Option<(StepId, &Decision)> {
        let current = self.current?;
        match &self.steps[current.0].kind {
            StepKind::Decision(decision)
                if self.steps[current.0].state == StepState::Pending =>
            {
                Some((current, decision))
            }
            _ => None,
        }
    }

    fn advance(&mut self, queue: &DecisionQueue) -> Result<WorkflowStatus, AppError> {
        while let Some(current) = self.current {
            let task = match &self.steps[current.0].kind {
                StepKind::Task(task) => Arc::clone(task),
                StepKind::Decision(decision) => {
                    let title = decision.title().to_string();
                    let actor = decision.actor().clone();
                    self.steps[current.0].state = StepState::Pending;
                    queue.enqueue(PendingDecision {
                        workflow_id: self.id,
                        step_id: current,
                        title: title.clone(),
                        actor: actor.clone(),
                        workflow_title: self.title.clone(),
                    });
                    debug!(
                        workflow = %self.id,
                        decision = %title,
                        actor = %actor,
                        "workflow suspended on decision"
                    );
                    self.status = WorkflowStatus::Waiting;
                    return Ok(self.status);
                }
            };
            let started_at = Utc::now();
            let outcome = match task.execute(&mut self.context) {
                Ok(outcome) => outcome,
                Err(err) => {
                    self.terminate(WorkflowStatus::Aborted);
                    return Err(err);
                }
            };
            self.steps[current.0].state = StepState::Resolved(outcome);
            self.history.push(StepRecord {
                step: task.name().to_string(),
                outcome,
                started_at,
                completed_at: Utc::now(),
            });
            if outcome == Outcome::StepAbort {
                self.terminate(WorkflowStatus::Aborted);
                return Ok(self.status);
            }
            match self.next_step(current, outcome) {
                Some(next) => self.current = Some(next),
                None => {
                    self.terminate(WorkflowStatus::Completed);
                    return Ok(self.status);
                }
            }
        }
        self.terminate(WorkflowStatus::Completed);
        Ok(self.status)
    }

    fn follow_successor(
        &mut self,
        from: StepId,
        outcome: Outcome,
        queue: &DecisionQueue,
    ) -> Result<WorkflowStatus, AppError> {
        match self.next_step(from, outcome) {
            Some(next) => {
                self.current = Some(next);
                self.advance(queue)
            }
            None => {
                self.terminate(WorkflowStatus::Completed);
                Ok(self.status)
            }
        }
    }

    fn next_step(&self, from: StepId, outcome: Outcome) -> Option<StepId> {
        self.steps[from.0]
            .successors
            .get(&outcome)
            .copied()
            .flatten()
    }

    fn terminate(&mut self, status: WorkflowStatus) {
        self.status = status;
        self.current = None;
        self.completed_at = Some(Utc::now());
    }

    fn protocol_error(&self, message: &str) -> AppError {
        let mut err = AppError::new(
            ErrorCategory::WorkflowProtocolError,
            format!("workflow {}: {}", self.id, message),
        )
        .with_code("WF-PROTO-001");
        err.add_context("status", self.status.as_str());
        err
    }
}
