use ferrowiki::core::auth::{ActorOnlyAuthorizer, Principal};
use ferrowiki::core::error::AppError;
use ferrowiki::core::types::ErrorCategory;
use ferrowiki::core::workflow::{
    Decision, DecisionQueue, Outcome, Task, Workflow, WorkflowContext, WorkflowManager,
    WorkflowStatus,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct MarkerTask {
    name: &'static str,
    runs: Arc<AtomicUsize>,
}

impl MarkerTask {
    fn new(name: &'static str) -> (Arc<Self>, Arc<AtomicUsize>) {
        let runs = Arc::new(AtomicUsize::new(0));
        (
            Arc::new(Self {
                name,
                runs: Arc::clone(&runs),
            }),
            runs,
        )
    }
}

impl Task for MarkerTask {
    fn name(&self) -> &'static str {
        self.name
    }

    fn execute(&self, ctx: &mut WorkflowContext) -> Result<Outcome, AppError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        ctx.set_attribute(self.name, json!(true));
        Ok(Outcome::StepComplete)
    }
}

#[test]
fn simple_decision_registers_exactly_approve_and_deny() {
    let decision = Decision::simple("approve save", Principal::new("admin"));
    assert_eq!(
        decision.outcomes(),
        &[Outcome::DecisionApprove, Outcome::DecisionDeny]
    );
    assert_eq!(decision.default_outcome(), Outcome::DecisionApprove);
}

#[test]
fn approve_with_absent_successor_completes_the_workflow() {
    let queue = DecisionQueue::new();
    let mut workflow = Workflow::new("standalone decision", Principal::new("alice"));
    workflow.add_decision(Decision::simple("approve", Principal::new("admin")));

    assert_eq!(workflow.start(&queue).unwrap(), WorkflowStatus::Waiting);
    assert_eq!(queue.len(), 1);

    let status = workflow.resolve(Outcome::DecisionApprove, &queue).unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
    assert!(queue.is_empty());
}

#[test]
fn second_resolution_is_rejected_and_first_effects_stand() {
    let queue = DecisionQueue::new();
    let (task, runs) = MarkerTask::new("after-approval");
    let mut workflow = Workflow::new("double resolve", Principal::new("alice"));
    let decision = workflow.add_decision(Decision::simple("approve", Principal::new("admin")));
    let step = workflow.add_task(task);
    workflow.set_first(decision);
    workflow
        .on_outcome(decision, Outcome::DecisionApprove, step)
        .unwrap();

    workflow.start(&queue).unwrap();
    let status = workflow.resolve(Outcome::DecisionApprove, &queue).unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    let err = workflow.resolve(Outcome::DecisionDeny, &queue).unwrap_err();
    assert_eq!(err.category, ErrorCategory::WorkflowProtocolError);
    // The approval's effects are untouched by the rejected attempt.
    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    assert_eq!(
        workflow.context().get_attribute("after-approval"),
        Some(&json!(true))
    );
}

#[test]
fn hold_keeps_the_decision_pending() {
    let queue = DecisionQueue::new();
    let mut workflow = Workflow::new("held", Principal::new("alice"));
    workflow.add_decision(Decision::new(
        "triage",
        Principal::new("admin"),
        Outcome::DecisionApprove,
        vec![
            Outcome::DecisionApprove,
            Outcome::DecisionDeny,
            Outcome::DecisionHold,
        ],
    ));
    workflow.start(&queue).unwrap();

    let status = workflow.resolve(Outcome::DecisionHold, &queue).unwrap();
    assert_eq!(status, WorkflowStatus::Waiting);
    assert_eq!(queue.len(), 1);

    // A real outcome still resolves it afterwards.
    let status = workflow.resolve(Outcome::DecisionDeny, &queue).unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
}

#[test]
fn reassignment_moves_the_inbox_entry_and_keeps_state() {
    let manager = WorkflowManager::new(Arc::new(ActorOnlyAuthorizer));
    let (before_task, _) = MarkerTask::new("before");
    let mut workflow = Workflow::new("reassigned", Principal::new("alice"));
    let before = workflow.add_task(before_task);
    let decision = workflow.add_decision(Decision::simple("approve", Principal::new("admin")));
    workflow
        .on_outcome(before, Outcome::StepComplete, decision)
        .unwrap();

    let (id, status) = manager.start(workflow).unwrap();
    assert_eq!(status, WorkflowStatus::Waiting);

    manager.reassign(id, Principal::new("backup")).unwrap();
    assert!(manager.pending_for(&Principal::new("admin")).is_empty());
    assert_eq!(manager.pending_for(&Principal::new("backup")).len(), 1);

    // Accumulated context survives the reassignment; the original actor can
    // no longer decide, the new one can.
    assert_eq!(manager.attribute(id, "before").unwrap(), Some(json!(true)));
    let err = manager
        .resolve(id, &Principal::new("admin"), Outcome::DecisionApprove)
        .unwrap_err();
    assert_eq!(err.code, "WF-AUTH-001");
    let status = manager
        .resolve(id, &Principal::new("backup"), Outcome::DecisionApprove)
        .unwrap();
    assert_eq!(status, WorkflowStatus::Completed);
}

#[test]
fn abort_is_idempotent_but_completed_cannot_abort() {
    let queue = DecisionQueue::new();
    let mut waiting = Workflow::new("waiting", Principal::new("alice"));
    waiting.add_decision(Decision::simple("approve", Principal::new("admin")));
    waiting.start(&queue).unwrap();

    waiting.abort(&queue).unwrap();
    assert_eq!(waiting.status(), WorkflowStatus::Aborted);
    assert!(queue.is_empty());
    // Second abort is a no-op.
    waiting.abort(&queue).unwrap();

    let (task, _) = MarkerTask::new("only");
    let mut completed = Workflow::new("completed", Principal::new("alice"));
    completed.add_task(task);
    completed.start(&queue).unwrap();
    let err = completed.abort(&queue).unwrap_err();
    assert_eq!(err.category, ErrorCategory::WorkflowProtocolError);
}

#[test]
fn terminated_workflow_rejects_further_resolution() {
    let queue = DecisionQueue::new();
    let mut workflow = Workflow::new("done", Principal::new("alice"));
    workflow.add_decision(Decision::simple("approve", Principal::new("admin")));
    workflow.start(&queue).unwrap();
    workflow.abort(&queue).unwrap();

    let err = workflow.resolve(Outcome::DecisionApprove, &queue).unwrap_err();
    assert_eq!(err.category, ErrorCategory::WorkflowProtocolError);
}

#[test]
fn unaccepted_outcome_is_a_protocol_error() {
    let queue = DecisionQueue::new();
    let mut workflow = Workflow::new("strict", Principal::new("alice"));
    workflow.add_decision(Decision::simple("approve", Principal::new("admin")));
    workflow.start(&queue).unwrap();

    let err = workflow
        .resolve(Outcome::DecisionAcknowledge, &queue)
        .unwrap_err();
    assert_eq!(err.category, ErrorCategory::WorkflowProtocolError);
    // Still pending with the real outcomes.
    assert_eq!(workflow.status(), WorkflowStatus::Waiting);
}

#[test]
fn history_records_steps_in_execution_order() {
    let queue = DecisionQueue::new();
    let (first, _) = MarkerTask::new("first");
    let (second, _) = MarkerTask::new("second");
    let mut workflow = Workflow::new("ordered", Principal::new("alice"));
    let a = workflow.add_task(first);
    let b = workflow.add_task(second);
    workflow.on_outcome(a, Outcome::StepComplete, b).unwrap();
    workflow.start(&queue).unwrap();

    let steps: Vec<&str> = workflow
        .history()
        .iter()
        .map(|record| record.step.as_str())
        .collect();
    assert_eq!(steps, vec!["first", "second"]);
}

#[test]
fn manager_prunes_only_terminated_workflows() {
    let manager = WorkflowManager::new(Arc::new(ActorOnlyAuthorizer));

    let (task, _) = MarkerTask::new("done");
    let mut finished = Workflow::new("finished", Principal::new("alice"));
    finished.add_task(task);
    manager.start(finished).unwrap();

    let mut pending = Workflow::new("pending", Principal::new("alice"));
    pending.add_decision(Decision::simple("approve", Principal::new("admin")));
    let (pending_id, _) = manager.start(pending).unwrap();

    assert_eq!(manager.prune_terminated(), 1);
    assert_eq!(
        manager.status(pending_id).unwrap(),
        WorkflowStatus::Waiting
    );
}
