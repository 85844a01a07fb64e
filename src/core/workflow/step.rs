#![allow(clippy::result_large_err)]

use super::outcome::Outcome;
use crate::core::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// Index handle for a step inside its owning workflow's arena. Steps refer
/// to their workflow by id, never by reference, so the graph has no cycles
/// of ownership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepId(pub usize);

/// Shared state the steps of one workflow read and write while it runs.
#[derive(Debug, Clone)]
pub struct WorkflowContext {
    workflow_id: Uuid,
    attributes: HashMap<String, Value>,
}

impl WorkflowContext {
    pub fn new(workflow_id: Uuid) -> Self {
        Self {
            workflow_id,
            attributes: HashMap::new(),
        }
    }

    pub fn workflow_id(&self) -> Uuid {
        self.workflow_id
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn set_attribute<T: Into<String>>(&mut self, name: T, value: Value) {
        self.attributes.insert(name.into(), value);
    }
}

/// Unit of work executed synchronously when the workflow reaches it.
pub trait Task: Send + Sync + 'static {
    /// Task name recorded in the workflow history.
    fn name(&self) -> &'static str;

    fn execute(&self, ctx: &mut WorkflowContext) -> Result<Outcome, AppError>;
}

/// Execution state of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    NotStarted,
    /// Decision awaiting an actor.
    Pending,
    Resolved(Outcome),
}

/// Historical record of one executed step, persisted with the workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: String,
    pub outcome: Outcome,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
}

/// Successor table: outcome -> next step, where None is an explicit
/// terminal.
pub type SuccessorMap = HashMap<Outcome, Option<StepId>>;
