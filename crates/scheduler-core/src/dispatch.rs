// Dispatch seams between the scheduling engine (C3) and its two downstream
// executors, the execution dispatcher (C4) and the workflow runner (C5).
//
// The engine is built against these traits rather than the concrete crates:
// scheduler-dispatcher and scheduler-workflow each implement one, and the
// scheduler-api composition root wires the concrete instances into the
// engine at startup. This keeps the engine's dependency graph a straight
// line (core -> trigger -> engine) instead of a diamond.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::job::JobDefinition;
use crate::retry::RetryContext;

/// Runs a single job's task to completion (C4). Implementations never
/// propagate task failure as an `Err` — a failed shell command or python
/// call is a COMPLETED dispatch with a FAILED execution log, which the
/// engine reads back to decide whether to schedule a retry. `Err` here is
/// reserved for the dispatcher failing to even attempt the task (e.g. the
/// log row couldn't be written).
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    async fn dispatch(&self, job: &JobDefinition, retry: RetryContext) -> Result<DispatchOutcome>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Completed,
    Failed,
}

/// Runs a workflow's steps to completion (C5), same non-propagation contract.
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    async fn dispatch(&self, workflow_id: i64, run_params: Option<HashMap<String, Value>>) -> Result<()>;
}
