// WorkflowRun (C1/C5 shared data model).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

/// One execution of a workflow. Append-only: a run is created RUNNING and
/// reaches exactly one terminal status transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WorkflowRun {
    pub id: i64,
    pub workflow_id: i64,
    pub status: RunStatus,
    pub current_step: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub params_val: Option<HashMap<String, Value>>,
}

impl WorkflowRun {
    pub fn new(workflow_id: i64, params_val: Option<HashMap<String, Value>>) -> Self {
        WorkflowRun {
            id: 0,
            workflow_id,
            status: RunStatus::Running,
            current_step: 0,
            start_time: Utc::now(),
            end_time: None,
            params_val,
        }
    }
}
