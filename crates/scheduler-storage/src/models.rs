// Database row types (C1). Each row maps 1:1 onto a scheduler-core domain
// type via a `From`/`TryFrom` impl; JSONB columns round-trip through
// `sqlx::types::Json<T>` since the domain types already derive
// Serialize/Deserialize for the API and the engine's persisted-entry blobs.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use scheduler_core::{
    ExecutionLog, JobDefinition, LogStatus, OnFailure, ParamDescriptor, RunStatus, SchedulerError,
    StepJobType, TaskParameters, Trigger, Workflow, WorkflowRun, WorkflowStep,
};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct JobRow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub is_enabled: bool,
    pub trigger: Json<Trigger>,
    pub task_parameters: Json<TaskParameters>,
    pub max_instances: i32,
    pub coalesce: bool,
    pub misfire_grace_time: Option<i64>,
}

impl From<JobRow> for JobDefinition {
    fn from(row: JobRow) -> Self {
        JobDefinition {
            id: row.id,
            name: row.name,
            description: row.description,
            is_enabled: row.is_enabled,
            trigger: row.trigger.0,
            task_parameters: row.task_parameters.0,
            max_instances: row.max_instances.max(0) as u32,
            coalesce: row.coalesce,
            misfire_grace_time: row.misfire_grace_time,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRow {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub schedule: Option<String>,
    pub is_enabled: bool,
    pub params_def: Option<Json<Vec<ParamDescriptor>>>,
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowStepRow {
    pub workflow_id: i64,
    pub step_order: i32,
    pub name: String,
    pub job_type: String,
    pub target: String,
    pub args: Json<Vec<Value>>,
    pub kwargs: Json<HashMap<String, Value>>,
    pub on_failure: String,
    pub timeout: Option<i64>,
    pub run_in_background: bool,
}

impl TryFrom<WorkflowStepRow> for WorkflowStep {
    type Error = SchedulerError;

    fn try_from(row: WorkflowStepRow) -> Result<Self, Self::Error> {
        Ok(WorkflowStep {
            step_order: row.step_order,
            name: row.name,
            job_type: parse_job_type(&row.job_type)?,
            target: row.target,
            args: row.args.0,
            kwargs: row.kwargs.0,
            on_failure: parse_on_failure(&row.on_failure)?,
            timeout: row.timeout.map(|t| t.max(0) as u64),
            run_in_background: row.run_in_background,
        })
    }
}

fn parse_job_type(raw: &str) -> Result<StepJobType, SchedulerError> {
    match raw {
        "shell" => Ok(StepJobType::Shell),
        "python" => Ok(StepJobType::Python),
        other => Err(SchedulerError::store(format!("unknown stored job_type '{other}'"))),
    }
}

fn parse_on_failure(raw: &str) -> Result<OnFailure, SchedulerError> {
    match raw {
        "stop" => Ok(OnFailure::Stop),
        "continue" => Ok(OnFailure::Continue),
        other => Err(SchedulerError::store(format!("unknown stored on_failure '{other}'"))),
    }
}

pub fn job_type_as_str(job_type: StepJobType) -> &'static str {
    match job_type {
        StepJobType::Shell => "shell",
        StepJobType::Python => "python",
    }
}

pub fn on_failure_as_str(on_failure: OnFailure) -> &'static str {
    match on_failure {
        OnFailure::Stop => "stop",
        OnFailure::Continue => "continue",
    }
}

/// Assembles a full `Workflow` from its row plus its already-ordered steps.
pub fn assemble_workflow(row: WorkflowRow, step_rows: Vec<WorkflowStepRow>) -> Result<Workflow, SchedulerError> {
    let steps = step_rows
        .into_iter()
        .map(WorkflowStep::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Workflow {
        id: row.id,
        name: row.name,
        description: row.description,
        schedule: row.schedule,
        is_enabled: row.is_enabled,
        params_def: row.params_def.map(|j| j.0),
        steps,
    })
}

#[derive(Debug, Clone, FromRow)]
pub struct WorkflowRunRow {
    pub id: i64,
    pub workflow_id: i64,
    pub status: String,
    pub current_step: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub params_val: Option<Json<HashMap<String, Value>>>,
}

impl TryFrom<WorkflowRunRow> for WorkflowRun {
    type Error = SchedulerError;

    fn try_from(row: WorkflowRunRow) -> Result<Self, Self::Error> {
        Ok(WorkflowRun {
            id: row.id,
            workflow_id: row.workflow_id,
            status: parse_run_status(&row.status)?,
            current_step: row.current_step,
            start_time: row.start_time,
            end_time: row.end_time,
            params_val: row.params_val.map(|j| j.0),
        })
    }
}

pub fn run_status_as_str(status: RunStatus) -> &'static str {
    match status {
        RunStatus::Pending => "PENDING",
        RunStatus::Running => "RUNNING",
        RunStatus::Completed => "COMPLETED",
        RunStatus::Failed => "FAILED",
    }
}

fn parse_run_status(raw: &str) -> Result<RunStatus, SchedulerError> {
    match raw {
        "PENDING" => Ok(RunStatus::Pending),
        "RUNNING" => Ok(RunStatus::Running),
        "COMPLETED" => Ok(RunStatus::Completed),
        "FAILED" => Ok(RunStatus::Failed),
        other => Err(SchedulerError::store(format!("unknown stored run status '{other}'"))),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ExecutionLogRow {
    pub id: Uuid,
    pub job_id: Option<String>,
    pub workflow_run_id: Option<i64>,
    pub command: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub status: String,
}

impl TryFrom<ExecutionLogRow> for ExecutionLog {
    type Error = SchedulerError;

    fn try_from(row: ExecutionLogRow) -> Result<Self, Self::Error> {
        Ok(ExecutionLog {
            id: row.id,
            job_id: row.job_id,
            workflow_run_id: row.workflow_run_id,
            command: row.command,
            start_time: row.start_time,
            end_time: row.end_time,
            exit_code: row.exit_code,
            stdout: row.stdout,
            stderr: row.stderr,
            status: parse_log_status(&row.status)?,
        })
    }
}

pub fn log_status_as_str(status: LogStatus) -> &'static str {
    match status {
        LogStatus::Running => "RUNNING",
        LogStatus::Completed => "COMPLETED",
        LogStatus::Failed => "FAILED",
    }
}

fn parse_log_status(raw: &str) -> Result<LogStatus, SchedulerError> {
    match raw {
        "RUNNING" => Ok(LogStatus::Running),
        "COMPLETED" => Ok(LogStatus::Completed),
        "FAILED" => Ok(LogStatus::Failed),
        other => Err(SchedulerError::store(format!("unknown stored log status '{other}'"))),
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct StoredEntryRow {
    pub id: String,
    pub trigger_blob: String,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub job_state_blob: String,
}

impl From<StoredEntryRow> for scheduler_core::StoredEntry {
    fn from(row: StoredEntryRow) -> Self {
        scheduler_core::StoredEntry {
            id: row.id,
            trigger_blob: row.trigger_blob,
            next_fire_time: row.next_fire_time,
            job_state_blob: row.job_state_blob,
        }
    }
}
