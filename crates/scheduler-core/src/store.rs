// Persistent store contract (C1). scheduler-storage implements this against
// Postgres; scheduler-engine, scheduler-workflow and scheduler-config depend
// only on the trait, never on sqlx directly, so the scheduling and
// reconciliation logic stays testable against an in-memory fake.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::job::JobDefinition;
use crate::log::{ExecutionLog, LogStatus};
use crate::run::{RunStatus, WorkflowRun};
use crate::workflow::Workflow;

/// A serialized schedule entry as the engine persists it, so process restart
/// can rebuild the in-memory priority structure verbatim.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub id: String,
    /// JSON-serialized `Trigger`.
    pub trigger_blob: String,
    pub next_fire_time: Option<DateTime<Utc>>,
    /// JSON-serialized engine-private state: paused flag, retry context, etc.
    pub job_state_blob: String,
}

#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default)]
pub struct LogFilters {
    pub job_id: Option<String>,
    pub workflow_run_id: Option<i64>,
    pub status: Option<LogStatus>,
}

#[async_trait]
pub trait SchedulerStore: Send + Sync {
    // Job definitions
    async fn get_job(&self, id: &str) -> Result<Option<JobDefinition>>;
    async fn list_jobs(&self, paging: Pagination) -> Result<Vec<JobDefinition>>;
    async fn upsert_job(&self, def: &JobDefinition) -> Result<()>;
    async fn delete_job(&self, id: &str) -> Result<()>;

    // Workflow definitions (steps eager-loaded / replaced as a unit)
    async fn get_workflow(&self, id: i64) -> Result<Option<Workflow>>;
    async fn list_workflows(&self) -> Result<Vec<Workflow>>;
    async fn upsert_workflow_with_steps(&self, workflow: &Workflow) -> Result<i64>;
    async fn delete_workflow(&self, id: i64) -> Result<()>;

    // Workflow runs (append-only)
    async fn create_workflow_run(&self, run: &WorkflowRun) -> Result<i64>;
    async fn update_workflow_run(
        &self,
        id: i64,
        status: RunStatus,
        end_time: Option<DateTime<Utc>>,
        current_step: i32,
    ) -> Result<()>;
    /// Runs that started on or after `since`, most recent first -- used by
    /// the dashboard timeline's 7-day window.
    async fn list_workflow_runs_since(&self, since: DateTime<Utc>) -> Result<Vec<WorkflowRun>>;

    // Execution logs (append-only)
    async fn create_log(&self, log: &ExecutionLog) -> Result<()>;
    #[allow(clippy::too_many_arguments)]
    async fn update_log(
        &self,
        id: uuid::Uuid,
        end_time: DateTime<Utc>,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        status: LogStatus,
    ) -> Result<()>;
    async fn list_logs(&self, filters: LogFilters, paging: Pagination) -> Result<Vec<ExecutionLog>>;
    async fn list_logs_by_job(&self, job_id: &str) -> Result<Vec<ExecutionLog>>;

    // Scheduler-owned serialized entries (used by the engine on startup)
    async fn list_stored_entries(&self) -> Result<Vec<StoredEntry>>;
    async fn upsert_stored_entry(&self, entry: &StoredEntry) -> Result<()>;
    async fn delete_stored_entry(&self, id: &str) -> Result<()>;
}
