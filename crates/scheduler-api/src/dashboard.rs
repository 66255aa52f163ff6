// Dashboard read endpoints (§4.7, SPEC_FULL §4.7 "Dashboard"): a summary of
// definition/log counts plus a 7-day timeline mixing scheduled future fire
// times with past workflow runs and standalone job logs. Individual
// workflow-step logs are excluded from the timeline -- a step is an
// implementation detail of its run, which already has its own entry.

use axum::extract::State;
use axum::{Json, Router};
use axum::routing::get;
use chrono::{DateTime, Duration, Utc};
use scheduler_core::{LogFilters, LogStatus, Pagination, RunStatus};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/dashboard/summary", get(summary))
        .route("/v1/dashboard/timeline", get(timeline))
        .with_state(state)
}

#[derive(Debug, Clone, Serialize, ToSchema, Default)]
pub struct DashboardSummary {
    pub total_jobs: usize,
    pub total_workflows: usize,
    pub running_count: usize,
    pub completed_count: usize,
    pub failed_count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimelineEntry {
    /// A future fire time for a live engine entry; has no duration yet.
    Scheduled { entry_id: String, at: DateTime<Utc> },
    /// A past or in-progress workflow run.
    WorkflowRun {
        workflow_id: i64,
        run_id: i64,
        status: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    },
    /// A past or in-progress standalone job execution.
    JobLog {
        job_id: String,
        status: String,
        start_time: DateTime<Utc>,
        end_time: Option<DateTime<Utc>>,
    },
}

impl TimelineEntry {
    fn start_time(&self) -> DateTime<Utc> {
        match self {
            TimelineEntry::Scheduled { at, .. } => *at,
            TimelineEntry::WorkflowRun { start_time, .. } => *start_time,
            TimelineEntry::JobLog { start_time, .. } => *start_time,
        }
    }
}

const TIMELINE_WINDOW_DAYS: i64 = 7;

#[utoipa::path(
    get,
    path = "/v1/dashboard/summary",
    responses((status = 200, description = "Counts of definitions and recent log outcomes", body = DashboardSummary)),
    tag = "dashboard"
)]
pub async fn summary(State(state): State<AppState>) -> AppResult<Json<DashboardSummary>> {
    let jobs = state.store.list_jobs(Pagination { skip: 0, limit: i64::MAX }).await?;
    let workflows = state.store.list_workflows().await?;

    async fn count(state: &AppState, status: LogStatus) -> AppResult<usize> {
        let filters = LogFilters {
            status: Some(status),
            ..Default::default()
        };
        Ok(state.store.list_logs(filters, Pagination { skip: 0, limit: i64::MAX }).await?.len())
    }

    Ok(Json(DashboardSummary {
        total_jobs: jobs.len(),
        total_workflows: workflows.len(),
        running_count: count(&state, LogStatus::Running).await?,
        completed_count: count(&state, LogStatus::Completed).await?,
        failed_count: count(&state, LogStatus::Failed).await?,
    }))
}

#[utoipa::path(
    get,
    path = "/v1/dashboard/timeline",
    responses((status = 200, description = "7-day activity timeline", body = Vec<TimelineEntry>)),
    tag = "dashboard"
)]
pub async fn timeline(State(state): State<AppState>) -> AppResult<Json<Vec<TimelineEntry>>> {
    let now = Utc::now();
    let since = now - Duration::days(TIMELINE_WINDOW_DAYS);
    let mut entries = Vec::new();

    for (entry_id, at) in state.scheduler.scheduled_fire_times().await {
        entries.push(TimelineEntry::Scheduled { entry_id, at });
    }

    for run in state.store.list_workflow_runs_since(since).await? {
        let end_time = run.end_time.or_else(|| (run.status == RunStatus::Running).then_some(now));
        entries.push(TimelineEntry::WorkflowRun {
            workflow_id: run.workflow_id,
            run_id: run.id,
            status: format!("{:?}", run.status).to_lowercase(),
            start_time: run.start_time,
            end_time,
        });
    }

    let logs = state
        .store
        .list_logs(LogFilters::default(), Pagination { skip: 0, limit: i64::MAX })
        .await?;
    for log in logs {
        if log.workflow_run_id.is_some() || log.start_time < since {
            continue;
        }
        let Some(job_id) = log.job_id else { continue };
        let end_time = log.end_time.or_else(|| (log.status == LogStatus::Running).then_some(now));
        entries.push(TimelineEntry::JobLog {
            job_id,
            status: format!("{:?}", log.status).to_lowercase(),
            start_time: log.start_time,
            end_time,
        });
    }

    entries.sort_by_key(|e| e.start_time());

    Ok(Json(entries))
}
