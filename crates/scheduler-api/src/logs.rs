// Execution log read endpoints (§4.7 "Logs"): a filterable, paginated list
// across every job and workflow step, plus a per-job convenience listing.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use scheduler_core::{ExecutionLog, LogFilters, LogStatus, Pagination};
use serde::Deserialize;
use utoipa::IntoParams;

use crate::error::AppResult;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/logs", get(list_logs))
        .route("/v1/jobs/:id/logs", get(list_logs_for_job))
        .with_state(state)
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct LogQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    pub job_id: Option<String>,
    pub workflow_run_id: Option<i64>,
    pub status: Option<LogStatus>,
}

fn default_limit() -> i64 {
    100
}

#[utoipa::path(
    get,
    path = "/v1/logs",
    params(LogQuery),
    responses((status = 200, description = "Execution logs", body = Vec<ExecutionLog>)),
    tag = "logs"
)]
pub async fn list_logs(State(state): State<AppState>, Query(q): Query<LogQuery>) -> AppResult<Json<Vec<ExecutionLog>>> {
    let filters = LogFilters {
        job_id: q.job_id,
        workflow_run_id: q.workflow_run_id,
        status: q.status,
    };
    let paging = Pagination { skip: q.skip, limit: q.limit };
    let logs = state.store.list_logs(filters, paging).await?;
    Ok(Json(logs))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}/logs",
    responses((status = 200, description = "Execution logs for one job", body = Vec<ExecutionLog>)),
    tag = "logs"
)]
pub async fn list_logs_for_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<Vec<ExecutionLog>>> {
    let logs = state.store.list_logs_by_job(&id).await?;
    Ok(Json(logs))
}
