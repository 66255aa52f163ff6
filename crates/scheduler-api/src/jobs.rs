// Job CRUD HTTP routes (C7, §6 "Job CRUD"): create/update validate via
// `JobDefinition::validate` and reconcile into the engine on success;
// pause/resume/run-now act on the live scheduler directly.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use scheduler_core::{JobDefinition, Pagination};
use scheduler_engine::entry_state_for_job;

use crate::dto::{BulkIdsRequest, BulkResult, PageParams};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/jobs", post(create_job).get(list_jobs))
        .route(
            "/v1/jobs/:id",
            get(get_job).patch(update_job).delete(delete_job),
        )
        .route("/v1/jobs/:id/pause", post(pause_job))
        .route("/v1/jobs/:id/resume", post(resume_job))
        .route("/v1/jobs/:id/run-now", post(run_job_now))
        .route("/v1/jobs/bulk/delete", post(bulk_delete))
        .route("/v1/jobs/bulk/pause", post(bulk_pause))
        .route("/v1/jobs/bulk/resume", post(bulk_resume))
        .with_state(state)
}

/// Installs or reinstalls `def`'s entry in the scheduling engine, the
/// "reconcile into the engine on success" half of the create/update
/// contract. Mirrors `scheduler_config::ConfigReconciler::sync_jobs` for a
/// single definition instead of the whole store.
async fn install(state: &AppState, def: &JobDefinition) -> scheduler_core::Result<()> {
    let entry_state = entry_state_for_job(def);
    state
        .scheduler
        .add_or_replace(def.id.clone(), def.trigger.clone(), entry_state)
        .await
}

#[utoipa::path(
    post,
    path = "/v1/jobs",
    request_body = JobDefinition,
    responses(
        (status = 201, description = "Job created", body = JobDefinition),
        (status = 400, description = "Validation error"),
        (status = 409, description = "A job with this id already exists"),
    ),
    tag = "jobs"
)]
pub async fn create_job(
    State(state): State<AppState>,
    Json(def): Json<JobDefinition>,
) -> AppResult<(StatusCode, Json<JobDefinition>)> {
    def.validate().map_err(AppError::from)?;
    if state.store.get_job(&def.id).await?.is_some() {
        return Err(AppError(
            StatusCode::CONFLICT,
            format!("job '{}' already exists", def.id),
        ));
    }
    state.store.upsert_job(&def).await?;
    install(&state, &def).await?;
    Ok((StatusCode::CREATED, Json(def)))
}

#[utoipa::path(
    get,
    path = "/v1/jobs",
    params(PageParams),
    responses((status = 200, description = "Job definitions", body = Vec<JobDefinition>)),
    tag = "jobs"
)]
pub async fn list_jobs(
    State(state): State<AppState>,
    Query(page): Query<PageParams>,
) -> AppResult<Json<Vec<JobDefinition>>> {
    let jobs = state.store.list_jobs(Pagination::from(page)).await?;
    Ok(Json(jobs))
}

#[utoipa::path(
    get,
    path = "/v1/jobs/{id}",
    responses(
        (status = 200, description = "Job found", body = JobDefinition),
        (status = 404, description = "No such job"),
    ),
    tag = "jobs"
)]
pub async fn get_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<JobDefinition>> {
    let job = state
        .store
        .get_job(&id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no job '{id}'")))?;
    Ok(Json(job))
}

#[utoipa::path(
    patch,
    path = "/v1/jobs/{id}",
    request_body = JobDefinition,
    responses(
        (status = 200, description = "Job updated", body = JobDefinition),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No such job"),
    ),
    tag = "jobs"
)]
pub async fn update_job(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(mut def): Json<JobDefinition>,
) -> AppResult<Json<JobDefinition>> {
    if state.store.get_job(&id).await?.is_none() {
        return Err(AppError::not_found(format!("no job '{id}'")));
    }
    def.id = id;
    def.validate().map_err(AppError::from)?;
    state.store.upsert_job(&def).await?;
    install(&state, &def).await?;
    Ok(Json(def))
}

#[utoipa::path(
    delete,
    path = "/v1/jobs/{id}",
    responses(
        (status = 204, description = "Job deleted"),
        (status = 404, description = "No such job"),
    ),
    tag = "jobs"
)]
pub async fn delete_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    if state.store.get_job(&id).await?.is_none() {
        return Err(AppError::not_found(format!("no job '{id}'")));
    }
    state.store.delete_job(&id).await?;
    state.scheduler.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/{id}/pause",
    responses((status = 204, description = "Job paused"), (status = 404, description = "No such entry")),
    tag = "jobs"
)]
pub async fn pause_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    state.scheduler.pause(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/{id}/resume",
    responses((status = 204, description = "Job resumed"), (status = 404, description = "No such entry")),
    tag = "jobs"
)]
pub async fn resume_job(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    state.scheduler.resume(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/{id}/run-now",
    responses((status = 202, description = "Run scheduled"), (status = 404, description = "No such entry")),
    tag = "jobs"
)]
pub async fn run_job_now(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<StatusCode> {
    state.scheduler.modify_next_run(&id, Utc::now()).await?;
    Ok(StatusCode::ACCEPTED)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/bulk/delete",
    request_body = BulkIdsRequest,
    responses((status = 200, description = "Best-effort bulk delete result", body = BulkResult)),
    tag = "jobs"
)]
pub async fn bulk_delete(State(state): State<AppState>, Json(req): Json<BulkIdsRequest>) -> Json<BulkResult> {
    Json(run_bulk(&state, req.ids, |state, id| async move {
        if state.store.get_job(&id).await?.is_none() {
            return Err(scheduler_core::SchedulerError::not_found(format!("no job '{id}'")));
        }
        state.store.delete_job(&id).await?;
        state.scheduler.remove(&id).await
    }).await)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/bulk/pause",
    request_body = BulkIdsRequest,
    responses((status = 200, description = "Best-effort bulk pause result", body = BulkResult)),
    tag = "jobs"
)]
pub async fn bulk_pause(State(state): State<AppState>, Json(req): Json<BulkIdsRequest>) -> Json<BulkResult> {
    Json(run_bulk(&state, req.ids, |state, id| async move { state.scheduler.pause(&id).await }).await)
}

#[utoipa::path(
    post,
    path = "/v1/jobs/bulk/resume",
    request_body = BulkIdsRequest,
    responses((status = 200, description = "Best-effort bulk resume result", body = BulkResult)),
    tag = "jobs"
)]
pub async fn bulk_resume(State(state): State<AppState>, Json(req): Json<BulkIdsRequest>) -> Json<BulkResult> {
    Json(run_bulk(&state, req.ids, |state, id| async move { state.scheduler.resume(&id).await }).await)
}

async fn run_bulk<F, Fut>(state: &AppState, ids: Vec<String>, op: F) -> BulkResult
where
    F: Fn(AppState, String) -> Fut,
    Fut: std::future::Future<Output = scheduler_core::Result<()>>,
{
    let mut result = BulkResult::default();
    for id in ids {
        match op(state.clone(), id.clone()).await {
            Ok(()) => result.done.push(id),
            Err(e) => {
                result.failed.insert(id, e.to_string());
            }
        }
    }
    result
}
