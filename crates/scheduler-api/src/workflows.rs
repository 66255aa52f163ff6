// Workflow CRUD HTTP routes (C7, §6 "workflow CRUD ... steps replace as a
// unit"): create/update validate via `Workflow::validate` and reconcile the
// workflow's own cron entry on success; run-now forwards optional run
// parameters straight to the `WorkflowDispatcher`, bypassing the engine
// entirely (a workflow need not be scheduled to be run once).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use scheduler_core::Workflow;
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/v1/workflows", post(create_workflow).get(list_workflows))
        .route(
            "/v1/workflows/:id",
            get(get_workflow).patch(update_workflow).delete(delete_workflow),
        )
        .route("/v1/workflows/:id/pause", post(pause_workflow))
        .route("/v1/workflows/:id/resume", post(resume_workflow))
        .route("/v1/workflows/:id/run-now", post(run_workflow_now))
        .with_state(state)
}

#[derive(Debug, Deserialize, ToSchema, Default)]
pub struct RunNowRequest {
    pub params: Option<HashMap<String, Value>>,
}

#[utoipa::path(
    post,
    path = "/v1/workflows",
    request_body = Workflow,
    responses(
        (status = 201, description = "Workflow created", body = Workflow),
        (status = 400, description = "Validation error"),
    ),
    tag = "workflows"
)]
pub async fn create_workflow(
    State(state): State<AppState>,
    Json(mut workflow): Json<Workflow>,
) -> AppResult<(StatusCode, Json<Workflow>)> {
    workflow.id = 0;
    workflow.validate().map_err(AppError::from)?;
    let id = state.store.upsert_workflow_with_steps(&workflow).await?;
    workflow.id = id;
    state.reconciler.sync().await?;
    Ok((StatusCode::CREATED, Json(workflow)))
}

#[utoipa::path(
    get,
    path = "/v1/workflows",
    responses((status = 200, description = "Workflows", body = Vec<Workflow>)),
    tag = "workflows"
)]
pub async fn list_workflows(State(state): State<AppState>) -> AppResult<Json<Vec<Workflow>>> {
    Ok(Json(state.store.list_workflows().await?))
}

#[utoipa::path(
    get,
    path = "/v1/workflows/{id}",
    responses(
        (status = 200, description = "Workflow found", body = Workflow),
        (status = 404, description = "No such workflow"),
    ),
    tag = "workflows"
)]
pub async fn get_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Workflow>> {
    let workflow = state
        .store
        .get_workflow(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no workflow '{id}'")))?;
    Ok(Json(workflow))
}

#[utoipa::path(
    patch,
    path = "/v1/workflows/{id}",
    request_body = Workflow,
    responses(
        (status = 200, description = "Workflow updated", body = Workflow),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No such workflow"),
    ),
    tag = "workflows"
)]
pub async fn update_workflow(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(mut workflow): Json<Workflow>,
) -> AppResult<Json<Workflow>> {
    if state.store.get_workflow(id).await?.is_none() {
        return Err(AppError::not_found(format!("no workflow '{id}'")));
    }
    workflow.id = id;
    workflow.validate().map_err(AppError::from)?;
    state.store.upsert_workflow_with_steps(&workflow).await?;
    state.reconciler.sync().await?;
    Ok(Json(workflow))
}

#[utoipa::path(
    delete,
    path = "/v1/workflows/{id}",
    responses(
        (status = 204, description = "Workflow deleted"),
        (status = 404, description = "No such workflow"),
    ),
    tag = "workflows"
)]
pub async fn delete_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    let workflow = state
        .store
        .get_workflow(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("no workflow '{id}'")))?;
    state.store.delete_workflow(id).await?;
    state.scheduler.remove(&workflow.entry_id()).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/workflows/{id}/pause",
    responses((status = 204, description = "Workflow paused"), (status = 404, description = "Workflow has no active schedule")),
    tag = "workflows"
)]
pub async fn pause_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.scheduler.pause(&workflow_entry_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/v1/workflows/{id}/resume",
    responses((status = 204, description = "Workflow resumed"), (status = 404, description = "Workflow has no active schedule")),
    tag = "workflows"
)]
pub async fn resume_workflow(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<StatusCode> {
    state.scheduler.resume(&workflow_entry_id(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

fn workflow_entry_id(id: i64) -> String {
    format!("workflow_{id}")
}

#[utoipa::path(
    post,
    path = "/v1/workflows/{id}/run-now",
    request_body = RunNowRequest,
    responses(
        (status = 202, description = "Run started"),
        (status = 404, description = "No such workflow"),
    ),
    tag = "workflows"
)]
pub async fn run_workflow_now(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    body: Option<Json<RunNowRequest>>,
) -> AppResult<StatusCode> {
    if state.store.get_workflow(id).await?.is_none() {
        return Err(AppError::not_found(format!("no workflow '{id}'")));
    }
    let params = body.and_then(|Json(r)| r.params);
    let dispatcher: Arc<dyn scheduler_core::WorkflowDispatcher> = state.workflow_dispatcher.clone();
    tokio::spawn(async move {
        if let Err(e) = dispatcher.dispatch(id, params).await {
            tracing::warn!(workflow_id = id, error = %e, "ad-hoc workflow run failed to even start");
        }
    });
    Ok(StatusCode::ACCEPTED)
}
