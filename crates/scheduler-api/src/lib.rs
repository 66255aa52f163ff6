//! HTTP control plane (C7) over the scheduler core crates: one route
//! module per resource, an OpenAPI document assembled from their
//! `utoipa::path` annotations, and a single `app_router` the composition
//! root (`main.rs`) and the integration tests both build against.

pub mod config;
pub mod dashboard;
pub mod dto;
pub mod error;
pub mod fs;
pub mod jobs;
pub mod logs;
pub mod state;
pub mod workflows;

use axum::extract::State as AxumState;
use axum::routing::get;
use axum::{Json, Router};
use scheduler_core::{JobDefinition, WorkflowRun};
use serde::Serialize;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        jobs::create_job,
        jobs::list_jobs,
        jobs::get_job,
        jobs::update_job,
        jobs::delete_job,
        jobs::pause_job,
        jobs::resume_job,
        jobs::run_job_now,
        jobs::bulk_delete,
        jobs::bulk_pause,
        jobs::bulk_resume,
        workflows::create_workflow,
        workflows::list_workflows,
        workflows::get_workflow,
        workflows::update_workflow,
        workflows::delete_workflow,
        workflows::pause_workflow,
        workflows::resume_workflow,
        workflows::run_workflow_now,
        dashboard::summary,
        dashboard::timeline,
        logs::list_logs,
        logs::list_logs_for_job,
        fs::list_subdirectories,
    ),
    components(schemas(
        JobDefinition,
        scheduler_core::Trigger,
        scheduler_core::CronFields,
        scheduler_core::IntervalSpec,
        scheduler_core::TaskParameters,
        scheduler_core::EmailBody,
        scheduler_core::BodyType,
        scheduler_core::ExecutionLog,
        scheduler_core::LogStatus,
        scheduler_core::Workflow,
        scheduler_core::WorkflowStep,
        scheduler_core::StepJobType,
        scheduler_core::OnFailure,
        scheduler_core::ParamDescriptor,
        WorkflowRun,
        scheduler_core::RunStatus,
        error::ErrorBody,
        dto::BulkResult,
        dto::BulkIdsRequest,
        workflows::RunNowRequest,
        dashboard::DashboardSummary,
        dashboard::TimelineEntry,
        fs::SubdirectoryList,
    )),
    tags(
        (name = "jobs", description = "Standalone job definitions, scheduling, and ad-hoc runs"),
        (name = "workflows", description = "Multi-step workflow definitions and runs"),
        (name = "dashboard", description = "Summary counts and activity timeline"),
        (name = "logs", description = "Execution log queries"),
        (name = "fs", description = "work_dir-sandboxed filesystem browsing"),
    ),
    info(
        title = "Scheduler API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP control plane for the persistent task scheduler",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health(AxumState(_state): AxumState<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Assembles the full router: every resource module merged in, the health
/// check, and swagger-ui. CORS and tracing layers are added by the caller
/// since tests typically don't want them.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(jobs::routes(state.clone()))
        .merge(workflows::routes(state.clone()))
        .merge(dashboard::routes(state.clone()))
        .merge(logs::routes(state.clone()))
        .merge(fs::routes(state.clone()))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
