// Integration tests for the HTTP control plane (§4.7), against an
// in-memory fake store and no-op dispatchers, the way the engine's own
// `engine_test.rs` exercises the scheduler without a real database.
// Requests are driven with `tower::ServiceExt::oneshot` against the
// assembled router, never a live TCP listener.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use scheduler_api::state::AppState;
use scheduler_config::{ConfigReconciler, ReconcilerConfig};
use scheduler_core::{
    CronFields, DispatchOutcome, ExecutionLog, JobDefinition, JobDispatcher, LogFilters, LogStatus,
    Pagination, RetryContext, RunStatus, SchedulerStore, StoredEntry, TaskParameters, Trigger,
    Workflow, WorkflowDispatcher, WorkflowRun,
};
use scheduler_engine::{ExecutorPoolsConfig, Scheduler};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Default)]
struct FakeStore {
    jobs: Mutex<HashMap<String, JobDefinition>>,
    workflows: Mutex<HashMap<i64, Workflow>>,
    stored_entries: Mutex<HashMap<String, StoredEntry>>,
}

#[async_trait]
impl SchedulerStore for FakeStore {
    async fn get_job(&self, id: &str) -> scheduler_core::Result<Option<JobDefinition>> {
        Ok(self.jobs.lock().unwrap().get(id).cloned())
    }
    async fn list_jobs(&self, _paging: Pagination) -> scheduler_core::Result<Vec<JobDefinition>> {
        Ok(self.jobs.lock().unwrap().values().cloned().collect())
    }
    async fn upsert_job(&self, def: &JobDefinition) -> scheduler_core::Result<()> {
        self.jobs.lock().unwrap().insert(def.id.clone(), def.clone());
        Ok(())
    }
    async fn delete_job(&self, id: &str) -> scheduler_core::Result<()> {
        self.jobs.lock().unwrap().remove(id);
        Ok(())
    }
    async fn get_workflow(&self, id: i64) -> scheduler_core::Result<Option<Workflow>> {
        Ok(self.workflows.lock().unwrap().get(&id).cloned())
    }
    async fn list_workflows(&self) -> scheduler_core::Result<Vec<Workflow>> {
        Ok(self.workflows.lock().unwrap().values().cloned().collect())
    }
    async fn upsert_workflow_with_steps(&self, workflow: &Workflow) -> scheduler_core::Result<i64> {
        let mut workflows = self.workflows.lock().unwrap();
        let id = if workflow.id == 0 {
            workflows.keys().max().copied().unwrap_or(0) + 1
        } else {
            workflow.id
        };
        let mut stored = workflow.clone();
        stored.id = id;
        workflows.insert(id, stored);
        Ok(id)
    }
    async fn delete_workflow(&self, id: i64) -> scheduler_core::Result<()> {
        self.workflows.lock().unwrap().remove(&id);
        Ok(())
    }
    async fn create_workflow_run(&self, run: &WorkflowRun) -> scheduler_core::Result<i64> {
        Ok(run.id)
    }
    async fn update_workflow_run(
        &self,
        _id: i64,
        _status: RunStatus,
        _end_time: Option<DateTime<Utc>>,
        _current_step: i32,
    ) -> scheduler_core::Result<()> {
        Ok(())
    }
    async fn list_workflow_runs_since(&self, _since: DateTime<Utc>) -> scheduler_core::Result<Vec<WorkflowRun>> {
        Ok(vec![])
    }
    async fn create_log(&self, _log: &ExecutionLog) -> scheduler_core::Result<()> {
        Ok(())
    }
    async fn update_log(
        &self,
        _id: uuid::Uuid,
        _end_time: DateTime<Utc>,
        _exit_code: i32,
        _stdout: &str,
        _stderr: &str,
        _status: LogStatus,
    ) -> scheduler_core::Result<()> {
        Ok(())
    }
    async fn list_logs(&self, _filters: LogFilters, _paging: Pagination) -> scheduler_core::Result<Vec<ExecutionLog>> {
        Ok(vec![])
    }
    async fn list_logs_by_job(&self, _job_id: &str) -> scheduler_core::Result<Vec<ExecutionLog>> {
        Ok(vec![])
    }
    async fn list_stored_entries(&self) -> scheduler_core::Result<Vec<StoredEntry>> {
        Ok(self.stored_entries.lock().unwrap().values().cloned().collect())
    }
    async fn upsert_stored_entry(&self, entry: &StoredEntry) -> scheduler_core::Result<()> {
        self.stored_entries.lock().unwrap().insert(entry.id.clone(), entry.clone());
        Ok(())
    }
    async fn delete_stored_entry(&self, id: &str) -> scheduler_core::Result<()> {
        self.stored_entries.lock().unwrap().remove(id);
        Ok(())
    }
}

struct NoopJobDispatcher;

#[async_trait]
impl JobDispatcher for NoopJobDispatcher {
    async fn dispatch(&self, _job: &JobDefinition, _retry: RetryContext) -> scheduler_core::Result<DispatchOutcome> {
        Ok(DispatchOutcome::Completed)
    }
}

struct NoopWorkflowDispatcher;

#[async_trait]
impl WorkflowDispatcher for NoopWorkflowDispatcher {
    async fn dispatch(&self, _workflow_id: i64, _run_params: Option<HashMap<String, Value>>) -> scheduler_core::Result<()> {
        Ok(())
    }
}

fn test_state() -> AppState {
    let store: Arc<dyn SchedulerStore> = Arc::new(FakeStore::default());
    let job_dispatcher: Arc<dyn JobDispatcher> = Arc::new(NoopJobDispatcher);
    let workflow_dispatcher: Arc<dyn WorkflowDispatcher> = Arc::new(NoopWorkflowDispatcher);
    let scheduler = Scheduler::new(store.clone(), job_dispatcher, workflow_dispatcher.clone(), ExecutorPoolsConfig::default());
    let reconciler = Arc::new(ConfigReconciler::new(store.clone(), scheduler.clone(), ReconcilerConfig::default()));
    AppState {
        store,
        scheduler,
        reconciler,
        workflow_dispatcher,
        work_dir: std::env::temp_dir(),
    }
}

fn sample_job(id: &str) -> Value {
    json!({
        "id": id,
        "name": id,
        "description": "",
        "is_enabled": true,
        "trigger": {
            "type": "interval",
            "spec": { "seconds": 60 },
            "timezone": "UTC",
            "start_anchor": Utc::now().to_rfc3339(),
        },
        "task_parameters": {
            "task_type": "shell",
            "command": "echo hi",
        },
        "max_instances": 1,
        "coalesce": false,
        "misfire_grace_time": null,
    })
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn creates_and_fetches_a_job() {
    let app = scheduler_api::app_router(test_state());

    let create = Request::builder()
        .method("POST")
        .uri("/v1/jobs")
        .header("content-type", "application/json")
        .body(Body::from(sample_job("nightly-backup").to_string()))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let get = Request::builder().uri("/v1/jobs/nightly-backup").body(Body::empty()).unwrap();
    let response = app.oneshot(get).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let job = body_json(response).await;
    assert_eq!(job["id"], "nightly-backup");
}

#[tokio::test]
async fn rejects_duplicate_job_id_with_conflict() {
    let app = scheduler_api::app_router(test_state());

    let create = || {
        Request::builder()
            .method("POST")
            .uri("/v1/jobs")
            .header("content-type", "application/json")
            .body(Body::from(sample_job("dup").to_string()))
            .unwrap()
    };

    let first = app.clone().oneshot(create()).await.unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(create()).await.unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = body_json(second).await;
    assert!(body["detail"].as_str().unwrap().contains("already exists"));
}

#[tokio::test]
async fn get_missing_job_returns_not_found_with_detail() {
    let app = scheduler_api::app_router(test_state());
    let request = Request::builder().uri("/v1/jobs/does-not-exist").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().is_some());
}

#[tokio::test]
async fn validation_error_returns_bad_request() {
    let app = scheduler_api::app_router(test_state());
    let mut bad = sample_job("Not A Valid Id!!");
    bad["id"] = json!("Not A Valid Id!!");
    let request = Request::builder()
        .method("POST")
        .uri("/v1/jobs")
        .header("content-type", "application/json")
        .body(Body::from(bad.to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn creates_a_workflow_and_lists_it() {
    let app = scheduler_api::app_router(test_state());
    let workflow = json!({
        "id": 0,
        "name": "nightly-etl",
        "description": "",
        "schedule": null,
        "is_enabled": true,
        "params_def": null,
        "steps": [
            {
                "step_order": 0,
                "name": "extract",
                "job_type": "shell",
                "target": "echo extract",
                "args": [],
                "kwargs": {},
                "on_failure": "stop",
                "timeout": null,
                "run_in_background": false,
            }
        ],
    });
    let create = Request::builder()
        .method("POST")
        .uri("/v1/workflows")
        .header("content-type", "application/json")
        .body(Body::from(workflow.to_string()))
        .unwrap();
    let response = app.clone().oneshot(create).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let list = Request::builder().uri("/v1/workflows").body(Body::empty()).unwrap();
    let response = app.oneshot(list).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let workflows = body_json(response).await;
    assert_eq!(workflows.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn bulk_delete_reports_per_id_outcomes() {
    let state = test_state();
    state.store.upsert_job(&JobDefinition {
        id: "exists".into(),
        name: "exists".into(),
        description: String::new(),
        is_enabled: true,
        trigger: Trigger::Cron {
            fields: CronFields::default(),
            timezone: chrono_tz::UTC,
        },
        task_parameters: TaskParameters::Shell {
            command: "echo hi".into(),
            cwd: None,
            env: HashMap::new(),
        },
        max_instances: 1,
        coalesce: false,
        misfire_grace_time: None,
    }).await.unwrap();
    let app = scheduler_api::app_router(state);

    let request = Request::builder()
        .method("POST")
        .uri("/v1/jobs/bulk/delete")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "ids": ["exists", "missing"] }).to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let result = body_json(response).await;
    assert_eq!(result["done"], json!(["exists"]));
    assert!(result["failed"]["missing"].as_str().is_some());
}

#[tokio::test]
async fn dashboard_summary_reports_zero_on_empty_store() {
    let app = scheduler_api::app_router(test_state());
    let request = Request::builder().uri("/v1/dashboard/summary").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let summary = body_json(response).await;
    assert_eq!(summary["total_jobs"], 0);
    assert_eq!(summary["total_workflows"], 0);
}

#[tokio::test]
async fn fs_subdirectories_rejects_path_traversal() {
    let app = scheduler_api::app_router(test_state());
    let request = Request::builder().uri("/v1/fs/subdirectories?path=../../etc").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["subdirectories"], json!([]));
}

#[tokio::test]
async fn health_check_reports_ok() {
    let app = scheduler_api::app_router(test_state());
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}
