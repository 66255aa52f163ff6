// Integration tests for DB -> engine reconciliation against an in-memory
// fake store and a real Scheduler with no-op dispatchers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scheduler_core::{
    DispatchOutcome, ExecutionLog, JobDefinition, JobDispatcher, LogFilters, LogStatus,
    OnFailure, Pagination, RetryContext, RunStatus, SchedulerStore, StepJobType, StoredEntry,
    TaskParameters, Trigger, Workflow, WorkflowDispatcher, WorkflowRun, WorkflowStep,
};
use scheduler_config::{ConfigReconciler, ReconcilerConfig};
use scheduler_engine::{ExecutorPoolsConfig, Scheduler};

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
        self.workflows.lock().unwrap().insert(workflow.id, workflow.clone());
        Ok(workflow.id)
    }
    async fn delete_workflow(&self, id: i64) -> scheduler_core::Result<()> {
        self.workflows.lock().unwrap().remove(&id);
        Ok(())
    }
    async fn create_workflow_run(&self, _run: &WorkflowRun) -> scheduler_core::Result<i64> {
        Ok(1)
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
        self.stored_entries
            .lock()
            .unwrap()
            .insert(entry.id.clone(), entry.clone());
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
    async fn dispatch(&self, _workflow_id: i64, _params: Option<HashMap<String, serde_json::Value>>) -> scheduler_core::Result<()> {
        Ok(())
    }
}

fn job(id: &str) -> JobDefinition {
    JobDefinition {
        id: id.to_string(),
        name: id.to_string(),
        description: String::new(),
        is_enabled: true,
        trigger: Trigger::Date {
            run_at: Utc::now() + chrono::Duration::hours(1),
            timezone: chrono_tz::Tz::UTC,
        },
        task_parameters: TaskParameters::Shell {
            command: "echo hi".into(),
            cwd: None,
            env: HashMap::new(),
        },
        max_instances: 1,
        coalesce: false,
        misfire_grace_time: None,
    }
}

fn workflow(id: i64, schedule: Option<&str>, is_enabled: bool) -> Workflow {
    Workflow {
        id,
        name: format!("wf-{id}"),
        description: String::new(),
        schedule: schedule.map(str::to_string),
        is_enabled,
        params_def: None,
        steps: vec![WorkflowStep {
            step_order: 1,
            name: "step".into(),
            job_type: StepJobType::Shell,
            target: "echo hi".into(),
            args: vec![],
            kwargs: HashMap::new(),
            on_failure: OnFailure::Stop,
            timeout: None,
            run_in_background: false,
        }],
    }
}

fn build_scheduler(store: Arc<FakeStore>) -> Arc<Scheduler> {
    Scheduler::new(
        store,
        Arc::new(NoopJobDispatcher),
        Arc::new(NoopWorkflowDispatcher),
        ExecutorPoolsConfig::default(),
    )
}

#[tokio::test]
async fn installs_jobs_and_enabled_workflows() {
    let store = Arc::new(FakeStore::default());
    store.upsert_job(&job("job-a")).await.unwrap();
    store
        .upsert_workflow_with_steps(&workflow(1, Some("0 2 * * *"), true))
        .await
        .unwrap();

    let scheduler = build_scheduler(store.clone());
    let reconciler = ConfigReconciler::new(store.clone() as Arc<dyn SchedulerStore>, scheduler.clone(), ReconcilerConfig::default());

    let report = reconciler.sync().await.unwrap();
    assert_eq!(report.jobs_installed, 1);
    assert_eq!(report.workflows_installed, 1);

    let ids = scheduler.entry_ids().await;
    assert!(ids.contains(&"job-a".to_string()));
    assert!(ids.contains(&"workflow_1".to_string()));
}

#[tokio::test]
async fn disabled_workflow_is_not_installed_and_is_removed_if_present() {
    let store = Arc::new(FakeStore::default());
    store
        .upsert_workflow_with_steps(&workflow(2, Some("0 2 * * *"), true))
        .await
        .unwrap();
    let scheduler = build_scheduler(store.clone());
    let reconciler = ConfigReconciler::new(store.clone() as Arc<dyn SchedulerStore>, scheduler.clone(), ReconcilerConfig::default());
    reconciler.sync().await.unwrap();
    assert!(scheduler.entry_ids().await.contains(&"workflow_2".to_string()));

    store
        .upsert_workflow_with_steps(&workflow(2, Some("0 2 * * *"), false))
        .await
        .unwrap();
    reconciler.sync().await.unwrap();
    assert!(!scheduler.entry_ids().await.contains(&"workflow_2".to_string()));
}

#[tokio::test]
async fn orphaned_job_entries_are_removed_but_workflow_entries_are_spared() {
    let store = Arc::new(FakeStore::default());
    store.upsert_job(&job("will-be-removed")).await.unwrap();
    store
        .upsert_workflow_with_steps(&workflow(3, Some("0 2 * * *"), true))
        .await
        .unwrap();
    let scheduler = build_scheduler(store.clone());
    let reconciler = ConfigReconciler::new(store.clone() as Arc<dyn SchedulerStore>, scheduler.clone(), ReconcilerConfig::default());
    reconciler.sync().await.unwrap();

    store.delete_job("will-be-removed").await.unwrap();
    let report = reconciler.sync().await.unwrap();
    assert_eq!(report.orphans_removed, 1);

    let ids = scheduler.entry_ids().await;
    assert!(!ids.contains(&"will-be-removed".to_string()));
    assert!(ids.contains(&"workflow_3".to_string()), "workflow entries must not be treated as orphans");
}

#[tokio::test]
async fn orphan_deletion_respects_the_disabled_policy() {
    let store = Arc::new(FakeStore::default());
    store.upsert_job(&job("kept-despite-removal")).await.unwrap();
    let scheduler = build_scheduler(store.clone());
    let config = ReconcilerConfig {
        delete_orphaned_jobs_on_sync: false,
        ..ReconcilerConfig::default()
    };
    let reconciler = ConfigReconciler::new(store.clone() as Arc<dyn SchedulerStore>, scheduler.clone(), config);
    reconciler.sync().await.unwrap();

    store.delete_job("kept-despite-removal").await.unwrap();
    let report = reconciler.sync().await.unwrap();
    assert_eq!(report.orphans_removed, 0);
    assert!(scheduler.entry_ids().await.contains(&"kept-despite-removal".to_string()));
}
