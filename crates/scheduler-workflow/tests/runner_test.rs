// Integration tests for the workflow runner against an in-memory fake store
// and real shell subprocesses, covering scenarios 3 and 4 of the testable
// properties (parameter substitution, stop-on-failure).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scheduler_core::{
    ExecutionLog, JobDefinition, LogFilters, LogStatus, OnFailure, Pagination, RunStatus,
    SchedulerStore, StepJobType, StoredEntry, Workflow, WorkflowRun, WorkflowStep,
};
use scheduler_dispatcher::{Dispatcher, DispatcherConfig, EmailConfig};
use scheduler_workflow::WorkflowRunner;
use serde_json::Value;

#[derive(Default)]
struct FakeStore {
    workflows: Mutex<HashMap<i64, Workflow>>,
    runs: Mutex<Vec<WorkflowRun>>,
    logs: Mutex<Vec<ExecutionLog>>,
}

#[async_trait]
impl SchedulerStore for FakeStore {
    async fn get_job(&self, _id: &str) -> scheduler_core::Result<Option<JobDefinition>> {
        Ok(None)
    }
    async fn list_jobs(&self, _paging: Pagination) -> scheduler_core::Result<Vec<JobDefinition>> {
        Ok(vec![])
    }
    async fn upsert_job(&self, _def: &JobDefinition) -> scheduler_core::Result<()> {
        Ok(())
    }
    async fn delete_job(&self, _id: &str) -> scheduler_core::Result<()> {
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
    async fn create_workflow_run(&self, run: &WorkflowRun) -> scheduler_core::Result<i64> {
        let mut runs = self.runs.lock().unwrap();
        let id = runs.len() as i64 + 1;
        let mut stored = run.clone();
        stored.id = id;
        runs.push(stored);
        Ok(id)
    }
    async fn update_workflow_run(
        &self,
        id: i64,
        status: RunStatus,
        end_time: Option<DateTime<Utc>>,
        current_step: i32,
    ) -> scheduler_core::Result<()> {
        let mut runs = self.runs.lock().unwrap();
        if let Some(run) = runs.iter_mut().find(|r| r.id == id) {
            run.status = status;
            run.end_time = end_time;
            run.current_step = current_step;
        }
        Ok(())
    }
    async fn list_workflow_runs_since(&self, _since: DateTime<Utc>) -> scheduler_core::Result<Vec<WorkflowRun>> {
        Ok(self.runs.lock().unwrap().clone())
    }
    async fn create_log(&self, log: &ExecutionLog) -> scheduler_core::Result<()> {
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
    async fn update_log(
        &self,
        id: uuid::Uuid,
        end_time: DateTime<Utc>,
        exit_code: i32,
        stdout: &str,
        stderr: &str,
        status: LogStatus,
    ) -> scheduler_core::Result<()> {
        let mut logs = self.logs.lock().unwrap();
        if let Some(log) = logs.iter_mut().find(|l| l.id == id) {
            log.end_time = Some(end_time);
            log.exit_code = Some(exit_code);
            log.stdout = stdout.to_string();
            log.stderr = stderr.to_string();
            log.status = status;
        }
        Ok(())
    }
    async fn list_logs(&self, _filters: LogFilters, _paging: Pagination) -> scheduler_core::Result<Vec<ExecutionLog>> {
        Ok(self.logs.lock().unwrap().clone())
    }
    async fn list_logs_by_job(&self, job_id: &str) -> scheduler_core::Result<Vec<ExecutionLog>> {
        Ok(self
            .logs
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.job_id.as_deref() == Some(job_id))
            .cloned()
            .collect())
    }
    async fn list_stored_entries(&self) -> scheduler_core::Result<Vec<StoredEntry>> {
        Ok(vec![])
    }
    async fn upsert_stored_entry(&self, _entry: &StoredEntry) -> scheduler_core::Result<()> {
        Ok(())
    }
    async fn delete_stored_entry(&self, _id: &str) -> scheduler_core::Result<()> {
        Ok(())
    }
}

fn dispatcher_config(work_dir: &std::path::Path) -> DispatcherConfig {
    DispatcherConfig {
        work_dir: work_dir.to_path_buf(),
        python_wrapper_path: std::path::PathBuf::from("/nonexistent/python-wrapper"),
        email: EmailConfig {
            sender_account: "ops@example.com".to_string(),
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_password: None,
        },
    }
}

fn shell_step(order: i32, name: &str, target: &str, on_failure: OnFailure) -> WorkflowStep {
    WorkflowStep {
        step_order: order,
        name: name.to_string(),
        job_type: StepJobType::Shell,
        target: target.to_string(),
        args: vec![],
        kwargs: HashMap::new(),
        on_failure,
        timeout: None,
        run_in_background: false,
    }
}

#[tokio::test]
async fn substitutes_parameters_and_runs_in_workflow_cwd() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeStore::default());
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone() as Arc<dyn SchedulerStore>,
        dispatcher_config(tmp.path()),
    ));
    let runner = WorkflowRunner::new(store.clone() as Arc<dyn SchedulerStore>, dispatcher, tmp.path().to_path_buf());

    let workflow = Workflow {
        id: 1,
        name: "W1".to_string(),
        description: String::new(),
        schedule: None,
        is_enabled: true,
        params_def: None,
        steps: vec![shell_step(
            1,
            "greet",
            "echo hello {{ params.name }}",
            OnFailure::Stop,
        )],
    };
    store.upsert_workflow_with_steps(&workflow).await.unwrap();

    let mut params = HashMap::new();
    params.insert("name".to_string(), Value::String("world".into()));

    use scheduler_core::WorkflowDispatcher;
    runner.dispatch(1, Some(params)).await.unwrap();

    let runs = store.runs.lock().unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].status, RunStatus::Completed);

    let logs = store.logs.lock().unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].stdout.trim(), "hello world");
    assert_eq!(logs[0].status, LogStatus::Completed);
    assert!(tmp.path().join("W1").exists());
}

#[tokio::test]
async fn stop_on_failure_skips_remaining_steps() {
    let tmp = tempfile::tempdir().unwrap();
    let store = Arc::new(FakeStore::default());
    let dispatcher = Arc::new(Dispatcher::new(
        store.clone() as Arc<dyn SchedulerStore>,
        dispatcher_config(tmp.path()),
    ));
    let runner = WorkflowRunner::new(store.clone() as Arc<dyn SchedulerStore>, dispatcher, tmp.path().to_path_buf());

    let workflow = Workflow {
        id: 2,
        name: "W2".to_string(),
        description: String::new(),
        schedule: None,
        is_enabled: true,
        params_def: None,
        steps: vec![
            shell_step(1, "fail", "false", OnFailure::Stop),
            shell_step(2, "unreached", "echo reached", OnFailure::Stop),
        ],
    };
    store.upsert_workflow_with_steps(&workflow).await.unwrap();

    use scheduler_core::WorkflowDispatcher;
    runner.dispatch(2, None).await.unwrap();

    let runs = store.runs.lock().unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);

    let logs = store.logs.lock().unwrap();
    assert_eq!(logs.len(), 1, "the unreached step must not have run");
}
