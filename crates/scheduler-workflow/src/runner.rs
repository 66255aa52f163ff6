// Workflow runner (C5, §4.5): orchestrates a workflow's steps through the
// dispatcher, persists a run record, applies on_failure policy and
// parameter substitution.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use scheduler_core::{
    sandbox, DispatchOutcome, OnFailure, RunStatus, SchedulerStore, StepJobType, TaskParameters,
    Workflow, WorkflowDispatcher, WorkflowRun, WorkflowStep,
};
use scheduler_dispatcher::Dispatcher;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::substitution::substitute;

pub struct WorkflowRunner {
    store: Arc<dyn SchedulerStore>,
    dispatcher: Arc<Dispatcher>,
    work_dir: PathBuf,
}

impl WorkflowRunner {
    pub fn new(store: Arc<dyn SchedulerStore>, dispatcher: Arc<Dispatcher>, work_dir: PathBuf) -> Self {
        WorkflowRunner {
            store,
            dispatcher,
            work_dir,
        }
    }

    async fn run(&self, workflow_id: i64, run_params: Option<HashMap<String, Value>>) -> scheduler_core::Result<()> {
        let Some(workflow) = self.store.get_workflow(workflow_id).await? else {
            error!(workflow_id, "run_workflow: no such workflow");
            return Ok(());
        };

        let token = sandbox::sanitize_token(&workflow.name);
        // The workflow's own cwd is the *only* cwd a shell step ever uses,
        // regardless of any cwd the step configuration might otherwise
        // suggest -- a deliberate sandbox decision (§4.5 step 2).
        let workflow_cwd = self.work_dir.join(&token);
        std::fs::create_dir_all(&workflow_cwd).map_err(|e| {
            scheduler_core::SchedulerError::sandbox(format!("could not create workflow cwd: {e}"))
        })?;

        let mut run = WorkflowRun::new(workflow_id, run_params.clone());
        let run_id = self.store.create_workflow_run(&run).await?;
        run.id = run_id;
        info!(workflow_id, run_id, "workflow run started");

        let params = run_params.unwrap_or_default();
        let mut final_status = RunStatus::Completed;
        let mut current_step = 0;

        for step in workflow.ordered_steps() {
            current_step = step.step_order;
            let outcome = self.run_step(&token, run_id, step, &params).await;
            match outcome {
                Ok(DispatchOutcome::Completed) => {}
                Ok(DispatchOutcome::Failed) => {
                    if step.on_failure == OnFailure::Stop {
                        warn!(workflow_id, run_id, step = %step.name, "step failed, stopping workflow");
                        final_status = RunStatus::Failed;
                        break;
                    }
                    info!(workflow_id, run_id, step = %step.name, "step failed, continuing (on_failure=continue)");
                }
                Err(e) => {
                    error!(workflow_id, run_id, step = %step.name, error = %e, "step dispatch errored");
                    final_status = RunStatus::Failed;
                    break;
                }
            }
        }

        self.store
            .update_workflow_run(run_id, final_status, Some(Utc::now()), current_step)
            .await?;
        info!(workflow_id, run_id, status = ?final_status, "workflow run finished");
        Ok(())
    }

    async fn run_step(
        &self,
        workflow_token: &str,
        run_id: i64,
        step: &WorkflowStep,
        params: &HashMap<String, Value>,
    ) -> scheduler_core::Result<DispatchOutcome> {
        let substituted_target = substitute(&step.target, params);
        let step_token = sandbox::sanitize_token(&step.name);
        let job_id = format!("{workflow_token}_{}_{step_token}", step.step_order);

        let task_params = match step.job_type {
            StepJobType::Shell => TaskParameters::Shell {
                command: substituted_target.clone(),
                cwd: Some(workflow_token.to_string()),
                env: step.shell_env(),
            },
            StepJobType::Python => {
                let (module, function) = substituted_target.split_once(':').ok_or_else(|| {
                    scheduler_core::SchedulerError::validation(format!(
                        "python step target '{substituted_target}' must be 'module:function'"
                    ))
                })?;
                TaskParameters::Python {
                    module: module.to_string(),
                    function: function.to_string(),
                    args: step.args.clone(),
                    kwargs: step.kwargs.clone(),
                }
            }
        };

        let timeout = step.timeout.map(Duration::from_secs);
        self.dispatcher
            .run_task(
                Some(job_id),
                Some(run_id),
                substituted_target,
                &task_params,
                step.run_in_background,
                timeout,
            )
            .await
    }
}

#[async_trait]
impl WorkflowDispatcher for WorkflowRunner {
    async fn dispatch(&self, workflow_id: i64, run_params: Option<HashMap<String, Value>>) -> scheduler_core::Result<()> {
        self.run(workflow_id, run_params).await
    }
}

/// The entry id a workflow with a schedule is installed under in the
/// scheduling engine -- must match [`Workflow::entry_id`].
pub fn entry_id_for(workflow: &Workflow) -> String {
    workflow.entry_id()
}
