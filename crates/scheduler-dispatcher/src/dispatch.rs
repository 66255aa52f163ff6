// The JobDispatcher seam (§4.4 meta-contract): open a RUNNING log row,
// perform the task, close it COMPLETED/FAILED, never propagate task failure
// as an Err. This is the one place that ties the three adapters to the
// shared store contract scheduler-engine dispatches against.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use scheduler_core::{
    DispatchOutcome, ExecutionLog, JobDefinition, JobDispatcher, LogStatus, RetryContext,
    SchedulerStore, TaskParameters,
};
use tracing::{info, warn};

use crate::config::DispatcherConfig;
use crate::email::run_email;
use crate::python::run_python;
use crate::shell::{run_shell, ShellOutcome};

pub struct Dispatcher {
    store: Arc<dyn SchedulerStore>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn SchedulerStore>, config: DispatcherConfig) -> Self {
        Dispatcher { store, config }
    }

    /// Shared by the job dispatcher and the workflow runner: runs one task,
    /// persisting the log row before and after. Returns the outcome so
    /// callers (the engine's retry logic, the workflow runner's on_failure
    /// policy) can act on it without re-reading the log themselves.
    pub async fn run_task(
        &self,
        job_id: Option<String>,
        workflow_run_id: Option<i64>,
        command: String,
        task: &TaskParameters,
        background: bool,
        timeout: Option<Duration>,
    ) -> scheduler_core::Result<DispatchOutcome> {
        let mut log = ExecutionLog::start(job_id.clone(), workflow_run_id, command.clone());
        self.store.create_log(&log).await?;

        let outcome = match task {
            TaskParameters::Shell { command, cwd, env } => {
                let resolved_cwd = scheduler_core::sandbox::resolve_under(
                    &self.config.work_dir,
                    cwd.as_deref().unwrap_or(""),
                )?;
                run_shell(command, &resolved_cwd, env, background, timeout).await
            }
            TaskParameters::Python {
                module,
                function,
                args,
                kwargs,
            } => run_python(&self.config.python_wrapper_path, module, function, args, kwargs).await,
            TaskParameters::Email {
                to,
                subject,
                body,
                image_paths,
            } => run_email(&self.config.email, to, subject, body, image_paths).await,
        };

        let ShellOutcome {
            exit_code,
            stdout,
            stderr,
        } = outcome;
        let status = if exit_code == 0 {
            LogStatus::Completed
        } else {
            LogStatus::Failed
        };
        log.finish(exit_code, stdout, stderr, status);
        self.store
            .update_log(
                log.id,
                log.end_time.expect("finish() sets end_time"),
                exit_code,
                &log.stdout,
                &log.stderr,
                status,
            )
            .await?;

        Ok(match status {
            LogStatus::Completed => DispatchOutcome::Completed,
            _ => DispatchOutcome::Failed,
        })
    }
}

#[async_trait]
impl JobDispatcher for Dispatcher {
    async fn dispatch(&self, job: &JobDefinition, retry: RetryContext) -> scheduler_core::Result<DispatchOutcome> {
        let command = describe(&job.task_parameters);
        if retry.retry_count > 0 {
            info!(job_id = %job.id, attempt = retry.retry_count, "retrying job");
        }
        let (background, timeout) = match &job.task_parameters {
            TaskParameters::Shell { .. } => (false, None),
            _ => (false, None),
        };
        let outcome = self
            .run_task(
                Some(job.id.clone()),
                None,
                command,
                &job.task_parameters,
                background,
                timeout,
            )
            .await;
        if let Err(e) = &outcome {
            warn!(job_id = %job.id, error = %e, "dispatcher failed to even attempt the task");
        }
        outcome
    }
}

/// Human-readable `command` field for the log row (§3 ExecutionLog).
pub fn describe(task: &TaskParameters) -> String {
    match task {
        TaskParameters::Shell { command, .. } => command.clone(),
        TaskParameters::Python { module, function, .. } => format!("{module}:{function}"),
        TaskParameters::Email { to, subject, .. } => format!("email to {} ({})", to.join(","), subject),
    }
}
