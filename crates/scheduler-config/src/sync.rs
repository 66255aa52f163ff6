// DB -> engine reconciliation (§4.6 "Sync"): enumerates store entries and
// installs them into the scheduling engine, optionally removing engine
// entries that no longer have a store counterpart.

use std::collections::HashSet;
use std::sync::Arc;

use chrono_tz::Tz;
use scheduler_core::{Pagination, SchedulerError, SchedulerStore, Trigger, Workflow};
use scheduler_engine::{entry_state_for_job, EntryState, EntryTarget, Scheduler};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct ReconcilerConfig {
    /// When set, engine entries absent from the store (and not a workflow
    /// entry) are removed on sync.
    pub delete_orphaned_jobs_on_sync: bool,
    /// Grace period installed for a workflow's own cron entry.
    pub workflow_misfire_grace_time: Option<i64>,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        ReconcilerConfig {
            delete_orphaned_jobs_on_sync: true,
            workflow_misfire_grace_time: Some(3600),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SyncReport {
    pub jobs_installed: usize,
    pub workflows_installed: usize,
    pub orphans_removed: usize,
}

pub struct ConfigReconciler {
    store: Arc<dyn SchedulerStore>,
    scheduler: Arc<Scheduler>,
    config: ReconcilerConfig,
}

impl ConfigReconciler {
    pub fn new(store: Arc<dyn SchedulerStore>, scheduler: Arc<Scheduler>, config: ReconcilerConfig) -> Self {
        ConfigReconciler {
            store,
            scheduler,
            config,
        }
    }

    /// Reconciles both job definitions and workflow schedules. Invoked once
    /// at startup (after `Scheduler::load_from_store`), on a declarative
    /// file modification, on a periodic timer, and after any API mutation
    /// per §4.6's control-flow note.
    pub async fn sync(&self) -> scheduler_core::Result<SyncReport> {
        let jobs_installed = self.sync_jobs().await?;
        let workflows_installed = self.sync_workflows().await?;
        let orphans_removed = if self.config.delete_orphaned_jobs_on_sync {
            self.remove_orphans().await?
        } else {
            0
        };
        info!(
            jobs_installed,
            workflows_installed, orphans_removed, "configuration sync complete"
        );
        Ok(SyncReport {
            jobs_installed,
            workflows_installed,
            orphans_removed,
        })
    }

    async fn sync_jobs(&self) -> scheduler_core::Result<usize> {
        let jobs = self.store.list_jobs(Pagination { skip: 0, limit: i64::MAX }).await?;
        for job in &jobs {
            let state = entry_state_for_job(job);
            self.scheduler
                .add_or_replace(job.id.clone(), job.trigger.clone(), state)
                .await?;
        }
        Ok(jobs.len())
    }

    async fn sync_workflows(&self) -> scheduler_core::Result<usize> {
        let workflows = self.store.list_workflows().await?;
        let mut installed = 0;
        for workflow in &workflows {
            if self.install_workflow(workflow).await? {
                installed += 1;
            }
        }
        Ok(installed)
    }

    /// Installs (or removes) one workflow's own cron entry, mirroring
    /// the source's `schedule_workflow`/`remove_workflow_job` pair. Returns
    /// whether an entry was installed.
    async fn install_workflow(&self, workflow: &Workflow) -> scheduler_core::Result<bool> {
        let entry_id = workflow.entry_id();
        let Some(schedule) = &workflow.schedule else {
            self.scheduler.remove(&entry_id).await?;
            return Ok(false);
        };
        if !workflow.is_enabled {
            self.scheduler.remove(&entry_id).await?;
            return Ok(false);
        }

        let fields = match parse_five_field_cron(schedule) {
            Ok(fields) => fields,
            Err(e) => {
                warn!(workflow_id = workflow.id, error = %e, "invalid workflow schedule, not installed");
                self.scheduler.remove(&entry_id).await?;
                return Ok(false);
            }
        };

        let trigger = Trigger::Cron {
            fields,
            timezone: Tz::UTC,
        };
        let state = EntryState {
            target: EntryTarget::Workflow(workflow.id),
            paused: false,
            retry: Default::default(),
            max_instances: 1,
            coalesce: false,
            misfire_grace_time: self.config.workflow_misfire_grace_time,
        };
        self.scheduler.add_or_replace(entry_id, trigger, state).await?;
        Ok(true)
    }

    /// Removes engine entries with no corresponding store job, skipping
    /// anything under the workflow-entry prefix (workflows are reconciled
    /// independently, since they may legitimately have no schedule).
    async fn remove_orphans(&self) -> scheduler_core::Result<usize> {
        let known: HashSet<String> = self
            .store
            .list_jobs(Pagination { skip: 0, limit: i64::MAX })
            .await?
            .into_iter()
            .map(|j| j.id)
            .collect();

        let mut removed = 0;
        for id in self.scheduler.entry_ids().await {
            if id.starts_with("workflow_") || id.contains("_retry_") {
                continue;
            }
            if !known.contains(&id) {
                self.scheduler.remove(&id).await?;
                info!(entry = %id, "removed orphaned entry from scheduler");
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Parses a workflow's five-field schedule string (minute hour day month
/// day_of_week) into the engine's cron field representation. `second`
/// defaults to "0" and `year`/`week` are unconstrained, matching the
/// defaults `CronFields` already applies elsewhere.
fn parse_five_field_cron(schedule: &str) -> scheduler_core::Result<scheduler_core::CronFields> {
    let parts: Vec<&str> = schedule.split_whitespace().collect();
    let [minute, hour, day, month, day_of_week] = parts[..] else {
        return Err(SchedulerError::validation(format!(
            "workflow schedule '{schedule}' must have exactly five whitespace-separated fields"
        )));
    };
    Ok(scheduler_core::CronFields {
        minute: minute.to_string(),
        hour: hour.to_string(),
        day: day.to_string(),
        month: month.to_string(),
        day_of_week: day_of_week.to_string(),
        ..Default::default()
    })
}
