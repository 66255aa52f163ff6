// The scheduling engine's core: in-memory state, the main loop, the
// mutation API, and retry orchestration (§4.3).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scheduler_core::{
    DispatchOutcome, JobDefinition, JobDispatcher, RetryContext, SchedulerError, SchedulerStore,
    StoredEntry, Trigger, WorkflowDispatcher, MAX_RETRIES, RETRY_DELAY_SECONDS,
};
use tokio::sync::{watch, Mutex, Notify};
use tracing::{debug, info, warn};

use crate::entry::{EntryState, EntryTarget, ScheduleEntry};
use crate::index::FireTimeIndex;
use crate::pools::{ExecutorPools, ExecutorPoolsConfig};

/// A single cascade of this many missed fires is dispatched per wake even
/// when `coalesce` is false; beyond it the rest are treated as misfires.
/// Guards against an entry whose period is so small that an outage would
/// otherwise require dispatching millions of backlogged fires.
const MAX_FIRES_PER_WAKE: usize = 64;

pub struct Scheduler {
    store: Arc<dyn SchedulerStore>,
    job_dispatcher: Arc<dyn JobDispatcher>,
    workflow_dispatcher: Arc<dyn WorkflowDispatcher>,
    pools: ExecutorPools,
    entries: Mutex<HashMap<String, ScheduleEntry>>,
    index: Mutex<FireTimeIndex>,
    wake: Notify,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(
        store: Arc<dyn SchedulerStore>,
        job_dispatcher: Arc<dyn JobDispatcher>,
        workflow_dispatcher: Arc<dyn WorkflowDispatcher>,
        pools_config: ExecutorPoolsConfig,
    ) -> Arc<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Arc::new(Scheduler {
            store,
            job_dispatcher,
            workflow_dispatcher,
            pools: ExecutorPools::new(&pools_config),
            entries: Mutex::new(HashMap::new()),
            index: Mutex::new(FireTimeIndex::new()),
            wake: Notify::new(),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Loads every stored entry and recomputes its next_fire_time from now,
    /// per the startup reconstitution invariant (the stored next_fire_time
    /// value itself is not trusted — only the trigger and state are).
    pub async fn load_from_store(&self) -> scheduler_core::Result<()> {
        let stored = self.store.list_stored_entries().await?;
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let mut index = self.index.lock().await;
        for row in stored {
            let trigger: Trigger = serde_json::from_str(&row.trigger_blob)?;
            let state: EntryState = serde_json::from_str(&row.job_state_blob)?;
            let next = scheduler_trigger::next_fire_time(&trigger, now)?;
            let mut entry = ScheduleEntry::new(row.id.clone(), trigger, state);
            entry.next_fire_time = next;
            if let Some(t) = next {
                index.push(row.id.clone(), t);
            }
            info!(entry = %row.id, next_fire_time = ?next, "restored schedule entry");
            entries.insert(row.id, entry);
        }
        Ok(())
    }

    /// Spawns the scheduling loop. The returned handle completes once
    /// `shutdown` is called and the loop drains its current wake.
    pub fn start(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run_loop().await })
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
        self.wake.notify_one();
    }

    async fn run_loop(self: Arc<Self>) {
        let mut shutdown_rx = self.shutdown_rx.clone();
        loop {
            let sleep_until = { self.index.lock().await.peek_time() };
            let sleep = async {
                match sleep_until {
                    Some(t) => {
                        let delay = (t - Utc::now()).to_std().unwrap_or(std::time::Duration::ZERO);
                        tokio::time::sleep(delay).await;
                    }
                    None => std::future::pending::<()>().await,
                }
            };

            tokio::select! {
                _ = sleep => {}
                _ = self.wake.notified() => {}
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        debug!("scheduling loop draining on shutdown");
                        return;
                    }
                }
            }

            if *shutdown_rx.borrow() {
                return;
            }

            self.process_due_entries().await;
        }
    }

    async fn process_due_entries(self: &Arc<Self>) {
        let now = Utc::now();
        loop {
            let candidate = {
                let mut index = self.index.lock().await;
                match index.peek_time() {
                    Some(t) if t <= now => index.pop(),
                    _ => None,
                }
            };
            let Some((id, fire_time)) = candidate else {
                break;
            };

            let mut entries = self.entries.lock().await;
            let Some(entry) = entries.get_mut(&id) else {
                continue; // tombstoned by remove()
            };
            if entry.next_fire_time != Some(fire_time) {
                continue; // stale heap slot; the live reschedule already re-pushed
            }

            if !entry.state.paused {
                self.dispatch_due(entry, fire_time, now).await;
            }

            let next = match scheduler_trigger::next_fire_time(&entry.trigger, now) {
                Ok(n) => n,
                Err(e) => {
                    warn!(entry = %id, error = %e, "failed to advance trigger; dropping entry");
                    None
                }
            };
            entry.next_fire_time = next;

            match next {
                Some(t) => {
                    if let Err(e) = self.persist_entry(entry).await {
                        warn!(entry = %id, error = %e, "failed to persist schedule entry");
                    }
                    self.index.lock().await.push(id, t);
                }
                None => {
                    drop(entries);
                    if let Err(e) = self.store.delete_stored_entry(&id).await {
                        warn!(entry = %id, error = %e, "failed to delete exhausted schedule entry");
                    }
                    self.entries.lock().await.remove(&id);
                }
            }
        }
    }

    /// Dispatches the planned fires for one due entry, applying coalesce,
    /// misfire grace, and max_instances as described in §4.3 step 3.
    async fn dispatch_due(self: &Arc<Self>, entry: &ScheduleEntry, fire_time: DateTime<Utc>, now: DateTime<Utc>) {
        let mut planned = vec![fire_time];
        let mut cursor = fire_time;
        while planned.len() < MAX_FIRES_PER_WAKE {
            match scheduler_trigger::next_fire_time(&entry.trigger, cursor) {
                Ok(Some(next)) if next <= now => {
                    planned.push(next);
                    cursor = next;
                }
                _ => break,
            }
        }

        let to_dispatch: Vec<DateTime<Utc>> = if entry.state.coalesce {
            vec![*planned.first().expect("at least one planned fire")]
        } else {
            planned
        };

        for planned_fire_time in to_dispatch {
            if let Some(grace) = entry.state.misfire_grace_time {
                if (now - planned_fire_time).num_seconds() > grace {
                    warn!(entry = %entry.id, planned = %planned_fire_time, "misfire: grace period exceeded");
                    continue;
                }
            }

            if !entry.can_run_another() {
                warn!(entry = %entry.id, "saturation: max_instances reached, skipping dispatch");
                continue;
            }

            entry.begin_run();
            self.submit(entry, planned_fire_time);
        }
    }

    fn submit(self: &Arc<Self>, entry: &ScheduleEntry, planned_fire_time: DateTime<Utc>) {
        let this = Arc::clone(self);
        let id = entry.id.clone();
        let target = entry.state.target.clone();
        let retry = entry.state.retry;
        let running_count = Arc::clone(&entry.running_count);
        let permit_pool = Arc::clone(&self.pools.worker);

        tokio::spawn(async move {
            let _permit = match permit_pool.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return, // pool closed during shutdown
            };
            let outcome = match &target {
                EntryTarget::Job(job_id) => match this.store.get_job(job_id).await {
                    Ok(Some(job)) => this.job_dispatcher.dispatch(&job, retry).await,
                    Ok(None) => {
                        warn!(job_id, "job definition missing at dispatch time");
                        Ok(DispatchOutcome::Failed)
                    }
                    Err(e) => Err(e),
                },
                EntryTarget::Workflow(workflow_id) => this
                    .workflow_dispatcher
                    .dispatch(*workflow_id, None)
                    .await
                    .map(|_| DispatchOutcome::Completed),
            };

            crate::entry::ScheduleEntry::end_run(&running_count);

            match outcome {
                Ok(DispatchOutcome::Failed) => {
                    if let EntryTarget::Job(job_id) = &target {
                        this.maybe_schedule_retry(job_id, retry, planned_fire_time).await;
                    }
                }
                Ok(DispatchOutcome::Completed) => {}
                Err(e) => warn!(entry = %id, error = %e, "dispatch failed to even attempt the task"),
            }
        });
    }

    async fn maybe_schedule_retry(&self, job_id: &str, current: RetryContext, now: DateTime<Utc>) {
        if !current.has_attempts_remaining() {
            info!(job_id, retries = current.retry_count, "job reached max retries, giving up");
            return;
        }
        let next = current.next_attempt();
        let retry_id = RetryContext::retry_entry_id(job_id, next.retry_count);
        let job = match self.store.get_job(job_id).await {
            Ok(Some(job)) => job,
            _ => return,
        };
        let retry_at = now + chrono::Duration::seconds(RETRY_DELAY_SECONDS);
        let trigger = Trigger::Date {
            run_at: retry_at,
            timezone: job.trigger.timezone(),
        };
        let state = EntryState {
            target: EntryTarget::Job(job_id.to_string()),
            paused: false,
            retry: next,
            max_instances: 1,
            coalesce: false,
            misfire_grace_time: None,
        };
        info!(retry_id = %retry_id, retry_at = %retry_at, attempt = next.retry_count, max = MAX_RETRIES, "scheduling retry");
        if let Err(e) = self.add_or_replace(retry_id.clone(), trigger, state).await {
            warn!(retry_id = %retry_id, error = %e, "failed to schedule retry");
        }
    }

    async fn persist_entry(&self, entry: &ScheduleEntry) -> scheduler_core::Result<()> {
        let stored = StoredEntry {
            id: entry.id.clone(),
            trigger_blob: serde_json::to_string(&entry.trigger)?,
            next_fire_time: entry.next_fire_time,
            job_state_blob: serde_json::to_string(&entry.state)?,
        };
        self.store.upsert_stored_entry(&stored).await
    }

    // ---- mutation API (§4.3) ----

    pub async fn add_or_replace(
        &self,
        id: String,
        trigger: Trigger,
        state: EntryState,
    ) -> scheduler_core::Result<()> {
        let now = Utc::now();
        let next = scheduler_trigger::next_fire_time(&trigger, now)?;
        let mut entry = ScheduleEntry::new(id.clone(), trigger, state);
        entry.next_fire_time = next;
        self.persist_entry(&entry).await?;
        if let Some(t) = next {
            self.index.lock().await.push(id.clone(), t);
        }
        self.entries.lock().await.insert(id, entry);
        self.wake.notify_one();
        Ok(())
    }

    pub async fn remove(&self, id: &str) -> scheduler_core::Result<()> {
        self.entries.lock().await.remove(id);
        self.store.delete_stored_entry(id).await?;
        self.wake.notify_one();
        Ok(())
    }

    pub async fn pause(&self, id: &str) -> scheduler_core::Result<()> {
        self.set_paused(id, true).await
    }

    pub async fn resume(&self, id: &str) -> scheduler_core::Result<()> {
        self.set_paused(id, false).await
    }

    async fn set_paused(&self, id: &str, paused: bool) -> scheduler_core::Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SchedulerError::not_found(format!("no schedule entry '{id}'")))?;
        entry.state.paused = paused;
        self.persist_entry(entry).await?;
        Ok(())
    }

    /// Used by "run now": sets the entry's next fire time directly.
    pub async fn modify_next_run(&self, id: &str, at: DateTime<Utc>) -> scheduler_core::Result<()> {
        let mut entries = self.entries.lock().await;
        let entry = entries
            .get_mut(id)
            .ok_or_else(|| SchedulerError::not_found(format!("no schedule entry '{id}'")))?;
        entry.next_fire_time = Some(at);
        self.persist_entry(entry).await?;
        drop(entries);
        self.index.lock().await.push(id.to_string(), at);
        self.wake.notify_one();
        Ok(())
    }

    /// All entry ids currently held in the engine, for reconciliation
    /// against the store's orphan-detection pass.
    pub async fn entry_ids(&self) -> Vec<String> {
        self.entries.lock().await.keys().cloned().collect()
    }

    /// `(id, next_fire_time)` for every entry with a future fire time, for
    /// the timeline's "scheduled" points (§6 "Timeline data").
    pub async fn scheduled_fire_times(&self) -> Vec<(String, DateTime<Utc>)> {
        self.entries
            .lock()
            .await
            .values()
            .filter_map(|e| e.next_fire_time.map(|t| (e.id.clone(), t)))
            .collect()
    }

    pub async fn is_paused(&self, id: &str) -> bool {
        self.entries
            .lock()
            .await
            .get(id)
            .map(|e| e.state.paused)
            .unwrap_or(false)
    }
}

/// Builds the initial entry state for a freshly upserted job definition.
pub fn entry_state_for_job(job: &JobDefinition) -> EntryState {
    EntryState {
        target: EntryTarget::Job(job.id.clone()),
        paused: !job.is_enabled,
        retry: RetryContext::default(),
        max_instances: job.max_instances,
        coalesce: job.coalesce,
        misfire_grace_time: job.misfire_grace_time,
    }
}
