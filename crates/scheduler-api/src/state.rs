// Shared router state (C7): handles to the store, the live scheduler, the
// reconciler, and the workflow dispatcher used for param-carrying run-now
// requests. Constructed once at the composition root (C8) and cloned (all
// fields are `Arc`s) into each per-resource router.

use std::path::PathBuf;
use std::sync::Arc;

use scheduler_core::{SchedulerStore, WorkflowDispatcher};
use scheduler_config::ConfigReconciler;
use scheduler_engine::Scheduler;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn SchedulerStore>,
    pub scheduler: Arc<Scheduler>,
    pub reconciler: Arc<ConfigReconciler>,
    pub workflow_dispatcher: Arc<dyn WorkflowDispatcher>,
    pub work_dir: PathBuf,
}
