// Schedule entries: the in-memory state the engine maintains per §4.3,
// mirrored to the store so a restart can rebuild them verbatim.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use scheduler_core::{RetryContext, Trigger};
use serde::{Deserialize, Serialize};

/// What a schedule entry, once due, actually runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum EntryTarget {
    Job(String),
    Workflow(i64),
}

impl EntryTarget {
    pub fn entry_id(&self) -> String {
        match self {
            EntryTarget::Job(id) => id.clone(),
            EntryTarget::Workflow(id) => format!("workflow_{id}"),
        }
    }
}

/// The durable part of an entry's engine-private state (everything besides
/// the trigger and next_fire_time, which are stored alongside it).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryState {
    pub target: EntryTarget,
    pub paused: bool,
    pub retry: RetryContext,
    pub max_instances: u32,
    pub coalesce: bool,
    pub misfire_grace_time: Option<i64>,
}

/// A live schedule entry held in the engine's priority structure.
pub struct ScheduleEntry {
    pub id: String,
    pub trigger: Trigger,
    pub next_fire_time: Option<DateTime<Utc>>,
    pub state: EntryState,
    pub running_count: Arc<AtomicU32>,
}

impl ScheduleEntry {
    pub fn new(id: String, trigger: Trigger, state: EntryState) -> Self {
        ScheduleEntry {
            id,
            trigger,
            next_fire_time: None,
            state,
            running_count: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn can_run_another(&self) -> bool {
        self.running_count.load(Ordering::SeqCst) < self.state.max_instances
    }

    pub fn begin_run(&self) {
        self.running_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn end_run(running_count: &Arc<AtomicU32>) {
        running_count.fetch_sub(1, Ordering::SeqCst);
    }
}
