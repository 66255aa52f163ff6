//! Scheduling engine (C3): holds scheduled entries, computes the due set,
//! dispatches, enforces max_instances/coalesce/misfire, persists state, and
//! implements retry. See `scheduler_core::dispatch` for the seams this
//! crate is built against instead of depending on the dispatcher/workflow
//! crates directly.

mod engine;
mod entry;
mod index;
mod pools;

pub use engine::{entry_state_for_job, Scheduler};
pub use entry::{EntryState, EntryTarget, ScheduleEntry};
pub use pools::{ExecutorPools, ExecutorPoolsConfig};
