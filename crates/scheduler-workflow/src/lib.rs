//! Workflow runner (C5): orchestrates a workflow's ordered steps through
//! scheduler-dispatcher, applies parameter substitution and on_failure
//! policy, and persists `WorkflowRun` records. Implements
//! `scheduler_core::WorkflowDispatcher`, the seam scheduler-engine
//! dispatches workflow entries against.

mod runner;
mod substitution;

pub use runner::{entry_id_for, WorkflowRunner};
pub use substitution::substitute;
