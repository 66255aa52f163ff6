//! Execution dispatcher (C4): typed task adapters (shell, embedded python,
//! email), subprocess lifecycle, and working-directory sandboxing. The
//! three adapters share one meta-contract, implemented once in
//! [`dispatch::Dispatcher`]: open a RUNNING log row, run the task, close it
//! COMPLETED/FAILED, never raise to the caller. scheduler-engine depends
//! only on `scheduler_core::JobDispatcher`; scheduler-workflow reuses
//! `Dispatcher::run_task` directly for its per-step execution.

pub mod config;
pub mod dispatch;
pub mod email;
pub mod python;
pub mod shell;

pub use config::{DispatcherConfig, EmailConfig};
pub use dispatch::{describe, Dispatcher};
pub use shell::ShellOutcome;
