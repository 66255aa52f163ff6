//! Domain model and error types shared by the scheduler crates.
//!
//! This crate is intentionally storage- and runtime-agnostic: it defines the
//! data in §3 of the design (job/workflow/run/log records, trigger and task
//! tagged unions) plus the invariants that can be checked without a database
//! or a clock beyond `Utc::now`. scheduler-trigger, scheduler-engine,
//! scheduler-dispatcher, scheduler-workflow and scheduler-storage all depend
//! on it for a single shared vocabulary.

pub mod dispatch;
pub mod error;
pub mod ids;
pub mod job;
pub mod log;
pub mod retry;
pub mod run;
pub mod sandbox;
pub mod store;
pub mod task;
pub mod trigger;
pub mod workflow;

pub use dispatch::{DispatchOutcome, JobDispatcher, WorkflowDispatcher};
pub use error::{Result, SchedulerError};
pub use ids::{is_url_safe_id, validate_job_id};
pub use job::JobDefinition;
pub use log::{truncate_output, ExecutionLog, LogStatus, MAX_CAPTURED_OUTPUT_BYTES};
pub use retry::{RetryContext, MAX_RETRIES, RETRY_DELAY_SECONDS};
pub use run::{RunStatus, WorkflowRun};
pub use store::{LogFilters, Pagination, SchedulerStore, StoredEntry};
pub use task::{BodyType, EmailBody, TaskParameters};
pub use trigger::{CronField, CronFields, IntervalSpec, Trigger};
pub use workflow::{OnFailure, ParamDescriptor, StepJobType, Workflow, WorkflowStep};
