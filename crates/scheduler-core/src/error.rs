// Error types shared by the scheduler crates

use thiserror::Error;

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur anywhere in the scheduler core
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A definition failed schema/invariant validation
    #[error("validation error: {0}")]
    Validation(String),

    /// Referenced job, workflow, or run does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// A definition with the same id already exists
    #[error("duplicate id: {0}")]
    Duplicate(String),

    /// A cwd resolved outside the work_dir sandbox
    #[error("filesystem sandbox violation: {0}")]
    SandboxViolation(String),

    /// Underlying store error (transient or not)
    #[error("store error: {0}")]
    Store(String),

    /// Serialization/deserialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Unknown task/job/trigger type at reconcile time
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Internal error that doesn't fit another category
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl SchedulerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        SchedulerError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        SchedulerError::NotFound(msg.into())
    }

    pub fn duplicate(msg: impl Into<String>) -> Self {
        SchedulerError::Duplicate(msg.into())
    }

    pub fn sandbox(msg: impl Into<String>) -> Self {
        SchedulerError::SandboxViolation(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        SchedulerError::Store(msg.into())
    }
}

impl From<serde_json::Error> for SchedulerError {
    fn from(err: serde_json::Error) -> Self {
        SchedulerError::Serialization(err.to_string())
    }
}
