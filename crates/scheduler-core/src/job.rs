// JobDefinition (C1/C3 shared data model).

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{Result, SchedulerError};
use crate::ids::validate_job_id;
use crate::task::TaskParameters;
use crate::trigger::Trigger;

/// A schedulable unit: one job, one trigger, one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct JobDefinition {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    pub trigger: Trigger,
    pub task_parameters: TaskParameters,
    #[serde(default = "default_max_instances")]
    pub max_instances: u32,
    #[serde(default)]
    pub coalesce: bool,
    #[serde(default)]
    pub misfire_grace_time: Option<i64>,
}

fn default_true() -> bool {
    true
}

fn default_max_instances() -> u32 {
    1
}

impl JobDefinition {
    /// Checks the invariants §3 lists for JobDefinition: id charset, a
    /// well-formed trigger, and max_instances >= 1. task_type and trigger.type
    /// are enforced by construction (Rust's type system rejects unknown tags
    /// at deserialization).
    pub fn validate(&self) -> Result<()> {
        validate_job_id(&self.id)?;
        if self.max_instances < 1 {
            return Err(SchedulerError::validation(
                "max_instances must be at least 1",
            ));
        }
        self.trigger.validate()?;
        if let TaskParameters::Shell { cwd: Some(cwd), .. } = &self.task_parameters {
            crate::sandbox::validate_relative_cwd(cwd)?;
        }
        Ok(())
    }
}
