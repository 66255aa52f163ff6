// Workflow and WorkflowStep (C1/C5 shared data model).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

use crate::error::{Result, SchedulerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum StepJobType {
    Shell,
    Python,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum OnFailure {
    Stop,
    Continue,
}

/// A parameter a workflow accepts at run time, named in `params_def`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ParamDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<Value>,
}

/// One step of a workflow. `target` is a shell command (job_type=shell) or a
/// `module:function` reference (job_type=python); parameter placeholders in
/// `target` are substituted at run time before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct WorkflowStep {
    pub step_order: i32,
    pub name: String,
    pub job_type: StepJobType,
    pub target: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: HashMap<String, Value>,
    pub on_failure: OnFailure,
    #[serde(default)]
    pub timeout: Option<u64>,
    #[serde(default)]
    pub run_in_background: bool,
}

impl WorkflowStep {
    /// For shell steps only `kwargs.env` (a string->string map) is consulted;
    /// for python steps both `args` and `kwargs` are passed through whole.
    pub fn shell_env(&self) -> HashMap<String, String> {
        match self.kwargs.get("env").and_then(|v| v.as_object()) {
            Some(map) => map
                .iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect(),
            None => HashMap::new(),
        }
    }
}

/// A named, ordered sequence of steps, optionally on its own cron schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Workflow {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Exactly five whitespace-separated fields: minute hour day month day_of_week.
    #[serde(default)]
    pub schedule: Option<String>,
    #[serde(default = "default_true")]
    pub is_enabled: bool,
    #[serde(default)]
    pub params_def: Option<Vec<ParamDescriptor>>,
    pub steps: Vec<WorkflowStep>,
}

fn default_true() -> bool {
    true
}

impl Workflow {
    /// The entry id this workflow is installed under in the scheduling engine.
    pub fn entry_id(&self) -> String {
        format!("workflow_{}", self.id)
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(SchedulerError::validation("workflow name must not be empty"));
        }
        if let Some(schedule) = &self.schedule {
            if schedule.split_whitespace().count() != 5 {
                return Err(SchedulerError::validation(
                    "workflow schedule must have exactly five whitespace-separated fields",
                ));
            }
        }
        let mut orders: Vec<i32> = self.steps.iter().map(|s| s.step_order).collect();
        orders.sort_unstable();
        orders.dedup();
        if orders.len() != self.steps.len() {
            return Err(SchedulerError::validation(
                "workflow step_order values must be distinct",
            ));
        }
        Ok(())
    }

    /// Steps in dispatch order: by step_order, ties broken by original insertion order.
    pub fn ordered_steps(&self) -> Vec<&WorkflowStep> {
        let mut indexed: Vec<(usize, &WorkflowStep)> = self.steps.iter().enumerate().collect();
        indexed.sort_by_key(|(idx, step)| (step.step_order, *idx));
        indexed.into_iter().map(|(_, step)| step).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(order: i32, name: &str) -> WorkflowStep {
        WorkflowStep {
            step_order: order,
            name: name.into(),
            job_type: StepJobType::Shell,
            target: "echo hi".into(),
            args: vec![],
            kwargs: HashMap::new(),
            on_failure: OnFailure::Stop,
            timeout: None,
            run_in_background: false,
        }
    }

    #[test]
    fn orders_steps_by_step_order() {
        let workflow = Workflow {
            id: 1,
            name: "w".into(),
            description: String::new(),
            schedule: None,
            is_enabled: true,
            params_def: None,
            steps: vec![step(2, "second"), step(1, "first")],
        };
        let ordered = workflow.ordered_steps();
        assert_eq!(ordered[0].name, "first");
        assert_eq!(ordered[1].name, "second");
    }

    #[test]
    fn rejects_duplicate_step_order() {
        let workflow = Workflow {
            id: 1,
            name: "w".into(),
            description: String::new(),
            schedule: None,
            is_enabled: true,
            params_def: None,
            steps: vec![step(1, "a"), step(1, "b")],
        };
        assert!(workflow.validate().is_err());
    }

    #[test]
    fn rejects_malformed_schedule() {
        let workflow = Workflow {
            id: 1,
            name: "w".into(),
            description: String::new(),
            schedule: Some("* * * *".into()),
            is_enabled: true,
            params_def: None,
            steps: vec![],
        };
        assert!(workflow.validate().is_err());
    }
}
