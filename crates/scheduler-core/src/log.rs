// ExecutionLog (C1/C4 shared data model).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum LogStatus {
    Running,
    Completed,
    Failed,
}

/// One execution of either a standalone job or a single workflow step.
/// `job_id` and `workflow_run_id` are mutually exclusive: workflow-step rows
/// carry a synthetic `job_id` of `<workflow>_<step_order>_<step_name>` plus
/// the owning run id, standalone job rows carry only `job_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ExecutionLog {
    pub id: Uuid,
    pub job_id: Option<String>,
    pub workflow_run_id: Option<i64>,
    /// Human-readable representation of what ran, e.g. the shell command or `module:function`.
    pub command: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub status: LogStatus,
}

/// Output rows are capped here to avoid unbounded storage growth.
pub const MAX_CAPTURED_OUTPUT_BYTES: usize = 64 * 1024;

pub fn truncate_output(output: &str) -> String {
    if output.len() <= MAX_CAPTURED_OUTPUT_BYTES {
        return output.to_string();
    }
    let mut end = MAX_CAPTURED_OUTPUT_BYTES;
    while end > 0 && !output.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}\n...[truncated]", &output[..end])
}

impl ExecutionLog {
    pub fn start(job_id: Option<String>, workflow_run_id: Option<i64>, command: String) -> Self {
        ExecutionLog {
            id: Uuid::now_v7(),
            job_id,
            workflow_run_id,
            command,
            start_time: Utc::now(),
            end_time: None,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            status: LogStatus::Running,
        }
    }

    pub fn finish(&mut self, exit_code: i32, stdout: String, stderr: String, status: LogStatus) {
        self.end_time = Some(Utc::now());
        self.exit_code = Some(exit_code);
        self.stdout = truncate_output(&stdout);
        self.stderr = truncate_output(&stderr);
        self.status = status;
    }
}
