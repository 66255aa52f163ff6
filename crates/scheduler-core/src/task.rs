// Task parameter variants (C1/C4 shared data model).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// Body of an email task: either a named template or a literal body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum EmailBody {
    Template {
        template_name: String,
        #[serde(default)]
        template_context: HashMap<String, Value>,
    },
    Literal {
        body: String,
        body_type: BodyType,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum BodyType {
    Plain,
    Html,
}

/// Task parameters: tagged union discriminated by `task_type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "task_type", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum TaskParameters {
    Shell {
        /// Parsed with POSIX shell-quoting rules; never handed to a shell.
        command: String,
        /// Relative path under the work_dir sandbox; `None` means work_dir itself.
        #[serde(default)]
        cwd: Option<String>,
        #[serde(default)]
        env: HashMap<String, String>,
    },
    Python {
        module: String,
        function: String,
        #[serde(default)]
        args: Vec<Value>,
        #[serde(default)]
        kwargs: HashMap<String, Value>,
    },
    Email {
        to: Vec<String>,
        subject: String,
        #[serde(flatten)]
        body: EmailBody,
        #[serde(default)]
        image_paths: Vec<String>,
    },
}

impl TaskParameters {
    pub fn task_type(&self) -> &'static str {
        match self {
            TaskParameters::Shell { .. } => "shell",
            TaskParameters::Python { .. } => "python",
            TaskParameters::Email { .. } => "email",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_type_matches_variant() {
        let shell = TaskParameters::Shell {
            command: "echo hello".into(),
            cwd: None,
            env: HashMap::new(),
        };
        assert_eq!(shell.task_type(), "shell");
    }

    #[test]
    fn round_trips_through_json() {
        let email = TaskParameters::Email {
            to: vec!["ops@example.com".into()],
            subject: "nightly report".into(),
            body: EmailBody::Literal {
                body: "done".into(),
                body_type: BodyType::Plain,
            },
            image_paths: vec![],
        };
        let json = serde_json::to_string(&email).unwrap();
        let back: TaskParameters = serde_json::from_str(&json).unwrap();
        assert_eq!(back.task_type(), "email");
    }
}
