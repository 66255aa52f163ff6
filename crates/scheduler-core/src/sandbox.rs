// Filesystem sandbox validation shared by job/workflow-step cwd handling (C4/C5).
//
// Enforced at both definition-validation time (here) and dispatch time
// (scheduler-dispatcher re-checks before touching the filesystem), per the
// spec's note that cwds can also arrive via workflow step configuration.

use std::path::{Component, Path};

use crate::error::{Result, SchedulerError};

/// Rejects absolute paths and any path containing a `..` component.
/// An empty string is allowed (means "work_dir itself").
pub fn validate_relative_cwd(cwd: &str) -> Result<()> {
    if cwd.is_empty() {
        return Ok(());
    }
    let path = Path::new(cwd);
    if path.is_absolute() {
        return Err(SchedulerError::sandbox(format!(
            "cwd '{cwd}' must be relative to work_dir"
        )));
    }
    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(SchedulerError::sandbox(format!(
                    "cwd '{cwd}' may not contain '..'"
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(SchedulerError::sandbox(format!(
                    "cwd '{cwd}' must be relative to work_dir"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }
    Ok(())
}

/// Joins a validated relative cwd onto the sandbox root, creating it if absent.
pub fn resolve_under(work_dir: &Path, cwd: &str) -> Result<std::path::PathBuf> {
    validate_relative_cwd(cwd)?;
    let resolved = if cwd.is_empty() {
        work_dir.to_path_buf()
    } else {
        work_dir.join(cwd)
    };
    std::fs::create_dir_all(&resolved)
        .map_err(|e| SchedulerError::sandbox(format!("could not create '{cwd}': {e}")))?;
    Ok(resolved)
}

/// Sanitizes an arbitrary name (e.g. a workflow name) into a directory-safe
/// token: alphanumerics and `_`/`-` survive, everything else becomes `_`.
pub fn sanitize_token(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "_".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_relative_paths() {
        assert!(validate_relative_cwd("reports/nightly").is_ok());
        assert!(validate_relative_cwd("").is_ok());
    }

    #[test]
    fn rejects_parent_and_absolute() {
        assert!(validate_relative_cwd("../escape").is_err());
        assert!(validate_relative_cwd("/etc").is_err());
        assert!(validate_relative_cwd("nested/../../escape").is_err());
    }

    #[test]
    fn sanitizes_tokens() {
        assert_eq!(sanitize_token("My Workflow!"), "My_Workflow_");
        assert_eq!(sanitize_token(""), "_");
    }
}
