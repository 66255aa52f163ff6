// Id validation shared by job and workflow definitions

use crate::error::SchedulerError;

/// Characters allowed in a job id: URL-safe, matches `[A-Za-z0-9_-]+`.
pub fn is_url_safe_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

pub fn validate_job_id(id: &str) -> Result<(), SchedulerError> {
    if is_url_safe_id(id) {
        Ok(())
    } else {
        Err(SchedulerError::validation(format!(
            "job id '{id}' must be non-empty and match [A-Za-z0-9_-]+"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_url_safe_ids() {
        assert!(is_url_safe_id("nightly-backup_v2"));
        assert!(validate_job_id("job-1").is_ok());
    }

    #[test]
    fn rejects_empty_and_unsafe_ids() {
        assert!(!is_url_safe_id(""));
        assert!(!is_url_safe_id("job/with/slash"));
        assert!(!is_url_safe_id("job with space"));
        assert!(validate_job_id("../etc").is_err());
    }
}
