// Retry bookkeeping (C3). Per the design notes, retry metadata threaded through
// task kwargs in the source becomes an explicit struct carried by the schedule
// entry rather than a user-visible parameter.

use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

pub const MAX_RETRIES: u32 = 3;
pub const RETRY_DELAY_SECONDS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct RetryContext {
    pub retry_count: u32,
}

impl RetryContext {
    pub fn has_attempts_remaining(&self) -> bool {
        self.retry_count < MAX_RETRIES
    }

    pub fn next_attempt(&self) -> RetryContext {
        RetryContext {
            retry_count: self.retry_count + 1,
        }
    }

    /// The entry id a retry of `original_id` is scheduled under.
    pub fn retry_entry_id(original_id: &str, attempt: u32) -> String {
        format!("{original_id}_retry_{attempt}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stops_after_max_retries() {
        let ctx = RetryContext { retry_count: 3 };
        assert!(!ctx.has_attempts_remaining());
    }

    #[test]
    fn builds_retry_entry_id() {
        assert_eq!(RetryContext::retry_entry_id("job2", 1), "job2_retry_1");
    }
}
