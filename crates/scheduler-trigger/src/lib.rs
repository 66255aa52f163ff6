//! Trigger evaluation (C2): computes the next fire time for a
//! [`scheduler_core::Trigger`] given a reference instant.

mod cron;
mod date;
mod field;
mod interval;

use chrono::{DateTime, Utc};
use scheduler_core::{SchedulerError, Trigger};

/// Smallest instant strictly greater than `after` at which `trigger` fires,
/// or `None` if it will never fire again (exhausted date trigger, or a cron
/// field intersection with no solution within the search horizon).
pub fn next_fire_time(
    trigger: &Trigger,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    match trigger {
        Trigger::Cron { fields, timezone } => cron::next_fire_time(fields, *timezone, after),
        Trigger::Interval {
            spec,
            start_anchor,
            ..
        } => interval::next_fire_time(spec, *start_anchor, after),
        Trigger::Date { run_at, .. } => Ok(date::next_fire_time(*run_at, after)),
    }
}
