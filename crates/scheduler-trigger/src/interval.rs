// Interval trigger evaluation.

use chrono::{DateTime, Utc};
use scheduler_core::{IntervalSpec, SchedulerError};

/// `start_anchor + ceil((after - start_anchor) / period) * period`.
pub fn next_fire_time(
    spec: &IntervalSpec,
    start_anchor: DateTime<Utc>,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    let period = spec.period_seconds();
    if period <= 0 {
        return Err(SchedulerError::validation(
            "interval trigger period must be greater than zero",
        ));
    }

    let elapsed = (after - start_anchor).num_seconds();
    let periods_elapsed = if elapsed <= 0 {
        0
    } else {
        // ceil division on non-negative integers
        (elapsed + period - 1) / period
    };
    // The result must be strictly greater than `after`; if the anchor-aligned
    // instant equals `after` exactly, advance one more period.
    let mut periods = periods_elapsed;
    loop {
        let candidate = start_anchor + chrono::Duration::seconds(periods * period);
        if candidate > after {
            return Ok(Some(candidate));
        }
        periods += 1;
    }
}
