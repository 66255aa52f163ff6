// Date (one-shot) trigger evaluation.

use chrono::{DateTime, Utc};

/// `run_at` if it is strictly after `after`, else `None`. Once fired, a date
/// trigger's entry is removed by the scheduling engine rather than re-queried.
pub fn next_fire_time(run_at: DateTime<Utc>, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
    (run_at > after).then_some(run_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn future_run_at_fires() {
        let now = Utc::now();
        let run_at = now + Duration::seconds(5);
        assert_eq!(next_fire_time(run_at, now), Some(run_at));
    }

    #[test]
    fn past_run_at_never_fires_again() {
        let now = Utc::now();
        let run_at = now - Duration::seconds(5);
        assert_eq!(next_fire_time(run_at, now), None);
    }
}
