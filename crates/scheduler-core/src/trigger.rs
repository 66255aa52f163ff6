// Trigger variants (C2 data model). next_fire_time computation lives in scheduler-trigger,
// which depends on this crate; keeping the types here lets storage and engine share them
// without pulling in the evaluator.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[cfg(feature = "openapi")]
use utoipa::ToSchema;

/// One field of a cron-style trigger. Stored as the raw expression string
/// (`*`, `N`, `N-M`, `*/S`, `N,M`, or comma-separated combinations of those);
/// scheduler-trigger parses and evaluates it.
pub type CronField = String;

/// The eight independent cron fields APScheduler-style triggers expose.
/// Unspecified fields default to the finest-granularity wildcard except
/// `second`, which defaults to `"0"` (fire-on-the-minute).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct CronFields {
    #[serde(default = "wildcard")]
    pub year: CronField,
    #[serde(default = "wildcard")]
    pub month: CronField,
    #[serde(default = "wildcard")]
    pub day: CronField,
    #[serde(default = "wildcard")]
    pub week: CronField,
    #[serde(default = "wildcard")]
    pub day_of_week: CronField,
    #[serde(default = "wildcard")]
    pub hour: CronField,
    #[serde(default = "wildcard")]
    pub minute: CronField,
    #[serde(default = "zero")]
    pub second: CronField,
}

fn wildcard() -> CronField {
    "*".to_string()
}

fn zero() -> CronField {
    "0".to_string()
}

impl Default for CronFields {
    fn default() -> Self {
        CronFields {
            year: wildcard(),
            month: wildcard(),
            day: wildcard(),
            week: wildcard(),
            day_of_week: wildcard(),
            hour: wildcard(),
            minute: wildcard(),
            second: zero(),
        }
    }
}

/// `weeks*7d + days + hours + minutes + seconds`, as whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct IntervalSpec {
    #[serde(default)]
    pub weeks: i64,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub hours: i64,
    #[serde(default)]
    pub minutes: i64,
    #[serde(default)]
    pub seconds: i64,
}

impl IntervalSpec {
    /// Total period in seconds. Zero or negative periods are rejected at validation.
    pub fn period_seconds(&self) -> i64 {
        self.weeks * 7 * 86_400 + self.days * 86_400 + self.hours * 3_600 + self.minutes * 60
            + self.seconds
    }
}

/// A schedulable trigger: tagged union discriminated by `type`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub enum Trigger {
    Cron {
        fields: CronFields,
        timezone: Tz,
    },
    Interval {
        spec: IntervalSpec,
        timezone: Tz,
        /// The instant the interval trigger was created; fire times are anchored here.
        start_anchor: DateTime<Utc>,
    },
    Date {
        run_at: DateTime<Utc>,
        timezone: Tz,
    },
}

impl Trigger {
    pub fn timezone(&self) -> Tz {
        match self {
            Trigger::Cron { timezone, .. } => *timezone,
            Trigger::Interval { timezone, .. } => *timezone,
            Trigger::Date { timezone, .. } => *timezone,
        }
    }

    /// Validates invariants that don't require the full evaluator: a non-zero
    /// interval period. Field-expression syntax is validated by scheduler-trigger.
    pub fn validate(&self) -> Result<(), crate::error::SchedulerError> {
        if let Trigger::Interval { spec, .. } = self {
            if spec.period_seconds() <= 0 {
                return Err(crate::error::SchedulerError::validation(
                    "interval trigger period must be greater than zero",
                ));
            }
        }
        Ok(())
    }
}
