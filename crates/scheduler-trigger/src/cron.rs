// Cron trigger evaluation: smallest instant strictly greater than `after`
// that satisfies all eight fields, in the trigger's timezone.
//
// day and day_of_week are intersected (both must match when both are
// non-wildcard); the second field is evaluated last, after everything else
// has settled. DST: times that don't exist are skipped forward one second
// at a time until a representable instant is found; times that occur twice
// fire on the first occurrence.
//
// day_of_week follows chrono's Monday=0 convention (APScheduler, which this
// evaluator's semantics are drawn from, uses the same numbering).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;
use scheduler_core::{CronFields, SchedulerError};

use crate::field::FieldMatcher;

const MAX_CASCADES: u32 = 100_000;
const HORIZON_YEARS: i32 = 50;

pub fn next_fire_time(
    fields: &CronFields,
    tz: Tz,
    after: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SchedulerError> {
    let year_f = FieldMatcher::parse(&fields.year, 1970, 9999)?;
    let month_f = FieldMatcher::parse(&fields.month, 1, 12)?;
    let day_f = FieldMatcher::parse(&fields.day, 1, 31)?;
    let week_f = FieldMatcher::parse(&fields.week, 1, 53)?;
    let dow_f = FieldMatcher::parse(&fields.day_of_week, 0, 6)?;
    let hour_f = FieldMatcher::parse(&fields.hour, 0, 23)?;
    let minute_f = FieldMatcher::parse(&fields.minute, 0, 59)?;
    let second_f = FieldMatcher::parse(&fields.second, 0, 59)?;

    let local_after = after.with_timezone(&tz).naive_local();
    let mut candidate = local_after + Duration::seconds(1);
    let horizon_year = local_after.year() + HORIZON_YEARS;

    for _ in 0..MAX_CASCADES {
        if candidate.year() > horizon_year {
            return Ok(None);
        }

        let year = match year_f.first_in_range(candidate.year() as i64, 9999) {
            Some(y) => y,
            None => return Ok(None),
        };
        if year != candidate.year() as i64 {
            candidate = start_of_year(year)?;
            continue;
        }

        let month = match month_f.first_in_range(candidate.month() as i64, 12) {
            Some(m) => m,
            None => {
                candidate = start_of_year(year + 1)?;
                continue;
            }
        };
        if month != candidate.month() as i64 {
            candidate = start_of_month(year, month)?;
            continue;
        }

        let last_day = days_in_month(year, month);
        let mut found_day = None;
        for day in candidate.day()..=last_day {
            let date = ymd(year, month, day as i64)?;
            let dow = date.weekday().num_days_from_monday() as i64;
            let week = date.iso_week().week() as i64;
            if day_f.matches(day as i64) && dow_f.matches(dow) && week_f.matches(week) {
                found_day = Some(day as i64);
                break;
            }
        }
        let day = match found_day {
            Some(d) => d,
            None => {
                candidate = if month == 12 {
                    start_of_year(year + 1)?
                } else {
                    start_of_month(year, month + 1)?
                };
                continue;
            }
        };
        if day != candidate.day() as i64 {
            candidate = midnight(year, month, day)?;
            continue;
        }

        let hour = match hour_f.first_in_range(candidate.hour() as i64, 23) {
            Some(h) => h,
            None => {
                candidate = advance_day(year, month, day)?;
                continue;
            }
        };
        if hour != candidate.hour() as i64 {
            candidate = at_time(year, month, day, hour, 0, 0)?;
            continue;
        }

        let minute = match minute_f.first_in_range(candidate.minute() as i64, 59) {
            Some(m) => m,
            None => {
                candidate = at_time(year, month, day, hour + 1, 0, 0)
                    .or_else(|_| advance_day(year, month, day))?;
                continue;
            }
        };
        if minute != candidate.minute() as i64 {
            candidate = at_time(year, month, day, hour, minute, 0)?;
            continue;
        }

        let second = match second_f.first_in_range(candidate.second() as i64, 59) {
            Some(s) => s,
            None => {
                candidate = at_time(year, month, day, hour, minute + 1, 0)
                    .or_else(|_| at_time(year, month, day, hour + 1, 0, 0))
                    .or_else(|_| advance_day(year, month, day))?;
                continue;
            }
        };
        if second != candidate.second() as i64 {
            candidate = at_time(year, month, day, hour, minute, second)?;
            continue;
        }

        match tz.from_local_datetime(&candidate) {
            chrono::LocalResult::Single(dt) => return Ok(Some(dt.with_timezone(&Utc))),
            chrono::LocalResult::Ambiguous(earliest, _) => {
                return Ok(Some(earliest.with_timezone(&Utc)))
            }
            chrono::LocalResult::None => {
                candidate += Duration::seconds(1);
                continue;
            }
        }
    }

    Ok(None)
}

fn ymd(year: i64, month: i64, day: i64) -> Result<NaiveDate, SchedulerError> {
    NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .ok_or_else(|| SchedulerError::validation("cron evaluation produced an invalid date"))
}

fn midnight(year: i64, month: i64, day: i64) -> Result<NaiveDateTime, SchedulerError> {
    Ok(ymd(year, month, day)?
        .and_hms_opt(0, 0, 0)
        .expect("00:00:00 is always valid"))
}

fn at_time(
    year: i64,
    month: i64,
    day: i64,
    hour: i64,
    minute: i64,
    second: i64,
) -> Result<NaiveDateTime, SchedulerError> {
    if hour > 23 {
        return Err(SchedulerError::validation("hour rollover"));
    }
    ymd(year, month, day)?
        .and_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or_else(|| SchedulerError::validation("cron evaluation produced an invalid time"))
}

fn start_of_year(year: i64) -> Result<NaiveDateTime, SchedulerError> {
    midnight(year, 1, 1)
}

fn start_of_month(year: i64, month: i64) -> Result<NaiveDateTime, SchedulerError> {
    midnight(year, month, 1)
}

fn advance_day(year: i64, month: i64, day: i64) -> Result<NaiveDateTime, SchedulerError> {
    if day < days_in_month(year, month) as i64 {
        midnight(year, month, day + 1)
    } else if month < 12 {
        start_of_month(year, month + 1)
    } else {
        start_of_year(year + 1)
    }
}

fn days_in_month(year: i64, month: i64) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year as i32, next_month as u32, 1)
        .unwrap()
        .pred_opt()
        .unwrap()
        .day()
}
