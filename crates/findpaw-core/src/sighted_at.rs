//! Helpers for the "when was the dog seen" field.
//!
//! The form edits a wall-clock value in `YYYY-MM-DDTHH:MM` form; rows store an
//! absolute UTC instant. Conversion happens once, at submission time.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::CoreError;

pub const DATETIME_LOCAL_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Current local wall-clock time truncated to the minute.
#[must_use]
pub fn now_local() -> NaiveDateTime {
    let now = Local::now().naive_local();
    now.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(now)
}

/// Parses a `YYYY-MM-DDTHH:MM` value.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDateTime`] if the value does not match the format.
pub fn parse_datetime_local(value: &str) -> Result<NaiveDateTime, CoreError> {
    NaiveDateTime::parse_from_str(value.trim(), DATETIME_LOCAL_FORMAT)
        .map_err(|_| CoreError::InvalidDateTime(value.to_string()))
}

/// Joins separate date (`YYYY-MM-DD`) and time (`HH:MM`) inputs.
///
/// Either part left blank yields the current local time.
///
/// # Errors
///
/// Returns [`CoreError::InvalidDateTime`] if the combined value does not parse.
pub fn combine_date_time(date: &str, time: &str) -> Result<NaiveDateTime, CoreError> {
    if date.trim().is_empty() || time.trim().is_empty() {
        return Ok(now_local());
    }
    parse_datetime_local(&format!("{}T{}", date.trim(), time.trim()))
}

/// Resolves a wall-clock value in `tz` to a UTC instant.
///
/// When a DST fold makes the value ambiguous the earlier instant wins.
///
/// # Errors
///
/// Returns [`CoreError::AmbiguousLocalTime`] when the value falls in a DST gap.
pub fn to_utc_instant<Tz: TimeZone>(
    local: NaiveDateTime,
    tz: &Tz,
) -> Result<DateTime<Utc>, CoreError> {
    tz.from_local_datetime(&local)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| CoreError::AmbiguousLocalTime(local.to_string()))
}

/// Rejects sighting times later than `now`.
///
/// # Errors
///
/// Returns [`CoreError::SightedAtInFuture`] if `instant > now`.
pub fn ensure_not_future(instant: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), CoreError> {
    if instant > now {
        return Err(CoreError::SightedAtInFuture(instant.to_rfc3339()));
    }
    Ok(())
}

/// Human label relative to `today`: `"Today 14:30"`, `"Yesterday 09:05"`,
/// otherwise `"2024-01-01 14:30"`.
#[must_use]
pub fn format_for_display(value: NaiveDateTime, today: NaiveDate) -> String {
    let time = value.format("%H:%M");
    format!("{} {time}", format_date_for_display(value.date(), today))
}

/// Date-only variant of [`format_for_display`].
#[must_use]
pub fn format_date_for_display(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        "Today".to_string()
    } else if today.pred_opt() == Some(date) {
        "Yesterday".to_string()
    } else {
        date.format("%Y-%m-%d").to_string()
    }
}
