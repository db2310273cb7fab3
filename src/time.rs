//! Date and time-of-day parsing for source export cells.
//!
//! Cells arrive as strings. The expression builders here turn them into
//! typed columns, with null wherever a cell does not parse.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};
use polars::datatypes::TimeUnit;
use polars::prelude::*;

const UNIX_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1970, 1, 1) {
    Some(d) => d,
    None => panic!("invalid epoch"),
};

// Excel serial day 0.
const EXCEL_EPOCH: NaiveDate = match NaiveDate::from_ymd_opt(1899, 12, 30) {
    Some(d) => d,
    None => panic!("invalid excel epoch"),
};

/// Largest whole number an f64 represents exactly (2^53).
pub const MAX_WHOLE_NUMBER: f64 = 9_007_199_254_740_992.0;

const WHITESPACE: &str = " \t\r\n";

const SECONDS_PER_DAY: i64 = 86_400;
const MICROS_PER_SECOND: i64 = 1_000_000;
const NANOS_PER_SECOND: i64 = 1_000_000_000;

fn lenient(format: &str) -> StrptimeOptions {
    StrptimeOptions {
        format: Some(format.into()),
        strict: false,
        ..Default::default()
    }
}

/// Trimmed string, with empty cells as null.
pub fn trimmed(e: Expr) -> Expr {
    let stripped = e.str().strip_chars(lit(WHITESPACE));
    when(stripped.clone().eq(lit("")))
        .then(lit(NULL).cast(DataType::String))
        .otherwise(stripped)
}

/// `YYYY-MM-DD`, also accepting a trailing `HH:MM:SS`.
pub fn date_expr(e: Expr) -> Expr {
    let e = trimmed(e);
    coalesce(&[
        e.clone().str().to_date(lenient("%Y-%m-%d")),
        e.str()
            .to_datetime(
                Some(TimeUnit::Microseconds),
                None,
                lenient("%Y-%m-%d %H:%M:%S"),
                lit("raise"),
            )
            .cast(DataType::Date),
    ])
}

/// Whole number in `0..=max`, accepting integral floats such as `"9.0"`.
///
/// Anything else (fractions, negatives, text, values past `max`) is null.
pub fn whole_number(e: Expr, max: f64) -> Expr {
    let value = trimmed(e).cast(DataType::Float64);
    when(
        value
            .clone()
            .eq(value.clone().floor())
            .and(value.clone().gt_eq(lit(0.0)))
            .and(value.clone().lt_eq(lit(max))),
    )
    .then(value.cast(DataType::Int64))
    .otherwise(lit(NULL).cast(DataType::Int64))
}

/// Second of day from separate hour and minute cells.
pub fn hour_minute_seconds(hour: Expr, minute: Expr) -> Expr {
    let hour = whole_number(hour, 23.0);
    let minute = whole_number(minute, 59.0);
    (hour * lit(3600i64) + minute * lit(60i64)).cast(DataType::Int32)
}

/// Second of day from a `HH:MM:SS` or `HH:MM` cell.
pub fn clock_seconds(e: Expr) -> Expr {
    let e = trimmed(e);
    coalesce(&[
        e.clone().str().to_time(lenient("%H:%M:%S")),
        e.str().to_time(lenient("%H:%M")),
    ])
    .cast(DataType::Int64)
    .floor_div(lit(NANOS_PER_SECOND))
    .cast(DataType::Int32)
}

/// Monday of the week of a date column.
pub fn week_start_expr(date: Expr) -> Expr {
    let offset = date.clone().dt().weekday().cast(DataType::Int32) - lit(1i32);
    (date.cast(DataType::Int32) - offset).cast(DataType::Date)
}

/// Naive local timestamp from a date column and its second of day.
pub fn timestamp_expr(date: Expr, second_of_day: Expr) -> Expr {
    (date.cast(DataType::Int64) * lit(SECONDS_PER_DAY * MICROS_PER_SECOND)
        + second_of_day.cast(DataType::Int64) * lit(MICROS_PER_SECOND))
    .cast(DataType::Datetime(TimeUnit::Microseconds, None))
}

/// Parse a `HH:MM:SS` or `HH:MM` value.
pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M"))
        .ok()
}

pub fn days_since_epoch(date: NaiveDate) -> i32 {
    date.signed_duration_since(UNIX_EPOCH).num_days() as i32
}

pub fn from_days_since_epoch(days: i32) -> NaiveDate {
    UNIX_EPOCH + Duration::days(days as i64)
}

/// Convert an Excel serial date (days since 1899-12-30, fractional time).
///
/// Serials outside chrono's date range give `None`.
pub fn from_excel_serial(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial.abs() > i32::MAX as f64 {
        return None;
    }
    let days = Duration::try_days(serial.trunc() as i64)?;
    let seconds = Duration::try_seconds(((serial - serial.trunc()) * 86_400.0).round() as i64)?;
    EXCEL_EPOCH
        .checked_add_signed(days)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(seconds)
}
