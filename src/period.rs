//! Date-period presets and the calendar arithmetic behind range filtering.
//!
//! Transactions are stored with Unix epoch millisecond timestamps, so every
//! preset resolves to an inclusive [DateRange] of local calendar days and
//! from there to a [TimeWindow] in milliseconds: the window starts at local
//! midnight of the first day and ends one millisecond before the midnight
//! following the last day.

use serde::Deserialize;
use time::{Date, Duration, Month, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// A Unix epoch timestamp in milliseconds.
pub type TimestampMillis = i64;

/// A named date-range granularity for filtering and analytics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Period {
    /// The single current day.
    Today,
    /// Monday through Sunday of one week.
    Week,
    /// A whole calendar month.
    Month,
    /// A whole calendar year.
    Year,
    /// A user-supplied start and end date.
    Custom,
}

impl Period {
    /// Every period preset, in the order the UI displays them.
    pub const ALL: [Period; 5] = [
        Period::Today,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::Custom,
    ];

    /// The value used for this preset in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }

    /// The label shown on the period selection chips.
    pub fn label(self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "Week",
            Self::Month => "Month",
            Self::Year => "Year",
            Self::Custom => "Custom",
        }
    }
}

/// An inclusive range of local calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    /// The first day of the range.
    pub start: Date,
    /// The last day of the range.
    pub end: Date,
}

/// An inclusive range of epoch millisecond timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Local midnight of the first day, in epoch milliseconds.
    pub start: TimestampMillis,
    /// One millisecond before the midnight following the last day.
    pub end: TimestampMillis,
}

/// Get the current UTC offset for a canonical timezone name, e.g. "Pacific/Auckland".
pub fn local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// Get the current date in the given canonical timezone.
///
/// # Errors
/// Returns an [Error::InvalidTimezoneError] if `local_timezone` is not a
/// canonical timezone name.
pub fn current_local_date(local_timezone: &str) -> Result<Date, Error> {
    let Some(offset) = local_offset(local_timezone) else {
        tracing::error!("Invalid timezone {}", local_timezone);
        return Err(Error::InvalidTimezoneError(local_timezone.to_owned()));
    };

    Ok(OffsetDateTime::now_utc().to_offset(offset).date())
}

/// Compute the date range for a preset containing `anchor_date`.
///
/// Returns `None` for [Period::Custom]: custom ranges are user supplied and
/// never computed.
pub fn preset_range(period: Period, anchor_date: Date) -> Option<DateRange> {
    match period {
        Period::Today => Some(DateRange {
            start: anchor_date,
            end: anchor_date,
        }),
        Period::Week => Some(week_bounds(anchor_date)),
        Period::Month => Some(month_bounds(anchor_date.year(), anchor_date.month())),
        Period::Year => Some(year_bounds(anchor_date.year())),
        Period::Custom => None,
    }
}

/// Compute the range one period before `range`.
///
/// Today and custom ranges are fixed points: adjacent-period navigation only
/// applies to week, month and year granularities.
pub fn previous_range(period: Period, range: DateRange) -> DateRange {
    match period {
        Period::Today | Period::Custom => range,
        Period::Week => week_bounds(range.start - Duration::days(7)),
        Period::Month => {
            let (year, month) = previous_month(range.start.year(), range.start.month());
            month_bounds(year, month)
        }
        Period::Year => year_bounds(range.start.year() - 1),
    }
}

/// Compute the range one period after `range`.
///
/// Today and custom ranges are fixed points, as for [previous_range].
pub fn next_range(period: Period, range: DateRange) -> DateRange {
    match period {
        Period::Today | Period::Custom => range,
        Period::Week => week_bounds(range.start + Duration::days(7)),
        Period::Month => {
            let (year, month) = next_month(range.start.year(), range.start.month());
            month_bounds(year, month)
        }
        Period::Year => year_bounds(range.start.year() + 1),
    }
}

/// Whether forward navigation from `range` is allowed.
///
/// Forward navigation stops at the period containing `today`, so the next
/// range can never extend past the present period. Today and custom ranges
/// never navigate forwards.
pub fn is_next_enabled(period: Period, range: DateRange, today: Date) -> bool {
    match period {
        Period::Today | Period::Custom => false,
        Period::Week => range.end < week_bounds(today).end,
        Period::Month => range.end < month_bounds(today.year(), today.month()).end,
        Period::Year => range.end < year_bounds(today.year()).end,
    }
}

/// Convert a date range into an inclusive epoch millisecond window.
pub fn window(range: DateRange, offset: UtcOffset) -> TimeWindow {
    TimeWindow {
        start: start_of_day_millis(range.start, offset),
        end: end_of_day_millis(range.end, offset),
    }
}

/// The epoch millisecond timestamp of local midnight on `date`.
pub fn start_of_day_millis(date: Date, offset: UtcOffset) -> TimestampMillis {
    date.midnight().assume_offset(offset).unix_timestamp() * 1_000
}

/// The last epoch millisecond of `date`: one millisecond before the next
/// day's midnight.
pub fn end_of_day_millis(date: Date, offset: UtcOffset) -> TimestampMillis {
    start_of_day_millis(date + Duration::days(1), offset) - 1
}

/// The local calendar date containing an epoch millisecond timestamp.
///
/// # Errors
/// Returns an [Error::InvalidTimestamp] if the timestamp is outside the
/// representable date range.
pub fn date_from_millis(timestamp: TimestampMillis, offset: UtcOffset) -> Result<Date, Error> {
    let date_time = OffsetDateTime::from_unix_timestamp(timestamp.div_euclid(1_000))
        .map_err(|_| Error::InvalidTimestamp(timestamp))?;

    Ok(date_time.to_offset(offset).date())
}

/// A human readable label for the active range, e.g. "3 Aug - 9 Aug" for a
/// week or "August 2026" for a month.
pub fn range_label(period: Period, range: DateRange) -> String {
    match period {
        Period::Today => format_date_label(range.start),
        Period::Week => format!(
            "{} {} - {} {}",
            range.start.day(),
            month_abbrev(range.start.month()),
            range.end.day(),
            month_abbrev(range.end.month()),
        ),
        Period::Month => format!("{} {}", month_name(range.start.month()), range.start.year()),
        Period::Year => range.start.year().to_string(),
        Period::Custom => format!(
            "{} - {}",
            format_date_label(range.start),
            format_date_label(range.end)
        ),
    }
}

fn week_bounds(anchor_date: Date) -> DateRange {
    let weekday_number = anchor_date.weekday().number_from_monday() as i64;
    let start = anchor_date - Duration::days(weekday_number - 1);
    let end = start + Duration::days(6);

    DateRange { start, end }
}

fn month_bounds(year: i32, month: Month) -> DateRange {
    let start = Date::from_calendar_date(year, month, 1).expect("invalid month start date");
    let end = Date::from_calendar_date(year, month, last_day_of_month(year, month))
        .expect("invalid month end date");

    DateRange { start, end }
}

fn year_bounds(year: i32) -> DateRange {
    DateRange {
        start: Date::from_calendar_date(year, Month::January, 1).expect("invalid year start date"),
        end: Date::from_calendar_date(year, Month::December, 31).expect("invalid year end date"),
    }
}

fn previous_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::January => (year - 1, Month::December),
        month => (year, month.previous()),
    }
}

fn next_month(year: i32, month: Month) -> (i32, Month) {
    match month {
        Month::December => (year + 1, Month::January),
        month => (year, month.next()),
    }
}

fn last_day_of_month(year: i32, month: Month) -> u8 {
    match month {
        Month::January
        | Month::March
        | Month::May
        | Month::July
        | Month::August
        | Month::October
        | Month::December => 31,
        Month::April | Month::June | Month::September | Month::November => 30,
        Month::February => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
    }
}

fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

/// Format a date as e.g. "5 Aug 2026".
pub(crate) fn format_date_label(date: Date) -> String {
    format!(
        "{} {} {}",
        date.day(),
        month_abbrev(date.month()),
        date.year()
    )
}

fn month_abbrev(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

fn month_name(month: Month) -> &'static str {
    match month {
        Month::January => "January",
        Month::February => "February",
        Month::March => "March",
        Month::April => "April",
        Month::May => "May",
        Month::June => "June",
        Month::July => "July",
        Month::August => "August",
        Month::September => "September",
        Month::October => "October",
        Month::November => "November",
        Month::December => "December",
    }
}
