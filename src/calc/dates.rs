use chrono::{Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fmt::Write;

/// A calendar month. The grid builder and month navigation work in these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(YearMonth { year, month })
        } else {
            None
        }
    }

    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses `YYYY-MM`.
    pub fn parse(s: &str) -> Option<Self> {
        let (y, m) = s.trim().split_once('-')?;
        YearMonth::new(y.parse().ok()?, m.parse().ok()?)
    }

    pub fn first_day(self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    pub fn last_day(self) -> NaiveDate {
        self.first_day() + Duration::days(self.days() as i64 - 1)
    }

    pub fn days(self) -> u32 {
        days_in_month(self.year, self.month)
    }

    /// `None` when the month count overflows.
    pub fn checked_add(self, months: i32) -> Option<Self> {
        let total = self
            .year
            .checked_mul(12)?
            .checked_add(self.month as i32 - 1)?
            .checked_add(months)?;
        Some(YearMonth {
            year: total.div_euclid(12),
            month: (total.rem_euclid(12) + 1) as u32,
        })
    }

    pub fn add(self, months: i32) -> Self {
        self.checked_add(months).unwrap_or(self)
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    match (
        NaiveDate::from_ymd_opt(year, month, 1),
        NaiveDate::from_ymd_opt(next_year, next_month, 1),
    ) {
        (Some(first), Some(next)) => next.signed_duration_since(first).num_days() as u32,
        _ => 30,
    }
}

/// Moves `date` by whole months, clamping the day to the target month's length.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    checked_add_months(date, months).unwrap_or(date)
}

/// Like [`add_months`], but `None` when the result leaves chrono's range.
pub fn checked_add_months(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let target = YearMonth::of(date).checked_add(months)?;
    let day = date.day().min(target.days());
    NaiveDate::from_ymd_opt(target.year, target.month, day)
}

pub fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // wraps to 23:59:59.999
    date.and_time(NaiveTime::MIN - Duration::milliseconds(1))
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Column (0-6) of `day` in a week that starts on `first_day`.
pub fn weekday_index(day: Weekday, first_day: Weekday) -> u32 {
    let first = first_day.num_days_from_sunday();
    (day.num_days_from_sunday() + 7 - first) % 7
}

/// Week of the year for a week starting on `first_day`, where week 1 is the
/// week containing January 1st.
pub fn locale_week_number(date: NaiveDate, first_day: Weekday) -> u32 {
    let week_start = date - Duration::days(weekday_index(date.weekday(), first_day) as i64);
    let year = (week_start + Duration::days(6)).year();
    let jan1 = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or(week_start);
    let first_week_start = jan1 - Duration::days(weekday_index(jan1.weekday(), first_day) as i64);
    ((week_start - first_week_start).num_days() / 7) as u32 + 1
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rounding {
    Nearest,
    Floor,
}

/// Snaps the minute field to a multiple of `increment`. A rounded value of
/// 60 carries into the next hour. Seconds are left alone.
pub fn snap_minutes(dt: NaiveDateTime, increment: u32, rounding: Rounding) -> NaiveDateTime {
    if increment <= 1 {
        return dt;
    }
    let minute = dt.minute();
    let snapped = match rounding {
        Rounding::Nearest => (minute as f64 / increment as f64).round() as u32 * increment,
        Rounding::Floor => minute / increment * increment,
    };
    dt + Duration::minutes(snapped as i64 - minute as i64)
}

/// A duration expressed in calendar units, like `{days: 7}` or `{months: 1}`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Span {
    pub years: u32,
    pub months: u32,
    pub weeks: u32,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl Span {
    pub fn days(days: u32) -> Self {
        Span {
            days,
            ..Span::default()
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Span::default()
    }

    /// Adds the span, saturating at `NaiveDateTime::MAX`.
    pub fn add_to(&self, dt: NaiveDateTime) -> NaiveDateTime {
        self.checked_add_to(dt).unwrap_or(NaiveDateTime::MAX)
    }

    pub fn checked_add_to(&self, dt: NaiveDateTime) -> Option<NaiveDateTime> {
        let months = self.years.checked_mul(12)?.checked_add(self.months)?;
        let shifted = dt.checked_add_months(Months::new(months))?;
        [
            Duration::try_weeks(self.weeks as i64)?,
            Duration::try_days(self.days as i64)?,
            Duration::try_hours(self.hours as i64)?,
            Duration::try_minutes(self.minutes as i64)?,
            Duration::try_seconds(self.seconds as i64)?,
        ]
        .into_iter()
        .try_fold(shifted, |acc, step| acc.checked_add_signed(step))
    }

    /// True when the span fits inside chrono's calendar from its first day.
    pub fn is_representable(&self) -> bool {
        self.checked_add_to(start_of_day(NaiveDate::MIN)).is_some()
    }
}

/// How precisely two instants must agree to count as the same selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Minute,
    Second,
}

impl Granularity {
    pub fn truncate(self, dt: NaiveDateTime) -> NaiveDateTime {
        match self {
            Granularity::Day => start_of_day(dt.date()),
            Granularity::Minute => dt
                .with_second(0)
                .and_then(|d| d.with_nanosecond(0))
                .unwrap_or(dt),
            Granularity::Second => dt.with_nanosecond(0).unwrap_or(dt),
        }
    }

    pub fn same(self, a: NaiveDateTime, b: NaiveDateTime) -> bool {
        self.truncate(a) == self.truncate(b)
    }
}

/// Parses `text` with a chrono format string. Falls back to ISO 8601 date
/// and date-time forms. Date-only results land at midnight.
pub fn parse_date_time(text: &str, format: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, format).ok().map(start_of_day))
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S").ok())
        .or_else(|| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M").ok())
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok().map(start_of_day))
}

/// Formats with a user-supplied chrono format string. A format chrono cannot
/// render falls back to ISO dates instead of panicking.
pub fn format_date_time(dt: NaiveDateTime, format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", dt.format(format)).is_err() {
        return dt.format("%Y-%m-%d").to_string();
    }
    out
}

pub fn weekday_from_index(index: u32) -> Weekday {
    match index % 7 {
        0 => Weekday::Sun,
        1 => Weekday::Mon,
        2 => Weekday::Tue,
        3 => Weekday::Wed,
        4 => Weekday::Thu,
        5 => Weekday::Fri,
        _ => Weekday::Sat,
    }
}

pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "Jan",
        2 => "Feb",
        3 => "Mar",
        4 => "Apr",
        5 => "May",
        6 => "Jun",
        7 => "Jul",
        8 => "Aug",
        9 => "Sep",
        10 => "Oct",
        11 => "Nov",
        12 => "Dec",
        _ => "Unknown",
    }
}
