use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Offset applied to the UTC clock to decide what "today" is (KST)
pub const UTC_OFFSET_HOURS: i64 = 9;

const KEY_FORMAT: &str = "%Y-%m-%d";

/// Six Sunday-start weeks
pub const GRID_DAYS: u64 = 42;

/// Date of `now` once shifted by the fixed offset. Time of day is dropped.
pub fn today_shifted(now: DateTime<Utc>) -> NaiveDate {
    (now + Duration::hours(UTC_OFFSET_HOURS)).date_naive()
}

/// Today according to the wall clock, shifted to UTC+9
pub fn now_shifted() -> NaiveDate {
    today_shifted(Utc::now())
}

pub fn day_of_week(date: NaiveDate) -> Weekday {
    date.weekday()
}

/// Whole days from `today` to `target`. Negative once the target has passed.
pub fn days_remaining(target: NaiveDate, today: NaiveDate) -> i64 {
    (target - today).num_days()
}

/// Canonical zero-padded completion key
pub fn format_key(date: NaiveDate) -> String {
    date.format(KEY_FORMAT).to_string()
}

pub fn parse_key(input: &str) -> AppResult<NaiveDate> {
    let trimmed = input.trim();
    // chrono accepts unpadded fields, keys must be exactly 10 chars
    if trimmed.len() != 10 {
        return Err(AppError::InvalidDate(input.to_string()));
    }
    NaiveDate::parse_from_str(trimmed, KEY_FORMAT).map_err(|_| AppError::InvalidDate(input.to_string()))
}

/// Weeks start on Sunday. Saturates at the first date chrono can represent.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(date.weekday().num_days_from_sunday() as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Saturday of the week. Saturates at the last date chrono can represent.
pub fn end_of_week(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(6 - date.weekday().num_days_from_sunday() as u64))
        .unwrap_or(NaiveDate::MAX)
}

pub fn end_of_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };

    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(first_of_next) => first_of_next.pred_opt().unwrap_or(date),
        // only reachable at the very end of chrono's range
        None => date,
    }
}

/// Every date from `from` to `to`, both inclusive. Empty when `from > to`.
#[cfg(test)]
pub fn days_between(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().take_while(move |d| *d <= to)
}

/// User-selected date range, inclusive on both ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn parse(start: &str, end: &str) -> AppResult<Self> {
        Ok(Self::new(parse_key(start)?, parse_key(end)?))
    }

    /// End before start. Such a range counts nothing.
    pub fn is_inverted(&self) -> bool {
        self.end < self.start
    }
}

/// Month currently shown by the calendar grid.
/// Only months whose whole padded grid fits in chrono's date range can be built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayedMonth {
    pub year: i32,
    pub month: u32,
}

impl DisplayedMonth {
    pub fn new(year: i32, month: u32) -> AppResult<Self> {
        let shown = Self { year, month };
        match shown.grid_start() {
            Some(_) => Ok(shown),
            None => Err(AppError::InvalidMonth(format!("{}-{:02}", year, month))),
        }
    }

    pub fn containing(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// Sunday on or before the 1st, when all `GRID_DAYS` cells from it exist
    pub fn grid_start(&self) -> Option<NaiveDate> {
        let first = self.first_day()?;
        let start = first.checked_sub_days(Days::new(first.weekday().num_days_from_sunday() as u64))?;
        start.checked_add_days(Days::new(GRID_DAYS - 1))?;
        Some(start)
    }

    pub fn prev(&self) -> AppResult<Self> {
        if self.month == 1 {
            Self::new(self.year.saturating_sub(1), 12)
        } else {
            Self::new(self.year, self.month - 1)
        }
    }

    pub fn next(&self) -> AppResult<Self> {
        if self.month == 12 {
            Self::new(self.year.saturating_add(1), 1)
        } else {
            Self::new(self.year, self.month + 1)
        }
    }
}
