use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::calendar::ClassSlot;
use crate::dates::{format_key, DateRange};
use crate::remaining::RemainingSummary;

/// Range update from the date pickers (`YYYY-MM-DD` each)
#[derive(Debug, Deserialize)]
pub struct RangeInput {
    pub start: String,
    pub end: String,
}

/// Completion toggle for one slot
#[derive(Debug, Deserialize)]
pub struct ToggleInput {
    pub date: String,
    pub period: i64,
}

/// Optional month to look at without moving the displayed month
#[derive(Debug, Deserialize)]
pub struct MonthQuery {
    pub year: Option<i32>,
    pub month: Option<u32>,
}

/// Jump target for the displayed month
#[derive(Debug, Deserialize)]
pub struct MonthInput {
    pub year: i32,
    pub month: u32,
}

/// Days left until the end date, in its three display states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaysRemaining {
    Days(i64),
    Today,
    Ended,
}

impl DaysRemaining {
    pub fn from_days(days: i64) -> Self {
        match days {
            d if d > 0 => DaysRemaining::Days(d),
            0 => DaysRemaining::Today,
            _ => DaysRemaining::Ended,
        }
    }
}

impl fmt::Display for DaysRemaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DaysRemaining::Days(1) => write!(f, "1 day"),
            DaysRemaining::Days(d) => write!(f, "{} days", d),
            DaysRemaining::Today => write!(f, "today"),
            DaysRemaining::Ended => write!(f, "period ended"),
        }
    }
}

pub fn format_periods(count: u32) -> String {
    format!("{} periods", count)
}

#[derive(Debug, Serialize)]
pub struct CountView {
    pub value: u32,
    pub display: String,
}

impl From<u32> for CountView {
    fn from(value: u32) -> Self {
        Self { value, display: format_periods(value) }
    }
}

#[derive(Debug, Serialize)]
pub struct DaysRemainingView {
    pub value: i64,
    pub display: String,
}

/// Everything the header of the widget shows
#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub today: String,
    pub start: String,
    pub end: String,
    pub days_remaining: DaysRemainingView,
    pub total: CountView,
    pub weekly: CountView,
    pub monthly: CountView,
}

impl SummaryView {
    pub fn new(today: NaiveDate, range: &DateRange, days: i64, summary: RemainingSummary) -> Self {
        Self {
            today: format_key(today),
            start: format_key(range.start),
            end: format_key(range.end),
            days_remaining: DaysRemainingView {
                value: days,
                display: DaysRemaining::from_days(days).to_string(),
            },
            total: summary.total.into(),
            weekly: summary.weekly.into(),
            monthly: summary.monthly.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DayClassesView {
    pub date: String,
    pub classes: Vec<ClassSlot>,
}

#[derive(Debug, Serialize)]
pub struct ToggleView {
    pub date: String,
    pub period: u8,
    pub completed: bool,
    pub summary: SummaryView,
}

/// API Response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self { status: "success".to_string(), data }
    }
}
