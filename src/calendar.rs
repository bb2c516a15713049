use chrono::{Datelike, Days, NaiveDate};
use serde::Serialize;

use crate::completion::CompletionStore;
use crate::dates::{format_key, DisplayedMonth, GRID_DAYS};
use crate::error::{AppError, AppResult};
use crate::schedule::{classes_for, ScheduledClass};
use crate::timetable::{ClassLabel, Period, Timetable};

pub const GRID_CELLS: usize = GRID_DAYS as usize;

/// Shown instead of the day number for dates before today
pub const PASSED_MARKER: &str = "X";

#[derive(Debug, Clone, Serialize)]
pub struct ClassSlot {
    pub period: Period,
    pub class: ClassLabel,
    pub label: String,
    pub completed: bool,
}

impl ClassSlot {
    pub fn new(scheduled: &ScheduledClass, completed: bool) -> Self {
        Self {
            period: scheduled.period,
            class: scheduled.class,
            label: format!("period {} {}", scheduled.period, scheduled.class),
            completed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GridCell {
    pub date: String,
    /// Day number, or the passed-day marker
    pub label: String,
    pub in_month: bool,
    pub is_today: bool,
    pub passed: bool,
    pub classes: Vec<ClassSlot>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub title: String,
    pub cells: Vec<GridCell>,
}

/// Classes on `date` joined with their completion flags
pub fn class_slots(timetable: &Timetable, completions: &CompletionStore, date: NaiveDate) -> Vec<ClassSlot> {
    classes_for(timetable, date)
        .iter()
        .map(|scheduled| ClassSlot::new(scheduled, completions.is_completed(date, scheduled.period)))
        .collect()
}

/// Build the 42-cell grid for `shown`, padded with the neighbouring months.
/// Fails for months at the very edge of chrono's date range.
pub fn month_grid(
    timetable: &Timetable,
    completions: &CompletionStore,
    shown: DisplayedMonth,
    today: NaiveDate,
) -> AppResult<MonthGrid> {
    let out_of_range = || AppError::InvalidMonth(format!("{}-{:02}", shown.year, shown.month));
    let grid_start = shown.grid_start().ok_or_else(out_of_range)?;

    let mut cells = Vec::with_capacity(GRID_CELLS);
    for offset in 0..GRID_DAYS {
        let date = grid_start.checked_add_days(Days::new(offset)).ok_or_else(out_of_range)?;
        let passed = date < today;

        cells.push(GridCell {
            date: format_key(date),
            label: if passed {
                PASSED_MARKER.to_string()
            } else {
                date.day().to_string()
            },
            in_month: date.month() == shown.month && date.year() == shown.year,
            is_today: date == today,
            passed,
            classes: class_slots(timetable, completions, date),
        });
    }

    Ok(MonthGrid {
        year: shown.year,
        month: shown.month,
        title: format!("{}-{:02}", shown.year, shown.month),
        cells,
    })
}
