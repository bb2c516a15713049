use chrono::NaiveDate;

use crate::calendar::{class_slots, month_grid, ClassSlot, MonthGrid};
use crate::completion::CompletionStore;
use crate::dates::{days_remaining, format_key, DateRange, DisplayedMonth};
use crate::error::AppResult;
use crate::remaining::{RemainingCounter, RemainingSummary};
use crate::storage::KeyValueStore;
use crate::timetable::{Period, Timetable};

/// Published after every completion toggle, once the new state is persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotice {
    pub date: NaiveDate,
    pub period: Period,
    pub completed: bool,
    pub summary: RemainingSummary,
}

pub type Subscriber = Box<dyn Fn(&ChangeNotice) + Send>;

/// Owns all mutable widget state: completion flags, the selected range and
/// the displayed month. Every mutation goes through here.
pub struct CalendarSession {
    timetable: Timetable,
    completions: CompletionStore,
    backend: Box<dyn KeyValueStore>,
    range: DateRange,
    shown: DisplayedMonth,
    subscribers: Vec<Subscriber>,
}

impl CalendarSession {
    /// Restore completion flags from `backend`; a missing or corrupt record starts empty
    pub fn open(timetable: Timetable, backend: Box<dyn KeyValueStore>, range: DateRange, today: NaiveDate) -> Self {
        let completions = CompletionStore::load(&*backend);
        if completions.is_empty() {
            tracing::info!("no completed classes recorded yet");
        }
        Self {
            timetable,
            completions,
            backend,
            range,
            shown: DisplayedMonth::containing(today),
            subscribers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, subscriber: Subscriber) {
        self.subscribers.push(subscriber);
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn set_range(&mut self, range: DateRange) {
        if range.is_inverted() {
            tracing::debug!("range {} .. {} is inverted, counts will be zero", format_key(range.start), format_key(range.end));
        }
        self.range = range;
    }

    pub fn shown(&self) -> DisplayedMonth {
        self.shown
    }

    pub fn show_month(&mut self, shown: DisplayedMonth) {
        self.shown = shown;
    }

    /// Step back one month. At the edge of the date range the view stays put.
    pub fn prev_month(&mut self) -> AppResult<DisplayedMonth> {
        self.shown = self.shown.prev()?;
        Ok(self.shown)
    }

    pub fn next_month(&mut self) -> AppResult<DisplayedMonth> {
        self.shown = self.shown.next()?;
        Ok(self.shown)
    }

    pub fn summary(&self, today: NaiveDate) -> RemainingSummary {
        RemainingCounter::new(&self.timetable, &self.completions).summary(today, &self.range)
    }

    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        days_remaining(self.range.end, today)
    }

    pub fn grid(&self, today: NaiveDate) -> AppResult<MonthGrid> {
        self.grid_for(self.shown, today)
    }

    /// Grid of any month, leaving the displayed month alone
    pub fn grid_for(&self, shown: DisplayedMonth, today: NaiveDate) -> AppResult<MonthGrid> {
        month_grid(&self.timetable, &self.completions, shown, today)
    }

    pub fn classes_on(&self, date: NaiveDate) -> Vec<ClassSlot> {
        class_slots(&self.timetable, &self.completions, date)
    }

    /// Flip one slot, persist the whole record and notify subscribers.
    /// If persisting fails the flip is rolled back.
    pub fn toggle(&mut self, date: NaiveDate, period: Period, today: NaiveDate) -> AppResult<ChangeNotice> {
        let completed = self.completions.toggle(date, period);

        if let Err(e) = self.completions.save(&mut *self.backend) {
            self.completions.toggle(date, period);
            return Err(e);
        }

        let notice = ChangeNotice {
            date,
            period,
            completed,
            summary: self.summary(today),
        };
        tracing::info!(
            "{} period {} marked {}",
            format_key(date),
            period,
            if completed { "done" } else { "not done" }
        );

        for subscriber in &self.subscribers {
            subscriber(&notice);
        }

        Ok(notice)
    }
}
