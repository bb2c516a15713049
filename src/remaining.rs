use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::completion::CompletionStore;
use crate::dates::{end_of_month, end_of_week, DateRange};
use crate::timetable::Timetable;

/// Remaining-class counts over the three windows anchored at today
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RemainingSummary {
    pub total: u32,
    pub weekly: u32,
    pub monthly: u32,
}

/// Counts scheduled classes that are not marked complete yet.
/// Derived on demand from the timetable and the completion flags, nothing is cached.
pub struct RemainingCounter<'a> {
    timetable: &'a Timetable,
    completions: &'a CompletionStore,
}

impl<'a> RemainingCounter<'a> {
    pub fn new(timetable: &'a Timetable, completions: &'a CompletionStore) -> Self {
        Self { timetable, completions }
    }

    /// Incomplete classes from `from` to `to`, both inclusive.
    /// A window whose start lies after its end is empty and counts 0.
    /// Scheduled classes are counted per whole week, so the cost does not
    /// grow with the length of the window.
    pub fn count_incomplete(&self, from: NaiveDate, to: NaiveDate) -> u32 {
        if from > to {
            return 0;
        }

        let scheduled = self.scheduled(from, to);
        let completed = self
            .completions
            .completed_slots()
            .filter(|(day, period)| {
                (from..=to).contains(day) && self.timetable.lookup(day.weekday(), *period).is_some()
            })
            .count() as u64;

        u32::try_from(scheduled.saturating_sub(completed)).unwrap_or(u32::MAX)
    }

    /// Classes the timetable holds from `from` to `to`, both inclusive
    fn scheduled(&self, from: NaiveDate, to: NaiveDate) -> u64 {
        let days = (to - from).num_days() as u64 + 1;
        let mut total = days / 7 * self.timetable.weekly_total();

        let mut weekday = from.weekday();
        for _ in 0..days % 7 {
            total += self.timetable.classes_on(weekday);
            weekday = weekday.succ();
        }
        total
    }

    /// Everything left between today and the end of the range
    pub fn total(&self, today: NaiveDate, end: NaiveDate) -> u32 {
        self.count_incomplete(today, end)
    }

    /// What is left of the current Sunday-Saturday week
    pub fn weekly(&self, today: NaiveDate, end: NaiveDate) -> u32 {
        self.count_incomplete(today, end_of_week(today).min(end))
    }

    /// What is left of the current calendar month
    pub fn monthly(&self, today: NaiveDate, end: NaiveDate) -> u32 {
        self.count_incomplete(today, end_of_month(today).min(end))
    }

    pub fn summary(&self, today: NaiveDate, range: &DateRange) -> RemainingSummary {
        if range.is_inverted() {
            return RemainingSummary::default();
        }

        RemainingSummary {
            total: self.total(today, range.end),
            weekly: self.weekly(today, range.end),
            monthly: self.monthly(today, range.end),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::days_between;
    use crate::schedule::classes_for;
    use crate::timetable::Period;
    use chrono::Duration;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_inverted_window_counts_zero() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        let monday = date(2025, 3, 3);
        assert_eq!(counter.count_incomplete(monday, monday - Duration::days(1)), 0);
        assert_eq!(counter.count_incomplete(date(2025, 3, 31), date(2025, 3, 1)), 0);
    }

    #[test]
    fn test_single_day_matches_schedule() {
        let table = Timetable::standard();
        let mut store = CompletionStore::new();
        let monday = date(2025, 3, 3);

        let before = RemainingCounter::new(&table, &store).count_incomplete(monday, monday);
        assert_eq!(before, 4);

        // Monday period 2 is class 7
        let period = Period::new(2).unwrap();
        assert!(store.toggle(monday, period));
        assert!(store.is_completed(monday, period));

        let after = RemainingCounter::new(&table, &store).count_incomplete(monday, monday);
        assert_eq!(after, before - 1);
    }

    #[test]
    fn test_full_week_count() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        // Sunday 2025-03-02 to Saturday 2025-03-08
        assert_eq!(counter.count_incomplete(date(2025, 3, 2), date(2025, 3, 8)), 21);
    }

    #[test]
    fn test_completed_slots_outside_timetable_are_ignored() {
        let table = Timetable::standard();
        let mut store = CompletionStore::new();
        let monday = date(2025, 3, 3);
        // Monday period 1 has no class, flagging it must not change anything
        store.toggle(monday, Period::new(1).unwrap());
        store.toggle(date(2025, 3, 8), Period::new(3).unwrap());

        let counter = RemainingCounter::new(&table, &store);
        assert_eq!(counter.count_incomplete(monday, monday), 4);
    }

    #[test]
    fn test_windows_from_midweek() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        // Wednesday 2025-03-26: Wed 3 + Thu 4 + Fri 5 left this week
        let today = date(2025, 3, 26);
        let end = date(2025, 6, 30);
        assert_eq!(counter.weekly(today, end), 12);
        // Rest of March: week above plus Mon 31 (4)
        assert_eq!(counter.monthly(today, end), 16);
        assert!(counter.total(today, end) > counter.monthly(today, end));

        // End date inside the week clips the weekly window
        assert_eq!(counter.weekly(today, date(2025, 3, 27)), 7);
    }

    #[test]
    fn test_completed_week_leaves_total_positive() {
        let table = Timetable::standard();
        let mut store = CompletionStore::new();
        let today = date(2025, 3, 2); // Sunday
        let week_end = end_of_week(today);

        for day in days_between(today, week_end) {
            for class in classes_for(&table, day) {
                store.toggle(day, class.period);
            }
        }

        let counter = RemainingCounter::new(&table, &store);
        let summary = counter.summary(today, &DateRange::new(today, date(2025, 4, 30)));
        assert_eq!(summary.weekly, 0);
        assert!(summary.total > 0);
        assert!(summary.monthly > 0);
    }

    #[test]
    fn test_end_before_today_is_all_zero() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        let today = date(2025, 3, 5);
        let range = DateRange::new(date(2025, 3, 1), today - Duration::days(1));
        assert_eq!(counter.summary(today, &range), RemainingSummary::default());
    }

    #[test]
    fn test_inverted_range_is_all_zero() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        let today = date(2025, 3, 3);
        let range = DateRange::new(date(2025, 5, 1), date(2025, 4, 1));
        assert_eq!(counter.summary(today, &range), RemainingSummary::default());
    }

    /// Day-by-day reference count
    fn walk_days(table: &Timetable, store: &CompletionStore, from: NaiveDate, to: NaiveDate) -> u32 {
        days_between(from, to)
            .map(|day| {
                classes_for(table, day)
                    .iter()
                    .filter(|class| !store.is_completed(day, class.period))
                    .count() as u32
            })
            .sum()
    }

    #[test]
    fn test_count_matches_walking_every_day() {
        let table = Timetable::standard();
        let mut store = CompletionStore::new();
        // scheduled, unscheduled and weekend slots, some outside the windows
        store.toggle(date(2025, 3, 3), Period::new(2).unwrap());
        store.toggle(date(2025, 3, 3), Period::new(1).unwrap());
        store.toggle(date(2025, 3, 12), Period::new(6).unwrap());
        store.toggle(date(2025, 3, 15), Period::new(4).unwrap());
        store.toggle(date(2025, 4, 4), Period::new(7).unwrap());
        store.toggle(date(2025, 2, 28), Period::new(1).unwrap());

        let counter = RemainingCounter::new(&table, &store);
        let start = date(2025, 2, 26);
        for from_offset in 0..9 {
            for len in 0..50 {
                let from = start + Duration::days(from_offset);
                let to = from + Duration::days(len);
                assert_eq!(
                    counter.count_incomplete(from, to),
                    walk_days(&table, &store, from, to),
                    "{} to {}",
                    from,
                    to
                );
            }
        }
    }

    #[test]
    fn test_far_end_date_counts_whole_weeks() {
        let table = Timetable::standard();
        let store = CompletionStore::new();
        let counter = RemainingCounter::new(&table, &store);

        let sunday = date(2025, 3, 2);
        let weeks = 100_000;
        let saturday = sunday + Duration::weeks(weeks) - Duration::days(1);
        assert_eq!(counter.count_incomplete(sunday, saturday), 21 * weeks as u32);

        let summary = counter.summary(sunday, &DateRange::new(sunday, NaiveDate::MAX));
        assert_eq!(summary.weekly, 21);
        assert!(summary.total > summary.monthly);
    }
}
