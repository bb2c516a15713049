use chrono::NaiveDate;
use serde::Serialize;

use crate::dates::day_of_week;
use crate::timetable::{ClassLabel, Period, Timetable};

/// A class slot of the weekly timetable, independent of any date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduledClass {
    pub period: Period,
    pub class: ClassLabel,
}

/// Classes held on `date`, ascending by period. Empty on weekends.
pub fn classes_for(timetable: &Timetable, date: NaiveDate) -> Vec<ScheduledClass> {
    let weekday = day_of_week(date);
    Period::all()
        .filter_map(|period| {
            timetable
                .lookup(weekday, period)
                .map(|class| ScheduledClass { period, class })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::days_between;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_monday_classes() {
        let table = Timetable::standard();
        let classes = classes_for(&table, date(2025, 3, 3));

        let periods: Vec<u8> = classes.iter().map(|c| c.period.get()).collect();
        assert_eq!(periods, vec![2, 3, 5, 6]);
        assert_eq!(
            classes[0],
            ScheduledClass {
                period: Period::new(2).unwrap(),
                class: ClassLabel::Class { number: 7 },
            }
        );
    }

    #[test]
    fn test_friday_ends_with_club() {
        let table = Timetable::standard();
        let classes = classes_for(&table, date(2025, 3, 7));

        assert_eq!(classes.len(), 5);
        assert_eq!(classes.last().map(|c| c.class), Some(ClassLabel::Club));
    }

    #[test]
    fn test_weekend_is_empty() {
        let table = Timetable::standard();
        assert!(classes_for(&table, date(2025, 3, 8)).is_empty());
        assert!(classes_for(&table, date(2025, 3, 9)).is_empty());
    }

    #[test]
    fn test_periods_strictly_ascending_and_present() {
        // Two full months covers every weekday many times over
        let table = Timetable::standard();
        for day in days_between(date(2025, 3, 1), date(2025, 4, 30)) {
            let classes = classes_for(&table, day);
            assert!(classes.windows(2).all(|w| w[0].period < w[1].period));
            for class in &classes {
                assert_eq!(table.lookup(day_of_week(day), class.period), Some(class.class));
            }
        }
    }
}
