use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const PERIODS_PER_DAY: u8 = 7;

/// One of the seven fixed slots of a school day (1-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Period(u8);

impl Period {
    pub fn new(n: u8) -> Option<Self> {
        if (1..=PERIODS_PER_DAY).contains(&n) {
            Some(Self(n))
        } else {
            None
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Periods 1..=7 in ascending order
    pub fn all() -> impl Iterator<Item = Period> {
        (1..=PERIODS_PER_DAY).map(Period)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What is taught in a slot. "No class" is modeled by `Option::None`
/// at the lookup site, never by a magic class number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassLabel {
    Class { number: u8 },
    Club,
}

impl fmt::Display for ClassLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassLabel::Class { number } => write!(f, "class {}", number),
            ClassLabel::Club => write!(f, "club activity"),
        }
    }
}

pub type DayRow = [Option<ClassLabel>; PERIODS_PER_DAY as usize];

const fn c(number: u8) -> Option<ClassLabel> {
    Some(ClassLabel::Class { number })
}

const CLUB: Option<ClassLabel> = Some(ClassLabel::Club);

//                         1        2      3      4      5      6      7
const MONDAY: DayRow    = [None,    c(7),  c(9),  None,  c(8),  c(4),  None];
const TUESDAY: DayRow   = [c(1),    c(3),  None,  c(2),  c(6),  None,  c(10)];
const WEDNESDAY: DayRow = [None,    None,  c(9),  c(5),  None,  c(8),  None];
const THURSDAY: DayRow  = [c(10),   None,  c(2),  None,  c(3),  c(5),  None];
const FRIDAY: DayRow    = [c(7),    c(6),  None,  c(1),  c(4),  None,  CLUB];

/// Weekly timetable: weekday -> period -> class.
/// Built once and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct Timetable {
    rows: [Option<DayRow>; 7],
}

impl Timetable {
    /// The school's fixed Mon-Fri timetable
    pub fn standard() -> Self {
        Self::from_rows([
            (Weekday::Mon, MONDAY),
            (Weekday::Tue, TUESDAY),
            (Weekday::Wed, WEDNESDAY),
            (Weekday::Thu, THURSDAY),
            (Weekday::Fri, FRIDAY),
        ])
    }

    /// Build a table from explicit rows; weekdays not listed have no classes.
    pub fn from_rows<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (Weekday, DayRow)>,
    {
        let mut table = [None; 7];
        for (weekday, row) in rows {
            table[weekday.num_days_from_sunday() as usize] = Some(row);
        }
        Self { rows: table }
    }

    pub fn lookup(&self, weekday: Weekday, period: Period) -> Option<ClassLabel> {
        self.rows[weekday.num_days_from_sunday() as usize]
            .and_then(|row| row[(period.get() - 1) as usize])
    }

    /// Number of classes held on `weekday`
    pub fn classes_on(&self, weekday: Weekday) -> u64 {
        self.rows[weekday.num_days_from_sunday() as usize]
            .map(|row| row.iter().filter(|slot| slot.is_some()).count() as u64)
            .unwrap_or(0)
    }

    /// Classes in one full week
    pub fn weekly_total(&self) -> u64 {
        let mut weekday = Weekday::Sun;
        let mut total = 0;
        for _ in 0..7 {
            total += self.classes_on(weekday);
            weekday = weekday.succ();
        }
        total
    }
}

impl Default for Timetable {
    fn default() -> Self {
        Self::standard()
    }
}
