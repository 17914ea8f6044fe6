//! Calendar indicators derived from the session's first visit.

use super::{indicator, Stage, FIRST_VISIT};
use crate::config::{CalendarConfig, WeekPolicy};
use crate::error::Result;
use crate::table::{Column, Dataset};
use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::BTreeSet;

pub const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// `month_{name}` for each calendar month.
#[derive(Debug, Clone, Copy, Default)]
pub struct Months;

impl Stage for Months {
    fn name(&self) -> &'static str {
        "months"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let first = dataset.datetime(FIRST_VISIT)?;
        let columns: Vec<(String, Column)> = MONTH_NAMES
            .iter()
            .zip(1u32..)
            .map(|(name, month)| {
                (
                    format!("month_{name}"),
                    indicator(first, |t| t.month() == month),
                )
            })
            .collect();
        dataset.with_columns(columns)
    }
}

/// `week_{n}` from the ISO week of the first visit.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weeks {
    pub policy: WeekPolicy,
}

impl Weeks {
    pub fn new(policy: WeekPolicy) -> Self {
        Self { policy }
    }

    /// Indicator column the given ISO week maps to.
    pub fn bucket(&self, iso_week: u32) -> u32 {
        iso_week.min(self.policy.week_count())
    }
}

impl Stage for Weeks {
    fn name(&self) -> &'static str {
        "weeks"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let first = dataset.datetime(FIRST_VISIT)?;
        let columns: Vec<(String, Column)> = (1..=self.policy.week_count())
            .map(|week| {
                (
                    format!("week_{week}"),
                    indicator(first, |t| self.bucket(t.iso_week().week()) == week),
                )
            })
            .collect();
        dataset.with_columns(columns)
    }
}

/// `weekday_{d}` with 0 = Monday through 6 = Sunday.
#[derive(Debug, Clone, Copy, Default)]
pub struct Weekdays;

impl Stage for Weekdays {
    fn name(&self) -> &'static str {
        "weekdays"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let first = dataset.datetime(FIRST_VISIT)?;
        let columns: Vec<(String, Column)> = (0..7u32)
            .map(|day| {
                (
                    format!("weekday_{day}"),
                    indicator(first, |t| t.weekday().num_days_from_monday() == day),
                )
            })
            .collect();
        dataset.with_columns(columns)
    }
}

/// Working-day calendar: fixed weekend days plus explicit holidays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessCalendar {
    weekend: [bool; 7],
    holidays: BTreeSet<NaiveDate>,
}

impl Default for BusinessCalendar {
    fn default() -> Self {
        Self::new([Weekday::Sat, Weekday::Sun], [])
    }
}

impl BusinessCalendar {
    pub fn new(
        weekend: impl IntoIterator<Item = Weekday>,
        holidays: impl IntoIterator<Item = NaiveDate>,
    ) -> Self {
        let mut mask = [false; 7];
        for day in weekend {
            mask[day.num_days_from_monday() as usize] = true;
        }
        Self {
            weekend: mask,
            holidays: holidays.into_iter().collect(),
        }
    }

    pub fn from_config(config: &CalendarConfig) -> Self {
        Self::new(
            config.weekend.iter().copied(),
            config.holidays.iter().copied(),
        )
    }

    pub fn is_workday(&self, date: NaiveDate) -> bool {
        !self.weekend[date.weekday().num_days_from_monday() as usize]
            && !self.holidays.contains(&date)
    }
}

/// `is_workday` for the first visit's date.
#[derive(Debug, Clone, Default)]
pub struct Workday {
    pub calendar: BusinessCalendar,
}

impl Workday {
    pub fn new(calendar: BusinessCalendar) -> Self {
        Self { calendar }
    }
}

impl Stage for Workday {
    fn name(&self) -> &'static str {
        "workday"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let column = indicator(dataset.datetime(FIRST_VISIT)?, |t| {
            self.calendar.is_workday(t.date())
        });
        dataset.with_column("is_workday", column)
    }
}
