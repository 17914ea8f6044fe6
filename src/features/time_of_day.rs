//! Per-visit time-of-day buckets.

use super::{datetime_family, indicator, Stage};
use crate::error::Result;
use crate::table::Dataset;
use chrono::Timelike;

/// Six-hour slice of the day, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPart {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    pub const ALL: [DayPart; 4] = [
        DayPart::Night,
        DayPart::Morning,
        DayPart::Afternoon,
        DayPart::Evening,
    ];

    pub fn label(self) -> &'static str {
        match self {
            DayPart::Night => "night",
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
        }
    }

    pub fn hours(self) -> (u32, u32) {
        match self {
            DayPart::Night => (0, 5),
            DayPart::Morning => (6, 11),
            DayPart::Afternoon => (12, 17),
            DayPart::Evening => (18, 23),
        }
    }

    pub fn contains(self, hour: u32) -> bool {
        let (start, end) = self.hours();
        (start..=end).contains(&hour)
    }

    pub fn of_hour(hour: u32) -> Option<DayPart> {
        Self::ALL.into_iter().find(|p| p.contains(hour))
    }
}

/// `time_of_day_{datetime_k}_{part}` for every visit and every part of the day.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeOfDay;

impl Stage for TimeOfDay {
    fn name(&self) -> &'static str {
        "time_of_day"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let family = datetime_family(&dataset)?;
        let mut columns = Vec::with_capacity(family.len() * DayPart::ALL.len());
        for (_, name) in &family {
            let visits = dataset.datetime(name)?;
            for part in DayPart::ALL {
                columns.push((
                    format!("time_of_day_{name}_{}", part.label()),
                    indicator(visits, |t| part.contains(t.hour())),
                ));
            }
        }
        dataset.with_columns(columns)
    }
}
