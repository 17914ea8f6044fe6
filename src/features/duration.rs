//! Seconds between visits.

use super::{datetime_family, Stage, DATETIME_PREFIX, FIRST_VISIT};
use crate::error::{FeatureError, Result};
use crate::table::{Column, Dataset};
use chrono::NaiveDateTime;

/// Whole seconds `later - earlier`; null if either side is null.
fn seconds_between(
    earlier: &[Option<NaiveDateTime>],
    later: &[Option<NaiveDateTime>],
) -> Column {
    Column::Int(
        earlier
            .iter()
            .zip(later)
            .map(|(a, b)| match (a, b) {
                (Some(a), Some(b)) => Some((*b - *a).num_seconds()),
                _ => None,
            })
            .collect(),
    )
}

/// `diff_time_{i}_{j}` for each adjacent pair of datetime columns.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsecutiveDurations;

impl Stage for ConsecutiveDurations {
    fn name(&self) -> &'static str {
        "consecutive_durations"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let family = datetime_family(&dataset)?;
        let mut columns = Vec::with_capacity(family.len().saturating_sub(1));
        for pair in family.windows(2) {
            let (i, first) = &pair[0];
            let (j, second) = &pair[1];
            columns.push((
                format!("diff_time_{i}_{j}"),
                seconds_between(dataset.datetime(first)?, dataset.datetime(second)?),
            ));
        }
        dataset.with_columns(columns)
    }
}

/// `total_duration`: first visit to the last step of a full-length session.
#[derive(Debug, Clone, Copy, Default)]
pub struct TotalDuration {
    /// Final step index; `None` uses the highest `datetime{k}` present.
    pub session_length: Option<usize>,
}

impl TotalDuration {
    pub fn new(session_length: Option<usize>) -> Self {
        Self { session_length }
    }
}

impl Stage for TotalDuration {
    fn name(&self) -> &'static str {
        "total_duration"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let last = match self.session_length {
            Some(0) => {
                return Err(FeatureError::Schema("session length must be positive".into()))
            }
            Some(n) => format!("{DATETIME_PREFIX}{n}"),
            None => datetime_family(&dataset)?
                .pop()
                .map(|(_, name)| name)
                .unwrap_or_else(|| FIRST_VISIT.to_string()),
        };
        let column = seconds_between(dataset.datetime(FIRST_VISIT)?, dataset.datetime(&last)?);
        dataset.with_column("total_duration", column)
    }
}
