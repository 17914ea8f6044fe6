//! Feature derivation: raw session columns → numeric indicator and duration columns.
//!
//! Each [`Stage`] reads existing columns and appends new ones. The default chain is
//! run by [`FeaturePipeline`] in a fixed order since later stages read the
//! `datetime{k}` columns produced by normalization.

mod calendar;
mod datetime;
mod duration;
mod pipeline;
mod sites;
mod time_of_day;

pub use calendar::{BusinessCalendar, Months, Weekdays, Weeks, Workday, MONTH_NAMES};
pub use datetime::{parse_timestamp, DatetimeNormalization};
pub use duration::{ConsecutiveDurations, TotalDuration};
pub use pipeline::{FeaturePipeline, SessionSchema};
pub use sites::UniqueSites;
pub use time_of_day::{DayPart, TimeOfDay};

use crate::error::{FeatureError, Result};
use crate::table::{Column, Dataset};

pub const TIME_PREFIX: &str = "time";
pub const DATETIME_PREFIX: &str = "datetime";
pub const SITE_PREFIX: &str = "site";

/// Column every calendar feature is derived from.
pub const FIRST_VISIT: &str = "datetime1";

/// One transformation in the feature pipeline.
pub trait Stage {
    fn name(&self) -> &'static str;

    /// Consume the table and return it with this stage's columns appended.
    fn apply(&self, dataset: Dataset) -> Result<Dataset>;
}

/// Names of the `datetime{k}` columns in step order. Fails if there are none.
fn datetime_family(dataset: &Dataset) -> Result<Vec<(usize, String)>> {
    let family: Vec<(usize, String)> = dataset
        .indexed_family(DATETIME_PREFIX)
        .into_iter()
        .map(|(k, name)| (k, name.to_string()))
        .collect();
    if family.is_empty() {
        return Err(FeatureError::Schema(
            "no datetime columns; normalize time columns first".into(),
        ));
    }
    Ok(family)
}

/// 0/1 column from a predicate; null input stays null.
fn indicator<T>(values: &[Option<T>], mut hit: impl FnMut(&T) -> bool) -> Column {
    Column::Int(
        values
            .iter()
            .map(|v| v.as_ref().map(|v| i64::from(hit(v))))
            .collect(),
    )
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::table::{Column, Dataset};

    /// Raw table with `time{k}`/`site{k}` columns; each session is a list of (time, site).
    pub fn raw_sessions(sessions: &[&[(&str, i64)]], steps: usize) -> Dataset {
        let mut columns = Vec::new();
        for k in 0..steps {
            let times = sessions
                .iter()
                .map(|s| s.get(k).map(|(t, _)| t.to_string()))
                .collect();
            columns.push((format!("time{}", k + 1), Column::Text(times)));
        }
        for k in 0..steps {
            let sites = sessions.iter().map(|s| s.get(k).map(|(_, id)| *id)).collect();
            columns.push((format!("site{}", k + 1), Column::Int(sites)));
        }
        Dataset::from_columns(columns).unwrap()
    }

    pub fn ints(ds: &Dataset, name: &str) -> Vec<Option<i64>> {
        ds.column(name)
            .and_then(Column::as_int)
            .unwrap_or_else(|| panic!("missing int column {name}"))
            .to_vec()
    }
}
