//! Raw `time{k}` text → `datetime{k}` timestamps.

use super::{Stage, DATETIME_PREFIX, TIME_PREFIX};
use crate::error::{FeatureError, Result};
use crate::table::{Column, Dataset, RenameMap};
use chrono::{NaiveDate, NaiveDateTime};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse a naive timestamp. A bare date is read as midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Parses every `time{k}` column and renames it to `datetime{k}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatetimeNormalization;

impl Stage for DatetimeNormalization {
    fn name(&self) -> &'static str {
        "datetime_normalization"
    }

    fn apply(&self, dataset: Dataset) -> Result<Dataset> {
        let family: Vec<(usize, String)> = dataset
            .indexed_family(TIME_PREFIX)
            .into_iter()
            .map(|(k, name)| (k, name.to_string()))
            .collect();
        if family.is_empty() {
            return Err(FeatureError::Schema("no time columns to normalize".into()));
        }

        let mut parsed = Vec::with_capacity(family.len());
        for (_, name) in &family {
            let column = dataset.column(name).ok_or_else(|| {
                FeatureError::Schema(format!("missing column '{name}'"))
            })?;
            let raw = column.as_text().ok_or_else(|| {
                FeatureError::Schema(format!(
                    "column '{name}' is {}, expected text timestamps",
                    column.kind()
                ))
            })?;
            let values = raw
                .iter()
                .enumerate()
                .map(|(row, cell)| match cell {
                    None => Ok(None),
                    Some(s) => parse_timestamp(s).map(Some).ok_or_else(|| FeatureError::Parse {
                        column: name.clone(),
                        row,
                        value: s.clone(),
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            parsed.push((name.clone(), Column::Datetime(values)));
        }

        let renames = RenameMap::new(
            family
                .iter()
                .map(|(k, name)| (name.clone(), format!("{DATETIME_PREFIX}{k}"))),
        )?;
        dataset.with_columns(parsed)?.rename(&renames)
    }
}
