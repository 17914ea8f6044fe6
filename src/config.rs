//! Pipeline, training, and logging configuration. Loaded from JSON; every section has defaults.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Feature derivation parameters
    pub pipeline: PipelineConfig,
    /// Classifier selection and search
    pub training: TrainingConfig,
    /// Logging
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum visits per session (N). `None` infers N from the `time*` columns.
    pub session_length: Option<usize>,
    /// How ISO week 53 maps onto the week indicator columns
    pub week_policy: WeekPolicy,
    /// Keep the deduplicated `all_sites` list column in the output
    pub emit_all_sites: bool,
    /// Business-day calendar for `is_workday`
    pub calendar: CalendarConfig,
}

/// Week-of-year indicator range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekPolicy {
    /// 52 columns; ISO week 53 sets `week_52`
    #[default]
    FoldInto52,
    /// 53 columns; ISO week 53 sets `week_53`
    Extend53,
}

impl WeekPolicy {
    pub fn week_count(self) -> u32 {
        match self {
            WeekPolicy::FoldInto52 => 52,
            WeekPolicy::Extend53 => 53,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// Non-working weekdays
    pub weekend: Vec<Weekday>,
    /// Additional non-working dates
    pub holidays: Vec<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Classifier backend key (`logistic_regression` or `gradient_boosting`)
    pub model: String,
    /// Label column excluded from the feature matrix
    pub target_column: String,
    /// Folds for cross-validated grid search
    pub cv_folds: usize,
    /// Share of rows held out by `train_test_split`
    pub test_fraction: f64,
    /// Seed for shuffling and subsampling
    pub seed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub level: String,
    pub json: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            session_length: None,
            week_policy: WeekPolicy::default(),
            emit_all_sites: false,
            calendar: CalendarConfig::default(),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            weekend: vec![Weekday::Sat, Weekday::Sun],
            holidays: Vec::new(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            model: "gradient_boosting".to_string(),
            target_column: "target".to_string(),
            cv_folds: 3,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

impl Config {
    /// Load from JSON file if present; otherwise return default
    pub fn load(path: &std::path::Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path) {
                Ok(data) => match serde_json::from_str::<Config>(&data) {
                    Ok(c) => return c,
                    Err(e) => tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "invalid config; using defaults"
                    ),
                },
                Err(e) => tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "unreadable config; using defaults"
                ),
            }
        }
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let c = Config::default();
        assert_eq!(c.pipeline.session_length, None);
        assert_eq!(c.pipeline.week_policy, WeekPolicy::FoldInto52);
        assert!(!c.pipeline.emit_all_sites);
        assert_eq!(c.pipeline.calendar.weekend, vec![Weekday::Sat, Weekday::Sun]);
        assert_eq!(c.training.cv_folds, 3);
        assert_eq!(c.training.seed, 42);
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let c: Config = serde_json::from_str(
            r#"{"pipeline": {"session_length": 10, "week_policy": "extend53"}}"#,
        )
        .unwrap();
        assert_eq!(c.pipeline.session_length, Some(10));
        assert_eq!(c.pipeline.week_policy, WeekPolicy::Extend53);
        assert_eq!(c.training.model, "gradient_boosting");
        assert_eq!(c.log.level, "info");
    }

    #[test]
    fn test_calendar_json() {
        let c: CalendarConfig =
            serde_json::from_str(r#"{"weekend": ["Fri", "Sat"], "holidays": ["2024-05-17"]}"#)
                .unwrap();
        assert_eq!(c.weekend, vec![Weekday::Fri, Weekday::Sat]);
        assert_eq!(c.holidays, vec![NaiveDate::from_ymd_opt(2024, 5, 17).unwrap()]);
    }

    #[test]
    fn test_week_count() {
        assert_eq!(WeekPolicy::FoldInto52.week_count(), 52);
        assert_eq!(WeekPolicy::Extend53.week_count(), 53);
    }
}
