//! Feature pipeline: raw session table → schema check → stages in order → feature table.

use super::{
    BusinessCalendar, ConsecutiveDurations, DatetimeNormalization, Months, Stage, TimeOfDay,
    TotalDuration, UniqueSites, Weekdays, Weeks, Workday, SITE_PREFIX, TIME_PREFIX,
};
use crate::config::PipelineConfig;
use crate::error::{FeatureError, Result};
use crate::table::Dataset;
use tracing::{debug, info};

/// Shape of a raw session table: `time{k}`/`site{k}` for k = 1..=steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSchema {
    pub steps: usize,
}

impl SessionSchema {
    /// Validate the raw column families. `expected` pins the session length.
    pub fn detect(dataset: &Dataset, expected: Option<usize>) -> Result<Self> {
        let times: Vec<usize> = dataset
            .indexed_family(TIME_PREFIX)
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        let sites: Vec<usize> = dataset
            .indexed_family(SITE_PREFIX)
            .into_iter()
            .map(|(k, _)| k)
            .collect();

        if times.is_empty() {
            return Err(FeatureError::Schema("no time columns".into()));
        }
        if sites.is_empty() {
            return Err(FeatureError::Schema("no site columns".into()));
        }
        if times.len() != sites.len() {
            return Err(FeatureError::Schema(format!(
                "{} time columns but {} site columns",
                times.len(),
                sites.len()
            )));
        }
        if let Some(gap) = times.iter().zip(1..).find(|(k, want)| **k != *want) {
            return Err(FeatureError::Schema(format!(
                "time columns are not numbered 1..={}: found time{} at position {}",
                times.len(),
                gap.0,
                gap.1
            )));
        }
        if times != sites {
            return Err(FeatureError::Schema(
                "time and site columns are indexed differently".into(),
            ));
        }

        let steps = times.len();
        if let Some(n) = expected {
            if n != steps {
                return Err(FeatureError::Schema(format!(
                    "expected sessions of {n} steps, table has {steps}"
                )));
            }
        }
        Ok(Self { steps })
    }
}

/// Ordered chain of feature stages built from configuration.
pub struct FeaturePipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl FeaturePipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(DatetimeNormalization),
            Box::new(ConsecutiveDurations),
            Box::new(TotalDuration::new(config.session_length)),
            Box::new(UniqueSites::new(config.emit_all_sites)),
            Box::new(TimeOfDay),
            Box::new(Months),
            Box::new(Weeks::new(config.week_policy)),
            Box::new(Weekdays),
            Box::new(Workday::new(BusinessCalendar::from_config(&config.calendar))),
        ];
        Self { config, stages }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Validate the raw schema, then apply every stage. No partial result on failure.
    pub fn run(&self, dataset: Dataset) -> Result<Dataset> {
        let schema = SessionSchema::detect(&dataset, self.config.session_length)?;
        let rows = dataset.n_rows();
        let input_columns = dataset.n_columns();

        let mut dataset = dataset;
        for stage in &self.stages {
            let before = dataset.n_columns();
            dataset = stage.apply(dataset)?;
            debug!(
                stage = stage.name(),
                added = dataset.n_columns() - before,
                "stage complete"
            );
        }

        info!(
            rows,
            steps = schema.steps,
            derived = dataset.n_columns() - input_columns,
            "feature pipeline complete"
        );
        Ok(dataset)
    }
}

impl Default for FeaturePipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}
