//! Alice Detect: session features and a classifier for spotting one user's browsing.
//!
//! Modular structure:
//! - [`table`]: In-memory session table (`time{k}`, `site{k}` columns)
//! - [`features`]: Feature derivation pipeline (durations, site counts, calendar indicators)
//! - [`model`]: Feature matrix hand-off, classifier backends, cross-validated grid search
//! - [`config`]: JSON configuration with defaults
//! - [`logging`]: Structured JSON logging

pub mod config;
pub mod error;
pub mod features;
pub mod logging;
pub mod model;
pub mod table;

pub use config::{Config, PipelineConfig, TrainingConfig, WeekPolicy};
pub use error::{FeatureError, TrainError};
pub use features::{FeaturePipeline, Stage};
pub use logging::StructuredLogger;
pub use model::{train, train_model, Classifier, FeatureMatrix, ModelKind, TrainedModel};
pub use table::{Column, Dataset, Scalar};
