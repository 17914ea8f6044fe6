//! Training stage: feature matrix → cross-validated classifier.
//!
//! Backends are selected by string key (`logistic_regression`, `gradient_boosting`);
//! an unknown key is a configuration error naming the key.

mod boosting;
mod logistic;
mod matrix;
pub mod metrics;
mod preprocess;
mod search;

pub use boosting::{BoostingParams, GradientBoosting};
pub use logistic::{LogisticParams, LogisticRegression};
pub use matrix::{split_target, train_test_split, FeatureMatrix, Split};
pub use metrics::Evaluation;
pub use preprocess::ColumnStats;
pub use search::{GridSearch, ParamGrid};

use crate::config::TrainingConfig;
use crate::error::TrainError;
use crate::table::Dataset;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary classifier over a dense feature matrix. Labels are 0.0 / 1.0.
pub trait Classifier: Send + Sync {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), TrainError>;

    /// Probability of the positive class per row.
    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array1<f64>;

    fn predict(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        self.predict_proba(x)
            .mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    LogisticRegression,
    GradientBoosting,
}

impl ModelKind {
    pub fn key(self) -> &'static str {
        match self {
            ModelKind::LogisticRegression => "logistic_regression",
            ModelKind::GradientBoosting => "gradient_boosting",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ModelKind {
    type Err = TrainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "logistic_regression" => Ok(ModelKind::LogisticRegression),
            "gradient_boosting" => Ok(ModelKind::GradientBoosting),
            other => Err(TrainError::UnknownModel(other.to_string())),
        }
    }
}

/// One point in a backend's hyperparameter space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum ModelParams {
    LogisticRegression(LogisticParams),
    GradientBoosting(BoostingParams),
}

impl ModelParams {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelParams::LogisticRegression(_) => ModelKind::LogisticRegression,
            ModelParams::GradientBoosting(_) => ModelKind::GradientBoosting,
        }
    }

    /// Unfitted classifier for these parameters.
    pub fn build(&self, seed: u64) -> Box<dyn Classifier> {
        match *self {
            ModelParams::LogisticRegression(p) => Box::new(LogisticRegression::new(p)),
            ModelParams::GradientBoosting(p) => Box::new(GradientBoosting::new(p, seed)),
        }
    }
}

/// Best classifier from a grid search, refit on all training rows.
pub struct TrainedModel {
    pub kind: ModelKind,
    pub params: ModelParams,
    /// Mean cross-validated ROC AUC of the chosen parameters
    pub cv_score: f64,
    classifier: Box<dyn Classifier>,
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("kind", &self.kind)
            .field("params", &self.params)
            .field("cv_score", &self.cv_score)
            .finish_non_exhaustive()
    }
}

impl TrainedModel {
    pub fn predict_proba(&self, x: &FeatureMatrix) -> Array1<f64> {
        self.classifier.predict_proba(x.view())
    }

    pub fn predict(&self, x: &FeatureMatrix) -> Array1<f64> {
        self.classifier.predict(x.view())
    }

    /// ROC AUC, balanced accuracy, and precision on held-out rows.
    pub fn evaluate(&self, x: &FeatureMatrix, y: &Array1<f64>) -> Evaluation {
        let proba = self.predict_proba(x);
        let pred = self.predict(x);
        Evaluation {
            roc_auc: metrics::roc_auc(y.view(), proba.view()),
            balanced_accuracy: metrics::balanced_accuracy(y.view(), pred.view()),
            precision: metrics::precision(y.view(), pred.view()),
        }
    }
}

/// Select a backend by key and fit it with its default grid.
pub fn train_model(
    key: &str,
    x: &FeatureMatrix,
    y: &Array1<f64>,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainError> {
    let kind: ModelKind = key.parse()?;
    search(kind, x, y, config)
}

/// Train from a labelled feature table using only the configuration:
/// target column, held-out fraction, seed, folds, and backend key.
/// Returns the fitted model with its scores on the held-out rows.
pub fn train(
    features: &Dataset,
    config: &TrainingConfig,
) -> Result<(TrainedModel, Evaluation), TrainError> {
    let kind: ModelKind = config.model.parse()?;
    let (x, y) = split_target(features, &config.target_column)?;
    let split = train_test_split(&x, &y, config.test_fraction, config.seed)?;
    let model = search(kind, &split.x_train, &split.y_train, config)?;
    let evaluation = model.evaluate(&split.x_test, &split.y_test);
    tracing::info!(
        model = %kind,
        held_out = split.y_test.len(),
        roc_auc = ?evaluation.roc_auc,
        balanced_accuracy = evaluation.balanced_accuracy,
        precision = evaluation.precision,
        "held-out evaluation"
    );
    Ok((model, evaluation))
}

fn search(
    kind: ModelKind,
    x: &FeatureMatrix,
    y: &Array1<f64>,
    config: &TrainingConfig,
) -> Result<TrainedModel, TrainError> {
    tracing::info!(
        model = %kind,
        rows = x.n_rows(),
        features = x.n_features(),
        "training"
    );
    GridSearch::from_config(config).fit(&ParamGrid::for_kind(kind), x.view(), y.view())
}

/// Shape and label checks shared by every backend.
pub(crate) fn check_training_data(
    x: ArrayView2<'_, f64>,
    y: ArrayView1<'_, f64>,
) -> Result<(), TrainError> {
    if x.nrows() != y.len() {
        return Err(TrainError::InvalidData(format!(
            "{} feature rows but {} labels",
            x.nrows(),
            y.len()
        )));
    }
    if x.ncols() == 0 {
        return Err(TrainError::InvalidData("no feature columns".into()));
    }
    if let Some(bad) = y.iter().find(|&&v| v != 0.0 && v != 1.0) {
        return Err(TrainError::InvalidData(format!("label {bad} is not 0 or 1")));
    }
    let positives = y.iter().filter(|&&v| v == 1.0).count();
    if positives == 0 || positives == y.len() {
        return Err(TrainError::InvalidData(
            "labels must contain both classes".into(),
        ));
    }
    Ok(())
}

pub(crate) fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::Column;
    use ndarray::array;

    /// One informative int column plus a 0/1 target switching at row 15.
    fn labelled(rows: usize) -> Dataset {
        Dataset::from_columns([
            ("num_sites", Column::Int((0..rows as i64).map(Some).collect())),
            (
                "target",
                Column::Int((0..rows).map(|r| Some(i64::from(r >= 15))).collect()),
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_model_kind_keys() {
        assert_eq!(
            "logistic_regression".parse::<ModelKind>().unwrap(),
            ModelKind::LogisticRegression
        );
        assert_eq!(
            "gradient_boosting".parse::<ModelKind>().unwrap(),
            ModelKind::GradientBoosting
        );
        assert_eq!(ModelKind::GradientBoosting.to_string(), "gradient_boosting");
    }

    #[test]
    fn test_unknown_key_is_config_error() {
        let err = "catboost".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, TrainError::UnknownModel(ref k) if k == "catboost"));
        assert!(err.to_string().contains("'catboost'"));
    }

    #[test]
    fn test_train_model_rejects_unknown_key_before_fitting() {
        let x = FeatureMatrix::new(vec!["a".into()], array![[0.0], [1.0]]).unwrap();
        let y = array![0.0, 1.0];
        let err = train_model("xgboost", &x, &y, &TrainingConfig::default()).unwrap_err();
        assert!(matches!(err, TrainError::UnknownModel(_)));
    }

    #[test]
    fn test_train_reads_backend_from_config() {
        let config = TrainingConfig {
            model: "logistic_regression".into(),
            ..TrainingConfig::default()
        };
        let (model, evaluation) = train(&labelled(30), &config).unwrap();
        assert_eq!(model.kind, ModelKind::LogisticRegression);
        assert!(evaluation.balanced_accuracy > 0.8);
    }

    #[test]
    fn test_train_rejects_unknown_configured_backend() {
        let config = TrainingConfig {
            model: "random_forest".into(),
            ..TrainingConfig::default()
        };
        let err = train(&labelled(30), &config).unwrap_err();
        assert!(matches!(err, TrainError::UnknownModel(ref k) if k == "random_forest"));
    }

    #[test]
    fn test_train_uses_configured_target() {
        let config = TrainingConfig {
            model: "logistic_regression".into(),
            target_column: "label".into(),
            ..TrainingConfig::default()
        };
        assert!(matches!(
            train(&labelled(30), &config),
            Err(TrainError::Feature(_))
        ));
    }

    #[test]
    fn test_check_training_data() {
        let x = array![[1.0], [2.0]];
        assert!(check_training_data(x.view(), array![0.0, 1.0].view()).is_ok());
        assert!(check_training_data(x.view(), array![1.0, 1.0].view()).is_err());
        assert!(check_training_data(x.view(), array![0.0, 2.0].view()).is_err());
        assert!(check_training_data(x.view(), array![0.0].view()).is_err());
    }

    #[test]
    fn test_params_serialize_with_tag() {
        let json = serde_json::to_value(ModelParams::LogisticRegression(LogisticParams::default()))
            .unwrap();
        assert_eq!(json["model"], "logistic_regression");
        assert_eq!(json["epochs"], 300);
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
    }
}
