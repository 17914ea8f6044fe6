//! Cross-validated grid search over classifier hyperparameters.

use super::metrics::roc_auc;
use super::{check_training_data, ModelKind, ModelParams, TrainedModel};
use super::{BoostingParams, LogisticParams};
use crate::config::TrainingConfig;
use crate::error::TrainError;
use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::Serialize;
use tracing::{debug, info};

/// Candidate parameter sets, evaluated in order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParamGrid {
    candidates: Vec<ModelParams>,
}

impl ParamGrid {
    pub fn new(candidates: Vec<ModelParams>) -> Self {
        Self { candidates }
    }

    /// Default search space for a backend.
    pub fn for_kind(kind: ModelKind) -> Self {
        let mut candidates = Vec::new();
        match kind {
            ModelKind::LogisticRegression => {
                for learning_rate in [0.1, 0.01] {
                    for epochs in [100, 300] {
                        for l2 in [1.0, 3.0] {
                            candidates.push(ModelParams::LogisticRegression(LogisticParams {
                                learning_rate,
                                epochs,
                                l2,
                                balanced: true,
                            }));
                        }
                    }
                }
            }
            ModelKind::GradientBoosting => {
                for max_depth in [3, 6] {
                    for learning_rate in [0.1, 0.01] {
                        for n_estimators in [100, 300] {
                            for subsample in [0.8, 1.0] {
                                for colsample in [0.8, 1.0] {
                                    let params = BoostingParams {
                                        n_estimators,
                                        learning_rate,
                                        max_depth,
                                        subsample,
                                        colsample,
                                        lambda: 1.0,
                                    };
                                    candidates.push(ModelParams::GradientBoosting(params));
                                }
                            }
                        }
                    }
                }
            }
        }
        Self { candidates }
    }

    pub fn candidates(&self) -> &[ModelParams] {
        &self.candidates
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

/// Test-row indices per fold; each class is dealt round-robin across folds.
pub(crate) fn stratified_folds(
    y: ArrayView1<'_, f64>,
    k: usize,
) -> Result<Vec<Vec<usize>>, TrainError> {
    let mut folds = vec![Vec::new(); k];
    for class in [0.0, 1.0] {
        let members: Vec<usize> = (0..y.len()).filter(|&i| y[i] == class).collect();
        if members.len() < k {
            return Err(TrainError::InvalidData(format!(
                "class {class} has {} rows, fewer than {k} folds",
                members.len()
            )));
        }
        for (pos, row) in members.into_iter().enumerate() {
            folds[pos % k].push(row);
        }
    }
    for fold in folds.iter_mut() {
        fold.sort_unstable();
    }
    Ok(folds)
}

pub struct GridSearch {
    folds: usize,
    seed: u64,
}

impl GridSearch {
    pub fn new(folds: usize, seed: u64) -> Self {
        Self { folds, seed }
    }

    pub fn from_config(config: &TrainingConfig) -> Self {
        Self::new(config.cv_folds, config.seed)
    }

    /// Score every candidate by mean fold ROC AUC, then refit the best on all rows.
    pub fn fit(
        &self,
        grid: &ParamGrid,
        x: ArrayView2<'_, f64>,
        y: ArrayView1<'_, f64>,
    ) -> Result<TrainedModel, TrainError> {
        if grid.is_empty() {
            return Err(TrainError::InvalidData("empty parameter grid".into()));
        }
        if self.folds < 2 {
            return Err(TrainError::InvalidData(format!(
                "cross validation needs at least 2 folds, got {}",
                self.folds
            )));
        }
        check_training_data(x, y)?;
        let folds = stratified_folds(y, self.folds)?;

        let mut best: Option<(f64, ModelParams)> = None;
        for params in grid.candidates() {
            let mut scores = Vec::with_capacity(folds.len());
            for test in &folds {
                let mut in_test = vec![false; y.len()];
                for &i in test {
                    in_test[i] = true;
                }
                let train: Vec<usize> = (0..y.len()).filter(|&i| !in_test[i]).collect();

                let mut model = params.build(self.seed);
                model.fit(
                    x.select(Axis(0), &train).view(),
                    y.select(Axis(0), &train).view(),
                )?;
                let proba = model.predict_proba(x.select(Axis(0), test).view());
                if let Some(auc) = roc_auc(y.select(Axis(0), test).view(), proba.view()) {
                    scores.push(auc);
                }
            }
            if scores.is_empty() {
                continue;
            }
            let mean = scores.iter().sum::<f64>() / scores.len() as f64;
            debug!(params = ?params, cv_auc = mean, "candidate scored");
            if best.map_or(true, |(score, _)| mean > score) {
                best = Some((mean, *params));
            }
        }

        let (cv_score, params) = best.ok_or_else(|| {
            TrainError::InvalidData("no candidate produced a cross-validation score".into())
        })?;
        let mut classifier = params.build(self.seed);
        classifier.fit(x, y)?;
        info!(
            model = %params.kind(),
            cv_auc = cv_score,
            candidates = grid.len(),
            folds = self.folds,
            "grid search complete"
        );
        Ok(TrainedModel {
            kind: params.kind(),
            params,
            cv_score,
            classifier,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    #[test]
    fn test_default_grid_sizes() {
        assert_eq!(ParamGrid::for_kind(ModelKind::LogisticRegression).len(), 8);
        assert_eq!(ParamGrid::for_kind(ModelKind::GradientBoosting).len(), 32);
    }

    #[test]
    fn test_boosting_grid_covers_column_sampling() {
        let grid = ParamGrid::for_kind(ModelKind::GradientBoosting);
        let colsample: Vec<f64> = grid
            .candidates()
            .iter()
            .filter_map(|p| match p {
                ModelParams::GradientBoosting(b) => Some(b.colsample),
                ModelParams::LogisticRegression(_) => None,
            })
            .collect();
        assert_eq!(colsample.len(), 32);
        assert_eq!(colsample.iter().filter(|&&c| c == 0.8).count(), 16);
        assert_eq!(colsample.iter().filter(|&&c| c == 1.0).count(), 16);
    }

    #[test]
    fn test_stratified_folds_cover_rows_once() {
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0]);
        let folds = stratified_folds(y.view(), 3).unwrap();
        let mut all: Vec<usize> = folds.iter().flatten().copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..9).collect::<Vec<_>>());
        for fold in &folds {
            assert_eq!(fold.iter().filter(|&&i| y[i] == 1.0).count(), 1);
        }
    }

    #[test]
    fn test_stratified_folds_need_members() {
        let y = Array1::from_vec(vec![0.0, 0.0, 0.0, 1.0]);
        assert!(stratified_folds(y.view(), 3).is_err());
    }

    #[test]
    fn test_search_picks_best_candidate() {
        let x = Array2::from_shape_fn((30, 1), |(r, _)| r as f64);
        let y = Array1::from_shape_fn(30, |r| if r >= 15 { 1.0 } else { 0.0 });
        let weak = LogisticParams {
            learning_rate: 0.0,
            ..LogisticParams::default()
        };
        let strong = LogisticParams::default();
        let grid = ParamGrid::new(vec![
            ModelParams::LogisticRegression(weak),
            ModelParams::LogisticRegression(strong),
        ]);

        let model = GridSearch::new(3, 42).fit(&grid, x.view(), y.view()).unwrap();
        assert_eq!(model.params, ModelParams::LogisticRegression(strong));
        assert_eq!(model.kind, ModelKind::LogisticRegression);
        assert!(model.cv_score > 0.99);
    }

    #[test]
    fn test_search_rejects_empty_grid() {
        let x = Array2::zeros((6, 1));
        let y = Array1::from_vec(vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0]);
        let err = GridSearch::new(3, 1)
            .fit(&ParamGrid::new(Vec::new()), x.view(), y.view())
            .unwrap_err();
        assert!(matches!(err, TrainError::InvalidData(_)));
    }
}
