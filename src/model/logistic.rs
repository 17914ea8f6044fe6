//! L2-regularized logistic regression fitted by batch gradient descent.

use super::preprocess::ColumnStats;
use super::{check_training_data, sigmoid, Classifier};
use crate::error::TrainError;
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticParams {
    pub learning_rate: f64,
    pub epochs: usize,
    /// L2 penalty on weights (bias is not penalized)
    pub l2: f64,
    /// Reweight classes inversely to their frequency
    pub balanced: bool,
}

impl Default for LogisticParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            epochs: 300,
            l2: 1.0,
            balanced: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    params: LogisticParams,
    stats: Option<ColumnStats>,
    weights: Array1<f64>,
    bias: f64,
}

impl LogisticRegression {
    pub fn new(params: LogisticParams) -> Self {
        Self {
            params,
            stats: None,
            weights: Array1::zeros(0),
            bias: 0.0,
        }
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }
}

/// Per-row weights; balanced mode gives each class half the total mass.
pub(crate) fn sample_weights(y: ArrayView1<'_, f64>, balanced: bool) -> Array1<f64> {
    if !balanced {
        return Array1::ones(y.len());
    }
    let n = y.len() as f64;
    let n_pos = y.iter().filter(|&&v| v == 1.0).count() as f64;
    let n_neg = n - n_pos;
    y.mapv(|v| {
        if v == 1.0 {
            n / (2.0 * n_pos)
        } else {
            n / (2.0 * n_neg)
        }
    })
}

impl Classifier for LogisticRegression {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), TrainError> {
        check_training_data(x, y)?;
        let stats = ColumnStats::fit(x);
        let xs = stats.standardize(x);
        let sw = sample_weights(y, self.params.balanced);
        let total = sw.sum();

        let mut w = Array1::<f64>::zeros(xs.ncols());
        let mut b = 0.0;
        for _ in 0..self.params.epochs {
            let p = (xs.dot(&w) + b).mapv(sigmoid);
            let err = (&p - &y) * &sw;
            let grad_w = xs.t().dot(&err) / total + &w * (self.params.l2 / total);
            let grad_b = err.sum() / total;
            w.scaled_add(-self.params.learning_rate, &grad_w);
            b -= self.params.learning_rate * grad_b;
        }

        self.stats = Some(stats);
        self.weights = w;
        self.bias = b;
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        match &self.stats {
            Some(stats) if stats.n_features() == x.ncols() => {
                (stats.standardize(x).dot(&self.weights) + self.bias).mapv(sigmoid)
            }
            _ => Array1::from_elem(x.nrows(), 0.5),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_separates_linear_data() {
        let x = Array2::from_shape_fn((40, 2), |(r, c)| if c == 0 { r as f64 } else { 1.0 });
        let y = Array1::from_shape_fn(40, |r| if r >= 20 { 1.0 } else { 0.0 });
        let mut model = LogisticRegression::new(LogisticParams::default());
        model.fit(x.view(), y.view()).unwrap();

        let p = model.predict_proba(array![[0.0, 1.0], [39.0, 1.0]].view());
        assert!(p[0] < 0.5);
        assert!(p[1] > 0.5);
        assert!(model.weights()[0] > 0.0);
        assert_eq!(model.predict(x.view()), y);
    }

    #[test]
    fn test_unfitted_predicts_half() {
        let model = LogisticRegression::new(LogisticParams::default());
        assert_eq!(model.predict_proba(array![[1.0]].view()), array![0.5]);
    }

    #[test]
    fn test_balanced_weights() {
        let y = array![1.0, 0.0, 0.0, 0.0];
        let w = sample_weights(y.view(), true);
        assert_eq!(w, array![2.0, 2.0 / 3.0, 2.0 / 3.0, 2.0 / 3.0]);
        assert_eq!(sample_weights(y.view(), false), array![1.0, 1.0, 1.0, 1.0]);
    }
}
