//! Per-column statistics fitted on training rows: mean imputation and standardization.

use ndarray::{Array1, Array2, ArrayView2, Axis, Zip};

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnStats {
    mean: Array1<f64>,
    std: Array1<f64>,
}

impl ColumnStats {
    /// Mean and population std of each column, ignoring `NaN`.
    /// All-missing columns get mean 0; constant columns get std 1.
    pub fn fit(x: ArrayView2<'_, f64>) -> Self {
        let mut mean = Array1::zeros(x.ncols());
        let mut std = Array1::ones(x.ncols());
        for (j, column) in x.axis_iter(Axis(1)).enumerate() {
            let present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            if present.is_empty() {
                continue;
            }
            let n = present.len() as f64;
            let m = present.iter().sum::<f64>() / n;
            let var = present.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n;
            mean[j] = m;
            if var > f64::EPSILON {
                std[j] = var.sqrt();
            }
        }
        Self { mean, std }
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Replace `NaN` with the column mean.
    pub fn impute(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for (mut column, &m) in out.axis_iter_mut(Axis(1)).zip(self.mean.iter()) {
            column.mapv_inplace(|v| if v.is_nan() { m } else { v });
        }
        out
    }

    /// Center and scale; missing values land on 0 (the mean).
    pub fn standardize(&self, x: ArrayView2<'_, f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for mut row in out.axis_iter_mut(Axis(0)) {
            Zip::from(&mut row)
                .and(&self.mean)
                .and(&self.std)
                .for_each(|v, &m, &s| *v = if v.is_nan() { 0.0 } else { (*v - m) / s });
        }
        out
    }
}
