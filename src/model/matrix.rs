//! Feature table → dense matrix hand-off for the training stage.

use crate::error::{FeatureError, TrainError};
use crate::table::{Column, Dataset};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Numeric features; null cells are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    names: Vec<String>,
    values: Array2<f64>,
}

impl FeatureMatrix {
    pub fn new(names: Vec<String>, values: Array2<f64>) -> Result<Self, TrainError> {
        if names.len() != values.ncols() {
            return Err(TrainError::InvalidData(format!(
                "{} names for {} feature columns",
                names.len(),
                values.ncols()
            )));
        }
        Ok(Self { names, values })
    }

    /// Every integer column except `exclude`. Text, datetime, and list columns are skipped.
    pub fn from_dataset(dataset: &Dataset, exclude: &[&str]) -> Result<Self, FeatureError> {
        let selected: Vec<(&str, &[Option<i64>])> = dataset
            .iter()
            .filter(|(name, _)| !exclude.contains(name))
            .filter_map(|(name, column)| column.as_int().map(|v| (name, v)))
            .collect();
        if selected.is_empty() {
            return Err(FeatureError::Schema("no numeric feature columns".into()));
        }
        let values = Array2::from_shape_fn((dataset.n_rows(), selected.len()), |(r, c)| {
            selected[c].1[r].map_or(f64::NAN, |v| v as f64)
        });
        Ok(Self {
            names: selected.iter().map(|(n, _)| n.to_string()).collect(),
            values,
        })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.values.view()
    }

    pub fn n_rows(&self) -> usize {
        self.values.nrows()
    }

    pub fn n_features(&self) -> usize {
        self.values.ncols()
    }

    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            names: self.names.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }
}

/// Split a feature table into features and a 0/1 label vector.
pub fn split_target(
    dataset: &Dataset,
    target: &str,
) -> Result<(FeatureMatrix, Array1<f64>), TrainError> {
    let column = dataset
        .column(target)
        .ok_or_else(|| FeatureError::Schema(format!("missing target column '{target}'")))?;
    let labels = match column {
        Column::Int(v) => v,
        other => {
            return Err(TrainError::InvalidData(format!(
                "target '{target}' is {}, expected int",
                other.kind()
            )))
        }
    };
    let y = labels
        .iter()
        .enumerate()
        .map(|(row, v)| match v {
            Some(0) => Ok(0.0),
            Some(1) => Ok(1.0),
            Some(other) => Err(TrainError::InvalidData(format!(
                "target row {row} is {other}, expected 0 or 1"
            ))),
            None => Err(TrainError::InvalidData(format!("target row {row} is null"))),
        })
        .collect::<Result<Array1<f64>, _>>()?;
    let x = FeatureMatrix::from_dataset(dataset, &[target])?;
    Ok((x, y))
}

/// Held-out split produced by [`train_test_split`].
#[derive(Debug, Clone)]
pub struct Split {
    pub x_train: FeatureMatrix,
    pub x_test: FeatureMatrix,
    pub y_train: Array1<f64>,
    pub y_test: Array1<f64>,
}

/// Seeded shuffle, then hold out `ceil(n * test_fraction)` rows.
pub fn train_test_split(
    x: &FeatureMatrix,
    y: &Array1<f64>,
    test_fraction: f64,
    seed: u64,
) -> Result<Split, TrainError> {
    if x.n_rows() != y.len() {
        return Err(TrainError::InvalidData(format!(
            "{} feature rows but {} labels",
            x.n_rows(),
            y.len()
        )));
    }
    if test_fraction.is_nan() || test_fraction <= 0.0 || test_fraction >= 1.0 {
        return Err(TrainError::InvalidData(format!(
            "test fraction {test_fraction} outside (0, 1)"
        )));
    }
    let n = x.n_rows();
    let n_test = ((n as f64) * test_fraction).ceil() as usize;
    if n_test == 0 || n_test >= n {
        return Err(TrainError::InvalidData(format!(
            "cannot hold out {n_test} of {n} rows"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    let (test, train) = order.split_at(n_test);

    Ok(Split {
        x_train: x.select_rows(train),
        x_test: x.select_rows(test),
        y_train: y.select(Axis(0), train),
        y_test: y.select(Axis(0), test),
    })
}
