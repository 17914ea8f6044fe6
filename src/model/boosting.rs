//! Gradient-boosted regression trees on the logistic loss (Newton leaf values).

use super::preprocess::ColumnStats;
use super::{check_training_data, sigmoid, Classifier};
use crate::error::TrainError;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

const MIN_CHILD_WEIGHT: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostingParams {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub max_depth: usize,
    /// Fraction of rows drawn (without replacement) per tree
    pub subsample: f64,
    /// Fraction of feature columns a tree may split on
    pub colsample: f64,
    /// L2 penalty on leaf values
    pub lambda: f64,
}

impl Default for BoostingParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            subsample: 1.0,
            colsample: 1.0,
            lambda: 1.0,
        }
    }
}

/// Rounded share of `n`, clamped to `1..=n`.
fn sample_size(n: usize, fraction: f64) -> usize {
    ((n as f64 * fraction).round() as usize).clamp(1, n)
}

#[derive(Debug, Clone)]
enum Node {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn predict_row(&self, row: ArrayView1<'_, f64>) -> f64 {
        let mut i = 0;
        loop {
            match self.nodes[i] {
                Node::Leaf(v) => return v,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => i = if row[feature] <= threshold { left } else { right },
            }
        }
    }
}

/// Grows one tree over `rows` from first and second order gradients.
struct TreeBuilder<'a> {
    x: &'a Array2<f64>,
    /// Columns this tree may split on
    features: &'a [usize],
    grad: &'a [f64],
    hess: &'a [f64],
    max_depth: usize,
    lambda: f64,
    nodes: Vec<Node>,
}

impl TreeBuilder<'_> {
    fn leaf_value(&self, rows: &[usize]) -> f64 {
        let g: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        g / (h + self.lambda)
    }

    fn score(&self, g: f64, h: f64) -> f64 {
        g * g / (h + self.lambda)
    }

    /// Best (gain, feature, threshold) over all features, if any split helps.
    fn best_split(&self, rows: &[usize]) -> Option<(f64, usize, f64)> {
        let g_total: f64 = rows.iter().map(|&r| self.grad[r]).sum();
        let h_total: f64 = rows.iter().map(|&r| self.hess[r]).sum();
        let parent = self.score(g_total, h_total);

        let mut best: Option<(f64, usize, f64)> = None;
        let mut sorted = rows.to_vec();
        for &feature in self.features {
            sorted.sort_by(|&a, &b| self.x[[a, feature]].total_cmp(&self.x[[b, feature]]));
            let (mut g_left, mut h_left) = (0.0, 0.0);
            for pair in sorted.windows(2) {
                let (r, next) = (pair[0], pair[1]);
                g_left += self.grad[r];
                h_left += self.hess[r];
                let (v, v_next) = (self.x[[r, feature]], self.x[[next, feature]]);
                if v == v_next {
                    continue;
                }
                let (g_right, h_right) = (g_total - g_left, h_total - h_left);
                if h_left < MIN_CHILD_WEIGHT || h_right < MIN_CHILD_WEIGHT {
                    continue;
                }
                let gain = self.score(g_left, h_left) + self.score(g_right, h_right) - parent;
                if gain > best.map_or(1e-12, |(b, _, _)| b) {
                    best = Some((gain, feature, (v + v_next) / 2.0));
                }
            }
        }
        best
    }

    fn grow(&mut self, rows: &[usize], depth: usize) -> usize {
        let id = self.nodes.len();
        self.nodes.push(Node::Leaf(self.leaf_value(rows)));
        if depth >= self.max_depth || rows.len() < 2 {
            return id;
        }
        let Some((_, feature, threshold)) = self.best_split(rows) else {
            return id;
        };
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&r| self.x[[r, feature]] <= threshold);
        let left = self.grow(&left_rows, depth + 1);
        let right = self.grow(&right_rows, depth + 1);
        self.nodes[id] = Node::Split {
            feature,
            threshold,
            left,
            right,
        };
        id
    }
}

#[derive(Debug, Clone)]
pub struct GradientBoosting {
    params: BoostingParams,
    seed: u64,
    stats: Option<ColumnStats>,
    base_score: f64,
    trees: Vec<Tree>,
}

impl GradientBoosting {
    pub fn new(params: BoostingParams, seed: u64) -> Self {
        Self {
            params,
            seed,
            stats: None,
            base_score: 0.0,
            trees: Vec::new(),
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn raw_scores(&self, x: &Array2<f64>) -> Array1<f64> {
        let lr = self.params.learning_rate;
        Array1::from_iter(x.rows().into_iter().map(|row| {
            self.base_score + lr * self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>()
        }))
    }
}

impl Classifier for GradientBoosting {
    fn fit(&mut self, x: ArrayView2<'_, f64>, y: ArrayView1<'_, f64>) -> Result<(), TrainError> {
        check_training_data(x, y)?;
        for (name, fraction) in [
            ("subsample", self.params.subsample),
            ("colsample", self.params.colsample),
        ] {
            if !(fraction > 0.0 && fraction <= 1.0) {
                return Err(TrainError::InvalidData(format!(
                    "{name} {fraction} outside (0, 1]"
                )));
            }
        }
        let stats = ColumnStats::fit(x);
        let xi = stats.impute(x);
        let (n, n_features) = xi.dim();

        let pos_rate = y.sum() / n as f64;
        self.base_score = (pos_rate / (1.0 - pos_rate)).ln();
        self.trees.clear();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let per_tree = sample_size(n, self.params.subsample);
        let features_per_tree = sample_size(n_features, self.params.colsample);
        let mut scores = Array1::from_elem(n, self.base_score);
        let mut grad = vec![0.0; n];
        let mut hess = vec![0.0; n];

        for _ in 0..self.params.n_estimators {
            for i in 0..n {
                let p = sigmoid(scores[i]);
                grad[i] = y[i] - p;
                hess[i] = p * (1.0 - p);
            }
            let rows: Vec<usize> = if per_tree == n {
                (0..n).collect()
            } else {
                sample(&mut rng, n, per_tree).into_vec()
            };
            let features: Vec<usize> = if features_per_tree == n_features {
                (0..n_features).collect()
            } else {
                let mut drawn = sample(&mut rng, n_features, features_per_tree).into_vec();
                drawn.sort_unstable();
                drawn
            };

            let mut builder = TreeBuilder {
                x: &xi,
                features: &features,
                grad: &grad,
                hess: &hess,
                max_depth: self.params.max_depth,
                lambda: self.params.lambda,
                nodes: Vec::new(),
            };
            builder.grow(&rows, 0);
            let tree = Tree {
                nodes: builder.nodes,
            };

            for (i, row) in xi.rows().into_iter().enumerate() {
                scores[i] += self.params.learning_rate * tree.predict_row(row);
            }
            self.trees.push(tree);
        }

        self.stats = Some(stats);
        Ok(())
    }

    fn predict_proba(&self, x: ArrayView2<'_, f64>) -> Array1<f64> {
        match &self.stats {
            Some(stats) if stats.n_features() == x.ncols() => {
                self.raw_scores(&stats.impute(x)).mapv(sigmoid)
            }
            _ => Array1::from_elem(x.nrows(), 0.5),
        }
    }
}

#[cfg(test)]
impl Tree {
    fn split_features(&self) -> std::collections::BTreeSet<usize> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Split { feature, .. } => Some(*feature),
                Node::Leaf(_) => None,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_threshold_on_one_feature() {
        // label is 1 iff the second feature exceeds 5
        let x = Array2::from_shape_fn((30, 2), |(r, c)| {
            if c == 0 {
                (r % 3) as f64
            } else {
                (r % 10) as f64
            }
        });
        let y = x.column(1).mapv(|v| if v > 5.0 { 1.0 } else { 0.0 });
        let mut model = GradientBoosting::new(BoostingParams::default(), 42);
        model.fit(x.view(), y.view()).unwrap();

        assert_eq!(model.n_trees(), 100);
        assert_eq!(model.predict(x.view()), y);
    }

    #[test]
    fn test_missing_values_are_imputed() {
        let x = array![[0.0], [1.0], [f64::NAN], [9.0], [10.0], [11.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let params = BoostingParams {
            subsample: 0.8,
            ..BoostingParams::default()
        };
        let mut model = GradientBoosting::new(params, 7);
        model.fit(x.view(), y.view()).unwrap();
        let p = model.predict_proba(array![[0.5], [10.5]].view());
        assert!(p[0] < 0.5 && p[1] > 0.5);
    }

    #[test]
    fn test_rejects_bad_subsample() {
        let params = BoostingParams {
            subsample: 0.0,
            ..BoostingParams::default()
        };
        let mut model = GradientBoosting::new(params, 1);
        let err = model
            .fit(array![[0.0], [1.0]].view(), array![0.0, 1.0].view())
            .unwrap_err();
        assert!(matches!(err, TrainError::InvalidData(_)));
    }

    #[test]
    fn test_colsample_restricts_each_tree() {
        // every column separates the classes on its own
        let x = Array2::from_shape_fn((40, 4), |(r, c)| r as f64 + c as f64 * 0.5);
        let y = Array1::from_shape_fn(40, |r| if r >= 20 { 1.0 } else { 0.0 });
        let params = BoostingParams {
            n_estimators: 20,
            colsample: 0.25,
            ..BoostingParams::default()
        };
        let mut model = GradientBoosting::new(params, 3);
        model.fit(x.view(), y.view()).unwrap();

        let mut used = std::collections::BTreeSet::new();
        for tree in &model.trees {
            let features = tree.split_features();
            assert!(features.len() <= 1, "tree split on {features:?}");
            used.extend(features);
        }
        assert!(used.len() > 1);
        assert_eq!(model.predict(x.view()), y);
    }

    #[test]
    fn test_rejects_bad_colsample() {
        let params = BoostingParams {
            colsample: 1.5,
            ..BoostingParams::default()
        };
        let mut model = GradientBoosting::new(params, 1);
        assert!(model
            .fit(array![[0.0], [1.0]].view(), array![0.0, 1.0].view())
            .is_err());
    }
}
