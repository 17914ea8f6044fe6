//! Binary classification metrics. Labels and predictions are 0.0 / 1.0.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Area under the ROC curve via the rank-sum statistic; ties share their average rank.
/// `None` when only one class is present.
pub fn roc_auc(y_true: ArrayView1<'_, f64>, scores: ArrayView1<'_, f64>) -> Option<f64> {
    let n_pos = y_true.iter().filter(|&&y| y == 1.0).count();
    let n_neg = y_true.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[a].total_cmp(&scores[b]));

    let mut rank_sum_pos = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && scores[order[j + 1]] == scores[order[i]] {
            j += 1;
        }
        // ranks are 1-based; the tie group i..=j shares the mean rank
        let rank = (i + j) as f64 / 2.0 + 1.0;
        let positives = order[i..=j].iter().filter(|&&k| y_true[k] == 1.0).count();
        rank_sum_pos += rank * positives as f64;
        i = j + 1;
    }

    let (p, n) = (n_pos as f64, n_neg as f64);
    Some((rank_sum_pos - p * (p + 1.0) / 2.0) / (p * n))
}

/// Mean of per-class recall over the classes present in `y_true`.
pub fn balanced_accuracy(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    let recalls: Vec<f64> = [0.0, 1.0]
        .iter()
        .filter_map(|&class| {
            let support = y_true.iter().filter(|&&y| y == class).count();
            if support == 0 {
                return None;
            }
            let hits = y_true
                .iter()
                .zip(y_pred.iter())
                .filter(|(&t, &p)| t == class && p == class)
                .count();
            Some(hits as f64 / support as f64)
        })
        .collect();
    if recalls.is_empty() {
        return 0.0;
    }
    recalls.iter().sum::<f64>() / recalls.len() as f64
}

/// Positive predictive value; 0 when nothing is predicted positive.
pub fn precision(y_true: ArrayView1<'_, f64>, y_pred: ArrayView1<'_, f64>) -> f64 {
    let predicted = y_pred.iter().filter(|&&p| p == 1.0).count();
    if predicted == 0 {
        return 0.0;
    }
    let true_pos = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(&t, &p)| t == 1.0 && p == 1.0)
        .count();
    true_pos as f64 / predicted as f64
}

/// Hold-out scores for a fitted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub roc_auc: Option<f64>,
    pub balanced_accuracy: f64,
    pub precision: f64,
}
