//! Ranking and classification metrics for binary labels

use crate::error::{BaselineError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

fn check_lengths(expected: usize, actual: usize, what: &str) -> Result<()> {
    if expected != actual {
        return Err(BaselineError::ShapeError {
            expected: format!("{} length = {}", what, expected),
            actual: format!("{} length = {}", what, actual),
        });
    }
    Ok(())
}

/// Cumulative false and true positive counts at each distinct score
/// threshold, highest threshold first.
fn binary_clf_curve(
    y_true: &Array1<i64>,
    scores: &Array1<f64>,
    positive: i64,
) -> Result<(Vec<f64>, Vec<f64>)> {
    check_lengths(y_true.len(), scores.len(), "scores")?;
    if scores.iter().any(|s| !s.is_finite()) {
        return Err(BaselineError::ValidationError(
            "scores contain NaN or infinite values".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));

    let mut fps = Vec::new();
    let mut tps = Vec::new();
    let (mut tp, mut fp) = (0.0, 0.0);

    for (pos, &i) in order.iter().enumerate() {
        if y_true[i] == positive {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_threshold = order
            .get(pos + 1)
            .map_or(true, |&next| scores[next] != scores[i]);
        if last_of_threshold {
            tps.push(tp);
            fps.push(fp);
        }
    }

    Ok((fps, tps))
}

fn require_both_classes(y_true: &Array1<i64>, positive: i64, metric: &str) -> Result<()> {
    let n_pos = y_true.iter().filter(|&&v| v == positive).count();
    if n_pos == 0 || n_pos == y_true.len() {
        return Err(BaselineError::ValidationError(format!(
            "Only one class present in y_true. {} is not defined in that case.",
            metric
        )));
    }
    Ok(())
}

/// Area under the ROC curve.
///
/// Tied scores form a single threshold, so ties contribute a diagonal
/// segment (trapezoidal rule).
pub fn roc_auc(y_true: &Array1<i64>, scores: &Array1<f64>, positive: i64) -> Result<f64> {
    require_both_classes(y_true, positive, "ROC AUC score")?;
    let (fps, tps) = binary_clf_curve(y_true, scores, positive)?;

    let n_neg = fps.last().copied().unwrap_or(0.0);
    let n_pos = tps.last().copied().unwrap_or(0.0);

    let mut area = 0.0;
    let (mut prev_fpr, mut prev_tpr) = (0.0, 0.0);
    for (fp, tp) in fps.iter().zip(tps.iter()) {
        let fpr = fp / n_neg;
        let tpr = tp / n_pos;
        area += (fpr - prev_fpr) * (tpr + prev_tpr) / 2.0;
        prev_fpr = fpr;
        prev_tpr = tpr;
    }

    Ok(area)
}

/// Average precision: `sum_n (R_n - R_{n-1}) * P_n` over thresholds in
/// decreasing order, without interpolation.
pub fn average_precision(y_true: &Array1<i64>, scores: &Array1<f64>, positive: i64) -> Result<f64> {
    require_both_classes(y_true, positive, "Average precision")?;
    let (fps, tps) = binary_clf_curve(y_true, scores, positive)?;
    let n_pos = tps.last().copied().unwrap_or(0.0);

    let mut ap = 0.0;
    let mut prev_recall = 0.0;
    for (fp, tp) in fps.iter().zip(tps.iter()) {
        let precision = tp / (tp + fp);
        let recall = tp / n_pos;
        ap += (recall - prev_recall) * precision;
        prev_recall = recall;
    }

    Ok(ap)
}

/// Precision, recall and F1 for one class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub label: i64,
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
    pub support: usize,
}

/// Averaged precision, recall and F1
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AverageMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

/// Per-class breakdown plus accuracy, macro and support-weighted averages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationSummary {
    pub classes: Vec<ClassMetrics>,
    pub accuracy: f64,
    pub macro_avg: AverageMetrics,
    pub weighted_avg: AverageMetrics,
    pub support: usize,
}

fn safe_div(num: f64, den: f64) -> f64 {
    if den > 0.0 {
        num / den
    } else {
        0.0
    }
}

/// Per-class precision/recall/F1 over the union of labels in `y_true` and
/// `y_pred`. A zero denominator yields 0.0.
pub fn classification_summary(y_true: &Array1<i64>, y_pred: &Array1<i64>) -> Result<ClassificationSummary> {
    check_lengths(y_true.len(), y_pred.len(), "y_pred")?;
    if y_true.is_empty() {
        return Err(BaselineError::ValidationError(
            "cannot summarize an empty prediction set".to_string(),
        ));
    }

    let mut labels: Vec<i64> = y_true.iter().chain(y_pred.iter()).copied().collect();
    labels.sort_unstable();
    labels.dedup();

    let classes: Vec<ClassMetrics> = labels
        .iter()
        .map(|&label| {
            let (mut tp, mut fp, mut fn_) = (0usize, 0usize, 0usize);
            for (&t, &p) in y_true.iter().zip(y_pred.iter()) {
                match (t == label, p == label) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => {}
                }
            }
            let precision = safe_div(tp as f64, (tp + fp) as f64);
            let recall = safe_div(tp as f64, (tp + fn_) as f64);
            ClassMetrics {
                label,
                precision,
                recall,
                f1_score: safe_div(2.0 * precision * recall, precision + recall),
                support: tp + fn_,
            }
        })
        .collect();

    let n = y_true.len();
    let correct = y_true.iter().zip(y_pred.iter()).filter(|(t, p)| t == p).count();

    let k = classes.len() as f64;
    let macro_avg = AverageMetrics {
        precision: classes.iter().map(|c| c.precision).sum::<f64>() / k,
        recall: classes.iter().map(|c| c.recall).sum::<f64>() / k,
        f1_score: classes.iter().map(|c| c.f1_score).sum::<f64>() / k,
    };

    let weighted = |f: fn(&ClassMetrics) -> f64| {
        classes.iter().map(|c| f(c) * c.support as f64).sum::<f64>() / n as f64
    };
    let weighted_avg = AverageMetrics {
        precision: weighted(|c| c.precision),
        recall: weighted(|c| c.recall),
        f1_score: weighted(|c| c.f1_score),
    };

    Ok(ClassificationSummary {
        accuracy: correct as f64 / n as f64,
        macro_avg,
        weighted_avg,
        support: n,
        classes,
    })
}
