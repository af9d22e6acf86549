//! Model evaluation on the held-out split
//!
//! - ROC-AUC and average precision from positive-class probabilities
//! - Per-class precision/recall/F1 at the hard predictions

pub mod metrics;
mod report;

pub use metrics::{
    average_precision, classification_summary, roc_auc, AverageMetrics, ClassMetrics,
    ClassificationSummary,
};
pub use report::EvaluationReport;

use crate::config::POSITIVE_LABEL;
use crate::error::{BaselineError, Result};
use ndarray::Array1;
use tracing::debug;

/// Score hard predictions and positive-class probabilities against the truth
pub fn evaluate(
    y_true: &Array1<i64>,
    y_pred: &Array1<i64>,
    y_proba: &Array1<f64>,
) -> Result<EvaluationReport> {
    if y_true.len() != y_pred.len() || y_true.len() != y_proba.len() {
        return Err(BaselineError::ShapeError {
            expected: format!("{} predictions and probabilities", y_true.len()),
            actual: format!("{} predictions, {} probabilities", y_pred.len(), y_proba.len()),
        });
    }

    let report = EvaluationReport {
        roc_auc: roc_auc(y_true, y_proba, POSITIVE_LABEL)?,
        average_precision: average_precision(y_true, y_proba, POSITIVE_LABEL)?,
        summary: classification_summary(y_true, y_pred)?,
    };

    debug!(
        roc_auc = report.roc_auc,
        average_precision = report.average_precision,
        accuracy = report.summary.accuracy,
        "Evaluated predictions"
    );

    Ok(report)
}
