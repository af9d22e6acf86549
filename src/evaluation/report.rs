//! Evaluation report and its text rendering

use super::metrics::{AverageMetrics, ClassificationSummary};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Digits after the decimal point in the per-class table
const DIGITS: usize = 4;

/// Metrics for one model on the held-out split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Area under the ROC curve of the positive-class probability
    pub roc_auc: f64,
    /// Average precision (area under the precision-recall curve)
    pub average_precision: f64,
    /// Per-class breakdown at the hard predictions
    pub summary: ClassificationSummary,
}

impl EvaluationReport {
    /// Every metric keyed by name
    pub fn to_metric_map(&self) -> BTreeMap<String, f64> {
        let mut map = BTreeMap::new();
        map.insert("roc_auc".to_string(), self.roc_auc);
        map.insert("average_precision".to_string(), self.average_precision);
        map.insert("accuracy".to_string(), self.summary.accuracy);

        for class in &self.summary.classes {
            map.insert(format!("{}_precision", class.label), class.precision);
            map.insert(format!("{}_recall", class.label), class.recall);
            map.insert(format!("{}_f1_score", class.label), class.f1_score);
            map.insert(format!("{}_support", class.label), class.support as f64);
        }

        for (prefix, avg) in [
            ("macro_avg", &self.summary.macro_avg),
            ("weighted_avg", &self.summary.weighted_avg),
        ] {
            map.insert(format!("{}_precision", prefix), avg.precision);
            map.insert(format!("{}_recall", prefix), avg.recall);
            map.insert(format!("{}_f1_score", prefix), avg.f1_score);
        }

        map
    }

    /// Recall of the class with label `label`, if it appeared
    pub fn recall_of(&self, label: i64) -> Option<f64> {
        self.summary
            .classes
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.recall)
    }

    /// The per-class precision/recall/F1 table
    pub fn classification_table(&self) -> String {
        let s = &self.summary;
        let labels: Vec<String> = s.classes.iter().map(|c| c.label.to_string()).collect();
        let width = labels
            .iter()
            .map(|l| l.len())
            .chain(["weighted avg".len(), DIGITS])
            .max()
            .unwrap_or(0);

        let mut out = format!(
            "{:>width$}  {:>9} {:>9} {:>9} {:>9}\n\n",
            "", "precision", "recall", "f1-score", "support",
            width = width
        );

        for (label, c) in labels.iter().zip(s.classes.iter()) {
            out.push_str(&row(label, c.precision, c.recall, c.f1_score, c.support, width));
        }
        out.push('\n');

        out.push_str(&format!(
            "{:>width$}  {:>9} {:>9} {:>9.prec$} {:>9}\n",
            "accuracy", "", "", s.accuracy, s.support,
            width = width,
            prec = DIGITS
        ));
        out.push_str(&avg_row("macro avg", &s.macro_avg, s.support, width));
        out.push_str(&avg_row("weighted avg", &s.weighted_avg, s.support, width));
        out
    }
}

fn row(name: &str, precision: f64, recall: f64, f1: f64, support: usize, width: usize) -> String {
    format!(
        "{:>width$}  {:>9.prec$} {:>9.prec$} {:>9.prec$} {:>9}\n",
        name, precision, recall, f1, support,
        width = width,
        prec = DIGITS
    )
}

fn avg_row(name: &str, avg: &AverageMetrics, support: usize, width: usize) -> String {
    row(name, avg.precision, avg.recall, avg.f1_score, support, width)
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ROC-AUC : {:?}", self.roc_auc)?;
        writeln!(f, "PR  AUC: {:?}", self.average_precision)?;
        write!(f, "{}", self.classification_table())
    }
}
