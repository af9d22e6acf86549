//! End-to-end baseline run: load, split, then fit and score each model

use super::Pipeline;
use crate::config::{BaselineConfig, POSITIVE_LABEL};
use crate::error::Result;
use crate::evaluation::{evaluate, EvaluationReport};
use crate::preprocessing::build_preprocessor_for;
use crate::synthetic::Smote;
use crate::training::{default_models, take_labels, take_rows, StratifiedSplitter};
use crate::utils::{split_features_and_labels, DataLoader};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

/// Outcome of fitting and scoring one model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRun {
    /// Model name from the fixed model list
    pub name: String,
    /// Whether SMOTE ran before the classifier
    pub smote: bool,
    /// Metrics on the held-out split
    pub report: EvaluationReport,
    /// Class counts the classifier was trained on
    pub training_class_counts: BTreeMap<i64, usize>,
}

impl ModelRun {
    /// Block header, e.g. `=== LogReg (SMOTE=False) ===`
    pub fn header(&self) -> String {
        format!(
            "=== {} (SMOTE={}) ===",
            self.name,
            if self.smote { "True" } else { "False" }
        )
    }
}

impl fmt::Display for ModelRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.header())?;
        write!(f, "{}", self.report)
    }
}

/// Run every model of the baseline on the configured dataset.
///
/// The first failure aborts the run.
pub fn run(config: &BaselineConfig, use_smote: bool) -> Result<Vec<ModelRun>> {
    let df = DataLoader::new()
        .with_label_column(config.label_column.as_str())
        .load(&config.data_path)?;
    let (features, labels) = split_features_and_labels(&df, &config.label_column)?;

    let split = StratifiedSplitter::new(config.test_size)
        .with_random_state(config.random_state)
        .split(&labels)?;

    let x_train = take_rows(&features, &split.train_indices)?;
    let x_test = take_rows(&features, &split.test_indices)?;
    let y_train = take_labels(&labels, &split.train_indices);
    let y_test = take_labels(&labels, &split.test_indices);

    info!(
        train_rows = y_train.len(),
        test_rows = y_test.len(),
        test_positives = y_test.iter().filter(|&&v| v == POSITIVE_LABEL).count(),
        "Stratified split"
    );

    let mut runs = Vec::new();
    for (name, kind) in default_models(config) {
        let mut pipeline = Pipeline::new(build_preprocessor_for(&config.scaled_columns), kind.build());
        if use_smote {
            pipeline = pipeline.with_resampler(
                Smote::new()
                    .with_sampling_strategy(config.smote_sampling_strategy)
                    .with_k_neighbors(config.smote_k_neighbors)
                    .with_seed(config.random_state),
            );
        }

        pipeline.fit(&x_train, &y_train)?;
        let y_pred = pipeline.predict(&x_test)?;
        let y_proba = pipeline.predict_positive_proba(&x_test)?;
        let report = evaluate(&y_test, &y_pred, &y_proba)?;

        info!(
            model = %name,
            roc_auc = report.roc_auc,
            average_precision = report.average_precision,
            "Model evaluated"
        );

        runs.push(ModelRun {
            name,
            smote: use_smote,
            report,
            training_class_counts: pipeline.training_class_counts().clone(),
        });
    }

    Ok(runs)
}
