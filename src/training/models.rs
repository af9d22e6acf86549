//! Classifier trait, class weighting and the model factory

use crate::config::{BaselineConfig, FOREST_N_ESTIMATORS, LOGREG_MAX_ITER, RANDOM_STATE};
use crate::error::{BaselineError, Result};
use super::linear_models::LogisticRegression;
use super::random_forest::RandomForest;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Common interface of the trainable classifiers
pub trait Classifier: Send + Sync {
    /// Fit the model
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()>;

    /// Predict hard class labels
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>>;

    /// Predict class probabilities, one column per entry of `classes()`
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>>;

    /// Sorted class labels seen at fit time
    fn classes(&self) -> &[i64];

    /// Human readable model name
    fn name(&self) -> &str;

    /// Probability of `positive` for each row
    fn positive_proba(&self, x: &Array2<f64>, positive: i64) -> Result<Array1<f64>> {
        let col = self
            .classes()
            .iter()
            .position(|&c| c == positive)
            .ok_or_else(|| {
                BaselineError::ValidationError(format!(
                    "class {} was not seen during fit (classes: {:?})",
                    positive,
                    self.classes()
                ))
            })?;
        Ok(self.predict_proba(x)?.column(col).to_owned())
    }
}

/// Class weighting scheme for logistic regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample weighs 1
    Uniform,
    /// `n_samples / (n_classes * count_c)` over the training set
    Balanced,
}

/// Sorted unique labels
pub fn unique_classes(y: &Array1<i64>) -> Vec<i64> {
    let mut classes: Vec<i64> = y.iter().copied().collect();
    classes.sort_unstable();
    classes.dedup();
    classes
}

/// Balanced weight per class from (possibly weighted) class counts.
/// Classes with a zero count get weight 0.
pub fn balanced_weights(counts: &[f64]) -> Vec<f64> {
    let total: f64 = counts.iter().sum();
    let n_present = counts.iter().filter(|&&c| c > 0.0).count() as f64;
    counts
        .iter()
        .map(|&c| if c > 0.0 { total / (n_present * c) } else { 0.0 })
        .collect()
}

/// The two classifier families of the baseline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelKind {
    LogisticRegression { max_iter: usize },
    RandomForest { n_estimators: usize, random_state: u64 },
}

impl ModelKind {
    /// Build an untrained classifier
    pub fn build(&self) -> Box<dyn Classifier> {
        match self {
            ModelKind::LogisticRegression { max_iter } => Box::new(
                LogisticRegression::new()
                    .with_max_iter(*max_iter)
                    .with_class_weight(ClassWeight::Balanced),
            ),
            ModelKind::RandomForest { n_estimators, random_state } => Box::new(
                RandomForest::new_classifier(*n_estimators)
                    .with_balanced_subsample(true)
                    .with_random_state(*random_state),
            ),
        }
    }
}

/// Logistic regression: 500 iterations, balanced class weights
pub fn make_logistic_regression() -> Box<dyn Classifier> {
    ModelKind::LogisticRegression { max_iter: LOGREG_MAX_ITER }.build()
}

/// Random forest: 300 trees, balanced_subsample weights, seed 42, all cores
pub fn make_random_forest() -> Box<dyn Classifier> {
    ModelKind::RandomForest {
        n_estimators: FOREST_N_ESTIMATORS,
        random_state: RANDOM_STATE,
    }
    .build()
}

/// Fixed, ordered list of (name, model) pairs evaluated by the runner
pub fn default_models(config: &BaselineConfig) -> Vec<(String, ModelKind)> {
    vec![
        (
            "LogReg".to_string(),
            ModelKind::LogisticRegression { max_iter: config.logreg_max_iter },
        ),
        (
            "RandForest".to_string(),
            ModelKind::RandomForest {
                n_estimators: config.forest_n_estimators,
                random_state: config.random_state,
            },
        ),
    ]
}
