//! fraud-baseline - baseline classifiers for imbalanced fraud data
//!
//! Loads a labeled transaction table, makes a stratified train/test split,
//! and fits two pipelines (logistic regression and random forest) with an
//! optional SMOTE stage, reporting ROC-AUC, average precision and a
//! per-class precision/recall/F1 table for each.
//!
//! # Modules
//!
//! - [`utils`] - CSV loading and label extraction
//! - [`preprocessing`] - Median imputation and standard scaling of selected columns
//! - [`synthetic`] - SMOTE oversampling
//! - [`training`] - Stratified split, classifiers and the model factory
//! - [`evaluation`] - Ranking and classification metrics
//! - [`pipeline`] - Fit/predict pipeline and the end-to-end runner
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;
pub mod config;

// Core ML modules
pub mod utils;
pub mod preprocessing;
pub mod synthetic;
pub mod training;
pub mod evaluation;
pub mod pipeline;

// Services
pub mod cli;

pub use error::{BaselineError, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::BaselineConfig;
    pub use crate::error::{BaselineError, Result};
    pub use crate::evaluation::{evaluate, EvaluationReport};
    pub use crate::pipeline::{run, ModelRun, Pipeline};
    pub use crate::preprocessing::{build_preprocessor, ColumnTransformer};
    pub use crate::synthetic::{Sampler, Smote};
    pub use crate::training::{default_models, Classifier, ModelKind};
    pub use crate::utils::{load_data, split_features_and_labels};
}
