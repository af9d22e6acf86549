//! Run configuration
//!
//! All values are fixed at build time; the CLI only selects the data path
//! and whether SMOTE is applied.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default location of the input table
pub const DEFAULT_DATA_PATH: &str = "./data/creditcard.csv";

/// Name of the binary label column (1 = fraud)
pub const LABEL_COLUMN: &str = "Class";

/// Label value of the fraud class, scored by ROC-AUC and average precision
pub const POSITIVE_LABEL: i64 = 1;

/// Columns that get median imputation and standard scaling.
/// V1..V28 are already PCA-like and pass through.
pub const SCALED_COLUMNS: [&str; 2] = ["Time", "Amount"];

/// Fraction of rows held out for evaluation
pub const TEST_SIZE: f64 = 0.2;

/// Seed shared by the split, SMOTE and the random forest
pub const RANDOM_STATE: u64 = 42;

/// SMOTE target: minority count as a fraction of the majority count
pub const SMOTE_SAMPLING_STRATEGY: f64 = 0.2;

/// Neighbors considered when interpolating synthetic rows
pub const SMOTE_K_NEIGHBORS: usize = 5;

/// Iteration cap for logistic regression
pub const LOGREG_MAX_ITER: usize = 500;

/// Number of trees in the random forest
pub const FOREST_N_ESTIMATORS: usize = 300;

/// Configuration for a baseline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// Input CSV path
    pub data_path: PathBuf,
    /// Label column name
    pub label_column: String,
    /// Columns to impute and scale
    pub scaled_columns: Vec<String>,
    /// Test fraction for the stratified split
    pub test_size: f64,
    /// Random seed for reproducibility
    pub random_state: u64,
    /// SMOTE sampling ratio (minority / majority)
    pub smote_sampling_strategy: f64,
    /// SMOTE neighbor count
    pub smote_k_neighbors: usize,
    /// Logistic regression iteration cap
    pub logreg_max_iter: usize,
    /// Random forest size
    pub forest_n_estimators: usize,
}

impl Default for BaselineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            label_column: LABEL_COLUMN.to_string(),
            scaled_columns: SCALED_COLUMNS.iter().map(|s| s.to_string()).collect(),
            test_size: TEST_SIZE,
            random_state: RANDOM_STATE,
            smote_sampling_strategy: SMOTE_SAMPLING_STRATEGY,
            smote_k_neighbors: SMOTE_K_NEIGHBORS,
            logreg_max_iter: LOGREG_MAX_ITER,
            forest_n_estimators: FOREST_N_ESTIMATORS,
        }
    }
}

impl BaselineConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the data path
    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    /// Builder method to set the forest size
    pub fn with_forest_n_estimators(mut self, n_estimators: usize) -> Self {
        self.forest_n_estimators = n_estimators;
        self
    }

    /// Builder method to set the random seed
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
}
