//! Model training module
//!
//! - Stratified train/test splitting
//! - L2-regularized logistic regression
//! - Weighted Gini decision trees and random forests
//! - The `Classifier` trait and the model factory used by the runner

mod models;
pub mod decision_tree;
pub mod linear_models;
pub mod random_forest;
pub mod split;

pub use decision_tree::{DecisionTree, TreeNode};
pub use linear_models::LogisticRegression;
pub use models::{
    balanced_weights, default_models, make_logistic_regression, make_random_forest,
    unique_classes, ClassWeight, Classifier, ModelKind,
};
pub use random_forest::{sqrt_features, RandomForest};
pub use split::{take_labels, take_rows, StratifiedSplitter, TrainTestSplit};
