//! Random Forest classifier

use crate::error::{BaselineError, Result};
use super::decision_tree::{argmax, DecisionTree};
use super::models::{balanced_weights, unique_classes, Classifier};
use ndarray::{Array1, Array2};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Random Forest model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    /// Individual trees
    trees: Vec<DecisionTree>,
    /// Number of trees
    pub n_estimators: usize,
    /// Maximum depth per tree
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Recompute balanced class weights on each bootstrap sample
    pub balanced_subsample: bool,
    /// Random state; tree `t` is seeded with `random_state + t`
    pub random_state: Option<u64>,
    n_features: usize,
    classes: Vec<i64>,
}

/// Features scanned per split: floor(sqrt(n_features)), at least one
pub fn sqrt_features(n_features: usize) -> usize {
    ((n_features as f64).sqrt().floor() as usize).max(1)
}

impl Default for RandomForest {
    fn default() -> Self {
        Self::new_classifier(100)
    }
}

impl RandomForest {
    /// Create a new random forest classifier
    pub fn new_classifier(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            balanced_subsample: false,
            random_state: None,
            n_features: 0,
            classes: Vec::new(),
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Weight classes as `n / (n_classes * count_c)` within each bootstrap sample
    pub fn with_balanced_subsample(mut self, enabled: bool) -> Self {
        self.balanced_subsample = enabled;
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Get number of trees
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    /// Grow one tree on its own bootstrap sample
    fn grow_tree(
        &self,
        x: &Array2<f64>,
        y_idx: &[usize],
        seed: u64,
        max_features: usize,
    ) -> Result<DecisionTree> {
        let n_samples = x.nrows();
        let n_classes = self.classes.len();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);

        let mut counts = vec![0u32; n_samples];
        for _ in 0..n_samples {
            counts[rng.gen_range(0..n_samples)] += 1;
        }

        let class_factor = if self.balanced_subsample {
            let mut class_counts = vec![0.0; n_classes];
            for (i, &c) in counts.iter().enumerate() {
                class_counts[y_idx[i]] += c as f64;
            }
            balanced_weights(&class_counts)
        } else {
            vec![1.0; n_classes]
        };

        let weights: Vec<f64> = counts
            .iter()
            .zip(y_idx.iter())
            .map(|(&c, &k)| c as f64 * class_factor[k])
            .collect();
        let rows: Vec<usize> = (0..n_samples).filter(|&i| counts[i] > 0).collect();

        let mut tree = DecisionTree::new_classifier()
            .with_min_samples_split(self.min_samples_split)
            .with_min_samples_leaf(self.min_samples_leaf)
            .with_max_features(max_features);
        if let Some(d) = self.max_depth {
            tree = tree.with_max_depth(d);
        }

        tree.fit_rows(x, y_idx, &self.classes, rows, &weights, &mut rng)?;
        Ok(tree)
    }
}

impl Classifier for RandomForest {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.n_estimators == 0 {
            return Err(BaselineError::InvalidParameter {
                name: "n_estimators".to_string(),
                value: "0".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if n_samples == 0 {
            return Err(BaselineError::TrainingError("empty training set".to_string()));
        }

        self.classes = unique_classes(y);
        self.n_features = n_features;
        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| self.classes.binary_search(v).unwrap_or(0))
            .collect();

        let max_features = sqrt_features(n_features);
        let base_seed = self.random_state.unwrap_or_else(rand::random);

        debug!(
            n_estimators = self.n_estimators,
            max_features,
            n_samples,
            "Growing random forest"
        );

        let this = &*self;
        let trees = (0..this.n_estimators)
            .into_par_iter()
            .map(|t| {
                let seed = base_seed.wrapping_add(t as u64);
                this.grow_tree(x, &y_idx, seed, max_features)
            })
            .collect::<Result<Vec<DecisionTree>>>()?;

        self.trees = trees;
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())])
            .collect())
    }

    /// Mean of the per-tree leaf class distributions
    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        if self.trees.is_empty() {
            return Err(BaselineError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(BaselineError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let n_classes = self.classes.len();
        let n_trees = self.trees.len() as f64;

        // Trees are summed in a fixed order per row so results do not
        // depend on thread scheduling
        let rows = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let sample = x.row(i);
                let mut acc = vec![0.0; n_classes];
                for tree in &self.trees {
                    let dist = tree.leaf_distribution(sample)?;
                    for (a, p) in acc.iter_mut().zip(dist) {
                        *a += p;
                    }
                }
                acc.iter_mut().for_each(|a| *a /= n_trees);
                Ok(acc)
            })
            .collect::<Result<Vec<Vec<f64>>>>()?;

        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        Ok(Array2::from_shape_vec((x.nrows(), n_classes), flat)?)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn name(&self) -> &str {
        "RandomForest"
    }
}
