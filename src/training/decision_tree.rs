//! Weighted CART classification tree

use crate::error::{BaselineError, Result};
use super::models::{unique_classes, Classifier};
use ndarray::{Array1, Array2, ArrayView1};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Feature values closer than this are treated as equal when placing thresholds
const FEATURE_THRESHOLD: f64 = 1e-7;

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node holding the weighted class distribution of its samples
    Leaf {
        distribution: Vec<f64>,
        n_samples: usize,
    },
    /// Internal node; samples with `x[feature_idx] <= threshold` go left
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Decision tree classifier using weighted Gini impurity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    /// Tree root
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at each split (all when None)
    pub max_features: Option<usize>,
    /// Seed for feature sampling in `Classifier::fit`
    pub random_state: Option<u64>,
    n_features: usize,
    classes: Vec<i64>,
}

impl Default for DecisionTree {
    fn default() -> Self {
        Self::new_classifier()
    }
}

impl DecisionTree {
    /// Create a new classifier tree
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
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

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    /// Set the number of features drawn at each split
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Grow the tree on a subset of rows.
    ///
    /// `y` holds class indices into `classes` for every row of `x`, and
    /// `weights` a non-negative weight per row of `x`. Only `rows` take part.
    pub(crate) fn fit_rows(
        &mut self,
        x: &Array2<f64>,
        y: &[usize],
        classes: &[i64],
        rows: Vec<usize>,
        weights: &[f64],
        rng: &mut ChaCha8Rng,
    ) -> Result<()> {
        if x.nrows() != y.len() || x.nrows() != weights.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("{} labels and weights", x.nrows()),
                actual: format!("{} labels, {} weights", y.len(), weights.len()),
            });
        }
        if rows.is_empty() {
            return Err(BaselineError::TrainingError(
                "cannot grow a tree on zero samples".to_string(),
            ));
        }

        let n_features = x.ncols();
        let max_features = self
            .max_features
            .unwrap_or(n_features)
            .clamp(1, n_features.max(1));

        let mut grower = Grower {
            x,
            y,
            weights,
            n_classes: classes.len(),
            max_depth: self.max_depth,
            min_samples_split: self.min_samples_split.max(2),
            min_samples_leaf: self.min_samples_leaf.max(1),
            max_features,
            rng,
            sorted: Vec::with_capacity(rows.len()),
        };

        self.root = Some(grower.grow(rows, 0));
        self.n_features = n_features;
        self.classes = classes.to_vec();
        Ok(())
    }

    /// Class distribution of the leaf reached by `sample`
    pub fn leaf_distribution(&self, sample: ArrayView1<f64>) -> Result<&[f64]> {
        let mut node = self.root.as_ref().ok_or(BaselineError::ModelNotFitted)?;
        loop {
            match node {
                TreeNode::Leaf { distribution, .. } => return Ok(distribution),
                TreeNode::Split { feature_idx, threshold, left, right, .. } => {
                    node = if sample[*feature_idx] <= *threshold { left } else { right };
                }
            }
        }
    }

    /// Get tree depth
    pub fn get_depth(&self) -> usize {
        fn depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + depth(left).max(depth(right)),
            }
        }
        self.root.as_ref().map_or(0, depth)
    }

    /// Get number of leaves
    pub fn get_n_leaves(&self) -> usize {
        fn leaves(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => leaves(left) + leaves(right),
            }
        }
        self.root.as_ref().map_or(0, leaves)
    }

    fn check_features(&self, x: &Array2<f64>) -> Result<()> {
        if self.root.is_none() {
            return Err(BaselineError::ModelNotFitted);
        }
        if x.ncols() != self.n_features {
            return Err(BaselineError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(())
    }
}

impl Classifier for DecisionTree {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if x.nrows() != y.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let classes = unique_classes(y);
        let y_idx: Vec<usize> = y
            .iter()
            .map(|v| classes.binary_search(v).unwrap_or(0))
            .collect();
        let weights = vec![1.0; y.len()];
        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        self.fit_rows(x, &y_idx, &classes, (0..y.len()).collect(), &weights, &mut rng)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<i64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba
            .rows()
            .into_iter()
            .map(|row| self.classes[argmax(row.iter().copied())])
            .collect())
    }

    fn predict_proba(&self, x: &Array2<f64>) -> Result<Array2<f64>> {
        self.check_features(x)?;
        let mut proba = Array2::zeros((x.nrows(), self.classes.len()));
        for (i, sample) in x.rows().into_iter().enumerate() {
            let dist = self.leaf_distribution(sample)?;
            for (j, &p) in dist.iter().enumerate() {
                proba[[i, j]] = p;
            }
        }
        Ok(proba)
    }

    fn classes(&self) -> &[i64] {
        &self.classes
    }

    fn name(&self) -> &str {
        "DecisionTree"
    }
}

/// Index of the first maximum
pub(crate) fn argmax(values: impl Iterator<Item = f64>) -> usize {
    let mut best = 0;
    let mut best_val = f64::NEG_INFINITY;
    for (i, v) in values.enumerate() {
        if v > best_val {
            best = i;
            best_val = v;
        }
    }
    best
}

fn gini(counts: &[f64], total: f64) -> f64 {
    if total <= 0.0 {
        return 0.0;
    }
    1.0 - counts.iter().map(|c| (c / total).powi(2)).sum::<f64>()
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    /// `sum_k left_k^2 / w_left + sum_k right_k^2 / w_right`; larger means
    /// lower weighted child impurity
    proxy: f64,
}

/// State shared by every node while one tree grows
struct Grower<'a> {
    x: &'a Array2<f64>,
    y: &'a [usize],
    weights: &'a [f64],
    n_classes: usize,
    max_depth: Option<usize>,
    min_samples_split: usize,
    min_samples_leaf: usize,
    max_features: usize,
    rng: &'a mut ChaCha8Rng,
    sorted: Vec<(f64, usize)>,
}

impl Grower<'_> {
    fn grow(&mut self, rows: Vec<usize>, depth: usize) -> TreeNode {
        let counts = self.class_weights(&rows);
        let total: f64 = counts.iter().sum();
        let n_samples = rows.len();
        let impurity = gini(&counts, total);

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON
            || total <= 0.0;

        if !should_stop {
            if let Some(split) = self.best_split(&rows, &counts, total) {
                let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
                    .into_iter()
                    .partition(|&r| self.x[[r, split.feature]] <= split.threshold);

                let left = Box::new(self.grow(left_rows, depth + 1));
                let right = Box::new(self.grow(right_rows, depth + 1));

                return TreeNode::Split {
                    feature_idx: split.feature,
                    threshold: split.threshold,
                    left,
                    right,
                    n_samples,
                    impurity,
                };
            }
        }

        let distribution = if total > 0.0 {
            counts.iter().map(|c| c / total).collect()
        } else {
            vec![1.0 / self.n_classes as f64; self.n_classes]
        };
        TreeNode::Leaf { distribution, n_samples }
    }

    fn class_weights(&self, rows: &[usize]) -> Vec<f64> {
        let mut counts = vec![0.0; self.n_classes];
        for &r in rows {
            counts[self.y[r]] += self.weights[r];
        }
        counts
    }

    /// Best threshold over a random subset of features.
    ///
    /// Features are drawn without replacement until `max_features`
    /// non-constant ones have been scanned. Each scan sorts the node's rows
    /// once and sweeps left to right.
    fn best_split(&mut self, rows: &[usize], parent: &[f64], total: f64) -> Option<SplitCandidate> {
        let n_features = self.x.ncols();
        let mut features: Vec<usize> = (0..n_features).collect();
        let mut remaining = n_features;
        let mut visited = 0;
        let mut best: Option<SplitCandidate> = None;

        let mut left = vec![0.0; self.n_classes];
        let mut right = vec![0.0; self.n_classes];

        while remaining > 0 && visited < self.max_features {
            let j = self.rng.gen_range(0..remaining);
            features.swap(j, remaining - 1);
            remaining -= 1;
            let feature = features[remaining];

            self.sorted.clear();
            self.sorted
                .extend(rows.iter().map(|&r| (self.x[[r, feature]], r)));
            self.sorted.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

            let n = self.sorted.len();
            if self.sorted[n - 1].0 <= self.sorted[0].0 + FEATURE_THRESHOLD {
                continue;
            }
            visited += 1;

            left.iter_mut().for_each(|c| *c = 0.0);
            let mut w_left = 0.0;

            for i in 0..n - 1 {
                let (value, r) = self.sorted[i];
                let w = self.weights[r];
                left[self.y[r]] += w;
                w_left += w;

                let next = self.sorted[i + 1].0;
                if next <= value + FEATURE_THRESHOLD {
                    continue;
                }
                let n_left = i + 1;
                if n_left < self.min_samples_leaf || n - n_left < self.min_samples_leaf {
                    continue;
                }
                let w_right = total - w_left;
                if w_left <= 0.0 || w_right <= 0.0 {
                    continue;
                }

                for k in 0..self.n_classes {
                    right[k] = parent[k] - left[k];
                }
                let proxy = left.iter().map(|c| c * c).sum::<f64>() / w_left
                    + right.iter().map(|c| c * c).sum::<f64>() / w_right;

                if best.map_or(true, |b| proxy > b.proxy) {
                    let mut threshold = value / 2.0 + next / 2.0;
                    if threshold >= next || !threshold.is_finite() {
                        threshold = value;
                    }
                    best = Some(SplitCandidate { feature, threshold, proxy });
                }
            }
        }

        best
    }
}
