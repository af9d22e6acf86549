//! Stratified train/test splitting

use crate::error::{BaselineError, Result};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single train/test partition of row indices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

/// Splitter that preserves class proportions in both partitions
#[derive(Debug, Clone)]
pub struct StratifiedSplitter {
    test_size: f64,
    random_state: Option<u64>,
}

impl StratifiedSplitter {
    /// Create a splitter holding out `test_size` of the rows
    pub fn new(test_size: f64) -> Self {
        Self {
            test_size,
            random_state: None,
        }
    }

    /// Set random state for reproducibility
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Partition row indices so every class keeps its share in both sets.
    ///
    /// `n_test = ceil(test_size * n)`. Per-class test counts are the
    /// proportional share rounded by largest remainder, so they sum to
    /// `n_test` and each is within one row of the exact share.
    pub fn split(&self, y: &Array1<i64>) -> Result<TrainTestSplit> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(BaselineError::InvalidParameter {
                name: "test_size".to_string(),
                value: self.test_size.to_string(),
                reason: "must be in (0, 1)".to_string(),
            });
        }

        let n = y.len();
        let n_test = (self.test_size * n as f64).ceil() as usize;
        let n_train = n.saturating_sub(n_test);

        let mut class_indices: BTreeMap<i64, Vec<usize>> = BTreeMap::new();
        for (idx, &label) in y.iter().enumerate() {
            class_indices.entry(label).or_default().push(idx);
        }

        if let Some((class, members)) = class_indices.iter().find(|(_, m)| m.len() < 2) {
            return Err(BaselineError::ValidationError(format!(
                "The least populated class in y has only {} member (class {}); stratification needs at least 2",
                members.len(),
                class
            )));
        }

        let n_classes = class_indices.len();
        if n_test < n_classes || n_train < n_classes {
            return Err(BaselineError::ValidationError(format!(
                "train size {} and test size {} must each be at least the number of classes {}",
                n_train, n_test, n_classes
            )));
        }

        let allocation = allocate_test_counts(&class_indices, n, n_test);

        let mut rng = match self.random_state {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let mut train_indices = Vec::with_capacity(n_train);
        let mut test_indices = Vec::with_capacity(n_test);

        for (class, indices) in &class_indices {
            let mut shuffled = indices.clone();
            shuffled.shuffle(&mut rng);
            let k = allocation[class];
            test_indices.extend_from_slice(&shuffled[..k]);
            train_indices.extend_from_slice(&shuffled[k..]);
        }

        train_indices.shuffle(&mut rng);
        test_indices.shuffle(&mut rng);

        Ok(TrainTestSplit {
            train_indices,
            test_indices,
        })
    }
}

/// Largest-remainder allocation of `n_test` rows across classes
fn allocate_test_counts(
    class_indices: &BTreeMap<i64, Vec<usize>>,
    n: usize,
    n_test: usize,
) -> BTreeMap<i64, usize> {
    let mut allocation = BTreeMap::new();
    let mut remainders: Vec<(i64, f64)> = Vec::with_capacity(class_indices.len());
    let mut assigned = 0usize;

    for (&class, indices) in class_indices {
        let exact = n_test as f64 * indices.len() as f64 / n as f64;
        let floor = exact.floor() as usize;
        allocation.insert(class, floor);
        remainders.push((class, exact - floor as f64));
        assigned += floor;
    }

    // Stable sort keeps class order for equal remainders
    remainders.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    for (class, _) in remainders.into_iter().take(n_test.saturating_sub(assigned)) {
        if let Some(count) = allocation.get_mut(&class) {
            *count += 1;
        }
    }

    allocation
}

/// Select rows of a DataFrame by position
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx = IdxCa::from_vec(
        "idx".into(),
        indices.iter().map(|&i| i as IdxSize).collect(),
    );
    Ok(df.take(&idx)?)
}

/// Select labels by position
pub fn take_labels(y: &Array1<i64>, indices: &[usize]) -> Array1<i64> {
    Array1::from_iter(indices.iter().map(|&i| y[i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imbalanced_labels(n_neg: usize, n_pos: usize) -> Array1<i64> {
        let mut v = vec![0i64; n_neg];
        v.extend(std::iter::repeat(1).take(n_pos));
        Array1::from_vec(v)
    }

    #[test]
    fn test_split_sizes() {
        let y = imbalanced_labels(950, 50);
        let split = StratifiedSplitter::new(0.2).with_random_state(42).split(&y).unwrap();

        assert_eq!(split.test_indices.len(), 200);
        assert_eq!(split.train_indices.len(), 800);

        let mut all: Vec<usize> = split
            .train_indices
            .iter()
            .chain(split.test_indices.iter())
            .copied()
            .collect();
        all.sort();
        assert_eq!(all, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_preserves_class_proportions() {
        let y = imbalanced_labels(987, 13);
        let split = StratifiedSplitter::new(0.2).with_random_state(7).split(&y).unwrap();

        let test_pos = split.test_indices.iter().filter(|&&i| y[i] == 1).count() as f64;
        let expected = 13.0 * split.test_indices.len() as f64 / 1000.0;
        assert!((test_pos - expected).abs() <= 1.0, "test positives {} vs {}", test_pos, expected);

        let train_pos = split.train_indices.iter().filter(|&&i| y[i] == 1).count() as f64;
        let expected = 13.0 * split.train_indices.len() as f64 / 1000.0;
        assert!((train_pos - expected).abs() <= 1.0, "train positives {} vs {}", train_pos, expected);
    }

    #[test]
    fn test_split_is_deterministic() {
        let y = imbalanced_labels(90, 10);
        let a = StratifiedSplitter::new(0.2).with_random_state(42).split(&y).unwrap();
        let b = StratifiedSplitter::new(0.2).with_random_state(42).split(&y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_singleton_class_rejected() {
        let y = imbalanced_labels(10, 1);
        let result = StratifiedSplitter::new(0.2).with_random_state(42).split(&y);
        assert!(matches!(result, Err(BaselineError::ValidationError(_))));
    }

    #[test]
    fn test_invalid_test_size() {
        let y = imbalanced_labels(10, 10);
        assert!(StratifiedSplitter::new(1.5).split(&y).is_err());
    }

    #[test]
    fn test_take_rows() {
        let df = df!("a" => &[10.0, 20.0, 30.0]).unwrap();
        let taken = take_rows(&df, &[2, 0]).unwrap();
        let col = taken.column("a").unwrap().f64().unwrap();
        assert_eq!(col.get(0), Some(30.0));
        assert_eq!(col.get(1), Some(10.0));
    }
}
