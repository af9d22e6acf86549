//! SMOTE oversampling

use crate::error::{BaselineError, Result};
use crate::synthetic::{class_counts, class_indices, ResampleResult, Sampler};
use ndarray::{concatenate, Array1, Array2, ArrayView1, Axis};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use tracing::info;

/// Max-heap entry ordered by distance, then row index
#[derive(Debug, Clone, Copy)]
struct DistIdx(f64, usize);

impl PartialEq for DistIdx {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for DistIdx {}
impl PartialOrd for DistIdx {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DistIdx {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0).then(self.1.cmp(&other.1))
    }
}

/// SMOTE (Synthetic Minority Over-sampling Technique) for binary labels.
///
/// `sampling_strategy` is the desired minority/majority ratio after
/// resampling. Each synthetic row lies on the segment between a minority row
/// and one of its `k_neighbors` nearest minority neighbors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Smote {
    /// Number of nearest neighbors
    k_neighbors: usize,
    /// Desired minority/majority ratio
    sampling_strategy: f64,
    /// Random seed
    seed: Option<u64>,
    /// Target row count for each class that needs oversampling
    target_counts: Option<BTreeMap<i64, usize>>,
}

impl Smote {
    /// Create new SMOTE sampler
    pub fn new() -> Self {
        Self {
            k_neighbors: 5,
            sampling_strategy: 1.0,
            seed: None,
            target_counts: None,
        }
    }

    /// Set number of neighbors
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k.max(1);
        self
    }

    /// Set sampling strategy (minority/majority ratio)
    pub fn with_sampling_strategy(mut self, ratio: f64) -> Self {
        self.sampling_strategy = ratio;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Targets computed by the last `fit`
    pub fn target_counts(&self) -> Option<&BTreeMap<i64, usize>> {
        self.target_counts.as_ref()
    }

    fn squared_distance(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
        a.iter().zip(b.iter()).map(|(ai, bi)| (ai - bi).powi(2)).sum()
    }

    /// The `k` nearest other rows of `data` for every row, nearest first.
    /// A row never counts as its own neighbor, even when duplicated.
    fn nearest_neighbors(data: &Array2<f64>, k: usize) -> Vec<Vec<usize>> {
        let n = data.nrows();
        (0..n)
            .map(|i| {
                let point = data.row(i);
                let mut heap: BinaryHeap<DistIdx> = BinaryHeap::with_capacity(k + 1);
                for j in 0..n {
                    if j == i {
                        continue;
                    }
                    let entry = DistIdx(Self::squared_distance(point, data.row(j)), j);
                    if heap.len() < k {
                        heap.push(entry);
                    } else if let Some(top) = heap.peek() {
                        if entry < *top {
                            heap.pop();
                            heap.push(entry);
                        }
                    }
                }
                heap.into_sorted_vec().into_iter().map(|DistIdx(_, j)| j).collect()
            })
            .collect()
    }
}

impl Default for Smote {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for Smote {
    fn fit(&mut self, _x: &Array2<f64>, y: &Array1<i64>) -> Result<()> {
        if !(self.sampling_strategy > 0.0) {
            return Err(BaselineError::InvalidParameter {
                name: "sampling_strategy".to_string(),
                value: self.sampling_strategy.to_string(),
                reason: "must be positive".to_string(),
            });
        }

        let counts = class_counts(y);
        if counts.len() != 2 {
            return Err(BaselineError::ValidationError(format!(
                "a ratio sampling strategy needs exactly 2 classes, got {}",
                counts.len()
            )));
        }

        // Ties resolve to the larger label as majority
        let (&majority, &majority_count) = counts
            .iter()
            .max_by_key(|(&class, &count)| (count, class))
            .ok_or_else(|| BaselineError::ValidationError("empty label set".to_string()))?;

        let target = (self.sampling_strategy * majority_count as f64).floor() as usize;
        let mut targets = BTreeMap::new();

        for (&class, &count) in counts.iter().filter(|(&c, _)| c != majority) {
            if count > target {
                return Err(BaselineError::ValidationError(format!(
                    "sampling ratio {} would need to remove samples from class {} ({} rows, target {})",
                    self.sampling_strategy, class, count, target
                )));
            }
            targets.insert(class, target);
        }

        self.target_counts = Some(targets);
        Ok(())
    }

    fn resample(&self, x: &Array2<f64>, y: &Array1<i64>) -> Result<ResampleResult> {
        let targets = self
            .target_counts
            .as_ref()
            .ok_or(BaselineError::ModelNotFitted)?;

        if x.nrows() != y.len() {
            return Err(BaselineError::ShapeError {
                expected: format!("y length = {}", x.nrows()),
                actual: format!("y length = {}", y.len()),
            });
        }

        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let indices = class_indices(y);
        let n_features = x.ncols();

        let mut synthetic_rows: Vec<f64> = Vec::new();
        let mut synthetic_y: Vec<i64> = Vec::new();
        let mut n_synthetic = BTreeMap::new();

        for (&class, &target_count) in targets {
            let members = indices.get(&class).map(|v| v.as_slice()).unwrap_or(&[]);
            let n_to_generate = target_count.saturating_sub(members.len());
            n_synthetic.insert(class, n_to_generate);

            if n_to_generate == 0 {
                continue;
            }
            if members.len() < 2 {
                return Err(BaselineError::ValidationError(format!(
                    "class {} has {} row(s); SMOTE needs at least 2 to interpolate",
                    class,
                    members.len()
                )));
            }

            let class_x = x.select(Axis(0), members);
            let k = self.k_neighbors.min(members.len() - 1);
            let neighbors = Self::nearest_neighbors(&class_x, k);

            for _ in 0..n_to_generate {
                let pick = rng.gen_range(0..members.len() * k);
                let (row, nn) = (pick / k, neighbors[pick / k][pick % k]);
                let gap: f64 = rng.gen();

                let base = class_x.row(row);
                let other = class_x.row(nn);
                synthetic_rows.extend(
                    base.iter()
                        .zip(other.iter())
                        .map(|(&b, &o)| b + gap * (o - b)),
                );
                synthetic_y.push(class);
            }

            info!(
                class,
                original = members.len(),
                generated = n_to_generate,
                k_neighbors = k,
                "SMOTE oversampled class"
            );
        }

        // Original rows first, synthetic rows appended
        let synthetic_x =
            Array2::from_shape_vec((synthetic_y.len(), n_features), synthetic_rows)?;
        let result_x = concatenate(Axis(0), &[x.view(), synthetic_x.view()])?;

        let mut all_y: Vec<i64> = y.to_vec();
        all_y.extend_from_slice(&synthetic_y);

        Ok(ResampleResult {
            x: result_x,
            y: Array1::from_vec(all_y),
            n_synthetic,
        })
    }
}
