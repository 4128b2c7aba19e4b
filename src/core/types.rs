//! Core type definitions shared by the kernels, the solver and RANSAC

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Prediction result containing label and decision value
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Predicted class label (+1 or -1)
    pub label: f64,
    /// Raw decision function value
    pub decision_value: f64,
}

impl Prediction {
    /// Create a new prediction
    pub fn new(label: f64, decision_value: f64) -> Self {
        Self {
            label,
            decision_value,
        }
    }

    /// Get confidence as absolute value of decision value
    pub fn confidence(&self) -> f64 {
        self.decision_value.abs()
    }
}

/// Sparse vector representation with sorted indices
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Sorted indices of non-zero elements
    pub indices: Vec<usize>,
    /// Values corresponding to indices
    pub values: Vec<f64>,
}

impl SparseVector {
    /// Create a new sparse vector, ensuring indices are sorted
    pub fn new(indices: Vec<usize>, values: Vec<f64>) -> Self {
        assert_eq!(
            indices.len(),
            values.len(),
            "Indices and values must have same length"
        );

        let mut pairs: Vec<_> = indices.into_iter().zip(values).collect();
        pairs.sort_by_key(|&(idx, _)| idx);

        let (indices, values): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
        Self { indices, values }
    }

    /// Create a sparse vector from a dense slice, dropping exact zeros
    pub fn from_dense(values: &[f64]) -> Self {
        let (indices, values) = values
            .iter()
            .enumerate()
            .filter(|(_, &v)| v != 0.0)
            .map(|(i, &v)| (i, v))
            .unzip();
        Self { indices, values }
    }

    /// Create an empty sparse vector
    pub fn empty() -> Self {
        Self {
            indices: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Expand into a dense vector of length `dim`
    ///
    /// Entries with an index at or beyond `dim` are ignored.
    pub fn to_dense(&self, dim: usize) -> Vec<f64> {
        let mut dense = vec![0.0; dim];
        for (&i, &v) in self.indices.iter().zip(&self.values) {
            if i < dim {
                dense[i] = v;
            }
        }
        dense
    }

    /// Get the value at a specific index (0 if not present)
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// One past the largest stored index (0 for an empty vector)
    pub fn dim_hint(&self) -> usize {
        self.indices.last().map_or(0, |&i| i + 1)
    }

    /// Compute squared L2 norm
    pub fn norm_squared(&self) -> f64 {
        self.values.iter().map(|&v| v * v).sum()
    }

    /// Compute L2 norm
    pub fn norm(&self) -> f64 {
        self.norm_squared().sqrt()
    }

    /// Compute L1 norm
    pub fn l1_norm(&self) -> f64 {
        self.values.iter().map(|v| v.abs()).sum()
    }

    /// Dot product with another sparse vector
    ///
    /// Both index lists are sorted, so this is a single merge pass.
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        self.merge(other, |a, b| result += a * b);
        result
    }

    /// Dot product with a dense vector; indices beyond `dense.len()` count as zero
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.indices
            .iter()
            .zip(&self.values)
            .filter(|(&i, _)| i < dense.len())
            .map(|(&i, &v)| v * dense[i])
            .sum()
    }

    /// Squared Euclidean distance ||x - y||²
    pub fn squared_distance(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        self.merge(other, |a, b| {
            let d = a - b;
            result += d * d;
        });
        result
    }

    /// Manhattan distance Σ|xᵢ - yᵢ|
    pub fn l1_distance(&self, other: &SparseVector) -> f64 {
        let mut result = 0.0;
        self.merge(other, |a, b| result += (a - b).abs());
        result
    }

    /// Visit every index present in either vector with the pair of values
    /// (a missing entry reads as 0.0).
    pub(crate) fn merge<F: FnMut(f64, f64)>(&self, other: &SparseVector, mut f: F) {
        let mut i = 0;
        let mut j = 0;

        while i < self.indices.len() && j < other.indices.len() {
            let x_idx = self.indices[i];
            let y_idx = other.indices[j];

            if x_idx == y_idx {
                f(self.values[i], other.values[j]);
                i += 1;
                j += 1;
            } else if x_idx < y_idx {
                f(self.values[i], 0.0);
                i += 1;
            } else {
                f(0.0, other.values[j]);
                j += 1;
            }
        }

        for &v in &self.values[i..] {
            f(v, 0.0);
        }
        for &v in &other.values[j..] {
            f(0.0, v);
        }
    }

    /// Number of non-zero elements
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    /// Check if vector is empty
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

impl From<&[f64]> for SparseVector {
    fn from(values: &[f64]) -> Self {
        Self::from_dense(values)
    }
}

/// Training sample with features and label
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Sample {
    /// Feature vector (sparse representation)
    pub features: SparseVector,
    /// Class label (+1 or -1 for binary classification)
    pub label: f64,
}

impl Sample {
    /// Create a new sample
    pub fn new(features: SparseVector, label: f64) -> Self {
        Self { features, label }
    }
}

/// How the SMO solver picks the pair of dual variables to update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkingSetStrategy {
    /// First-order selection: the maximal violating pair
    MaximalViolatingPair,
    /// Second-order selection (Fan, Chen & Lin 2005): the partner that
    /// maximises the guaranteed objective decrease
    #[default]
    SecondOrder,
    /// Maximal violator for the first index, seeded random violating
    /// partner for the second
    Random,
}

/// Terminal state of an iterative solver run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// KKT conditions satisfied within tolerance
    Converged,
    /// Iteration cap reached; the result is a usable best effort
    MaxIterationsExceeded,
    /// Stopped by a cancellation request; the result is a usable best effort
    Cancelled,
    /// Numerical breakdown on the active pair; the last committed state is returned
    Failed,
}

impl SolverStatus {
    /// True only for [`SolverStatus::Converged`]
    pub fn is_converged(&self) -> bool {
        matches!(self, SolverStatus::Converged)
    }
}

/// Result of optimization process
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Lagrange multipliers (alpha values)
    pub alpha: Vec<f64>,
    /// Bias term (b)
    pub b: f64,
    /// Indices of support vectors (where alpha > 0)
    pub support_vectors: Vec<usize>,
    /// Number of iterations performed
    pub iterations: usize,
    /// Final objective value of the dual
    pub objective_value: f64,
    /// How the run ended
    pub status: SolverStatus,
    /// Maximal KKT violation m(α) - M(α) at exit
    pub max_violation: f64,
    /// Kernel cache hit rate over the run
    pub cache_hit_rate: f64,
}

/// Configuration for optimizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Regularization parameter (upper bound for alpha)
    pub c: f64,
    /// Tolerance for KKT conditions
    pub epsilon: f64,
    /// Maximum number of iterations
    pub max_iterations: usize,
    /// Kernel cache size in bytes
    pub cache_size: usize,
    /// Working set selection policy
    pub working_set_strategy: WorkingSetStrategy,
    /// Box bound multiplier for the positive class
    pub positive_weight: f64,
    /// Box bound multiplier for the negative class
    pub negative_weight: f64,
    /// Seed for every random choice the solver makes
    pub seed: u64,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            epsilon: 0.001,
            max_iterations: 10000,
            cache_size: 100_000_000, // 100MB
            working_set_strategy: WorkingSetStrategy::default(),
            positive_weight: 1.0,
            negative_weight: 1.0,
            seed: 0,
        }
    }
}

impl OptimizerConfig {
    /// Box bound for a sample with the given label and sample weight
    pub fn upper_bound(&self, label: f64, weight: f64) -> f64 {
        let class_weight = if label > 0.0 {
            self.positive_weight
        } else {
            self.negative_weight
        };
        self.c * class_weight * weight
    }
}

/// Cooperative cancellation flag polled by every iterative routine
///
/// Clones share the same flag, so one handle can be given to a worker and
/// another kept by the caller.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
