//! Optimization algorithms for SVM
//!
//! This module provides high-level optimization interfaces that integrate
//! kernels and solvers to provide complete SVM training functionality.

use crate::core::{
    CancellationToken, Dataset, OptimizationResult, OptimizerConfig, Prediction, Result,
    SVMModel, Sample, SolverStatus, SparseVector,
};
use crate::kernel::{Kernel, KernelType, LinearKernel};
use crate::solver::SMOSolver;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// High-level SVM optimizer that integrates kernel functions and solving algorithms
pub struct SVMOptimizer<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
    cancellation: Option<CancellationToken>,
}

impl<K: Kernel> SVMOptimizer<K> {
    /// Create a new SVM optimizer with the given kernel and configuration
    pub fn new(kernel: K, config: OptimizerConfig) -> Self {
        Self::with_shared_kernel(Arc::new(kernel), config)
    }

    /// Create an optimizer around a kernel shared with other optimizers
    pub fn with_shared_kernel(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self {
            kernel,
            config,
            cancellation: None,
        }
    }

    /// Create a new SVM optimizer with default configuration
    pub fn with_kernel(kernel: K) -> Self {
        Self::new(kernel, OptimizerConfig::default())
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Train an SVM model on the given dataset
    pub fn train<D: Dataset>(&self, dataset: &D) -> Result<TrainedSVM<K>> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.train_samples(&samples)
    }

    /// Train an SVM model on a slice of ±1 labelled samples
    pub fn train_samples(&self, samples: &[Sample]) -> Result<TrainedSVM<K>> {
        self.train_weighted(samples, None)
    }

    /// Train with optional per-sample weights scaling each box bound
    pub fn train_weighted(
        &self,
        samples: &[Sample],
        weights: Option<&[f64]>,
    ) -> Result<TrainedSVM<K>> {
        let mut solver = SMOSolver::new(Arc::clone(&self.kernel), self.config.clone());
        if let Some(token) = &self.cancellation {
            solver = solver.with_cancellation(token.clone());
        }
        let result = solver.solve_weighted(samples, weights)?;

        Ok(TrainedSVM::new(Arc::clone(&self.kernel), samples, result))
    }

    /// Get the optimizer configuration
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Get the kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

/// A trained SVM model that can make predictions
///
/// `decision_function(x) = Σ αᵢ yᵢ K(svᵢ, x) + b`
pub struct TrainedSVM<K: Kernel> {
    kernel: Arc<K>,
    support_vectors: Vec<Sample>,
    alpha: Vec<f64>,
    bias: f64,
    support_indices: Vec<usize>,
    status: SolverStatus,
    iterations: usize,
}

impl<K: Kernel> TrainedSVM<K> {
    /// Create a new trained SVM model
    pub(crate) fn new(
        kernel: Arc<K>,
        training_samples: &[Sample],
        optimization_result: OptimizationResult,
    ) -> Self {
        let support_vectors = optimization_result
            .support_vectors
            .iter()
            .map(|&i| training_samples[i].clone())
            .collect();
        let alpha = optimization_result
            .support_vectors
            .iter()
            .map(|&i| optimization_result.alpha[i])
            .collect();

        Self {
            kernel,
            support_vectors,
            alpha,
            bias: optimization_result.b,
            support_indices: optimization_result.support_vectors,
            status: optimization_result.status,
            iterations: optimization_result.iterations,
        }
    }

    /// Rebuild a model from stored parts
    pub(crate) fn from_parts(
        kernel: Arc<K>,
        support_vectors: Vec<Sample>,
        alpha: Vec<f64>,
        bias: f64,
        status: SolverStatus,
        iterations: usize,
    ) -> Self {
        Self {
            kernel,
            support_indices: (0..support_vectors.len()).collect(),
            support_vectors,
            alpha,
            bias,
            status,
            iterations,
        }
    }

    /// Get the decision function value for a sample
    pub fn decision_function(&self, sample: &Sample) -> f64 {
        self.score(&sample.features)
    }

    /// Signed distance-like score of a feature vector
    pub fn score(&self, x: &SparseVector) -> f64 {
        let sum: f64 = self
            .support_vectors
            .iter()
            .zip(&self.alpha)
            .map(|(sv, a)| a * sv.label * self.kernel.compute(&sv.features, x))
            .sum();
        sum + self.bias
    }

    /// Class decision, +1 or -1; a zero score decides +1
    pub fn decide(&self, x: &SparseVector) -> f64 {
        if self.score(x) >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    /// Get the support vectors
    pub fn support_vectors(&self) -> &[Sample] {
        &self.support_vectors
    }

    /// Get the alpha values for support vectors
    pub fn alpha_values(&self) -> &[f64] {
        &self.alpha
    }

    /// Signed dual weights αᵢyᵢ, aligned with [`TrainedSVM::support_vectors`]
    pub fn dual_weights(&self) -> Vec<f64> {
        self.support_vectors
            .iter()
            .zip(&self.alpha)
            .map(|(sv, a)| a * sv.label)
            .collect()
    }

    /// Get the indices of support vectors in the original training set
    pub fn support_vector_indices(&self) -> &[usize] {
        &self.support_indices
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn is_converged(&self) -> bool {
        self.status.is_converged()
    }

    /// Solver iterations spent in training
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }
}

impl<K: Kernel> SVMModel for TrainedSVM<K> {
    fn predict(&self, sample: &Sample) -> Prediction {
        let decision_value = self.decision_function(sample);
        let label = if decision_value >= 0.0 { 1.0 } else { -1.0 };
        Prediction::new(label, decision_value)
    }

    fn n_support_vectors(&self) -> usize {
        self.support_vectors.len()
    }

    fn bias(&self) -> f64 {
        self.bias
    }
}

impl<K: Kernel> TrainedSVM<K> {
    /// `w = Σ αᵢyᵢxᵢ`, meaningful only when `K` is the plain dot product
    fn linear_expansion(&self) -> LinearMachine {
        let dim = self
            .support_vectors
            .iter()
            .map(|sv| sv.features.dim_hint())
            .max()
            .unwrap_or(0);

        let mut weights = vec![0.0; dim];
        for (sv, a) in self.support_vectors.iter().zip(&self.alpha) {
            let coef = a * sv.label;
            for (&i, &v) in sv.features.indices.iter().zip(&sv.features.values) {
                weights[i] += coef * v;
            }
        }

        LinearMachine {
            weights,
            bias: self.bias,
        }
    }
}

impl TrainedSVM<LinearKernel> {
    /// Collapse the support-vector expansion into `w = Σ αᵢyᵢxᵢ`
    pub fn compact(&self) -> LinearMachine {
        self.linear_expansion()
    }
}

impl TrainedSVM<KernelType> {
    /// Compacted form when the stored kernel is [`KernelType::Linear`]
    pub fn compact(&self) -> Option<LinearMachine> {
        match *self.kernel {
            KernelType::Linear => Some(self.linear_expansion()),
            _ => None,
        }
    }
}

/// Linear decision function `w·x + b`, the compacted form of a linear model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearMachine {
    weights: Vec<f64>,
    bias: f64,
}

impl LinearMachine {
    pub fn new(weights: Vec<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn score(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.bias
    }

    pub fn decide(&self, x: &SparseVector) -> f64 {
        if self.score(x) >= 0.0 {
            1.0
        } else {
            -1.0
        }
    }

    pub fn predict(&self, x: &SparseVector) -> Prediction {
        let decision_value = self.score(x);
        Prediction::new(self.decide(x), decision_value)
    }
}
