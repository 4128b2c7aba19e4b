//! High-level API for Support Vector Machine operations
//!
//! This module provides a user-friendly interface for common SVM tasks,
//! including training, prediction, and model evaluation.
//!
//! # Quick Start
//!
//! ```rust
//! use svmkit::api::SVM;
//! use svmkit::core::SparseVector;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let inputs: Vec<SparseVector> = [[2.0, 2.0], [3.0, 3.0], [-2.0, -2.0], [-3.0, -3.0]]
//!     .iter()
//!     .map(|x| SparseVector::from_dense(x))
//!     .collect();
//! let labels = [1, 1, 0, 0];
//!
//! let model = SVM::new().with_c(1.0).learn(&inputs, &labels, None)?;
//! assert_eq!(model.decide(&SparseVector::from_dense(&[4.0, 1.0])), 1);
//! assert_eq!(model.decide(&SparseVector::from_dense(&[-1.0, -4.0])), 0);
//! # Ok(())
//! # }
//! ```

use crate::core::{
    CancellationToken, Dataset, Error, OptimizerConfig, Prediction, Result, SVMModel, Sample,
    SolverStatus, SparseVector, WorkingSetStrategy,
};
use crate::data::LibSVMDataset;
use crate::kernel::{Kernel, KernelType, LinearKernel};
use crate::optimizer::{LinearMachine, SVMOptimizer, TrainedSVM};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// High-level SVM interface with builder pattern
pub struct SVM<K: Kernel = LinearKernel> {
    kernel: K,
    config: OptimizerConfig,
    cancellation: Option<CancellationToken>,
}

impl SVM<LinearKernel> {
    /// Create a new SVM with linear kernel and default parameters
    pub fn new() -> Self {
        Self::with_kernel(LinearKernel::new())
    }
}

impl Default for SVM<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> SVM<K> {
    /// Create SVM with custom kernel
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel,
            config: OptimizerConfig::default(),
            cancellation: None,
        }
    }

    /// Set regularization parameter C
    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Set convergence tolerance
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.config.epsilon = epsilon;
        self
    }

    /// Scale the box bound of the positive and negative class
    pub fn with_class_weights(mut self, positive: f64, negative: f64) -> Self {
        self.config.positive_weight = positive;
        self.config.negative_weight = negative;
        self
    }

    /// Set maximum number of iterations
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    /// Set kernel cache size in bytes
    pub fn with_cache_size(mut self, cache_size: usize) -> Self {
        self.config.cache_size = cache_size;
        self
    }

    pub fn with_working_set_strategy(mut self, strategy: WorkingSetStrategy) -> Self {
        self.config.working_set_strategy = strategy;
        self
    }

    /// Seed for the random working-set strategy
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.config.seed = seed;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Replace the whole solver configuration
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Train on integer labels with exactly two distinct values
    ///
    /// The smaller label becomes the negative class and the larger the
    /// positive class; [`TrainedModel::decide`] answers with the original
    /// labels. `weights` scale each sample's box bound.
    pub fn learn(
        self,
        inputs: &[SparseVector],
        labels: &[i32],
        weights: Option<&[f64]>,
    ) -> Result<TrainedModel<K>> {
        if inputs.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if labels.len() != inputs.len() {
            return Err(Error::DimensionMismatch {
                expected: inputs.len(),
                actual: labels.len(),
            });
        }
        let classes = binary_classes(labels)?;

        let samples: Vec<Sample> = inputs
            .iter()
            .zip(labels)
            .map(|(x, &l)| Sample::new(x.clone(), if l == classes[1] { 1.0 } else { -1.0 }))
            .collect();

        self.fit(&samples, weights, classes)
    }

    /// Dense-row convenience over [`SVM::learn`]
    pub fn learn_dense(
        self,
        inputs: &[Vec<f64>],
        labels: &[i32],
        weights: Option<&[f64]>,
    ) -> Result<TrainedModel<K>> {
        let inputs: Vec<SparseVector> = inputs.iter().map(|x| SparseVector::from_dense(x)).collect();
        self.learn(&inputs, labels, weights)
    }

    /// Train on a dataset of ±1 labelled samples
    pub fn train<D: Dataset>(self, dataset: &D) -> Result<TrainedModel<K>> {
        let samples: Vec<Sample> = (0..dataset.len()).map(|i| dataset.get_sample(i)).collect();
        self.train_samples(&samples)
    }

    /// Train on ±1 labelled samples
    pub fn train_samples(self, samples: &[Sample]) -> Result<TrainedModel<K>> {
        self.fit(samples, None, [-1, 1])
    }

    /// Train from LibSVM format file with two classes
    pub fn train_from_file<P: AsRef<Path>>(self, path: P) -> Result<TrainedModel<K>> {
        let dataset = LibSVMDataset::from_file(path)?;
        self.learn(dataset.inputs(), dataset.labels(), None)
    }

    fn fit(
        self,
        samples: &[Sample],
        weights: Option<&[f64]>,
        classes: [i32; 2],
    ) -> Result<TrainedModel<K>> {
        let mut optimizer = SVMOptimizer::new(self.kernel, self.config);
        if let Some(token) = self.cancellation {
            optimizer = optimizer.with_cancellation(token);
        }
        let model = optimizer.train_weighted(samples, weights)?;

        log::info!(
            "Trained SVM on {} samples: {} support vectors, {:?} after {} iterations",
            samples.len(),
            model.n_support_vectors(),
            model.status(),
            model.iterations()
        );
        Ok(TrainedModel::new(model, classes))
    }
}

/// Sorted pair of distinct labels, or an error unless there are exactly two
fn binary_classes(labels: &[i32]) -> Result<[i32; 2]> {
    let mut classes = labels.to_vec();
    classes.sort_unstable();
    classes.dedup();
    match classes.as_slice() {
        &[negative, positive] => Ok([negative, positive]),
        _ => Err(Error::InvalidParameter(format!(
            "binary training needs exactly two distinct labels, found {}",
            classes.len()
        ))),
    }
}

/// Trained SVM model with high-level prediction interface
pub struct TrainedModel<K: Kernel> {
    model: TrainedSVM<K>,
    classes: [i32; 2],
}

impl<K: Kernel> TrainedModel<K> {
    pub(crate) fn new(model: TrainedSVM<K>, classes: [i32; 2]) -> Self {
        Self { model, classes }
    }

    /// Decision value; positive scores favour the larger label
    pub fn score(&self, x: &SparseVector) -> f64 {
        self.model.score(x)
    }

    /// Original class label for `x`
    pub fn decide(&self, x: &SparseVector) -> i32 {
        if self.model.decide(x) > 0.0 {
            self.classes[1]
        } else {
            self.classes[0]
        }
    }

    /// Predict a single sample; the label is ±1
    pub fn predict(&self, sample: &Sample) -> Prediction {
        self.model.predict(sample)
    }

    /// Predict multiple samples
    pub fn predict_batch(&self, samples: &[Sample]) -> Vec<Prediction> {
        self.model.predict_batch(samples)
    }

    /// Original labels for every input of a LibSVM file
    pub fn decide_from_file<P: AsRef<Path>>(&self, path: P) -> Result<Vec<i32>> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(dataset.inputs().iter().map(|x| self.decide(x)).collect())
    }

    /// Fraction of inputs whose decision matches `labels`
    pub fn evaluate(&self, inputs: &[SparseVector], labels: &[i32]) -> f64 {
        self.evaluate_detailed(inputs, labels).accuracy()
    }

    /// Evaluate accuracy from LibSVM file
    pub fn evaluate_from_file<P: AsRef<Path>>(&self, path: P) -> Result<f64> {
        let dataset = LibSVMDataset::from_file(path)?;
        Ok(self.evaluate(dataset.inputs(), dataset.labels()))
    }

    /// Confusion counts with the larger label as the positive class
    pub fn evaluate_detailed(&self, inputs: &[SparseVector], labels: &[i32]) -> EvaluationMetrics {
        let positive = self.classes[1];
        let mut metrics = EvaluationMetrics::new(0, 0, 0, 0);

        for (x, &actual) in inputs.iter().zip(labels) {
            match (self.decide(x) == positive, actual == positive) {
                (true, true) => metrics.true_positives += 1,
                (false, false) => metrics.true_negatives += 1,
                (true, false) => metrics.false_positives += 1,
                (false, true) => metrics.false_negatives += 1,
            }
        }
        metrics
    }

    /// Get model information
    pub fn info(&self) -> ModelInfo {
        ModelInfo {
            n_support_vectors: self.model.n_support_vectors(),
            bias: self.model.bias(),
            support_vector_indices: self.model.support_vector_indices().to_vec(),
            classes: self.classes,
            status: self.model.status(),
            iterations: self.model.iterations(),
        }
    }

    /// `[negative, positive]` labels
    pub fn classes(&self) -> [i32; 2] {
        self.classes
    }

    pub fn status(&self) -> SolverStatus {
        self.model.status()
    }

    /// Get the underlying trained model
    pub fn inner(&self) -> &TrainedSVM<K> {
        &self.model
    }

    pub fn into_inner(self) -> TrainedSVM<K> {
        self.model
    }
}

impl TrainedModel<LinearKernel> {
    /// Compacted `w·x + b` form of the model
    pub fn compact(&self) -> LinearMachine {
        self.model.compact()
    }
}

impl TrainedModel<KernelType> {
    /// Compacted `w·x + b` form of a loaded model, `None` unless its kernel is linear
    pub fn compact(&self) -> Option<LinearMachine> {
        self.model.compact()
    }
}

/// Detailed evaluation metrics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationMetrics {
    pub true_positives: usize,
    pub true_negatives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
}

impl EvaluationMetrics {
    fn new(tp: usize, tn: usize, fp: usize, fn_: usize) -> Self {
        Self {
            true_positives: tp,
            true_negatives: tn,
            false_positives: fp,
            false_negatives: fn_,
        }
    }

    pub fn total(&self) -> usize {
        self.true_positives + self.true_negatives + self.false_positives + self.false_negatives
    }

    /// Calculate accuracy: (TP + TN) / (TP + TN + FP + FN)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_positives + self.true_negatives, self.total())
    }

    /// Calculate precision: TP / (TP + FP)
    pub fn precision(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_positives)
    }

    /// Calculate recall (sensitivity): TP / (TP + FN)
    pub fn recall(&self) -> f64 {
        ratio(self.true_positives, self.true_positives + self.false_negatives)
    }

    /// Calculate F1 score: 2 * (precision * recall) / (precision + recall)
    pub fn f1_score(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * (p * r) / (p + r)
        }
    }

    /// Calculate specificity: TN / (TN + FP)
    pub fn specificity(&self) -> f64 {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

/// Model information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    pub n_support_vectors: usize,
    pub bias: f64,
    pub support_vector_indices: Vec<usize>,
    /// `[negative, positive]` labels
    pub classes: [i32; 2],
    pub status: SolverStatus,
    pub iterations: usize,
}

/// Convenience functions for quick operations
pub mod quick {
    use super::*;

    /// Train a linear SVM on LibSVM data with default parameters
    pub fn train_libsvm<P: AsRef<Path>>(path: P) -> Result<TrainedModel<LinearKernel>> {
        SVM::new().train_from_file(path)
    }

    /// Train with custom C parameter
    pub fn train_libsvm_with_c<P: AsRef<Path>>(
        path: P,
        c: f64,
    ) -> Result<TrainedModel<LinearKernel>> {
        SVM::new().with_c(c).train_from_file(path)
    }

    /// Quick evaluation: train on training file, test on test file
    pub fn evaluate_split<P1: AsRef<Path>, P2: AsRef<Path>>(
        train_path: P1,
        test_path: P2,
    ) -> Result<f64> {
        let model = train_libsvm(train_path)?;
        model.evaluate_from_file(test_path)
    }

    /// Hold-out validation on a sequential split (not randomized for reproducibility)
    pub fn simple_validation(
        inputs: &[SparseVector],
        labels: &[i32],
        train_ratio: f64,
        c: f64,
    ) -> Result<f64> {
        if train_ratio <= 0.0 || train_ratio >= 1.0 {
            return Err(Error::InvalidParameter(format!(
                "Train ratio must be between 0 and 1, got: {train_ratio}"
            )));
        }
        if labels.len() != inputs.len() {
            return Err(Error::DimensionMismatch {
                expected: inputs.len(),
                actual: labels.len(),
            });
        }

        let train_size = (inputs.len() as f64 * train_ratio) as usize;
        let model = SVM::new()
            .with_c(c)
            .learn(&inputs[..train_size], &labels[..train_size], None)?;

        Ok(model.evaluate(&inputs[train_size..], &labels[train_size..]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::RBFKernel;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn toy() -> (Vec<SparseVector>, Vec<i32>) {
        let inputs = [[2.0, 2.0], [3.0, 3.0], [-2.0, -2.0], [-3.0, -3.0]]
            .iter()
            .map(|x| SparseVector::from_dense(x))
            .collect();
        (inputs, vec![7, 7, 3, 3])
    }

    #[test]
    fn test_svm_builder_pattern() {
        let svm = SVM::new()
            .with_c(2.0)
            .with_epsilon(0.01)
            .with_max_iterations(5000)
            .with_class_weights(2.0, 0.5)
            .with_cache_size(1024)
            .with_working_set_strategy(WorkingSetStrategy::Random)
            .with_seed(9);

        let config = svm.config();
        assert_eq!(config.c, 2.0);
        assert_eq!(config.epsilon, 0.01);
        assert_eq!(config.max_iterations, 5000);
        assert_eq!((config.positive_weight, config.negative_weight), (2.0, 0.5));
        assert_eq!(config.cache_size, 1024);
        assert_eq!(config.working_set_strategy, WorkingSetStrategy::Random);
        assert_eq!(config.seed, 9);
    }

    #[test]
    fn test_learn_maps_labels() {
        let (inputs, labels) = toy();
        let model = SVM::new().learn(&inputs, &labels, None).unwrap();

        assert_eq!(model.classes(), [3, 7]);
        for (x, &label) in inputs.iter().zip(&labels) {
            assert_eq!(model.decide(x), label);
        }
        assert!(model.score(&inputs[0]) > 0.0);
        assert_eq!(model.evaluate(&inputs, &labels), 1.0);
    }

    #[test]
    fn test_learn_validation() {
        let (inputs, labels) = toy();

        assert!(matches!(
            SVM::new().learn(&[], &[], None),
            Err(Error::EmptyDataset)
        ));
        assert!(matches!(
            SVM::new().learn(&inputs, &labels[..3], None),
            Err(Error::DimensionMismatch {
                expected: 4,
                actual: 3
            })
        ));
        assert!(matches!(
            SVM::new().learn(&inputs, &[1, 1, 1, 1], None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SVM::new().learn(&inputs, &[1, 2, 3, 1], None),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SVM::new().learn(&inputs, &labels, Some(&[1.0, -1.0, 1.0, 1.0])),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            SVM::new().with_c(0.0).learn(&inputs, &labels, None),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_learn_dense_with_rbf() {
        let inputs = vec![vec![0.0, 0.0], vec![0.1, 0.2], vec![3.0, 3.0], vec![3.2, 2.9]];
        let labels = [0, 0, 1, 1];
        let model = SVM::with_kernel(RBFKernel::new(0.5))
            .with_c(10.0)
            .learn_dense(&inputs, &labels, None)
            .unwrap();

        assert_eq!(model.decide(&SparseVector::from_dense(&[0.05, 0.1])), 0);
        assert_eq!(model.decide(&SparseVector::from_dense(&[3.1, 3.0])), 1);
    }

    #[test]
    fn test_quick_training() {
        let samples = vec![
            Sample::new(SparseVector::new(vec![0], vec![2.0]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-2.0]), -1.0),
            Sample::new(SparseVector::new(vec![0], vec![1.5]), 1.0),
            Sample::new(SparseVector::new(vec![0], vec![-1.5]), -1.0),
        ];

        let model = SVM::new()
            .train_samples(&samples)
            .expect("Training should succeed");

        let test_sample = Sample::new(SparseVector::new(vec![0], vec![1.0]), 1.0);
        assert_eq!(model.predict(&test_sample).label, 1.0);
        assert_eq!(model.decide(&test_sample.features), 1);

        let info = model.info();
        assert!(info.n_support_vectors > 0);
        assert_eq!(info.classes, [-1, 1]);
        assert_eq!(info.status, SolverStatus::Converged);
    }

    #[test]
    fn test_compact_decisions_agree() {
        let (inputs, labels) = toy();
        let model = SVM::new().learn(&inputs, &labels, None).unwrap();
        let machine = model.compact();

        for x in &inputs {
            assert_eq!(machine.decide(x) > 0.0, model.decide(x) == 7);
        }
    }

    #[test]
    fn test_evaluation_metrics() {
        let metrics = EvaluationMetrics::new(10, 5, 2, 3);

        assert_eq!(metrics.accuracy(), 0.75); // (10+5)/(10+5+2+3)
        assert_eq!(metrics.precision(), 10.0 / 12.0); // 10/(10+2)
        assert_eq!(metrics.recall(), 10.0 / 13.0); // 10/(10+3)
        assert!(metrics.f1_score() > 0.0);
        assert_eq!(metrics.specificity(), 5.0 / 7.0); // 5/(5+2)

        let empty = EvaluationMetrics::new(0, 0, 0, 0);
        assert_eq!(empty.accuracy(), 0.0);
        assert_eq!(empty.f1_score(), 0.0);
    }

    #[test]
    fn test_evaluate_detailed_uses_larger_label_as_positive() {
        let (inputs, labels) = toy();
        let model = SVM::new().learn(&inputs, &labels, None).unwrap();
        // Flip the truth of one negative sample
        let truth = [7, 7, 7, 3];
        let metrics = model.evaluate_detailed(&inputs, &truth);

        assert_eq!(metrics.true_positives, 2);
        assert_eq!(metrics.false_negatives, 1);
        assert_eq!(metrics.true_negatives, 1);
        assert_eq!(metrics.false_positives, 0);
    }

    #[test]
    fn test_file_operations() {
        let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(temp_file, "+1 1:2.0").expect("Failed to write");
        writeln!(temp_file, "-1 1:-2.0").expect("Failed to write");
        writeln!(temp_file, "+1 1:1.5").expect("Failed to write");
        writeln!(temp_file, "-1 1:-1.5").expect("Failed to write");
        temp_file.flush().expect("Failed to flush");

        let model = SVM::new()
            .train_from_file(temp_file.path())
            .expect("Training should succeed");

        let accuracy = model
            .evaluate_from_file(temp_file.path())
            .expect("Evaluation should succeed");
        assert_eq!(accuracy, 1.0);
        assert_eq!(
            model.decide_from_file(temp_file.path()).unwrap(),
            vec![1, -1, 1, -1]
        );

        let accuracy = quick::evaluate_split(temp_file.path(), temp_file.path()).unwrap();
        assert_eq!(accuracy, 1.0);
    }

    #[test]
    fn test_simple_validation() {
        let inputs: Vec<SparseVector> = [2.0, -2.0, 1.5, -1.5, 1.8, -1.8, 2.5, -2.5]
            .iter()
            .map(|&x| SparseVector::from_dense(&[x]))
            .collect();
        let labels = [1, -1, 1, -1, 1, -1, 1, -1];

        let accuracy = quick::simple_validation(&inputs, &labels, 0.75, 1.0)
            .expect("Validation should succeed");
        assert_eq!(accuracy, 1.0);

        assert!(quick::simple_validation(&inputs, &labels, 1.5, 1.0).is_err());
    }
}
