//! One-vs-one multi-class classification
//!
//! A machine is trained for every pair of classes on the samples of those
//! two classes only. Prediction runs every machine and the class with the
//! most pairwise wins is chosen; ties go to the smaller label.

use crate::api::TrainedModel;
use crate::core::{CancellationToken, Error, OptimizerConfig, Result, Sample, SparseVector};
use crate::kernel::{Kernel, LinearKernel};
use crate::optimizer::SVMOptimizer;
use rayon::prelude::*;
use std::sync::Arc;

/// One-vs-one trainer
pub struct MulticlassSVM<K: Kernel = LinearKernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
    cancellation: Option<CancellationToken>,
    parallel: bool,
}

impl MulticlassSVM<LinearKernel> {
    pub fn new() -> Self {
        Self::with_kernel(LinearKernel::new())
    }
}

impl Default for MulticlassSVM<LinearKernel> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Kernel> MulticlassSVM<K> {
    pub fn with_kernel(kernel: K) -> Self {
        Self {
            kernel: Arc::new(kernel),
            config: OptimizerConfig::default(),
            cancellation: None,
            parallel: false,
        }
    }

    /// Solver configuration shared by every pairwise machine
    pub fn with_config(mut self, config: OptimizerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_c(mut self, c: f64) -> Self {
        self.config.c = c;
        self
    }

    /// Train the pairwise machines on the rayon thread pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Shared by every sub-problem; cancelled machines keep their partial state
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Train one machine per class pair; needs at least two distinct labels
    pub fn learn(
        &self,
        inputs: &[SparseVector],
        labels: &[i32],
        weights: Option<&[f64]>,
    ) -> Result<MulticlassModel<K>> {
        if inputs.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if labels.len() != inputs.len() {
            return Err(Error::DimensionMismatch {
                expected: inputs.len(),
                actual: labels.len(),
            });
        }
        if let Some(weights) = weights {
            if weights.len() != inputs.len() {
                return Err(Error::DimensionMismatch {
                    expected: inputs.len(),
                    actual: weights.len(),
                });
            }
        }

        let mut classes = labels.to_vec();
        classes.sort_unstable();
        classes.dedup();
        if classes.len() < 2 {
            return Err(Error::InvalidParameter(
                "multi-class training needs at least two distinct labels".to_string(),
            ));
        }

        let pairs: Vec<[i32; 2]> = classes
            .iter()
            .enumerate()
            .flat_map(|(k, &a)| classes[k + 1..].iter().map(move |&b| [a, b]))
            .collect();

        let train = |pair: &[i32; 2]| self.train_pair(*pair, inputs, labels, weights);
        let machines = if self.parallel {
            pairs.par_iter().map(train).collect::<Result<Vec<_>>>()?
        } else {
            pairs.iter().map(train).collect::<Result<Vec<_>>>()?
        };

        log::info!(
            "Trained {} pairwise machines over {} classes",
            machines.len(),
            classes.len()
        );
        Ok(MulticlassModel { classes, machines })
    }

    fn train_pair(
        &self,
        pair: [i32; 2],
        inputs: &[SparseVector],
        labels: &[i32],
        weights: Option<&[f64]>,
    ) -> Result<TrainedModel<K>> {
        let selected: Vec<usize> = (0..labels.len())
            .filter(|&i| labels[i] == pair[0] || labels[i] == pair[1])
            .collect();
        let samples: Vec<Sample> = selected
            .iter()
            .map(|&i| {
                let y = if labels[i] == pair[1] { 1.0 } else { -1.0 };
                Sample::new(inputs[i].clone(), y)
            })
            .collect();
        let pair_weights: Option<Vec<f64>> =
            weights.map(|w| selected.iter().map(|&i| w[i]).collect());

        let mut optimizer =
            SVMOptimizer::with_shared_kernel(Arc::clone(&self.kernel), self.config.clone());
        if let Some(token) = &self.cancellation {
            optimizer = optimizer.with_cancellation(token.clone());
        }
        let model = optimizer.train_weighted(&samples, pair_weights.as_deref())?;
        log::debug!(
            "pair {} vs {}: {} samples, {:?}",
            pair[0],
            pair[1],
            samples.len(),
            model.status()
        );
        Ok(TrainedModel::new(model, pair))
    }
}

/// Trained one-vs-one model
pub struct MulticlassModel<K: Kernel> {
    classes: Vec<i32>,
    machines: Vec<TrainedModel<K>>,
}

impl<K: Kernel> MulticlassModel<K> {
    /// Winning class by majority vote
    pub fn decide(&self, x: &SparseVector) -> i32 {
        tally(&self.classes, self.machines.iter().map(|m| m.decide(x)))
    }

    /// Pairwise wins per class, in class order
    pub fn votes(&self, x: &SparseVector) -> Vec<(i32, usize)> {
        let mut votes: Vec<(i32, usize)> = self.classes.iter().map(|&c| (c, 0)).collect();
        for winner in self.machines.iter().map(|m| m.decide(x)) {
            if let Ok(k) = self.classes.binary_search(&winner) {
                votes[k].1 += 1;
            }
        }
        votes
    }

    pub fn decide_batch(&self, inputs: &[SparseVector]) -> Vec<i32> {
        inputs.iter().map(|x| self.decide(x)).collect()
    }

    /// Fraction of inputs whose decision matches `labels`
    pub fn evaluate(&self, inputs: &[SparseVector], labels: &[i32]) -> f64 {
        if inputs.is_empty() {
            return 0.0;
        }
        let correct = inputs
            .iter()
            .zip(labels)
            .filter(|(x, &l)| self.decide(x) == l)
            .count();
        correct as f64 / inputs.len() as f64
    }

    /// Distinct labels in ascending order
    pub fn classes(&self) -> &[i32] {
        &self.classes
    }

    /// Pairwise machines ordered by `(negative, positive)` label
    pub fn machines(&self) -> &[TrainedModel<K>] {
        &self.machines
    }

    /// True when every pairwise solver converged
    pub fn is_converged(&self) -> bool {
        self.machines.iter().all(|m| m.status().is_converged())
    }

    /// Support vectors summed over all machines
    pub fn n_support_vectors(&self) -> usize {
        self.machines
            .iter()
            .map(|m| m.info().n_support_vectors)
            .sum()
    }

    pub(crate) fn from_parts(classes: Vec<i32>, machines: Vec<TrainedModel<K>>) -> Self {
        Self { classes, machines }
    }
}

/// Class with the most wins; `classes` is sorted so the first maximum is the smallest label
fn tally(classes: &[i32], winners: impl Iterator<Item = i32>) -> i32 {
    let mut counts = vec![0usize; classes.len()];
    for winner in winners {
        if let Ok(k) = classes.binary_search(&winner) {
            counts[k] += 1;
        }
    }

    let mut best = 0;
    for (k, &count) in counts.iter().enumerate() {
        if count > counts[best] {
            best = k;
        }
    }
    classes.get(best).copied().unwrap_or_default()
}
