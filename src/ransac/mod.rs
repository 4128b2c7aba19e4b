//! Random sample consensus
//!
//! [`Ransac`] repeatedly fits a model to a minimal random subset of the
//! data, counts the points the model explains within a threshold, and keeps
//! the candidate with the largest consensus set. The number of draws adapts
//! to the best inlier ratio `w` seen so far:
//!
//! ```text
//! N = log(1 - p) / log(1 - w^s)
//! ```
//!
//! which is the number of draws needed to pick at least one all-inlier
//! sample of size `s` with probability `p`.

pub mod regression;

pub use self::regression::*;

use crate::core::{CancellationToken, Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Model fitting callbacks driven by [`Ransac`]
pub trait Estimator {
    type Model;

    /// Fit a model to the points at `sample`; `Ok(None)` when no model exists
    fn fit(&self, sample: &[usize]) -> Result<Option<Self::Model>>;

    /// Indices of every point within `threshold` of `model`
    fn inliers(&self, model: &Self::Model, threshold: f64) -> Vec<usize>;

    /// Reject a sample before fitting
    fn is_degenerate(&self, _sample: &[usize]) -> bool {
        false
    }
}

type DegeneracyFn = Box<dyn Fn(&[usize]) -> bool + Send + Sync>;

/// [`Estimator`] built from closures
pub struct FnEstimator<M, F, G> {
    fit: F,
    inliers: G,
    degenerate: Option<DegeneracyFn>,
    _model: PhantomData<fn() -> M>,
}

impl<M, F, G> FnEstimator<M, F, G>
where
    F: Fn(&[usize]) -> Result<Option<M>>,
    G: Fn(&M, f64) -> Vec<usize>,
{
    pub fn new(fit: F, inliers: G) -> Self {
        Self {
            fit,
            inliers,
            degenerate: None,
            _model: PhantomData,
        }
    }

    pub fn with_degeneracy<D>(mut self, degenerate: D) -> Self
    where
        D: Fn(&[usize]) -> bool + Send + Sync + 'static,
    {
        self.degenerate = Some(Box::new(degenerate));
        self
    }
}

impl<M, F, G> Estimator for FnEstimator<M, F, G>
where
    F: Fn(&[usize]) -> Result<Option<M>>,
    G: Fn(&M, f64) -> Vec<usize>,
{
    type Model = M;

    fn fit(&self, sample: &[usize]) -> Result<Option<M>> {
        (self.fit)(sample)
    }

    fn inliers(&self, model: &M, threshold: f64) -> Vec<usize> {
        (self.inliers)(model, threshold)
    }

    fn is_degenerate(&self, sample: &[usize]) -> bool {
        self.degenerate.as_ref().is_some_and(|d| d(sample))
    }
}

/// RANSAC parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RansacConfig {
    /// Points per minimal sample
    pub min_samples: usize,
    /// Inlier distance threshold, in the estimator's residual units
    pub threshold: f64,
    /// Desired probability of drawing at least one all-inlier sample
    pub probability: f64,
    /// Hard cap on the number of draws
    pub max_evaluations: usize,
    /// Redraws allowed per iteration when samples are degenerate
    pub max_degenerate_draws: usize,
    pub seed: u64,
}

impl Default for RansacConfig {
    fn default() -> Self {
        Self {
            min_samples: 2,
            threshold: 1.0,
            probability: 0.99,
            max_evaluations: 1000,
            max_degenerate_draws: 100,
            seed: 0,
        }
    }
}

impl RansacConfig {
    pub fn new(min_samples: usize, threshold: f64) -> Self {
        Self {
            min_samples,
            threshold,
            ..Default::default()
        }
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if self.min_samples == 0 {
            return Err(Error::InvalidParameter(
                "min_samples must be at least 1".to_string(),
            ));
        }
        if !(self.threshold >= 0.0 && self.threshold.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "threshold must be non-negative and finite, got {}",
                self.threshold
            )));
        }
        if !(self.probability > 0.0 && self.probability < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "probability must lie in (0, 1), got {}",
                self.probability
            )));
        }
        if self.max_evaluations == 0 {
            return Err(Error::InvalidParameter(
                "max_evaluations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Best consensus found by [`Ransac::run`]
#[derive(Debug, Clone)]
pub struct RansacResult<M> {
    /// Fit on the minimal sample that produced the best consensus.
    /// Refit on `inliers` for a least-squares estimate.
    pub model: M,
    /// Sorted indices of the consensus set
    pub inliers: Vec<usize>,
    /// Draws performed
    pub iterations: usize,
    /// Draws the stopping rule asked for when the loop ended
    pub required_iterations: usize,
}

impl<M> RansacResult<M> {
    pub fn inlier_ratio(&self, n: usize) -> f64 {
        if n == 0 {
            0.0
        } else {
            self.inliers.len() as f64 / n as f64
        }
    }
}

/// RANSAC driver over an [`Estimator`]
pub struct Ransac<E: Estimator> {
    estimator: E,
    config: RansacConfig,
    cancellation: Option<CancellationToken>,
}

impl<E: Estimator> Ransac<E> {
    pub fn new(estimator: E, config: RansacConfig) -> Self {
        Self {
            estimator,
            config,
            cancellation: None,
        }
    }

    /// Poll `token` before every draw
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    pub fn config(&self) -> &RansacConfig {
        &self.config
    }

    /// Search for the largest consensus set among `n` points
    ///
    /// `Ok(None)` when no model explains any point, every fit failed, or
    /// `min_samples > n`. Errors come only from the estimator or from an
    /// invalid configuration.
    pub fn run(&self, n: usize) -> Result<Option<RansacResult<E::Model>>> {
        self.config.validate()?;
        let s = self.config.min_samples;
        if s > n {
            log::debug!("RANSAC: {s} samples requested from {n} points");
            return Ok(None);
        }

        let max_evaluations = self.config.max_evaluations;
        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut best: Option<(E::Model, Vec<usize>)> = None;
        let mut required = max_evaluations;
        let mut iterations = 0;

        while iterations < required {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                log::debug!("RANSAC cancelled after {iterations} iterations");
                break;
            }
            iterations += 1;

            let Some(sample) = self.draw(&mut rng, n) else {
                continue;
            };
            let Some(model) = self.estimator.fit(&sample)? else {
                continue;
            };

            let mut inliers = self.estimator.inliers(&model, self.config.threshold);
            let best_count = best.as_ref().map_or(0, |(_, b)| b.len());
            if inliers.len() > best_count {
                inliers.sort_unstable();
                required = required_iterations(
                    inliers.len() as f64 / n as f64,
                    s,
                    self.config.probability,
                    max_evaluations,
                );
                best = Some((model, inliers));
            }
        }

        match best {
            Some((model, inliers)) if !inliers.is_empty() => {
                log::info!(
                    "RANSAC: {} of {n} inliers after {iterations} iterations",
                    inliers.len()
                );
                Ok(Some(RansacResult {
                    model,
                    inliers,
                    iterations,
                    required_iterations: required,
                }))
            }
            _ => {
                log::warn!("RANSAC found no consensus after {iterations} iterations");
                Ok(None)
            }
        }
    }

    /// Minimal sample without replacement, redrawn while degenerate
    fn draw(&self, rng: &mut StdRng, n: usize) -> Option<Vec<usize>> {
        for _ in 0..self.config.max_degenerate_draws.max(1) {
            let sample = rand::seq::index::sample(rng, n, self.config.min_samples).into_vec();
            if !self.estimator.is_degenerate(&sample) {
                return Some(sample);
            }
        }
        None
    }
}

/// `log(1 - p) / log(1 - w^s)` rounded up and clamped to `[1, cap]`
pub fn required_iterations(inlier_ratio: f64, min_samples: usize, probability: f64, cap: usize) -> usize {
    if inlier_ratio <= 0.0 {
        return cap;
    }
    let all_inliers = inlier_ratio.min(1.0).powi(min_samples as i32);
    if all_inliers >= 1.0 {
        return 1.min(cap);
    }

    let n = (1.0 - probability).ln() / (1.0 - all_inliers).ln();
    if !n.is_finite() || n >= cap as f64 {
        cap
    } else {
        (n.ceil() as usize).clamp(1, cap)
    }
}
