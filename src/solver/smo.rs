//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves the C-SVM dual
//!
//! ```text
//! min ½ αᵀQα - eᵀα   s.t.  yᵀα = 0,  0 <= αᵢ <= Cᵢ
//! ```
//!
//! with `Qᵢⱼ = yᵢ yⱼ K(xᵢ, xⱼ)` by updating two multipliers at a time. The
//! solver maintains the gradient `G = Qα - e` instead of the error cache of
//! the original SMO paper, which makes the KKT violation of the whole
//! problem available at every step: optimality is reached when
//! `m(α) - M(α) <= epsilon`, where `m` and `M` are the extreme values of
//! `-yᵢGᵢ` over the indices that may still move up and down.

use crate::cache::KernelCache;
use crate::core::{
    CancellationToken, Error, OptimizationResult, OptimizerConfig, Result, Sample, SolverStatus,
    WorkingSetStrategy,
};
use crate::kernel::Kernel;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

/// Curvature substituted when `K_ii + K_jj - 2K_ij <= 0` (non-PSD kernels)
const TAU: f64 = 1e-12;

/// SMO solver for SVM optimization
///
/// ```
/// use std::sync::Arc;
/// use svmkit::core::{OptimizerConfig, Sample, SparseVector};
/// use svmkit::kernel::LinearKernel;
/// use svmkit::solver::SMOSolver;
///
/// let samples = vec![
///     Sample::new(SparseVector::from_dense(&[2.0]), 1.0),
///     Sample::new(SparseVector::from_dense(&[-2.0]), -1.0),
/// ];
/// let solver = SMOSolver::new(Arc::new(LinearKernel), OptimizerConfig::default());
/// let result = solver.solve(&samples).unwrap();
/// assert!(result.status.is_converged());
/// assert_eq!(result.support_vectors, vec![0, 1]);
/// ```
pub struct SMOSolver<K: Kernel> {
    kernel: Arc<K>,
    config: OptimizerConfig,
    cancellation: Option<CancellationToken>,
}

/// Mutable state of one solver run
struct State<'a> {
    samples: &'a [Sample],
    y: Vec<f64>,
    bound: Vec<f64>,
    alpha: Vec<f64>,
    gradient: Vec<f64>,
    diagonal: Vec<f64>,
    norms: Vec<f64>,
}

impl State<'_> {
    fn is_upper(&self, t: usize) -> bool {
        self.alpha[t] >= self.bound[t]
    }

    fn is_lower(&self, t: usize) -> bool {
        self.alpha[t] <= 0.0
    }
}

/// Outcome of working-set selection
enum Selection {
    Pair { i: usize, j: usize, violation: f64 },
    Optimal { violation: f64 },
    Failed,
}

impl<K: Kernel> SMOSolver<K> {
    /// Create a new SMO solver with the given kernel and configuration
    pub fn new(kernel: Arc<K>, config: OptimizerConfig) -> Self {
        Self {
            kernel,
            config,
            cancellation: None,
        }
    }

    /// Poll `token` once per iteration; a fired token ends the run with
    /// [`SolverStatus::Cancelled`]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Solve with unit sample weights
    pub fn solve(&self, samples: &[Sample]) -> Result<OptimizationResult> {
        self.solve_weighted(samples, None)
    }

    /// Solve with optional per-sample weights scaling each box bound
    pub fn solve_weighted(
        &self,
        samples: &[Sample],
        weights: Option<&[f64]>,
    ) -> Result<OptimizationResult> {
        let mut cache = KernelCache::with_memory_limit(self.config.cache_size, samples.len());
        self.solve_with_cache(samples, weights, &mut cache)
    }

    /// Solve the SVM optimization problem with a caller-provided kernel row cache
    pub fn solve_with_cache(
        &self,
        samples: &[Sample],
        weights: Option<&[f64]>,
        cache: &mut KernelCache,
    ) -> Result<OptimizationResult> {
        let bound = self.validate(samples, weights)?;
        let n = samples.len();

        let norms: Vec<f64> = samples.iter().map(|s| s.features.norm_squared()).collect();
        let diagonal: Vec<f64> = samples
            .iter()
            .zip(&norms)
            .map(|(s, &nrm)| self.kernel.compute_with_norms(&s.features, &s.features, nrm, nrm))
            .collect();

        let mut state = State {
            samples,
            y: samples.iter().map(|s| s.label).collect(),
            bound,
            alpha: vec![0.0; n],
            gradient: vec![-1.0; n],
            diagonal,
            norms,
        };

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut iterations = 0;
        let mut max_violation = f64::INFINITY;

        let status = loop {
            if self
                .cancellation
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                break SolverStatus::Cancelled;
            }

            let (i, j) = match self.select_working_set(&state, cache, &mut rng) {
                Selection::Optimal { violation } => {
                    max_violation = violation.max(0.0);
                    break SolverStatus::Converged;
                }
                Selection::Failed => break SolverStatus::Failed,
                Selection::Pair { i, j, violation } => {
                    max_violation = violation;
                    (i, j)
                }
            };

            if iterations >= self.config.max_iterations {
                break SolverStatus::MaxIterationsExceeded;
            }

            let q_i = self.q_row(&state, cache, i);
            let q_j = self.q_row(&state, cache, j);
            if !is_finite_row(&q_i) || !is_finite_row(&q_j) {
                log::warn!("SMO: non-finite kernel value on pair ({i}, {j})");
                break SolverStatus::Failed;
            }

            iterations += 1;
            self.update_pair(&mut state, i, j, &q_i, &q_j);
        };

        let b = -compute_rho(&state);
        let objective_value = state
            .alpha
            .iter()
            .zip(&state.gradient)
            .map(|(a, g)| a * (1.0 - g) / 2.0)
            .sum();
        let support_vectors: Vec<usize> = (0..n).filter(|&t| state.alpha[t] > 0.0).collect();

        match status {
            SolverStatus::Converged => log::debug!(
                "SMO converged in {iterations} iterations, {} support vectors",
                support_vectors.len()
            ),
            other => log::warn!(
                "SMO stopped ({other:?}) after {iterations} iterations, violation {max_violation:e}"
            ),
        }

        Ok(OptimizationResult {
            alpha: state.alpha,
            b,
            support_vectors,
            iterations,
            objective_value,
            status,
            max_violation,
            cache_hit_rate: cache.hit_rate(),
        })
    }

    /// Check labels, parameters and weights; return the per-sample box bounds
    fn validate(&self, samples: &[Sample], weights: Option<&[f64]>) -> Result<Vec<f64>> {
        if samples.is_empty() {
            return Err(Error::EmptyDataset);
        }
        for sample in samples {
            if sample.label != 1.0 && sample.label != -1.0 {
                return Err(Error::InvalidLabel(sample.label));
            }
        }

        let config = &self.config;
        if !(config.c > 0.0 && config.c.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "C must be positive and finite, got {}",
                config.c
            )));
        }
        if !(config.epsilon > 0.0 && config.epsilon.is_finite()) {
            return Err(Error::InvalidParameter(format!(
                "epsilon must be positive and finite, got {}",
                config.epsilon
            )));
        }
        for w in [config.positive_weight, config.negative_weight] {
            if !(w > 0.0 && w.is_finite()) {
                return Err(Error::InvalidParameter(format!(
                    "class weights must be positive and finite, got {w}"
                )));
            }
        }

        match weights {
            None => Ok(samples
                .iter()
                .map(|s| config.upper_bound(s.label, 1.0))
                .collect()),
            Some(weights) => {
                if weights.len() != samples.len() {
                    return Err(Error::DimensionMismatch {
                        expected: samples.len(),
                        actual: weights.len(),
                    });
                }
                if let Some(&bad) = weights.iter().find(|w| !(**w >= 0.0 && w.is_finite())) {
                    return Err(Error::InvalidParameter(format!(
                        "sample weights must be non-negative and finite, got {bad}"
                    )));
                }
                Ok(samples
                    .iter()
                    .zip(weights)
                    .map(|(s, &w)| config.upper_bound(s.label, w))
                    .collect())
            }
        }
    }

    /// Row `i` of Q, through the cache
    fn q_row(&self, state: &State<'_>, cache: &mut KernelCache, i: usize) -> Arc<[f64]> {
        cache.get_or_insert_with(i, || {
            let xi = &state.samples[i].features;
            let yi = state.y[i];
            state
                .samples
                .iter()
                .enumerate()
                .map(|(t, s)| {
                    yi * state.y[t]
                        * self
                            .kernel
                            .compute_with_norms(xi, &s.features, state.norms[i], state.norms[t])
                })
                .collect()
        })
    }

    /// Pick `i` as the maximal violator in I_up, then `j` from I_low by the
    /// configured strategy
    fn select_working_set(
        &self,
        state: &State<'_>,
        cache: &mut KernelCache,
        rng: &mut StdRng,
    ) -> Selection {
        let n = state.alpha.len();

        // m(α) = max { -yₜGₜ : t ∈ I_up }
        let mut g_max = f64::NEG_INFINITY;
        let mut i = None;
        for t in 0..n {
            let value = -state.y[t] * state.gradient[t];
            let movable = if state.y[t] > 0.0 {
                !state.is_upper(t)
            } else {
                !state.is_lower(t)
            };
            if movable && value >= g_max {
                g_max = value;
                i = Some(t);
            }
        }
        let Some(i) = i else {
            return Selection::Optimal { violation: 0.0 };
        };

        let q_i = match self.config.working_set_strategy {
            WorkingSetStrategy::SecondOrder => {
                let row = self.q_row(state, cache, i);
                if !is_finite_row(&row) {
                    log::warn!("SMO: non-finite kernel value in row {i}");
                    return Selection::Failed;
                }
                Some(row)
            }
            _ => None,
        };

        // -M(α) = max { yₜGₜ : t ∈ I_low }
        let mut g_max2 = f64::NEG_INFINITY;
        let mut mvp_j = None;
        let mut best_j = None;
        let mut best_objective = f64::INFINITY;
        let mut violators = Vec::new();

        for t in 0..n {
            let movable = if state.y[t] > 0.0 {
                !state.is_lower(t)
            } else {
                !state.is_upper(t)
            };
            if !movable {
                continue;
            }

            let value = state.y[t] * state.gradient[t];
            if value >= g_max2 {
                g_max2 = value;
                mvp_j = Some(t);
            }

            let grad_diff = g_max + value;
            if grad_diff <= 0.0 {
                continue;
            }
            match (&self.config.working_set_strategy, &q_i) {
                (WorkingSetStrategy::SecondOrder, Some(q_i)) => {
                    // Curvature of the objective along the feasible direction
                    let quad =
                        state.diagonal[i] + state.diagonal[t] - 2.0 * state.y[i] * state.y[t] * q_i[t];
                    let quad = if quad > 0.0 { quad } else { TAU };
                    let objective = -(grad_diff * grad_diff) / quad;
                    if objective <= best_objective {
                        best_objective = objective;
                        best_j = Some(t);
                    }
                }
                (WorkingSetStrategy::Random, _) => violators.push(t),
                _ => {}
            }
        }

        let j = match self.config.working_set_strategy {
            WorkingSetStrategy::MaximalViolatingPair => mvp_j,
            WorkingSetStrategy::SecondOrder => best_j,
            WorkingSetStrategy::Random if violators.is_empty() => None,
            WorkingSetStrategy::Random => Some(violators[rng.gen_range(0..violators.len())]),
        };

        let violation = g_max + g_max2;
        match j {
            Some(j) if violation > self.config.epsilon => Selection::Pair { i, j, violation },
            _ => Selection::Optimal { violation },
        }
    }

    /// Analytic solution of the two-variable sub-problem, clipped to the box
    fn update_pair(&self, state: &mut State<'_>, i: usize, j: usize, q_i: &[f64], q_j: &[f64]) {
        let (c_i, c_j) = (state.bound[i], state.bound[j]);
        let (old_ai, old_aj) = (state.alpha[i], state.alpha[j]);
        let (g_i, g_j) = (state.gradient[i], state.gradient[j]);
        let mut a_i = old_ai;
        let mut a_j = old_aj;

        if state.y[i] != state.y[j] {
            let quad = state.diagonal[i] + state.diagonal[j] + 2.0 * q_i[j];
            let quad = if quad > 0.0 { quad } else { TAU };
            let delta = (-g_i - g_j) / quad;
            let diff = a_i - a_j;
            a_i += delta;
            a_j += delta;

            if diff > 0.0 {
                if a_j < 0.0 {
                    a_j = 0.0;
                    a_i = diff;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = -diff;
            }
            if diff > c_i - c_j {
                if a_i > c_i {
                    a_i = c_i;
                    a_j = c_i - diff;
                }
            } else if a_j > c_j {
                a_j = c_j;
                a_i = c_j + diff;
            }
        } else {
            let quad = state.diagonal[i] + state.diagonal[j] - 2.0 * q_i[j];
            let quad = if quad > 0.0 { quad } else { TAU };
            let delta = (g_i - g_j) / quad;
            let sum = a_i + a_j;
            a_i -= delta;
            a_j += delta;

            if sum > c_i {
                if a_i > c_i {
                    a_i = c_i;
                    a_j = sum - c_i;
                }
            } else if a_j < 0.0 {
                a_j = 0.0;
                a_i = sum;
            }
            if sum > c_j {
                if a_j > c_j {
                    a_j = c_j;
                    a_i = sum - c_j;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = sum;
            }
        }

        state.alpha[i] = a_i;
        state.alpha[j] = a_j;

        let delta_i = a_i - old_ai;
        let delta_j = a_j - old_aj;
        for (t, g) in state.gradient.iter_mut().enumerate() {
            *g += q_i[t] * delta_i + q_j[t] * delta_j;
        }
    }
}

fn is_finite_row(row: &[f64]) -> bool {
    row.iter().all(|v| v.is_finite())
}

/// Offset ρ = -b: mean of yᵢGᵢ over free multipliers, else the midpoint of
/// the feasible interval
fn compute_rho(state: &State<'_>) -> f64 {
    let mut upper = f64::INFINITY;
    let mut lower = f64::NEG_INFINITY;
    let mut free_sum = 0.0;
    let mut free_count = 0usize;

    for t in 0..state.alpha.len() {
        let yg = state.y[t] * state.gradient[t];
        let at_upper = state.is_upper(t);
        let at_lower = state.is_lower(t);

        if at_upper && at_lower {
            // Zero-width box: the multiplier carries no information
            continue;
        } else if at_upper {
            if state.y[t] < 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else if at_lower {
            if state.y[t] > 0.0 {
                upper = upper.min(yg);
            } else {
                lower = lower.max(yg);
            }
        } else {
            free_count += 1;
            free_sum += yg;
        }
    }

    if free_count > 0 {
        return free_sum / free_count as f64;
    }
    match (upper.is_finite(), lower.is_finite()) {
        (true, true) => (upper + lower) / 2.0,
        (true, false) => upper,
        (false, true) => lower,
        (false, false) => 0.0,
    }
}
