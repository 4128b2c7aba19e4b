//! Data-driven kernel parameter heuristics

use crate::core::SparseVector;
use crate::kernel::Kernel;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Inputs examined by the estimation heuristics
pub const DEFAULT_ESTIMATE_SAMPLES: usize = 1024;

/// Heuristic value for the regularization parameter C: `n / Σ K(xᵢ, xᵢ)`.
///
/// Computed over at most [`DEFAULT_ESTIMATE_SAMPLES`] inputs taken at an
/// even stride. This is the usual "inverse mean self-similarity" rule of
/// thumb, a starting point for a parameter search rather than a tuned
/// value. Returns 1.0 when there is no usable input.
///
/// ```
/// use svmkit::core::SparseVector;
/// use svmkit::kernel::{estimate_complexity, LinearKernel};
///
/// let inputs = vec![
///     SparseVector::from_dense(&[1.0, 1.0]),
///     SparseVector::from_dense(&[1.0, -1.0]),
/// ];
/// // Σ K(x, x) = 2 + 2
/// assert_eq!(estimate_complexity(&LinearKernel, &inputs), 0.5);
/// ```
pub fn estimate_complexity<K: Kernel + ?Sized>(kernel: &K, inputs: &[SparseVector]) -> f64 {
    if inputs.is_empty() {
        return 1.0;
    }
    let stride = inputs.len().div_ceil(DEFAULT_ESTIMATE_SAMPLES);
    let (count, sum) = inputs
        .iter()
        .step_by(stride)
        .fold((0usize, 0.0), |(n, s), x| (n + 1, s + kernel.compute(x, x)));

    if sum > 0.0 && sum.is_finite() {
        count as f64 / sum
    } else {
        1.0
    }
}

/// Median of `distance` over every pair of a seeded random subset of at
/// most `max_samples` inputs. `None` with fewer than two inputs.
pub(crate) fn median_pairwise_distance<F>(
    inputs: &[SparseVector],
    max_samples: usize,
    seed: u64,
    distance: F,
) -> Option<f64>
where
    F: Fn(&SparseVector, &SparseVector) -> f64,
{
    if inputs.len() < 2 {
        return None;
    }
    let count = max_samples.max(2).min(inputs.len());
    let mut rng = StdRng::seed_from_u64(seed);
    let points: Vec<&SparseVector> = rand::seq::index::sample(&mut rng, inputs.len(), count)
        .iter()
        .map(|i| &inputs[i])
        .collect();

    let mut distances = Vec::with_capacity(count * (count - 1) / 2);
    for (i, x) in points.iter().enumerate() {
        for y in &points[i + 1..] {
            distances.push(distance(x, y));
        }
    }
    distances.sort_by(f64::total_cmp);

    let mid = distances.len() / 2;
    Some(if distances.len() % 2 == 0 {
        (distances[mid - 1] + distances[mid]) / 2.0
    } else {
        distances[mid]
    })
}
