//! RBF (Radial Basis Function) kernel implementation
//!
//! The RBF kernel is defined as: K(x, y) = exp(-γ * ||x - y||²)
//! where γ (gamma) is a hyperparameter that controls the kernel width.

use crate::core::SparseVector;
use crate::kernel::estimate::median_pairwise_distance;
use crate::kernel::{Kernel, KernelType};

/// RBF (Gaussian) kernel: K(x, y) = exp(-γ * ||x - y||²)
///
/// The gamma parameter controls the "reach" of each training example:
/// - High gamma: close points have high influence (potential overfitting)
/// - Low gamma: distant points have influence (potential underfitting)
///
/// When no prior is available, [`RBFKernel::estimate`] picks gamma from
/// the data itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RBFKernel {
    pub(crate) gamma: f64,
}

impl RBFKernel {
    /// Create a new RBF kernel with specified gamma parameter
    ///
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Create RBF kernel with gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }

    /// Create RBF kernel with gamma = 1.0
    pub fn unit_gamma() -> Self {
        Self::new(1.0)
    }

    /// Estimate gamma from the median squared distance `m` between a seeded
    /// sample of at most `max_samples` inputs: `γ = 1 / (2m)`.
    ///
    /// Falls back to unit gamma when fewer than two inputs are given or
    /// all sampled inputs coincide.
    ///
    /// ```
    /// use svmkit::core::SparseVector;
    /// use svmkit::kernel::RBFKernel;
    ///
    /// let inputs: Vec<_> = (0..20)
    ///     .map(|i| SparseVector::from_dense(&[i as f64 * 0.1, 1.0]))
    ///     .collect();
    /// let kernel = RBFKernel::estimate(&inputs, 1024, 0);
    /// assert!(kernel.gamma() > 0.0);
    /// ```
    pub fn estimate(inputs: &[SparseVector], max_samples: usize, seed: u64) -> Self {
        match median_pairwise_distance(inputs, max_samples, seed, |x, y| x.squared_distance(y)) {
            Some(median) if median > 0.0 && median.is_finite() => {
                log::debug!("RBF estimate: median squared distance {median}");
                Self::new(1.0 / (2.0 * median))
            }
            _ => Self::unit_gamma(),
        }
    }

    /// Get the gamma parameter
    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for RBFKernel {
    /// Default RBF kernel with gamma = 1.0
    fn default() -> Self {
        Self::unit_gamma()
    }
}

impl Kernel for RBFKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * x.squared_distance(y)).exp()
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        // ||x - y||² = ||x||² + ||y||² - 2*x^T*y, clamped against cancellation
        let squared_distance = (x_norm_sq + y_norm_sq - 2.0 * x.dot(y)).max(0.0);
        (-self.gamma * squared_distance).exp()
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::Rbf { gamma: self.gamma })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rbf_kernel_creation() {
        assert_eq!(RBFKernel::new(0.5).gamma(), 0.5);
        assert_eq!(RBFKernel::with_auto_gamma(10).gamma(), 0.1);
        assert_eq!(RBFKernel::unit_gamma().gamma(), 1.0);
        assert_eq!(RBFKernel::default().gamma(), 1.0);
    }

    #[test]
    #[should_panic(expected = "Gamma must be positive")]
    fn test_rbf_kernel_invalid_gamma() {
        RBFKernel::new(-0.5);
    }

    #[test]
    #[should_panic(expected = "Number of features must be positive")]
    fn test_rbf_kernel_zero_features() {
        RBFKernel::with_auto_gamma(0);
    }

    #[test]
    fn test_rbf_kernel_identical_vectors() {
        let kernel = RBFKernel::new(1.0);
        let x = SparseVector::new(vec![0, 1, 2], vec![1.0, 2.0, 3.0]);
        assert_relative_eq!(kernel.compute(&x, &x), 1.0);
    }

    #[test]
    fn test_rbf_kernel_orthogonal_vectors() {
        let kernel = RBFKernel::new(1.0);
        let x = SparseVector::new(vec![0, 2], vec![1.0, 1.0]);
        let y = SparseVector::new(vec![1, 3], vec![1.0, 1.0]);

        // ||x - y||² = 4 with no overlap
        assert_relative_eq!(kernel.compute(&x, &y), (-4.0_f64).exp());
    }

    #[test]
    fn test_rbf_kernel_with_norms_matches() {
        let kernel = RBFKernel::new(2.0);
        let x = SparseVector::new(vec![0, 1], vec![3.0, 4.0]);
        let y = SparseVector::new(vec![0, 1], vec![1.0, 2.0]);

        let direct = kernel.compute(&x, &y);
        let with_norms = kernel.compute_with_norms(&x, &y, 25.0, 5.0);
        assert_relative_eq!(direct, with_norms, epsilon = 1e-12);
    }

    #[test]
    fn test_rbf_kernel_decreases_with_distance() {
        let kernel = RBFKernel::new(1.0);
        let origin = SparseVector::empty();
        let values: Vec<f64> = [1.0, 2.0, 3.0]
            .iter()
            .map(|&d| kernel.compute(&origin, &SparseVector::from_dense(&[d])))
            .collect();

        assert!(values[0] > values[1] && values[1] > values[2]);
        assert!(values.iter().all(|&k| (0.0..=1.0).contains(&k)));
    }

    #[test]
    fn test_rbf_estimate() {
        // Two clusters of identical points: squared distances are 0 or 8,
        // median over all 15 pairs of 6 points is 8
        let mut inputs = vec![SparseVector::from_dense(&[1.0, 1.0]); 3];
        inputs.extend(vec![SparseVector::from_dense(&[-1.0, -1.0]); 3]);

        let kernel = RBFKernel::estimate(&inputs, 1024, 3);
        assert_relative_eq!(kernel.gamma(), 1.0 / 16.0);
    }

    #[test]
    fn test_rbf_estimate_degenerate_input() {
        let same = vec![SparseVector::from_dense(&[2.0]); 4];
        assert_eq!(RBFKernel::estimate(&same, 1024, 0).gamma(), 1.0);
        assert_eq!(RBFKernel::estimate(&[], 1024, 0).gamma(), 1.0);
    }
}
