//! Laplacian kernel: K(x, y) = exp(-γ * ||x - y||₁)

use crate::core::SparseVector;
use crate::kernel::estimate::median_pairwise_distance;
use crate::kernel::{Kernel, KernelType};

/// Laplacian kernel over the Manhattan distance
///
/// Less sensitive to single large coordinate differences than the RBF
/// kernel, which makes it a common choice for count and histogram data.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaplacianKernel {
    pub(crate) gamma: f64,
}

impl LaplacianKernel {
    /// # Panics
    /// Panics if gamma is not positive
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive, got: {}", gamma);
        Self { gamma }
    }

    /// Estimate gamma as the inverse median L1 distance over a seeded sample
    /// of at most `max_samples` inputs; unit gamma when undetermined
    pub fn estimate(inputs: &[SparseVector], max_samples: usize, seed: u64) -> Self {
        match median_pairwise_distance(inputs, max_samples, seed, |x, y| x.l1_distance(y)) {
            Some(median) if median > 0.0 && median.is_finite() => Self::new(1.0 / median),
            _ => Self::default(),
        }
    }

    pub fn gamma(&self) -> f64 {
        self.gamma
    }
}

impl Default for LaplacianKernel {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Kernel for LaplacianKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * x.l1_distance(y)).exp()
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::Laplacian { gamma: self.gamma })
    }
}
