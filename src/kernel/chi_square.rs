//! Chi-Square Kernel Implementation
//!
//! The Chi-square kernel is particularly effective for histogram and distribution data.
//!
//! K(x, y) = exp(-γ * χ²(x, y))
//!
//! Where χ²(x, y) = Σᵢ (xᵢ - yᵢ)² / (xᵢ + yᵢ) over the indices with xᵢ + yᵢ > 0.
//! Features are expected to be non-negative.

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelType};

/// Exponential chi-square kernel for histogram features
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChiSquareKernel {
    /// Scaling parameter gamma (must be positive)
    pub gamma: f64,
}

impl ChiSquareKernel {
    /// # Examples
    /// ```
    /// use svmkit::kernel::{ChiSquareKernel, Kernel};
    /// use svmkit::core::SparseVector;
    ///
    /// let kernel = ChiSquareKernel::new(1.0);
    /// let h = SparseVector::from_dense(&[0.2, 0.8]);
    /// assert!((kernel.compute(&h, &h) - 1.0).abs() < 1e-12);
    /// ```
    pub fn new(gamma: f64) -> Self {
        assert!(gamma > 0.0, "Gamma must be positive");
        Self { gamma }
    }

    pub fn unit_gamma() -> Self {
        Self::new(1.0)
    }

    /// Gamma = 1.0 / n_features
    pub fn with_auto_gamma(n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(1.0 / n_features as f64)
    }
}

impl Kernel for ChiSquareKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (-self.gamma * chi_square_distance(x, y)).exp()
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::ChiSquare { gamma: self.gamma })
    }
}

/// χ²(x, y); an index present in only one vector contributes its value
fn chi_square_distance(x: &SparseVector, y: &SparseVector) -> f64 {
    let mut distance = 0.0;
    x.merge(y, |a, b| {
        let sum = a + b;
        if sum > 0.0 {
            let diff = a - b;
            distance += diff * diff / sum;
        }
    });
    distance
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_chi_square_kernel_creation() {
        assert_eq!(ChiSquareKernel::new(2.0).gamma, 2.0);
        assert_eq!(ChiSquareKernel::unit_gamma().gamma, 1.0);
        assert_eq!(ChiSquareKernel::with_auto_gamma(100).gamma, 0.01);
    }

    #[test]
    #[should_panic(expected = "Gamma must be positive")]
    fn test_chi_square_invalid_gamma() {
        ChiSquareKernel::new(0.0);
    }

    #[test]
    fn test_chi_square_distance_values() {
        let x = SparseVector::new(vec![0, 1], vec![1.0, 3.0]);
        let y = SparseVector::new(vec![1, 2], vec![1.0, 2.0]);

        // index 0: 1, index 1: 4/4 = 1, index 2: 2
        assert_relative_eq!(chi_square_distance(&x, &y), 4.0);
        assert_relative_eq!(
            ChiSquareKernel::new(0.5).compute(&x, &y),
            (-2.0_f64).exp()
        );
    }

    #[test]
    fn test_chi_square_identical_and_empty() {
        let kernel = ChiSquareKernel::new(1.0);
        let x = SparseVector::new(vec![0, 1, 2], vec![10.0, 20.0, 30.0]);

        assert_relative_eq!(kernel.compute(&x, &x), 1.0);
        assert_relative_eq!(
            kernel.compute(&SparseVector::empty(), &SparseVector::empty()),
            1.0
        );
    }

    #[test]
    fn test_chi_square_symmetry() {
        let kernel = ChiSquareKernel::new(0.3);
        let x = SparseVector::new(vec![0, 4], vec![0.5, 0.5]);
        let y = SparseVector::new(vec![0, 2], vec![0.25, 0.75]);
        assert_eq!(kernel.compute(&x, &y), kernel.compute(&y, &x));
    }
}
