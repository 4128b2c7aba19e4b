//! Polynomial Kernel Implementation
//!
//! The polynomial kernel is defined as:
//! K(x, y) = (γ * <x, y> + r)^d
//!
//! Where:
//! - γ (gamma): scaling factor for the dot product
//! - r (coef0): independent term in the polynomial
//! - d (degree): degree of the polynomial

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelType};

/// Polynomial kernel with configurable degree, gamma, and coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PolynomialKernel {
    /// Scaling factor for the dot product
    pub gamma: f64,
    /// Independent term in the polynomial
    pub coef0: f64,
    /// Degree of the polynomial
    pub degree: u32,
}

impl PolynomialKernel {
    /// Creates a new polynomial kernel
    ///
    /// # Examples
    /// ```
    /// use svmkit::kernel::PolynomialKernel;
    ///
    /// // Quadratic kernel: (x·y + 1)²
    /// let quad_kernel = PolynomialKernel::new(2, 1.0, 1.0);
    /// assert_eq!(quad_kernel.degree, 2);
    /// ```
    ///
    /// # Panics
    /// Panics if `degree` is zero or `gamma` is not positive
    pub fn new(degree: u32, gamma: f64, coef0: f64) -> Self {
        assert!(degree > 0, "Polynomial degree must be positive");
        assert!(gamma > 0.0, "Gamma must be positive");

        Self {
            gamma,
            coef0,
            degree,
        }
    }

    /// Creates a quadratic kernel: (γ * <x,y> + 1)²
    pub fn quadratic(gamma: f64) -> Self {
        Self::new(2, gamma, 1.0)
    }

    /// Creates a cubic kernel: (γ * <x,y> + 1)³
    pub fn cubic(gamma: f64) -> Self {
        Self::new(3, gamma, 1.0)
    }

    /// Polynomial kernel with gamma = 1.0 / n_features
    pub fn auto(degree: u32, n_features: usize) -> Self {
        assert!(n_features > 0, "Number of features must be positive");
        Self::new(degree, 1.0 / n_features as f64, 1.0)
    }
}

impl Kernel for PolynomialKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * x.dot(y) + self.coef0).powi(self.degree as i32)
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::Polynomial {
            degree: self.degree,
            gamma: self.gamma,
            coef0: self.coef0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_polynomial_kernel_creation() {
        let kernel = PolynomialKernel::new(3, 0.5, 1.0);
        assert_eq!(kernel.degree, 3);
        assert_eq!(kernel.gamma, 0.5);
        assert_eq!(kernel.coef0, 1.0);

        assert_eq!(PolynomialKernel::quadratic(2.0).degree, 2);
        assert_eq!(PolynomialKernel::cubic(1.0).degree, 3);
        assert_eq!(PolynomialKernel::auto(2, 4).gamma, 0.25);
    }

    #[test]
    #[should_panic(expected = "Polynomial degree must be positive")]
    fn test_polynomial_zero_degree() {
        PolynomialKernel::new(0, 1.0, 0.0);
    }

    #[test]
    fn test_polynomial_kernel_values() {
        let x = SparseVector::new(vec![0, 1], vec![1.0, 2.0]);
        let y = SparseVector::new(vec![0, 1], vec![3.0, 1.0]);

        // <x, y> = 5
        assert_relative_eq!(PolynomialKernel::quadratic(1.0).compute(&x, &y), 36.0);
        assert_relative_eq!(PolynomialKernel::new(3, 0.5, 0.0).compute(&x, &y), 15.625);
    }

    #[test]
    fn test_polynomial_degree_one_is_affine_linear() {
        let kernel = PolynomialKernel::new(1, 1.0, 0.0);
        let x = SparseVector::new(vec![0, 3], vec![2.0, -1.0]);
        let y = SparseVector::new(vec![0, 3], vec![1.0, 4.0]);
        assert_relative_eq!(kernel.compute(&x, &y), x.dot(&y));
    }

    #[test]
    fn test_polynomial_negative_base_even_degree() {
        let kernel = PolynomialKernel::new(2, 1.0, 0.0);
        let x = SparseVector::from_dense(&[1.0]);
        let y = SparseVector::from_dense(&[-3.0]);
        assert_relative_eq!(kernel.compute(&x, &y), 9.0);
    }
}
