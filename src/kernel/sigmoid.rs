//! Sigmoid (Tanh) Kernel Implementation
//!
//! K(x, y) = tanh(γ * <x, y> + r)
//!
//! The sigmoid kernel is not positive semi-definite for every parameter
//! choice, so the dual problem it produces may be non-convex. The solver
//! copes with this through its second-order working-set rule, which
//! substitutes a small positive curvature when `K_ii + K_jj - 2K_ij <= 0`.

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelType};

/// Sigmoid (hyperbolic tangent) kernel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SigmoidKernel {
    /// Scaling parameter for the dot product (must be positive)
    pub gamma: f64,
    /// Offset parameter
    pub coef0: f64,
}

impl SigmoidKernel {
    /// # Panics
    /// Panics if gamma is not positive
    ///
    /// ```
    /// use svmkit::kernel::SigmoidKernel;
    ///
    /// let kernel = SigmoidKernel::new(0.1, -1.0);
    /// assert_eq!(kernel.gamma, 0.1);
    /// assert_eq!(kernel.coef0, -1.0);
    /// ```
    pub fn new(gamma: f64, coef0: f64) -> Self {
        if gamma <= 0.0 {
            panic!("Gamma must be positive, got: {}", gamma);
        }
        Self { gamma, coef0 }
    }

    /// gamma = 0.01, coef0 = 0.0
    pub fn default_params() -> Self {
        Self::new(0.01, 0.0)
    }

    /// gamma = 1/n_features and coef0 = -1.0
    pub fn neural_network(n_features: usize) -> Self {
        if n_features == 0 {
            panic!("Number of features must be positive");
        }
        Self::new(1.0 / n_features as f64, -1.0)
    }
}

impl Kernel for SigmoidKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.gamma * x.dot(y) + self.coef0).tanh()
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::Sigmoid {
            gamma: self.gamma,
            coef0: self.coef0,
        })
    }
}
