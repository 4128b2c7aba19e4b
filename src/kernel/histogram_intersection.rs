//! Histogram Intersection Kernel Implementation
//!
//! K(x, y) = Σᵢ min(xᵢ, yᵢ)
//!
//! Measures the overlap between two non-negative histograms. The normalized
//! variant divides by min(||x||₁, ||y||₁), giving values in [0, 1].

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelType};

/// Histogram intersection kernel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HistogramIntersectionKernel {
    /// Normalize by the smaller L1 norm
    pub normalized: bool,
}

impl HistogramIntersectionKernel {
    /// # Examples
    /// ```
    /// use svmkit::kernel::HistogramIntersectionKernel;
    ///
    /// let kernel = HistogramIntersectionKernel::new(true);
    /// assert!(kernel.normalized);
    /// ```
    pub fn new(normalized: bool) -> Self {
        Self { normalized }
    }

    /// Absolute histogram overlap
    pub fn standard() -> Self {
        Self::new(false)
    }

    /// Overlap relative to the smaller histogram mass
    pub fn normalized() -> Self {
        Self::new(true)
    }
}

impl Kernel for HistogramIntersectionKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        let mut intersection = 0.0;
        // Indices present in one vector only contribute min(v, 0)
        x.merge(y, |a, b| intersection += a.min(b));

        if !self.normalized {
            return intersection;
        }
        let min_norm = x.l1_norm().min(y.l1_norm());
        if min_norm > 0.0 {
            intersection / min_norm
        } else {
            0.0
        }
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::HistogramIntersection {
            normalized: self.normalized,
        })
    }
}
