//! Kernel trait definition

use crate::core::SparseVector;
use crate::kernel::KernelType;
use std::sync::Arc;

/// Kernel function trait
///
/// A kernel function K(x, y) must satisfy Mercer's condition to be valid for SVM.
/// Kernels are immutable once built, so one instance can be shared by
/// several models through `Arc`.
pub trait Kernel: Send + Sync {
    /// Compute kernel value K(x, y)
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64;

    /// Compute the kernel using precomputed squared norms
    ///
    /// Distance-based kernels can skip a merge pass with these.
    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        let _ = (x_norm_sq, y_norm_sq);
        self.compute(x, y)
    }

    /// Serializable description of this kernel, `None` when it cannot be
    /// persisted (closures)
    fn kernel_type(&self) -> Option<KernelType> {
        None
    }
}

impl<K: Kernel + ?Sized> Kernel for Arc<K> {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (**self).compute(x, y)
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        (**self).compute_with_norms(x, y, x_norm_sq, y_norm_sq)
    }

    fn kernel_type(&self) -> Option<KernelType> {
        (**self).kernel_type()
    }
}

impl<K: Kernel + ?Sized> Kernel for Box<K> {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (**self).compute(x, y)
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        (**self).compute_with_norms(x, y, x_norm_sq, y_norm_sq)
    }

    fn kernel_type(&self) -> Option<KernelType> {
        (**self).kernel_type()
    }
}
