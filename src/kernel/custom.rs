//! Closure-backed kernels

use crate::core::SparseVector;
use crate::kernel::Kernel;
use std::fmt;

/// Wraps any `Fn(&SparseVector, &SparseVector) -> f64` as a [`Kernel`].
///
/// Custom kernels train and predict like the built-in ones but have no
/// [`KernelType`](crate::kernel::KernelType), so persisting a model that
/// uses one fails with `Error::UnsupportedConfiguration`.
///
/// ```
/// use svmkit::core::SparseVector;
/// use svmkit::kernel::{CustomKernel, Kernel};
///
/// let cosine = CustomKernel::new(|x: &SparseVector, y: &SparseVector| {
///     x.dot(y) / (x.norm() * y.norm()).max(f64::MIN_POSITIVE)
/// });
/// let v = SparseVector::from_dense(&[3.0, 4.0]);
/// assert!((cosine.compute(&v, &v) - 1.0).abs() < 1e-12);
/// ```
#[derive(Clone)]
pub struct CustomKernel<F> {
    function: F,
}

impl<F> CustomKernel<F>
where
    F: Fn(&SparseVector, &SparseVector) -> f64 + Send + Sync,
{
    pub fn new(function: F) -> Self {
        Self { function }
    }
}

impl<F> Kernel for CustomKernel<F>
where
    F: Fn(&SparseVector, &SparseVector) -> f64 + Send + Sync,
{
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        (self.function)(x, y)
    }
}

impl<F> fmt::Debug for CustomKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomKernel")
    }
}
