//! Linear kernel implementation

use crate::core::SparseVector;
use crate::kernel::{Kernel, KernelType};

/// Linear kernel: K(x, y) = x^T * y
///
/// The only kernel whose trained model can be compacted into a single
/// weight vector (see `TrainedSVM::compact`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearKernel;

impl LinearKernel {
    /// Create a new linear kernel
    pub fn new() -> Self {
        Self
    }
}

impl Kernel for LinearKernel {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        x.dot(y)
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(KernelType::Linear)
    }
}
