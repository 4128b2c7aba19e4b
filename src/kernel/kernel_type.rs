//! Serializable kernel descriptions

use crate::core::SparseVector;
use crate::kernel::{
    ChiSquareKernel, HistogramIntersectionKernel, Kernel, LaplacianKernel, LinearKernel,
    PolynomialKernel, RBFKernel, SigmoidKernel,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Parameters of a built-in kernel.
///
/// This is what gets written to disk with a model; it also implements
/// [`Kernel`] itself, so a loaded model predicts without knowing the
/// concrete kernel type at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum KernelType {
    Linear,
    Rbf { gamma: f64 },
    Polynomial { degree: u32, gamma: f64, coef0: f64 },
    Sigmoid { gamma: f64, coef0: f64 },
    Laplacian { gamma: f64 },
    ChiSquare { gamma: f64 },
    HistogramIntersection { normalized: bool },
}

impl KernelType {
    pub fn name(&self) -> &'static str {
        match self {
            KernelType::Linear => "linear",
            KernelType::Rbf { .. } => "rbf",
            KernelType::Polynomial { .. } => "polynomial",
            KernelType::Sigmoid { .. } => "sigmoid",
            KernelType::Laplacian { .. } => "laplacian",
            KernelType::ChiSquare { .. } => "chi_square",
            KernelType::HistogramIntersection { .. } => "histogram_intersection",
        }
    }
}

impl fmt::Display for KernelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KernelType::Linear => write!(f, "linear"),
            KernelType::Rbf { gamma } => write!(f, "rbf(gamma={gamma})"),
            KernelType::Polynomial {
                degree,
                gamma,
                coef0,
            } => write!(f, "polynomial(degree={degree}, gamma={gamma}, coef0={coef0})"),
            KernelType::Sigmoid { gamma, coef0 } => {
                write!(f, "sigmoid(gamma={gamma}, coef0={coef0})")
            }
            KernelType::Laplacian { gamma } => write!(f, "laplacian(gamma={gamma})"),
            KernelType::ChiSquare { gamma } => write!(f, "chi_square(gamma={gamma})"),
            KernelType::HistogramIntersection { normalized } => {
                write!(f, "histogram_intersection(normalized={normalized})")
            }
        }
    }
}

impl Kernel for KernelType {
    fn compute(&self, x: &SparseVector, y: &SparseVector) -> f64 {
        match *self {
            KernelType::Linear => LinearKernel.compute(x, y),
            KernelType::Rbf { gamma } => RBFKernel { gamma }.compute(x, y),
            KernelType::Polynomial {
                degree,
                gamma,
                coef0,
            } => PolynomialKernel {
                gamma,
                coef0,
                degree,
            }
            .compute(x, y),
            KernelType::Sigmoid { gamma, coef0 } => SigmoidKernel { gamma, coef0 }.compute(x, y),
            KernelType::Laplacian { gamma } => LaplacianKernel { gamma }.compute(x, y),
            KernelType::ChiSquare { gamma } => ChiSquareKernel { gamma }.compute(x, y),
            KernelType::HistogramIntersection { normalized } => {
                HistogramIntersectionKernel { normalized }.compute(x, y)
            }
        }
    }

    fn compute_with_norms(
        &self,
        x: &SparseVector,
        y: &SparseVector,
        x_norm_sq: f64,
        y_norm_sq: f64,
    ) -> f64 {
        match *self {
            KernelType::Rbf { gamma } => {
                RBFKernel { gamma }.compute_with_norms(x, y, x_norm_sq, y_norm_sq)
            }
            _ => self.compute(x, y),
        }
    }

    fn kernel_type(&self) -> Option<KernelType> {
        Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_kernel_type_matches_concrete_kernels() {
        let x = SparseVector::new(vec![0, 2], vec![0.5, 1.5]);
        let y = SparseVector::new(vec![1, 2], vec![1.0, 0.5]);

        let concrete: Vec<Box<dyn Kernel>> = vec![
            Box::new(LinearKernel),
            Box::new(RBFKernel::new(0.7)),
            Box::new(PolynomialKernel::new(3, 0.5, 1.0)),
            Box::new(SigmoidKernel::new(0.2, -0.5)),
            Box::new(LaplacianKernel::new(0.9)),
            Box::new(ChiSquareKernel::new(1.1)),
            Box::new(HistogramIntersectionKernel::normalized()),
        ];

        for kernel in &concrete {
            let described = kernel.kernel_type().unwrap();
            assert_relative_eq!(described.compute(&x, &y), kernel.compute(&x, &y));
        }
    }

    #[test]
    fn test_kernel_type_serde_tagged() {
        let kernel = KernelType::Polynomial {
            degree: 2,
            gamma: 0.5,
            coef0: 1.0,
        };
        let json = serde_json::to_string(&kernel).unwrap();
        assert!(json.contains("\"type\":\"polynomial\""));

        let back: KernelType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, kernel);
        assert_eq!(back.name(), "polynomial");
    }

    #[test]
    fn test_kernel_type_display() {
        assert_eq!(KernelType::Rbf { gamma: 0.5 }.to_string(), "rbf(gamma=0.5)");
        assert_eq!(KernelType::Linear.to_string(), "linear");
    }
}
