//! Kernel functions for SVM

pub mod chi_square;
pub mod custom;
pub mod estimate;
pub mod histogram_intersection;
pub mod kernel_type;
pub mod laplacian;
pub mod linear;
pub mod polynomial;
pub mod rbf;
pub mod sigmoid;
pub mod traits;

pub use self::chi_square::ChiSquareKernel;
pub use self::custom::CustomKernel;
pub use self::estimate::{estimate_complexity, DEFAULT_ESTIMATE_SAMPLES};
pub use self::histogram_intersection::HistogramIntersectionKernel;
pub use self::kernel_type::KernelType;
pub use self::laplacian::LaplacianKernel;
pub use self::linear::LinearKernel;
pub use self::polynomial::PolynomialKernel;
pub use self::rbf::RBFKernel;
pub use self::sigmoid::SigmoidKernel;
pub use self::traits::Kernel;
