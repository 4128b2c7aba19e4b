//! Dense matrix decompositions
//!
//! LU, Cholesky, QR, eigenvalue and singular value decompositions of
//! [`Matrix`], plus a dispatching [`solve`] that picks the factorization
//! suited to the system at hand. Every constructor copies its input;
//! validity (singular, not positive definite, rank) is reported through
//! flags on the result rather than by failing mid-computation.

pub mod cholesky;
pub mod eigen;
pub mod lu;
pub mod matrix;
pub mod qr;
pub mod solve;
pub mod svd;

pub use self::cholesky::Cholesky;
pub use self::eigen::Eigen;
pub use self::lu::Lu;
pub use self::matrix::Matrix;
pub use self::qr::Qr;
pub use self::solve::{inverse, pseudo_inverse, solve, Solution, SolveMethod};
pub use self::svd::Svd;

/// Relative bound under which symmetric-only code paths accept a matrix
pub const SYMMETRY_TOLERANCE: f64 = 1e-10;

/// Zero threshold for an `n`-dimensional problem whose entries have magnitude `scale`
#[inline]
pub(crate) fn relative_tolerance(scale: f64, n: usize) -> f64 {
    n.max(1) as f64 * f64::EPSILON * scale
}
