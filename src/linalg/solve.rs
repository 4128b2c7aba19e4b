//! Linear system dispatch over the decompositions

use crate::core::{Error, Result};
use crate::linalg::{Lu, Matrix, Qr, Svd};
use serde::{Deserialize, Serialize};

/// Decomposition that produced a [`Solution`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolveMethod {
    Lu,
    Qr,
    Svd,
}

/// Result of [`solve`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Solution matrix, `n x ncols(B)`
    pub x: Matrix,
    pub method: SolveMethod,
    /// Numerical rank of A as seen by the chosen method
    pub rank: usize,
    /// Condition number estimate (1-norm for LU, R-diagonal ratio for QR, 2-norm for SVD)
    pub condition_number: f64,
}

/// Solve `A·X = B`, or its least-squares problem when A is not square.
///
/// - square, non-singular and well conditioned: LU
/// - tall with full column rank: Householder QR least squares
/// - anything else: SVD minimum-norm least squares
///
/// A matrix is well conditioned when its reciprocal condition estimate is at
/// least `n·ε`. Singular systems never produce NaN: they fall through to the
/// pseudo-inverse.
///
/// ```
/// use svmkit::linalg::{solve, Matrix, SolveMethod};
///
/// let a = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0]]).unwrap();
/// let b = Matrix::column_vector(&[2.0, 2.0]);
/// let solution = solve(&a, &b).unwrap();
/// assert_eq!(solution.method, SolveMethod::Svd);
/// assert_eq!(solution.rank, 1);
/// assert!((solution.x[(0, 0)] - 1.0).abs() < 1e-12);
/// ```
pub fn solve(a: &Matrix, b: &Matrix) -> Result<Solution> {
    let (m, n) = a.shape();
    if b.nrows() != m {
        return Err(Error::DimensionMismatch {
            expected: m,
            actual: b.nrows(),
        });
    }
    if a.has_non_finite() || b.has_non_finite() {
        return Err(Error::InvalidParameter(
            "linear system contains non-finite entries".to_string(),
        ));
    }

    if m == n && n > 0 {
        if let Some(solution) = try_lu(a, b)? {
            return Ok(solution);
        }
    } else if m > n && n > 0 {
        if let Some(solution) = try_qr(a, b)? {
            return Ok(solution);
        }
    }

    let svd = Svd::new(a)?;
    let x = svd.solve(b)?;
    let rank = svd.rank();
    log::debug!("solve: {m}x{n} system via SVD (rank {rank})");
    Ok(Solution {
        x,
        method: SolveMethod::Svd,
        rank,
        condition_number: svd.condition_number(),
    })
}

fn try_lu(a: &Matrix, b: &Matrix) -> Result<Option<Solution>> {
    let n = a.nrows();
    let lu = Lu::new(a)?;
    if lu.is_singular() {
        return Ok(None);
    }

    let condition_number = a.norm1() * lu.inverse()?.norm1();
    if !condition_number.is_finite() || 1.0 / condition_number < n as f64 * f64::EPSILON {
        log::debug!("solve: LU rejected, condition estimate {condition_number:e}");
        return Ok(None);
    }

    let x = lu.solve(b)?;
    if x.has_non_finite() {
        return Ok(None);
    }
    log::debug!("solve: {n}x{n} system via LU");
    Ok(Some(Solution {
        x,
        method: SolveMethod::Lu,
        rank: n,
        condition_number,
    }))
}

fn try_qr(a: &Matrix, b: &Matrix) -> Result<Option<Solution>> {
    let (m, n) = a.shape();
    let qr = Qr::new(a)?;
    if !qr.is_full_rank() {
        return Ok(None);
    }

    let (min, max) = qr
        .r_diagonal()
        .iter()
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), d| (lo.min(d.abs()), hi.max(d.abs())));
    let condition_number = max / min;
    if !condition_number.is_finite() || 1.0 / condition_number < m as f64 * f64::EPSILON {
        log::debug!("solve: QR rejected, condition estimate {condition_number:e}");
        return Ok(None);
    }

    let x = qr.solve(b)?;
    log::debug!("solve: {m}x{n} least squares via QR");
    Ok(Some(Solution {
        x,
        method: SolveMethod::Qr,
        rank: n,
        condition_number,
    }))
}

/// Inverse of a square non-singular matrix via LU
pub fn inverse(a: &Matrix) -> Result<Matrix> {
    Lu::new(a)?.inverse()
}

/// Moore-Penrose pseudo-inverse of any matrix via SVD
pub fn pseudo_inverse(a: &Matrix) -> Result<Matrix> {
    Ok(Svd::new(a)?.pseudo_inverse())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::test_util::sample_matrix;

    #[test]
    fn test_square_system_uses_lu() {
        let a = sample_matrix(5, 5, 41);
        let b = sample_matrix(5, 1, 42);
        let solution = solve(&a, &b).unwrap();

        assert_eq!(solution.method, SolveMethod::Lu);
        assert_eq!(solution.rank, 5);
        assert!(solution.condition_number >= 1.0);
        assert!(a.matmul(&solution.x).unwrap().approx_eq(&b, 1e-10));
    }

    #[test]
    fn test_tall_system_uses_qr() {
        // Overdetermined but consistent: b lies in the column space
        let a = sample_matrix(6, 3, 43);
        let x_true = Matrix::column_vector(&[1.0, -2.0, 0.5]);
        let b = a.matmul(&x_true).unwrap();
        let solution = solve(&a, &b).unwrap();

        assert_eq!(solution.method, SolveMethod::Qr);
        assert!(solution.x.approx_eq(&x_true, 1e-10));
    }

    #[test]
    fn test_singular_system_uses_svd() {
        let a = Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![2.0, 4.0, 6.0],
            vec![1.0, 0.0, 1.0],
        ])
        .unwrap();
        let b = Matrix::column_vector(&[1.0, 2.0, 0.0]);
        let solution = solve(&a, &b).unwrap();

        assert_eq!(solution.method, SolveMethod::Svd);
        assert_eq!(solution.rank, 2);
        assert!(!solution.x.has_non_finite());
        // Consistent system: residual vanishes
        assert!(a.matmul(&solution.x).unwrap().approx_eq(&b, 1e-10));

        // Minimum norm: x is orthogonal to the null space spanned by (1, 1, -1)
        let x = &solution.x;
        assert!((x[(0, 0)] + x[(1, 0)] - x[(2, 0)]).abs() < 1e-10);
    }

    #[test]
    fn test_ill_conditioned_square_uses_svd() {
        let a = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0 + 1e-15]]).unwrap();
        let b = Matrix::column_vector(&[2.0, 2.0]);
        let solution = solve(&a, &b).unwrap();

        assert_eq!(solution.method, SolveMethod::Svd);
        assert!(!solution.x.has_non_finite());
    }

    #[test]
    fn test_wide_system_minimum_norm() {
        let a = Matrix::from_rows(&[vec![1.0, 1.0, 1.0]]).unwrap();
        let b = Matrix::column_vector(&[3.0]);
        let solution = solve(&a, &b).unwrap();

        assert_eq!(solution.method, SolveMethod::Svd);
        assert_eq!(solution.x.shape(), (3, 1));
        for i in 0..3 {
            assert!((solution.x[(i, 0)] - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_solve_rejects_bad_input() {
        let a = Matrix::identity(2);
        assert!(matches!(
            solve(&a, &Matrix::zeros(3, 1)),
            Err(Error::DimensionMismatch { .. })
        ));

        let mut bad = Matrix::identity(2);
        bad[(0, 1)] = f64::NAN;
        assert!(matches!(
            solve(&bad, &Matrix::zeros(2, 1)),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_inverse_helpers() {
        let a = Matrix::from_rows(&[vec![2.0, 0.0], vec![0.0, 4.0]]).unwrap();
        let inv = inverse(&a).unwrap();
        assert!((inv[(1, 1)] - 0.25).abs() < 1e-15);

        let singular = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        assert!(matches!(inverse(&singular), Err(Error::SingularMatrix)));

        let pinv = pseudo_inverse(&singular).unwrap();
        let back = singular.matmul(&pinv).unwrap().matmul(&singular).unwrap();
        assert!(back.approx_eq(&singular, 1e-12));
    }
}
