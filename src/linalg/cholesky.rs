use crate::core::{Error, Result};
use crate::linalg::{relative_tolerance, Matrix, SYMMETRY_TOLERANCE};

/// Cholesky decomposition `A = L·Lᵗ` of a symmetric positive-definite matrix.
///
/// A non-symmetric input, or a diagonal pivot that is not positive
/// within tolerance, marks the result invalid rather than failing.
/// Check [`Cholesky::is_positive_definite`] before using the factor:
/// `solve` and `inverse` on an invalid factor return
/// [`Error::NotPositiveDefinite`].
///
/// ```
/// use svmkit::linalg::{Cholesky, Matrix};
///
/// let a = Matrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 3.0]]).unwrap();
/// let chol = Cholesky::new(&a).unwrap();
/// assert!(chol.is_positive_definite());
/// assert!((chol.determinant() - 8.0).abs() < 1e-12);
///
/// let not_pd = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
/// assert!(!Cholesky::new(&not_pd).unwrap().is_positive_definite());
/// ```
#[derive(Debug, Clone)]
pub struct Cholesky {
    l: Matrix,
    positive_definite: bool,
}

impl Cholesky {
    pub fn new(a: &Matrix) -> Result<Self> {
        if !a.is_square() {
            return Err(Error::DimensionMismatch {
                expected: a.nrows(),
                actual: a.ncols(),
            });
        }

        let n = a.nrows();
        let tol = relative_tolerance(a.max_abs(), n);
        let mut positive_definite = a.is_symmetric(SYMMETRY_TOLERANCE);
        let mut l = Matrix::zeros(n, n);

        // Column-by-column elimination over the private factor, reading
        // only the lower triangle of `a`
        for j in 0..n {
            let mut d = a[(j, j)];
            for k in 0..j {
                d -= l[(j, k)] * l[(j, k)];
            }
            if d <= tol {
                positive_definite = false;
                break;
            }
            let l_jj = d.sqrt();
            l[(j, j)] = l_jj;

            for i in (j + 1)..n {
                let mut s = a[(i, j)];
                for k in 0..j {
                    s -= l[(i, k)] * l[(j, k)];
                }
                l[(i, j)] = s / l_jj;
            }
        }

        if !positive_definite {
            log::debug!("Cholesky: matrix of order {n} is not positive definite");
        }

        Ok(Self {
            l,
            positive_definite,
        })
    }

    pub fn is_positive_definite(&self) -> bool {
        self.positive_definite
    }

    /// Lower-triangular factor. Only meaningful when positive definite.
    pub fn l(&self) -> &Matrix {
        &self.l
    }

    /// det(A) = Π lᵢᵢ², or 0 for an invalid factor
    pub fn determinant(&self) -> f64 {
        if !self.positive_definite {
            return 0.0;
        }
        let prod = (0..self.l.nrows()).fold(1.0, |p, i| p * self.l[(i, i)]);
        prod * prod
    }

    /// Solve `A·X = B` via `L·Y = B`, `Lᵗ·X = Y`
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let n = self.l.nrows();
        if b.nrows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: b.nrows(),
            });
        }
        if !self.positive_definite {
            return Err(Error::NotPositiveDefinite);
        }

        let mut x = b.clone();
        for j in 0..b.ncols() {
            for i in 0..n {
                let mut s = x[(i, j)];
                for k in 0..i {
                    s -= self.l[(i, k)] * x[(k, j)];
                }
                x[(i, j)] = s / self.l[(i, i)];
            }
            for i in (0..n).rev() {
                let mut s = x[(i, j)];
                for k in (i + 1)..n {
                    s -= self.l[(k, i)] * x[(k, j)];
                }
                x[(i, j)] = s / self.l[(i, i)];
            }
        }
        Ok(x)
    }

    pub fn inverse(&self) -> Result<Matrix> {
        self.solve(&Matrix::identity(self.l.nrows()))
    }
}

impl Matrix {
    /// Cholesky decomposition; check `is_positive_definite()` on the result
    pub fn cholesky(&self) -> Result<Cholesky> {
        Cholesky::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::test_util::{sample_matrix, spd_matrix};

    #[test]
    fn test_cholesky_reconstruction() {
        for (n, seed) in [(1, 5), (4, 6), (8, 7)] {
            let a = spd_matrix(n, seed);
            let chol = a.cholesky().unwrap();
            assert!(chol.is_positive_definite());

            let llt = chol.l().matmul(&chol.l().transpose()).unwrap();
            assert!(llt.approx_eq(&a, 1e-12));
        }
    }

    #[test]
    fn test_cholesky_factor_is_lower_triangular() {
        let chol = spd_matrix(5, 11).cholesky().unwrap();
        for i in 0..5 {
            for j in (i + 1)..5 {
                assert_eq!(chol.l()[(i, j)], 0.0);
            }
            assert!(chol.l()[(i, i)] > 0.0);
        }
    }

    #[test]
    fn test_cholesky_indefinite_flag() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 1.0]]).unwrap();
        let chol = Cholesky::new(&a).unwrap();

        assert!(!chol.is_positive_definite());
        assert_eq!(chol.determinant(), 0.0);
        assert!(matches!(
            chol.solve(&Matrix::column_vector(&[1.0, 1.0])),
            Err(Error::NotPositiveDefinite)
        ));
    }

    #[test]
    fn test_cholesky_non_symmetric_flag() {
        let a = Matrix::from_rows(&[vec![4.0, 1.0], vec![0.0, 3.0]]).unwrap();
        assert!(!a.cholesky().unwrap().is_positive_definite());
    }

    #[test]
    fn test_cholesky_semidefinite_flag() {
        // Rank-one Gram matrix [2,1]ᵗ[2,1]: PSD but not PD
        let a = Matrix::from_rows(&[vec![4.0, 2.0], vec![2.0, 1.0]]).unwrap();
        assert!(!a.cholesky().unwrap().is_positive_definite());
    }

    #[test]
    fn test_cholesky_solve_and_inverse() {
        let a = spd_matrix(4, 3);
        let chol = a.cholesky().unwrap();
        let b = sample_matrix(4, 2, 8);

        let x = chol.solve(&b).unwrap();
        assert!(a.matmul(&x).unwrap().approx_eq(&b, 1e-12));

        let inv = chol.inverse().unwrap();
        assert!(a.matmul(&inv).unwrap().approx_eq(&Matrix::identity(4), 1e-12));
    }
}
