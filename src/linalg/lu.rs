use crate::core::{Error, Result};
use crate::linalg::{relative_tolerance, Matrix};

/// LU decomposition with partial pivoting: `P·A = L·U`.
///
/// Stores L (unit diagonal, below the diagonal) and U (on and above the
/// diagonal) packed in one matrix. A pivot column that is zero within
/// tolerance flags the factorization as singular instead of failing;
/// the permutation stays available for diagnostics, and `solve` /
/// `inverse` then report [`Error::SingularMatrix`].
///
/// ```
/// use svmkit::linalg::{Lu, Matrix};
///
/// let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![5.0, 3.0]]).unwrap();
/// let lu = Lu::new(&a).unwrap();
/// let x = lu.solve(&Matrix::column_vector(&[4.0, 11.0])).unwrap();
/// assert!((x[(0, 0)] - 1.0).abs() < 1e-12);
/// assert!((x[(1, 0)] - 2.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Lu {
    lu: Matrix,
    pivot: Vec<usize>,
    pivot_sign: f64,
    singular: bool,
}

impl Lu {
    /// Factor a square matrix. Only a non-square input is an error.
    pub fn new(a: &Matrix) -> Result<Self> {
        if !a.is_square() {
            return Err(Error::DimensionMismatch {
                expected: a.nrows(),
                actual: a.ncols(),
            });
        }

        let n = a.nrows();
        let mut lu = a.clone();
        let mut pivot: Vec<usize> = (0..n).collect();
        let mut pivot_sign = 1.0;
        let mut singular = false;
        let tol = relative_tolerance(a.max_abs(), n);

        for k in 0..n {
            let mut p = k;
            let mut max_val = lu[(k, k)].abs();
            for i in (k + 1)..n {
                let v = lu[(i, k)].abs();
                if v > max_val {
                    max_val = v;
                    p = i;
                }
            }

            if p != k {
                lu.swap_rows(p, k);
                pivot.swap(p, k);
                pivot_sign = -pivot_sign;
            }

            if max_val <= tol {
                // Column is numerically zero: multipliers are zero so L stays unit lower
                singular = true;
                for i in (k + 1)..n {
                    lu[(i, k)] = 0.0;
                }
                continue;
            }

            let inv_pivot = 1.0 / lu[(k, k)];
            for i in (k + 1)..n {
                let factor = lu[(i, k)] * inv_pivot;
                lu[(i, k)] = factor;
                if factor != 0.0 {
                    for j in (k + 1)..n {
                        let u_kj = lu[(k, j)];
                        lu[(i, j)] -= factor * u_kj;
                    }
                }
            }
        }

        Ok(Self {
            lu,
            pivot,
            pivot_sign,
            singular,
        })
    }

    pub fn is_singular(&self) -> bool {
        self.singular
    }

    /// Row permutation: row `i` of `P·A` is row `pivot()[i]` of `A`
    pub fn pivot(&self) -> &[usize] {
        &self.pivot
    }

    /// Permutation matrix P with `P·A = L·U`
    pub fn permutation_matrix(&self) -> Matrix {
        let n = self.pivot.len();
        let mut p = Matrix::zeros(n, n);
        for (i, &src) in self.pivot.iter().enumerate() {
            p[(i, src)] = 1.0;
        }
        p
    }

    /// Unit lower-triangular factor
    pub fn l(&self) -> Matrix {
        let n = self.lu.nrows();
        let mut l = Matrix::identity(n);
        for i in 0..n {
            for j in 0..i {
                l[(i, j)] = self.lu[(i, j)];
            }
        }
        l
    }

    /// Upper-triangular factor
    pub fn u(&self) -> Matrix {
        let n = self.lu.nrows();
        let mut u = Matrix::zeros(n, n);
        for i in 0..n {
            for j in i..n {
                u[(i, j)] = self.lu[(i, j)];
            }
        }
        u
    }

    pub fn determinant(&self) -> f64 {
        if self.singular {
            return 0.0;
        }
        (0..self.lu.nrows()).fold(self.pivot_sign, |d, i| d * self.lu[(i, i)])
    }

    /// Solve `A·X = B` for every column of `B`
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let n = self.lu.nrows();
        if b.nrows() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: b.nrows(),
            });
        }
        if self.singular {
            return Err(Error::SingularMatrix);
        }

        let mut x = Matrix::zeros(n, b.ncols());
        let mut rhs = vec![0.0; n];
        let mut col = vec![0.0; n];
        for j in 0..b.ncols() {
            for i in 0..n {
                rhs[i] = b[(i, j)];
            }
            self.substitute(&rhs, &mut col);
            for i in 0..n {
                x[(i, j)] = col[i];
            }
        }
        Ok(x)
    }

    /// Solve `A·x = b` for a single right-hand side into a caller-supplied buffer.
    ///
    /// `x` must have length `n`; it is fully overwritten.
    pub fn solve_vector_into(&self, b: &[f64], x: &mut [f64]) -> Result<()> {
        let n = self.lu.nrows();
        if b.len() != n || x.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: if b.len() != n { b.len() } else { x.len() },
            });
        }
        if self.singular {
            return Err(Error::SingularMatrix);
        }
        self.substitute(b, x);
        Ok(())
    }

    pub fn inverse(&self) -> Result<Matrix> {
        self.solve(&Matrix::identity(self.lu.nrows()))
    }

    /// Forward substitution with L on the permuted rhs, then back substitution with U
    fn substitute(&self, b: &[f64], x: &mut [f64]) {
        let n = self.lu.nrows();
        for i in 0..n {
            let mut sum = b[self.pivot[i]];
            for j in 0..i {
                sum -= self.lu[(i, j)] * x[j];
            }
            x[i] = sum;
        }
        for i in (0..n).rev() {
            let mut sum = x[i];
            for j in (i + 1)..n {
                sum -= self.lu[(i, j)] * x[j];
            }
            x[i] = sum / self.lu[(i, i)];
        }
    }
}

impl Matrix {
    /// LU decomposition with partial pivoting
    pub fn lu(&self) -> Result<Lu> {
        Lu::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::test_util::sample_matrix;

    #[test]
    fn test_lu_reconstruction() {
        for (n, seed) in [(1, 1), (3, 2), (6, 3), (10, 4)] {
            let a = sample_matrix(n, n, seed);
            let lu = a.lu().unwrap();
            assert!(!lu.is_singular());

            let pa = lu.permutation_matrix().matmul(&a).unwrap();
            let l_u = lu.l().matmul(&lu.u()).unwrap();
            assert!(pa.approx_eq(&l_u, 1e-9), "P·A != L·U for n = {n}");
        }
    }

    #[test]
    fn test_lu_solve_and_inverse() {
        let a = Matrix::from_rows(&[
            vec![4.0, -2.0, 1.0],
            vec![-2.0, 4.0, -2.0],
            vec![1.0, -2.0, 4.0],
        ])
        .unwrap();
        let lu = Lu::new(&a).unwrap();

        let inv = lu.inverse().unwrap();
        assert!(a.matmul(&inv).unwrap().approx_eq(&Matrix::identity(3), 1e-12));

        let mut x = vec![0.0; 3];
        lu.solve_vector_into(&[11.0, -16.0, 17.0], &mut x).unwrap();
        let back = a.matvec(&x).unwrap();
        for (got, want) in back.iter().zip([11.0, -16.0, 17.0]) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn test_lu_determinant() {
        let a = Matrix::from_rows(&[vec![0.0, 2.0], vec![3.0, 1.0]]).unwrap();
        let lu = Lu::new(&a).unwrap();
        assert!((lu.determinant() + 6.0).abs() < 1e-12);
        assert_eq!(lu.pivot(), &[1, 0]);
    }

    #[test]
    fn test_lu_singular_flag() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![2.0, 4.0]]).unwrap();
        let lu = Lu::new(&a).unwrap();

        assert!(lu.is_singular());
        assert_eq!(lu.pivot().len(), 2);
        assert_eq!(lu.determinant(), 0.0);
        assert!(matches!(
            lu.solve(&Matrix::column_vector(&[1.0, 2.0])),
            Err(Error::SingularMatrix)
        ));
        assert!(matches!(lu.inverse(), Err(Error::SingularMatrix)));

        // Factors still reconstruct the permuted input
        let pa = lu.permutation_matrix().matmul(&a).unwrap();
        assert!(pa.approx_eq(&lu.l().matmul(&lu.u()).unwrap(), 1e-12));
    }

    #[test]
    fn test_lu_zero_matrix_is_singular() {
        let lu = Lu::new(&Matrix::zeros(3, 3)).unwrap();
        assert!(lu.is_singular());
    }

    #[test]
    fn test_lu_rejects_rectangular() {
        assert!(matches!(
            Lu::new(&Matrix::zeros(2, 3)),
            Err(Error::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_lu_does_not_modify_input() {
        let a = sample_matrix(4, 4, 9);
        let copy = a.clone();
        let _ = a.lu().unwrap();
        assert_eq!(a, copy);
    }
}
