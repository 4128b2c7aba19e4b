//! Dense row-major matrix of `f64`

use crate::core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Dynamically-sized dense matrix.
///
/// Row-major `Vec<f64>` storage with explicit row and column counts.
/// Decompositions copy a `Matrix` into private working storage, so a
/// caller's matrix is never modified by any factorization.
///
/// ```
/// use svmkit::linalg::Matrix;
///
/// let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.transpose()[(0, 1)], 3.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl Matrix {
    /// Create an `nrows x ncols` matrix of zeros
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = 1.0;
        }
        m
    }

    /// Wrap a row-major buffer; fails if `data.len() != nrows * ncols`
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<f64>) -> Result<Self> {
        if data.len() != nrows * ncols {
            return Err(Error::DimensionMismatch {
                expected: nrows * ncols,
                actual: data.len(),
            });
        }
        Ok(Self { data, nrows, ncols })
    }

    /// Build from an array of rows; every row must have the same length
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self> {
        let ncols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(rows.len() * ncols);
        for row in rows {
            if row.len() != ncols {
                return Err(Error::DimensionMismatch {
                    expected: ncols,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            nrows: rows.len(),
            ncols,
        })
    }

    /// Square matrix with `diag` on the diagonal
    pub fn from_diagonal(diag: &[f64]) -> Self {
        let mut m = Self::zeros(diag.len(), diag.len());
        for (i, &d) in diag.iter().enumerate() {
            m[(i, i)] = d;
        }
        m
    }

    /// `n x 1` matrix holding `values`
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            data: values.to_vec(),
            nrows: values.len(),
            ncols: 1,
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Row-major view of the storage
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Borrow row `i`
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.ncols..(i + 1) * self.ncols]
    }

    /// Copy out column `j`
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.nrows).map(|i| self[(i, j)]).collect()
    }

    /// Rows as owned vectors
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.nrows).map(|i| self.row(i).to_vec()).collect()
    }

    /// Swap two rows in place
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            self.data.swap(a * self.ncols + j, b * self.ncols + j);
        }
    }

    /// Copy of the leading `rows x cols` block
    pub fn top_left(&self, rows: usize, cols: usize) -> Matrix {
        let mut out = Matrix::zeros(rows, cols);
        for i in 0..rows.min(self.nrows) {
            for j in 0..cols.min(self.ncols) {
                out[(i, j)] = self[(i, j)];
            }
        }
        out
    }

    pub fn transpose(&self) -> Matrix {
        let mut t = Matrix::zeros(self.ncols, self.nrows);
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                t[(j, i)] = self[(i, j)];
            }
        }
        t
    }

    /// Matrix product `self * rhs`
    pub fn matmul(&self, rhs: &Matrix) -> Result<Matrix> {
        let mut out = Matrix::zeros(self.nrows, rhs.ncols);
        self.matmul_into(rhs, &mut out)?;
        Ok(out)
    }

    /// Matrix product written into a caller-supplied buffer.
    ///
    /// `out` must already be `self.nrows() x rhs.ncols()`; its previous
    /// contents are overwritten. Lets iterative callers reuse one buffer.
    pub fn matmul_into(&self, rhs: &Matrix, out: &mut Matrix) -> Result<()> {
        if self.ncols != rhs.nrows {
            return Err(Error::DimensionMismatch {
                expected: self.ncols,
                actual: rhs.nrows,
            });
        }
        if out.shape() != (self.nrows, rhs.ncols) {
            return Err(Error::DimensionMismatch {
                expected: self.nrows * rhs.ncols,
                actual: out.nrows * out.ncols,
            });
        }
        out.data.iter_mut().for_each(|v| *v = 0.0);
        // i-k-j order keeps the inner loop on contiguous rows
        for i in 0..self.nrows {
            for k in 0..self.ncols {
                let a_ik = self[(i, k)];
                if a_ik == 0.0 {
                    continue;
                }
                let rhs_row = &rhs.data[k * rhs.ncols..(k + 1) * rhs.ncols];
                let out_row = &mut out.data[i * rhs.ncols..(i + 1) * rhs.ncols];
                for (o, &r) in out_row.iter_mut().zip(rhs_row) {
                    *o += a_ik * r;
                }
            }
        }
        Ok(())
    }

    /// Matrix-vector product `self * x`
    pub fn matvec(&self, x: &[f64]) -> Result<Vec<f64>> {
        if x.len() != self.ncols {
            return Err(Error::DimensionMismatch {
                expected: self.ncols,
                actual: x.len(),
            });
        }
        Ok((0..self.nrows)
            .map(|i| self.row(i).iter().zip(x).map(|(a, b)| a * b).sum())
            .collect())
    }

    pub fn add(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Matrix) -> Result<Matrix> {
        self.zip_with(rhs, |a, b| a - b)
    }

    pub fn scale(&self, s: f64) -> Matrix {
        Matrix {
            data: self.data.iter().map(|v| v * s).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    fn zip_with<F: Fn(f64, f64) -> f64>(&self, rhs: &Matrix, f: F) -> Result<Matrix> {
        if self.shape() != rhs.shape() {
            return Err(Error::DimensionMismatch {
                expected: self.nrows * self.ncols,
                actual: rhs.nrows * rhs.ncols,
            });
        }
        Ok(Matrix {
            data: self
                .data
                .iter()
                .zip(&rhs.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        })
    }

    /// Maximum absolute column sum
    pub fn norm1(&self) -> f64 {
        (0..self.ncols)
            .map(|j| (0..self.nrows).map(|i| self[(i, j)].abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    /// Maximum absolute row sum
    pub fn norm_inf(&self) -> f64 {
        (0..self.nrows)
            .map(|i| self.row(i).iter().map(|v| v.abs()).sum::<f64>())
            .fold(0.0, f64::max)
    }

    pub fn norm_frobenius(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, &v| acc.hypot(v))
    }

    /// Largest entry magnitude
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0, |acc: f64, v| acc.max(v.abs()))
    }

    /// True when square and `|aᵢⱼ - aⱼᵢ| <= tol * max(1, max|a|)`
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let bound = tol * self.max_abs().max(1.0);
        for i in 0..self.nrows {
            for j in (i + 1)..self.ncols {
                if (self[(i, j)] - self[(j, i)]).abs() > bound {
                    return false;
                }
            }
        }
        true
    }

    /// Entry-wise comparison relative to the larger magnitude of the two matrices
    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        if self.shape() != other.shape() {
            return false;
        }
        let bound = tol * self.max_abs().max(other.max_abs()).max(1.0);
        self.data
            .iter()
            .zip(&other.data)
            .all(|(a, b)| (a - b).abs() <= bound)
    }

    /// True if any entry is NaN or infinite
    pub fn has_non_finite(&self) -> bool {
        self.data.iter().any(|v| !v.is_finite())
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.nrows && j < self.ncols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.nrows,
            self.ncols
        );
        &self.data[i * self.ncols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(
            i < self.nrows && j < self.ncols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.nrows,
            self.ncols
        );
        &mut self.data[i * self.ncols + j]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_jagged() {
        let result = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(Error::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_from_vec_length_check() {
        assert!(Matrix::from_vec(2, 2, vec![1.0; 3]).is_err());
        let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert_eq!(m[(1, 0)], 4.0);
        assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
        assert_eq!(m.column(2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_matmul() {
        let a = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let b = Matrix::from_rows(&[vec![5.0, 6.0], vec![7.0, 8.0]]).unwrap();
        let c = a.matmul(&b).unwrap();
        assert_eq!(c.as_slice(), &[19.0, 22.0, 43.0, 50.0]);

        let bad = Matrix::zeros(3, 1);
        assert!(a.matmul(&bad).is_err());
    }

    #[test]
    fn test_matmul_into_reuses_buffer() {
        let a = Matrix::identity(2);
        let b = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        let mut out = Matrix::from_rows(&[vec![9.0, 9.0], vec![9.0, 9.0]]).unwrap();
        a.matmul_into(&b, &mut out).unwrap();
        assert_eq!(out, b);

        let mut wrong = Matrix::zeros(3, 3);
        assert!(a.matmul_into(&b, &mut wrong).is_err());
    }

    #[test]
    fn test_matvec_and_norms() {
        let a = Matrix::from_rows(&[vec![1.0, -2.0], vec![-3.0, 4.0]]).unwrap();
        assert_eq!(a.matvec(&[1.0, 1.0]).unwrap(), vec![-1.0, 1.0]);
        assert_eq!(a.norm1(), 6.0);
        assert_eq!(a.norm_inf(), 7.0);
        assert_eq!(a.max_abs(), 4.0);
        assert!((a.norm_frobenius() - 30.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_symmetry_check() {
        let s = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 3.0]]).unwrap();
        assert!(s.is_symmetric(1e-12));

        let ns = Matrix::from_rows(&[vec![2.0, 1.0], vec![0.0, 3.0]]).unwrap();
        assert!(!ns.is_symmetric(1e-12));
        assert!(!Matrix::zeros(2, 3).is_symmetric(1e-12));
    }

    #[test]
    fn test_swap_rows_and_transpose() {
        let mut m = Matrix::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]).unwrap();
        m.swap_rows(0, 2);
        assert_eq!(m.row(0), &[5.0, 6.0]);
        let t = m.transpose();
        assert_eq!(t.shape(), (2, 3));
        assert_eq!(t.row(0), &[5.0, 3.0, 1.0]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_column_overflow_does_not_wrap_to_next_row() {
        let m = Matrix::zeros(2, 3);
        let _ = m[(0, 3)];
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_index_mut_checks_bounds() {
        let mut m = Matrix::zeros(2, 2);
        m[(2, 0)] = 1.0;
    }
}
