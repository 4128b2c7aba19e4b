use crate::core::{Error, Result};
use crate::linalg::Matrix;

/// Column-pivoted Householder QR decomposition `A·P = Q·R` of an `m x n`
/// matrix with `m >= n`.
///
/// At every step the remaining column with the largest norm is swapped to
/// the front, so `|r_ii|` is non-increasing and any rank deficiency ends up
/// in the trailing diagonal entries. The Householder vectors are stored
/// below the diagonal of the packed matrix, the diagonal of R separately. A
/// rank-deficient input is not an error: [`Qr::rank`] counts the diagonal
/// entries above a cutoff scaled to the Frobenius norm of `A`.
///
/// ```
/// use svmkit::linalg::{Matrix, Qr};
///
/// let a = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 2.0], vec![1.0, 3.0]]).unwrap();
/// let qr = Qr::new(&a).unwrap();
/// assert!(qr.is_full_rank());
/// // Least-squares line through (1,1), (2,2), (3,3)
/// let x = qr.solve(&Matrix::column_vector(&[1.0, 2.0, 3.0])).unwrap();
/// assert!(x[(0, 0)].abs() < 1e-12);
/// assert!((x[(1, 0)] - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Qr {
    qr: Matrix,
    r_diag: Vec<f64>,
    perm: Vec<usize>,
    norm: f64,
}

impl Qr {
    /// Factor `a`; fails only when `a` has fewer rows than columns.
    pub fn new(a: &Matrix) -> Result<Self> {
        let (m, n) = a.shape();
        if m < n {
            return Err(Error::DimensionMismatch {
                expected: n,
                actual: m,
            });
        }

        let mut qr = a.clone();
        let mut r_diag = vec![0.0; n];
        let mut perm: Vec<usize> = (0..n).collect();

        for k in 0..n {
            // Bring the trailing column with the largest remaining norm forward
            let mut pivot = k;
            let mut best = -1.0_f64;
            for j in k..n {
                let mut s = 0.0;
                for i in k..m {
                    s += qr[(i, j)] * qr[(i, j)];
                }
                if s > best {
                    best = s;
                    pivot = j;
                }
            }
            if pivot != k {
                for i in 0..m {
                    let tmp = qr[(i, k)];
                    qr[(i, k)] = qr[(i, pivot)];
                    qr[(i, pivot)] = tmp;
                }
                perm.swap(k, pivot);
            }

            let mut nrm = 0.0_f64;
            for i in k..m {
                nrm = nrm.hypot(qr[(i, k)]);
            }

            if nrm != 0.0 {
                if qr[(k, k)] < 0.0 {
                    nrm = -nrm;
                }
                for i in k..m {
                    qr[(i, k)] /= nrm;
                }
                qr[(k, k)] += 1.0;

                // Reflect the remaining columns
                for j in (k + 1)..n {
                    let mut s = 0.0;
                    for i in k..m {
                        s += qr[(i, k)] * qr[(i, j)];
                    }
                    s = -s / qr[(k, k)];
                    for i in k..m {
                        let v = qr[(i, k)];
                        qr[(i, j)] += s * v;
                    }
                }
            }
            r_diag[k] = -nrm;
        }

        Ok(Self {
            qr,
            r_diag,
            perm,
            norm: a.norm_frobenius(),
        })
    }

    /// Cutoff below which a diagonal entry of R counts as zero
    pub fn tolerance(&self) -> f64 {
        let (m, n) = self.qr.shape();
        m.max(n) as f64 * f64::EPSILON * self.norm
    }

    /// Number of diagonal entries of R above [`Qr::tolerance`]
    pub fn rank(&self) -> usize {
        let tol = self.tolerance();
        self.r_diag.iter().take_while(|d| d.abs() > tol).count()
    }

    pub fn is_full_rank(&self) -> bool {
        self.rank() == self.r_diag.len()
    }

    /// Column order: column `k` of `A·P` is column `permutation()[k]` of `A`
    pub fn permutation(&self) -> &[usize] {
        &self.perm
    }

    /// `n x n` permutation matrix `P` with `A·P = Q·R`
    pub fn permutation_matrix(&self) -> Matrix {
        let n = self.perm.len();
        let mut p = Matrix::zeros(n, n);
        for (k, &j) in self.perm.iter().enumerate() {
            p[(j, k)] = 1.0;
        }
        p
    }

    /// Upper-triangular `n x n` factor
    pub fn r(&self) -> Matrix {
        let n = self.qr.ncols();
        let mut r = Matrix::zeros(n, n);
        for i in 0..n {
            r[(i, i)] = self.r_diag[i];
            for j in (i + 1)..n {
                r[(i, j)] = self.qr[(i, j)];
            }
        }
        r
    }

    /// Diagonal of R
    pub fn r_diagonal(&self) -> &[f64] {
        &self.r_diag
    }

    /// Householder vectors, one per column, zero above the diagonal
    pub fn h(&self) -> Matrix {
        let (m, n) = self.qr.shape();
        let mut h = Matrix::zeros(m, n);
        for i in 0..m {
            for j in 0..n.min(i + 1) {
                h[(i, j)] = self.qr[(i, j)];
            }
        }
        h
    }

    /// Economy orthogonal factor, `m x n`
    pub fn q(&self) -> Matrix {
        self.accumulate_q(self.qr.ncols())
    }

    /// Full orthogonal factor, `m x m`
    pub fn q_full(&self) -> Matrix {
        self.accumulate_q(self.qr.nrows())
    }

    /// Apply the reflectors in reverse order to the first `cols` columns of the identity
    fn accumulate_q(&self, cols: usize) -> Matrix {
        let (m, n) = self.qr.shape();
        let mut q = Matrix::identity(m).top_left(m, cols);
        for k in (0..n).rev() {
            if self.qr[(k, k)] == 0.0 {
                continue;
            }
            for j in k..cols {
                let mut s = 0.0;
                for i in k..m {
                    s += self.qr[(i, k)] * q[(i, j)];
                }
                s = -s / self.qr[(k, k)];
                for i in k..m {
                    q[(i, j)] += s * self.qr[(i, k)];
                }
            }
        }
        q
    }

    /// Least-squares solution of `A·X ≈ B`, minimising `||A·X - B||`.
    ///
    /// Requires full column rank; otherwise returns [`Error::RankDeficient`].
    /// The column permutation is undone, so rows of `X` follow the columns of `A`.
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let (m, n) = self.qr.shape();
        if b.nrows() != m {
            return Err(Error::DimensionMismatch {
                expected: m,
                actual: b.nrows(),
            });
        }
        let rank = self.rank();
        if rank != n {
            return Err(Error::RankDeficient { rank, required: n });
        }

        let nx = b.ncols();
        let mut x = b.clone();

        // Qᵗ·B
        for k in 0..n {
            for j in 0..nx {
                let mut s = 0.0;
                for i in k..m {
                    s += self.qr[(i, k)] * x[(i, j)];
                }
                s = -s / self.qr[(k, k)];
                for i in k..m {
                    x[(i, j)] += s * self.qr[(i, k)];
                }
            }
        }

        // R·X = Qᵗ·B
        for k in (0..n).rev() {
            for j in 0..nx {
                x[(k, j)] /= self.r_diag[k];
            }
            for i in 0..k {
                for j in 0..nx {
                    let x_kj = x[(k, j)];
                    x[(i, j)] -= x_kj * self.qr[(i, k)];
                }
            }
        }

        let mut solution = Matrix::zeros(n, nx);
        for (k, &row) in self.perm.iter().enumerate() {
            for j in 0..nx {
                solution[(row, j)] = x[(k, j)];
            }
        }
        Ok(solution)
    }
}

impl Matrix {
    /// Householder QR decomposition (requires `nrows >= ncols`)
    pub fn qr(&self) -> Result<Qr> {
        Qr::new(self)
    }
}
