use crate::core::{CancellationToken, Error, Result};
use crate::linalg::Matrix;

/// Sweep limit for the Jacobi iteration; quadratic convergence makes this generous
const MAX_SWEEPS: usize = 60;

/// Economy singular value decomposition `A = U·Σ·Vᵗ`.
///
/// For an `m x n` input with `k = min(m, n)`, U is `m x k` with orthonormal
/// columns, Σ is stored as `k` non-negative values sorted descending and
/// Vᵗ is `k x n` with orthonormal rows. Computed by one-sided (Hestenes)
/// Jacobi rotations on the taller orientation of the input, which keeps
/// small singular values accurate.
///
/// ```
/// use svmkit::linalg::{Matrix, Svd};
///
/// let a = Matrix::from_rows(&[vec![3.0, 0.0], vec![0.0, -2.0], vec![0.0, 0.0]]).unwrap();
/// let svd = Svd::new(&a).unwrap();
/// assert!((svd.singular_values()[0] - 3.0).abs() < 1e-12);
/// assert!((svd.singular_values()[1] - 2.0).abs() < 1e-12);
/// assert_eq!(svd.rank(), 2);
/// ```
#[derive(Debug, Clone)]
pub struct Svd {
    u: Matrix,
    singular_values: Vec<f64>,
    vt: Matrix,
    converged: bool,
}

impl Svd {
    pub fn new(a: &Matrix) -> Result<Self> {
        Ok(Self::compute(a, None))
    }

    /// Decompose while polling `token` once per sweep. A cancelled run still
    /// returns consistent factors of the current iterate, flagged unconverged.
    pub fn with_cancellation(a: &Matrix, token: &CancellationToken) -> Result<Self> {
        Ok(Self::compute(a, Some(token)))
    }

    fn compute(a: &Matrix, token: Option<&CancellationToken>) -> Self {
        let (m, n) = a.shape();
        if m >= n {
            let (u, singular_values, v, converged) = jacobi(a, token);
            Self {
                u,
                singular_values,
                vt: v.transpose(),
                converged,
            }
        } else {
            // A = (Aᵗ)ᵗ = V'·Σ·U'ᵗ
            let (u, singular_values, v, converged) = jacobi(&a.transpose(), token);
            Self {
                u: v,
                singular_values,
                vt: u.transpose(),
                converged,
            }
        }
    }

    /// Left singular vectors, `m x k`
    pub fn u(&self) -> &Matrix {
        &self.u
    }

    pub fn singular_values(&self) -> &[f64] {
        &self.singular_values
    }

    /// Transposed right singular vectors, `k x n`
    pub fn vt(&self) -> &Matrix {
        &self.vt
    }

    /// Right singular vectors, `n x k`
    pub fn v(&self) -> Matrix {
        self.vt.transpose()
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Threshold `max(m, n)·ε·σ₀` below which a singular value counts as zero
    pub fn tolerance(&self) -> f64 {
        let dim = self.u.nrows().max(self.vt.ncols());
        dim as f64 * f64::EPSILON * self.norm2()
    }

    /// Number of singular values above [`Svd::tolerance`]
    pub fn rank(&self) -> usize {
        let tol = self.tolerance();
        self.singular_values.iter().filter(|&&s| s > tol).count()
    }

    /// Largest singular value
    pub fn norm2(&self) -> f64 {
        self.singular_values.first().copied().unwrap_or(0.0)
    }

    /// Ratio `σ_max / σ_min`, infinite when the smallest value is zero
    pub fn condition_number(&self) -> f64 {
        match (self.singular_values.first(), self.singular_values.last()) {
            (Some(&max), Some(&min)) if min > 0.0 => max / min,
            (Some(_), Some(_)) => f64::INFINITY,
            _ => 0.0,
        }
    }

    /// Moore-Penrose pseudo-inverse `A⁺ = V·Σ⁺·Uᵗ`, `n x m`
    pub fn pseudo_inverse(&self) -> Matrix {
        let m = self.u.nrows();
        let n = self.vt.ncols();
        let mut pinv = Matrix::zeros(n, m);
        for (r, &sigma) in self.singular_values.iter().take(self.rank()).enumerate() {
            let inv = 1.0 / sigma;
            for i in 0..n {
                let v_ir = self.vt[(r, i)] * inv;
                if v_ir == 0.0 {
                    continue;
                }
                for j in 0..m {
                    pinv[(i, j)] += v_ir * self.u[(j, r)];
                }
            }
        }
        pinv
    }

    /// Minimum-norm least-squares solution of `A·X ≈ B`
    pub fn solve(&self, b: &Matrix) -> Result<Matrix> {
        let m = self.u.nrows();
        let n = self.vt.ncols();
        if b.nrows() != m {
            return Err(Error::DimensionMismatch {
                expected: m,
                actual: b.nrows(),
            });
        }

        let rank = self.rank();
        let mut x = Matrix::zeros(n, b.ncols());
        for col in 0..b.ncols() {
            for r in 0..rank {
                let mut c = 0.0;
                for i in 0..m {
                    c += self.u[(i, r)] * b[(i, col)];
                }
                c /= self.singular_values[r];
                for i in 0..n {
                    x[(i, col)] += c * self.vt[(r, i)];
                }
            }
        }
        Ok(x)
    }
}

impl Matrix {
    /// Economy singular value decomposition
    pub fn svd(&self) -> Result<Svd> {
        Svd::new(self)
    }
}

/// One-sided Jacobi on a tall (`m >= n`) matrix.
///
/// Returns `(U m x n, σ, V n x n, converged)` with σ sorted descending.
fn jacobi(a: &Matrix, token: Option<&CancellationToken>) -> (Matrix, Vec<f64>, Matrix, bool) {
    let (m, n) = a.shape();
    // Column-major working copies: w[j] is column j of A·V
    let mut w: Vec<Vec<f64>> = (0..n).map(|j| a.column(j)).collect();
    let mut v: Vec<Vec<f64>> = (0..n)
        .map(|j| {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            e
        })
        .collect();

    let threshold = (m as f64 * f64::EPSILON).max(f64::EPSILON);
    let mut converged = n < 2;
    let mut sweeps = 0;

    while !converged && sweeps < MAX_SWEEPS {
        if token.is_some_and(CancellationToken::is_cancelled) {
            break;
        }
        sweeps += 1;
        let mut rotated = false;

        for p in 0..n - 1 {
            for q in (p + 1)..n {
                let (alpha, beta, gamma) = column_products(&w[p], &w[q]);
                if gamma == 0.0 || gamma.abs() <= threshold * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;

                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;

                rotate(&mut w, p, q, c, s);
                rotate(&mut v, p, q, c, s);
            }
        }

        converged = !rotated;
    }

    if converged {
        log::debug!("SVD: {m}x{n} converged after {sweeps} sweeps");
    } else {
        log::warn!("SVD: {m}x{n} stopped after {sweeps} sweeps without convergence");
    }

    let sigma: Vec<f64> = w.iter().map(|col| norm(col)).collect();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| sigma[j].total_cmp(&sigma[i]));

    let sigma_max = order.first().map_or(0.0, |&i| sigma[i]);
    let tol = m.max(n) as f64 * f64::EPSILON * sigma_max;

    let mut u = Matrix::zeros(m, n);
    let mut v_out = Matrix::zeros(n, n);
    let mut sorted_sigma = Vec::with_capacity(n);
    let mut missing = Vec::new();

    for (k, &j) in order.iter().enumerate() {
        let s = sigma[j];
        sorted_sigma.push(s);
        for i in 0..n {
            v_out[(i, k)] = v[j][i];
        }
        if s > tol && s > 0.0 {
            for i in 0..m {
                u[(i, k)] = w[j][i] / s;
            }
        } else {
            missing.push(k);
        }
    }

    // Null directions of U get an orthonormal completion; their σ is
    // negligible so reconstruction is unaffected
    if !missing.is_empty() {
        complete_basis(&mut u, &missing);
    }

    (u, sorted_sigma, v_out, converged)
}

fn column_products(p: &[f64], q: &[f64]) -> (f64, f64, f64) {
    p.iter()
        .zip(q)
        .fold((0.0, 0.0, 0.0), |(a, b, g), (&x, &y)| (a + x * x, b + y * y, g + x * y))
}

/// `(col_p, col_q) <- (c·col_p - s·col_q, s·col_p + c·col_q)`
fn rotate(cols: &mut [Vec<f64>], p: usize, q: usize, c: f64, s: f64) {
    let (left, right) = cols.split_at_mut(q);
    for (xp, xq) in left[p].iter_mut().zip(right[0].iter_mut()) {
        let a = *xp;
        let b = *xq;
        *xp = c * a - s * b;
        *xq = s * a + c * b;
    }
}

fn norm(x: &[f64]) -> f64 {
    x.iter().fold(0.0_f64, |acc, &v| acc.hypot(v))
}

/// Fill the columns of `u` listed in `missing` with unit vectors orthogonal
/// to every other column, by Gram-Schmidt on the best standard basis vector
fn complete_basis(u: &mut Matrix, missing: &[usize]) {
    let (m, k) = u.shape();
    let mut filled: Vec<usize> = (0..k).filter(|c| !missing.contains(c)).collect();

    for &col in missing {
        let mut best: Option<(f64, Vec<f64>)> = None;
        for basis in 0..m {
            let mut r = vec![0.0; m];
            r[basis] = 1.0;
            orthogonalize(&mut r, u, &filled);
            let len = norm(&r);
            if best.as_ref().map_or(true, |(l, _)| len > *l) {
                best = Some((len, r));
            }
        }

        if let Some((_, mut r)) = best {
            // Second pass restores orthogonality lost to cancellation
            orthogonalize(&mut r, u, &filled);
            let len = norm(&r);
            if len > 0.0 {
                for i in 0..m {
                    u[(i, col)] = r[i] / len;
                }
            }
        }
        filled.push(col);
    }
}

fn orthogonalize(r: &mut [f64], u: &Matrix, cols: &[usize]) {
    for &c in cols {
        let dot: f64 = (0..r.len()).map(|i| u[(i, c)] * r[i]).sum();
        for (i, ri) in r.iter_mut().enumerate() {
            *ri -= dot * u[(i, c)];
        }
    }
}
