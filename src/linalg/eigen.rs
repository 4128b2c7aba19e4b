//! Eigenvalue decomposition of real square matrices
//!
//! Symmetric input is reduced to tridiagonal form with Householder
//! transformations and diagonalized by the implicit QL method. Any other
//! input goes through orthogonal Hessenberg reduction followed by the
//! Francis double-shift QR iteration; eigenvectors are recovered by back
//! substitution on the resulting quasi-triangular Schur form.

use crate::core::{CancellationToken, Error, Result};
use crate::linalg::{Matrix, SYMMETRY_TOLERANCE};

/// Iterations allowed per eigenvalue before giving up
const ITERATIONS_PER_EIGENVALUE: usize = 30;

/// Eigenvalues and eigenvectors `A·V = V·D`.
///
/// For symmetric input the eigenvalues are real and sorted ascending, and
/// V is orthogonal. For general input a complex conjugate pair
/// `λ = re ± i·im` occupies two consecutive slots `j, j+1` with
/// `imag[j] > 0`; the matching eigenvector is `V[:, j] ± i·V[:, j+1]`.
/// [`Eigen::block_diagonal`] returns the real block-diagonal D that
/// satisfies `A·V = V·D` in both cases.
///
/// ```
/// use svmkit::linalg::{Eigen, Matrix};
///
/// let a = Matrix::from_rows(&[vec![2.0, 1.0], vec![1.0, 2.0]]).unwrap();
/// let eig = Eigen::new(&a).unwrap();
/// assert!(eig.is_symmetric());
/// assert!((eig.eigenvalues_real()[0] - 1.0).abs() < 1e-12);
/// assert!((eig.eigenvalues_real()[1] - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Eigen {
    real: Vec<f64>,
    imag: Vec<f64>,
    vectors: Matrix,
    symmetric: bool,
    converged: bool,
}

impl Eigen {
    pub fn new(a: &Matrix) -> Result<Self> {
        Self::compute(a, None)
    }

    /// Decompose while polling `token`; a cancelled run returns the current
    /// estimates with `is_converged() == false`
    pub fn with_cancellation(a: &Matrix, token: &CancellationToken) -> Result<Self> {
        Self::compute(a, Some(token))
    }

    fn compute(a: &Matrix, token: Option<&CancellationToken>) -> Result<Self> {
        if !a.is_square() {
            return Err(Error::DimensionMismatch {
                expected: a.nrows(),
                actual: a.ncols(),
            });
        }

        let n = a.nrows();
        let symmetric = a.is_symmetric(SYMMETRY_TOLERANCE);
        let mut real = vec![0.0; n];
        let mut imag = vec![0.0; n];

        if n == 0 {
            return Ok(Self {
                real,
                imag,
                vectors: Matrix::zeros(0, 0),
                symmetric,
                converged: true,
            });
        }

        let (vectors, converged) = if symmetric {
            let mut v = a.clone();
            tridiagonalize(&mut v, &mut real, &mut imag);
            let converged = tql2(&mut v, &mut real, &mut imag, token);
            imag.iter_mut().for_each(|e| *e = 0.0);
            (v, converged)
        } else {
            let mut h = a.clone();
            let mut v = Matrix::identity(n);
            orthes(&mut h, &mut v);
            let converged = hqr2(&mut h, &mut v, &mut real, &mut imag, token);
            (v, converged)
        };

        if converged {
            log::debug!("Eigen: order {n} converged (symmetric: {symmetric})");
        } else {
            log::warn!("Eigen: order {n} stopped before convergence");
        }

        Ok(Self {
            real,
            imag,
            vectors,
            symmetric,
            converged,
        })
    }

    pub fn eigenvalues_real(&self) -> &[f64] {
        &self.real
    }

    pub fn eigenvalues_imag(&self) -> &[f64] {
        &self.imag
    }

    /// Eigenvector matrix V, one eigenvector (or real/imaginary part) per column
    pub fn eigenvectors(&self) -> &Matrix {
        &self.vectors
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn is_converged(&self) -> bool {
        self.converged
    }

    /// Block-diagonal eigenvalue matrix D with `[[re, im], [-im, re]]` blocks for complex pairs
    pub fn block_diagonal(&self) -> Matrix {
        let n = self.real.len();
        let mut d = Matrix::zeros(n, n);
        for i in 0..n {
            d[(i, i)] = self.real[i];
            if self.imag[i] > 0.0 && i + 1 < n {
                d[(i, i + 1)] = self.imag[i];
            } else if self.imag[i] < 0.0 && i > 0 {
                d[(i, i - 1)] = self.imag[i];
            }
        }
        d
    }
}

impl Matrix {
    /// Eigenvalue decomposition
    pub fn eigen(&self) -> Result<Eigen> {
        Eigen::new(self)
    }
}

fn cancelled(token: Option<&CancellationToken>) -> bool {
    token.is_some_and(CancellationToken::is_cancelled)
}

/// Householder reduction of the symmetric matrix in `v` to tridiagonal form.
///
/// On return `d` holds the diagonal, `e[1..]` the sub-diagonal and `v` the
/// accumulated orthogonal transformation.
fn tridiagonalize(v: &mut Matrix, d: &mut [f64], e: &mut [f64]) {
    let n = d.len();
    for j in 0..n {
        d[j] = v[(n - 1, j)];
    }

    for i in (1..n).rev() {
        let mut scale = 0.0;
        let mut h = 0.0;
        for k in 0..i {
            scale += d[k].abs();
        }

        if scale == 0.0 {
            e[i] = d[i - 1];
            for j in 0..i {
                d[j] = v[(i - 1, j)];
                v[(i, j)] = 0.0;
                v[(j, i)] = 0.0;
            }
        } else {
            for k in 0..i {
                d[k] /= scale;
                h += d[k] * d[k];
            }
            let mut f = d[i - 1];
            let mut g = h.sqrt();
            if f > 0.0 {
                g = -g;
            }
            e[i] = scale * g;
            h -= f * g;
            d[i - 1] = f - g;
            for j in 0..i {
                e[j] = 0.0;
            }

            for j in 0..i {
                f = d[j];
                v[(j, i)] = f;
                g = e[j] + v[(j, j)] * f;
                for k in (j + 1)..i {
                    g += v[(k, j)] * d[k];
                    e[k] += v[(k, j)] * f;
                }
                e[j] = g;
            }

            f = 0.0;
            for j in 0..i {
                e[j] /= h;
                f += e[j] * d[j];
            }
            let hh = f / (h + h);
            for j in 0..i {
                e[j] -= hh * d[j];
            }
            for j in 0..i {
                f = d[j];
                g = e[j];
                for k in j..i {
                    v[(k, j)] -= f * e[k] + g * d[k];
                }
                d[j] = v[(i - 1, j)];
                v[(i, j)] = 0.0;
            }
        }
        d[i] = h;
    }

    // Accumulate transformations
    for i in 0..(n - 1) {
        v[(n - 1, i)] = v[(i, i)];
        v[(i, i)] = 1.0;
        let h = d[i + 1];
        if h != 0.0 {
            for k in 0..=i {
                d[k] = v[(k, i + 1)] / h;
            }
            for j in 0..=i {
                let mut g = 0.0;
                for k in 0..=i {
                    g += v[(k, i + 1)] * v[(k, j)];
                }
                for k in 0..=i {
                    v[(k, j)] -= g * d[k];
                }
            }
        }
        for k in 0..=i {
            v[(k, i + 1)] = 0.0;
        }
    }
    for j in 0..n {
        d[j] = v[(n - 1, j)];
        v[(n - 1, j)] = 0.0;
    }
    v[(n - 1, n - 1)] = 1.0;
    e[0] = 0.0;
}

/// Implicit QL iteration on the tridiagonal form, then ascending sort.
///
/// Returns false when the iteration cap or cancellation stopped it early.
fn tql2(v: &mut Matrix, d: &mut [f64], e: &mut [f64], token: Option<&CancellationToken>) -> bool {
    let n = d.len();
    for i in 1..n {
        e[i - 1] = e[i];
    }
    e[n - 1] = 0.0;

    let max_iterations = ITERATIONS_PER_EIGENVALUE * n;
    let mut iterations = 0;
    let mut converged = true;
    let mut f = 0.0;
    let mut tst1 = 0.0_f64;
    let eps = f64::EPSILON;

    'outer: for l in 0..n {
        tst1 = tst1.max(d[l].abs() + e[l].abs());
        let mut m = l;
        while m < n - 1 {
            if e[m].abs() <= eps * tst1 {
                break;
            }
            m += 1;
        }

        if m > l {
            loop {
                if iterations >= max_iterations || cancelled(token) {
                    // Pending shifts still have to be applied to the unfinished values
                    for x in &mut d[l..] {
                        *x += f;
                    }
                    converged = false;
                    break 'outer;
                }
                iterations += 1;

                let mut g = d[l];
                let mut p = (d[l + 1] - g) / (2.0 * e[l]);
                let mut r = p.hypot(1.0);
                if p < 0.0 {
                    r = -r;
                }
                d[l] = e[l] / (p + r);
                d[l + 1] = e[l] * (p + r);
                let dl1 = d[l + 1];
                let mut h = g - d[l];
                for x in &mut d[(l + 2)..] {
                    *x -= h;
                }
                f += h;

                p = d[m];
                let mut c = 1.0;
                let mut c2 = c;
                let mut c3 = c;
                let el1 = e[l + 1];
                let mut s = 0.0;
                let mut s2 = 0.0;
                for i in (l..m).rev() {
                    c3 = c2;
                    c2 = c;
                    s2 = s;
                    g = c * e[i];
                    h = c * p;
                    r = p.hypot(e[i]);
                    e[i + 1] = s * r;
                    s = e[i] / r;
                    c = p / r;
                    p = c * d[i] - s * g;
                    d[i + 1] = h + s * (c * g + s * d[i]);

                    for k in 0..n {
                        h = v[(k, i + 1)];
                        v[(k, i + 1)] = s * v[(k, i)] + c * h;
                        v[(k, i)] = c * v[(k, i)] - s * h;
                    }
                }
                p = -s * s2 * c3 * el1 * e[l] / dl1;
                e[l] = s * p;
                d[l] = c * p;

                if e[l].abs() <= eps * tst1 {
                    break;
                }
            }
        }
        d[l] += f;
        e[l] = 0.0;
    }

    // Selection sort keeps eigenvector columns paired with their values
    for i in 0..n.saturating_sub(1) {
        let mut k = i;
        let mut p = d[i];
        for (j, &dj) in d.iter().enumerate().skip(i + 1) {
            if dj < p {
                k = j;
                p = dj;
            }
        }
        if k != i {
            d[k] = d[i];
            d[i] = p;
            for row in 0..n {
                let tmp = v[(row, i)];
                v[(row, i)] = v[(row, k)];
                v[(row, k)] = tmp;
            }
        }
    }

    converged
}

/// Orthogonal reduction of `h` to upper Hessenberg form, accumulating into `v`
fn orthes(h: &mut Matrix, v: &mut Matrix) {
    let n = h.nrows();
    let high = n - 1;
    let mut ort = vec![0.0; n];

    for m in 1..high {
        let mut scale = 0.0;
        for i in m..=high {
            scale += h[(i, m - 1)].abs();
        }
        if scale == 0.0 {
            continue;
        }

        let mut hsum = 0.0;
        for i in (m..=high).rev() {
            ort[i] = h[(i, m - 1)] / scale;
            hsum += ort[i] * ort[i];
        }
        let mut g = hsum.sqrt();
        if ort[m] > 0.0 {
            g = -g;
        }
        hsum -= ort[m] * g;
        ort[m] -= g;

        // H = (I - u·uᵗ/h)·H·(I - u·uᵗ/h)
        for j in m..n {
            let mut f = 0.0;
            for i in (m..=high).rev() {
                f += ort[i] * h[(i, j)];
            }
            f /= hsum;
            for i in m..=high {
                h[(i, j)] -= f * ort[i];
            }
        }
        for i in 0..=high {
            let mut f = 0.0;
            for j in (m..=high).rev() {
                f += ort[j] * h[(i, j)];
            }
            f /= hsum;
            for j in m..=high {
                h[(i, j)] -= f * ort[j];
            }
        }
        ort[m] *= scale;
        h[(m, m - 1)] = scale * g;
    }

    for m in (1..high).rev() {
        if h[(m, m - 1)] == 0.0 {
            continue;
        }
        for i in (m + 1)..=high {
            ort[i] = h[(i, m - 1)];
        }
        for j in m..=high {
            let mut g = 0.0;
            for i in m..=high {
                g += ort[i] * v[(i, j)];
            }
            // Double division avoids possible underflow
            g = (g / ort[m]) / h[(m, m - 1)];
            for i in m..=high {
                v[(i, j)] += g * ort[i];
            }
        }
    }
}

/// Complex division `(xr + i·xi) / (yr + i·yi)`
fn cdiv(xr: f64, xi: f64, yr: f64, yi: f64) -> (f64, f64) {
    if yr.abs() > yi.abs() {
        let r = yi / yr;
        let d = yr + r * yi;
        ((xr + r * xi) / d, (xi - r * xr) / d)
    } else {
        let r = yr / yi;
        let d = yi + r * yr;
        ((r * xr + xi) / d, (r * xi - xr) / d)
    }
}

/// Francis double-shift QR on the Hessenberg matrix `h`, then eigenvector
/// back substitution and back transformation into `v`.
///
/// Returns false when the iteration cap or cancellation stopped it early.
fn hqr2(
    h: &mut Matrix,
    v: &mut Matrix,
    d: &mut [f64],
    e: &mut [f64],
    token: Option<&CancellationToken>,
) -> bool {
    let nn = h.nrows();
    let eps = f64::EPSILON;
    let mut exshift = 0.0;
    let (mut p, mut q, mut r, mut s, mut z) = (0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64, 0.0_f64);
    let (mut w, mut x, mut y) = (0.0_f64, 0.0_f64, 0.0_f64);

    let mut norm = 0.0;
    for i in 0..nn {
        for j in i.saturating_sub(1)..nn {
            norm += h[(i, j)].abs();
        }
    }

    let max_iterations = ITERATIONS_PER_EIGENVALUE * nn;
    let mut total_iterations = 0;
    let mut converged = true;
    let mut iter = 0;

    // `active` counts the rows not yet deflated; the working index is active - 1
    let mut active = nn;
    while active > 0 {
        let n = active - 1;

        if total_iterations >= max_iterations || cancelled(token) {
            for i in 0..active {
                d[i] = h[(i, i)] + exshift;
                e[i] = 0.0;
            }
            converged = false;
            break;
        }

        // Look for a single small sub-diagonal element
        let mut l = n;
        while l > 0 {
            s = h[(l - 1, l - 1)].abs() + h[(l, l)].abs();
            if s == 0.0 {
                s = norm;
            }
            if h[(l, l - 1)].abs() < eps * s {
                break;
            }
            l -= 1;
        }

        if l == n {
            // One root found
            h[(n, n)] += exshift;
            d[n] = h[(n, n)];
            e[n] = 0.0;
            active -= 1;
            iter = 0;
        } else if l + 1 == n {
            // Two roots found
            w = h[(n, n - 1)] * h[(n - 1, n)];
            p = (h[(n - 1, n - 1)] - h[(n, n)]) / 2.0;
            q = p * p + w;
            z = q.abs().sqrt();
            h[(n, n)] += exshift;
            h[(n - 1, n - 1)] += exshift;
            x = h[(n, n)];

            if q >= 0.0 {
                // Real pair
                z = if p >= 0.0 { p + z } else { p - z };
                d[n - 1] = x + z;
                d[n] = d[n - 1];
                if z != 0.0 {
                    d[n] = x - w / z;
                }
                e[n - 1] = 0.0;
                e[n] = 0.0;
                x = h[(n, n - 1)];
                s = x.abs() + z.abs();
                p = x / s;
                q = z / s;
                r = (p * p + q * q).sqrt();
                p /= r;
                q /= r;

                for j in (n - 1)..nn {
                    z = h[(n - 1, j)];
                    h[(n - 1, j)] = q * z + p * h[(n, j)];
                    h[(n, j)] = q * h[(n, j)] - p * z;
                }
                for i in 0..=n {
                    z = h[(i, n - 1)];
                    h[(i, n - 1)] = q * z + p * h[(i, n)];
                    h[(i, n)] = q * h[(i, n)] - p * z;
                }
                for i in 0..nn {
                    z = v[(i, n - 1)];
                    v[(i, n - 1)] = q * z + p * v[(i, n)];
                    v[(i, n)] = q * v[(i, n)] - p * z;
                }
            } else {
                // Complex pair
                d[n - 1] = x + p;
                d[n] = x + p;
                e[n - 1] = z;
                e[n] = -z;
            }
            active -= 2;
            iter = 0;
        } else {
            // No convergence yet: form shift
            x = h[(n, n)];
            y = h[(n - 1, n - 1)];
            w = h[(n, n - 1)] * h[(n - 1, n)];

            // Wilkinson's original ad hoc shift
            if iter == 10 {
                exshift += x;
                for i in 0..=n {
                    h[(i, i)] -= x;
                }
                s = h[(n, n - 1)].abs() + h[(n - 1, n - 2)].abs();
                x = 0.75 * s;
                y = x;
                w = -0.4375 * s * s;
            }

            // MATLAB's new ad hoc shift
            if iter == 30 {
                s = (y - x) / 2.0;
                s = s * s + w;
                if s > 0.0 {
                    s = s.sqrt();
                    if y < x {
                        s = -s;
                    }
                    s = x - w / ((y - x) / 2.0 + s);
                    for i in 0..=n {
                        h[(i, i)] -= s;
                    }
                    exshift += s;
                    x = 0.964;
                    y = x;
                    w = x;
                }
            }

            iter += 1;
            total_iterations += 1;

            // Look for two consecutive small sub-diagonal elements
            let mut m = n - 2;
            loop {
                z = h[(m, m)];
                r = x - z;
                s = y - z;
                p = (r * s - w) / h[(m + 1, m)] + h[(m, m + 1)];
                q = h[(m + 1, m + 1)] - z - r - s;
                r = h[(m + 2, m + 1)];
                s = p.abs() + q.abs() + r.abs();
                p /= s;
                q /= s;
                r /= s;
                if m == l {
                    break;
                }
                if h[(m, m - 1)].abs() * (q.abs() + r.abs())
                    < eps * (p.abs() * (h[(m - 1, m - 1)].abs() + z.abs() + h[(m + 1, m + 1)].abs()))
                {
                    break;
                }
                m -= 1;
            }

            for i in (m + 2)..=n {
                h[(i, i - 2)] = 0.0;
                if i > m + 2 {
                    h[(i, i - 3)] = 0.0;
                }
            }

            // Double QR step involving rows l..=n and columns m..=n
            for k in m..n {
                let notlast = k != n - 1;
                if k != m {
                    p = h[(k, k - 1)];
                    q = h[(k + 1, k - 1)];
                    r = if notlast { h[(k + 2, k - 1)] } else { 0.0 };
                    x = p.abs() + q.abs() + r.abs();
                    if x == 0.0 {
                        continue;
                    }
                    p /= x;
                    q /= x;
                    r /= x;
                }

                s = (p * p + q * q + r * r).sqrt();
                if p < 0.0 {
                    s = -s;
                }
                if s == 0.0 {
                    continue;
                }

                if k != m {
                    h[(k, k - 1)] = -s * x;
                } else if l != m {
                    h[(k, k - 1)] = -h[(k, k - 1)];
                }
                p += s;
                x = p / s;
                y = q / s;
                z = r / s;
                q /= p;
                r /= p;

                // Row modification
                for j in k..nn {
                    p = h[(k, j)] + q * h[(k + 1, j)];
                    if notlast {
                        p += r * h[(k + 2, j)];
                        h[(k + 2, j)] -= p * z;
                    }
                    h[(k, j)] -= p * x;
                    h[(k + 1, j)] -= p * y;
                }

                // Column modification
                for i in 0..=n.min(k + 3) {
                    p = x * h[(i, k)] + y * h[(i, k + 1)];
                    if notlast {
                        p += z * h[(i, k + 2)];
                        h[(i, k + 2)] -= p * r;
                    }
                    h[(i, k)] -= p;
                    h[(i, k + 1)] -= p * q;
                }

                // Accumulate transformations
                for i in 0..nn {
                    p = x * v[(i, k)] + y * v[(i, k + 1)];
                    if notlast {
                        p += z * v[(i, k + 2)];
                        v[(i, k + 2)] -= p * r;
                    }
                    v[(i, k)] -= p;
                    v[(i, k + 1)] -= p * q;
                }
            }
        }
    }

    if norm == 0.0 {
        return converged;
    }

    // Back substitute to find vectors of the upper triangular form
    for n in (0..nn).rev() {
        p = d[n];
        q = e[n];

        if q == 0.0 {
            // Real vector
            let mut l = n;
            h[(n, n)] = 1.0;
            for i in (0..n).rev() {
                w = h[(i, i)] - p;
                r = 0.0;
                for j in l..=n {
                    r += h[(i, j)] * h[(j, n)];
                }
                if e[i] < 0.0 {
                    z = w;
                    s = r;
                    continue;
                }

                l = i;
                if e[i] == 0.0 {
                    h[(i, n)] = if w != 0.0 { -r / w } else { -r / (eps * norm) };
                } else {
                    // Solve the real 2x2 system
                    x = h[(i, i + 1)];
                    y = h[(i + 1, i)];
                    q = (d[i] - p) * (d[i] - p) + e[i] * e[i];
                    let t = (x * s - z * r) / q;
                    h[(i, n)] = t;
                    h[(i + 1, n)] = if x.abs() > z.abs() {
                        (-r - w * t) / x
                    } else {
                        (-s - y * t) / z
                    };
                }

                // Overflow control
                let t = h[(i, n)].abs();
                if (eps * t) * t > 1.0 {
                    for j in i..=n {
                        h[(j, n)] /= t;
                    }
                }
            }
        } else if q < 0.0 {
            // Complex vector, last component imaginary so the matrix is triangular
            let mut l = n - 1;
            if h[(n, n - 1)].abs() > h[(n - 1, n)].abs() {
                h[(n - 1, n - 1)] = q / h[(n, n - 1)];
                h[(n - 1, n)] = -(h[(n, n)] - p) / h[(n, n - 1)];
            } else {
                let (cr, ci) = cdiv(0.0, -h[(n - 1, n)], h[(n - 1, n - 1)] - p, q);
                h[(n - 1, n - 1)] = cr;
                h[(n - 1, n)] = ci;
            }
            h[(n, n - 1)] = 0.0;
            h[(n, n)] = 1.0;

            for i in (0..(n - 1)).rev() {
                let mut ra = 0.0;
                let mut sa = 0.0;
                for j in l..=n {
                    ra += h[(i, j)] * h[(j, n - 1)];
                    sa += h[(i, j)] * h[(j, n)];
                }
                w = h[(i, i)] - p;

                if e[i] < 0.0 {
                    z = w;
                    r = ra;
                    s = sa;
                    continue;
                }

                l = i;
                if e[i] == 0.0 {
                    let (cr, ci) = cdiv(-ra, -sa, w, q);
                    h[(i, n - 1)] = cr;
                    h[(i, n)] = ci;
                } else {
                    // Solve complex equations
                    x = h[(i, i + 1)];
                    y = h[(i + 1, i)];
                    let mut vr = (d[i] - p) * (d[i] - p) + e[i] * e[i] - q * q;
                    let vi = (d[i] - p) * 2.0 * q;
                    if vr == 0.0 && vi == 0.0 {
                        vr = eps * norm * (w.abs() + q.abs() + x.abs() + y.abs() + z.abs());
                    }
                    let (cr, ci) = cdiv(
                        x * r - z * ra + q * sa,
                        x * s - z * sa - q * ra,
                        vr,
                        vi,
                    );
                    h[(i, n - 1)] = cr;
                    h[(i, n)] = ci;
                    if x.abs() > z.abs() + q.abs() {
                        h[(i + 1, n - 1)] = (-ra - w * h[(i, n - 1)] + q * h[(i, n)]) / x;
                        h[(i + 1, n)] = (-sa - w * h[(i, n)] - q * h[(i, n - 1)]) / x;
                    } else {
                        let (cr, ci) = cdiv(-r - y * h[(i, n - 1)], -s - y * h[(i, n)], z, q);
                        h[(i + 1, n - 1)] = cr;
                        h[(i + 1, n)] = ci;
                    }
                }

                // Overflow control
                let t = h[(i, n - 1)].abs().max(h[(i, n)].abs());
                if (eps * t) * t > 1.0 {
                    for j in i..=n {
                        h[(j, n - 1)] /= t;
                        h[(j, n)] /= t;
                    }
                }
            }
        }
    }

    // Back transformation to get eigenvectors of the original matrix
    for j in (0..nn).rev() {
        for i in 0..nn {
            z = 0.0;
            for k in 0..=j {
                z += v[(i, k)] * h[(k, j)];
            }
            v[(i, j)] = z;
        }
    }

    converged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::test_util::{sample_matrix, spd_matrix};

    fn assert_av_eq_vd(a: &Matrix, eig: &Eigen, tol: f64) {
        let av = a.matmul(eig.eigenvectors()).unwrap();
        let vd = eig.eigenvectors().matmul(&eig.block_diagonal()).unwrap();
        assert!(av.approx_eq(&vd, tol), "A·V != V·D");
    }

    #[test]
    fn test_symmetric_eigen() {
        let b = sample_matrix(6, 6, 17);
        let a = b.add(&b.transpose()).unwrap();
        let eig = a.eigen().unwrap();

        assert!(eig.is_symmetric());
        assert!(eig.is_converged());
        assert!(eig.eigenvalues_imag().iter().all(|&v| v == 0.0));
        assert!(eig
            .eigenvalues_real()
            .windows(2)
            .all(|w| w[0] <= w[1]));

        let v = eig.eigenvectors();
        let vtv = v.transpose().matmul(v).unwrap();
        assert!(vtv.approx_eq(&Matrix::identity(6), 1e-12));
        assert_av_eq_vd(&a, &eig, 1e-10);
    }

    #[test]
    fn test_spd_eigenvalues_positive() {
        let eig = spd_matrix(5, 2).eigen().unwrap();
        assert!(eig.eigenvalues_real().iter().all(|&v| v > 0.0));
    }

    #[test]
    fn test_general_real_eigenvalues() {
        let a = Matrix::from_rows(&[
            vec![1.0, 2.0, 3.0],
            vec![0.0, 4.0, 5.0],
            vec![0.0, 0.0, 6.0],
        ])
        .unwrap();
        let eig = a.eigen().unwrap();

        assert!(!eig.is_symmetric());
        assert!(eig.is_converged());
        let mut values = eig.eigenvalues_real().to_vec();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        for (got, want) in values.iter().zip([1.0, 4.0, 6.0]) {
            assert!((got - want).abs() < 1e-10);
        }
        assert_av_eq_vd(&a, &eig, 1e-10);
    }

    #[test]
    fn test_complex_pair() {
        // Rotation by 90 degrees: eigenvalues ±i
        let a = Matrix::from_rows(&[vec![0.0, -1.0], vec![1.0, 0.0]]).unwrap();
        let eig = a.eigen().unwrap();

        assert!(eig.eigenvalues_real().iter().all(|v| v.abs() < 1e-12));
        assert!((eig.eigenvalues_imag()[0] - 1.0).abs() < 1e-12);
        assert!((eig.eigenvalues_imag()[1] + 1.0).abs() < 1e-12);
        assert_av_eq_vd(&a, &eig, 1e-12);
    }

    #[test]
    fn test_general_random_matrix() {
        let a = sample_matrix(7, 7, 23);
        let eig = a.eigen().unwrap();
        assert!(eig.is_converged());
        assert_av_eq_vd(&a, &eig, 1e-9);

        // Trace is preserved by the eigenvalues
        let trace: f64 = (0..7).map(|i| a[(i, i)]).sum();
        let sum: f64 = eig.eigenvalues_real().iter().sum();
        assert!((trace - sum).abs() < 1e-10);
    }

    #[test]
    fn test_cancelled_returns_partial() {
        let token = CancellationToken::new();
        token.cancel();

        let sym = spd_matrix(5, 8);
        let eig = Eigen::with_cancellation(&sym, &token).unwrap();
        assert!(!eig.is_converged());
        assert!(eig.eigenvalues_real().iter().all(|v| v.is_finite()));

        let general = sample_matrix(5, 5, 9);
        let eig = Eigen::with_cancellation(&general, &token).unwrap();
        assert!(!eig.is_converged());
        assert!(eig.eigenvalues_real().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_eigen_edge_shapes() {
        let eig = Matrix::zeros(0, 0).eigen().unwrap();
        assert!(eig.eigenvalues_real().is_empty());

        let eig = Matrix::from_rows(&[vec![-3.5]]).unwrap().eigen().unwrap();
        assert_eq!(eig.eigenvalues_real(), &[-3.5]);

        assert!(matches!(
            Matrix::zeros(2, 3).eigen(),
            Err(Error::DimensionMismatch { .. })
        ));
    }
}
