//! Closed-form kernels for dense 3×3 matrices.
//!
//! These routines back the local least-squares fits of reconstruction
//! stencils, where the normal-equation matrices are always 3×3. They are
//! written without an external linear-algebra backend:
//!
//! - [`det2`] evaluates `a*d - c*b` with an FMA-compensated difference of
//!   products, so near-cancelling products keep full precision.
//! - [`det`] and [`inv`] are cofactor/adjugate formulas built on [`det2`].
//! - [`pivot`] row-permutes and partially eliminates a matrix before a solve.
//! - [`eigen`] returns the eigenvalues of a symmetric matrix with the
//!   trigonometric closed form.
//!
//! None of the functions trap degenerate input. A singular matrix passed to
//! [`inv`] or [`pivot`] yields non-finite entries; callers check
//! [`det`] (or [`SquareMatrix3::is_finite`]) before trusting the result.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::{Add, Div, Index, IndexMut, Mul, Sub};

/// Fixed 3×3 matrix of `f64`, row-major, indexed `(row, col)` from 0.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[repr(transparent)]
pub struct SquareMatrix3([[f64; 3]; 3]);

impl SquareMatrix3 {
    /// All-zero matrix.
    pub const fn zeros() -> Self {
        SquareMatrix3([[0.0; 3]; 3])
    }

    /// Identity matrix.
    pub const fn identity() -> Self {
        SquareMatrix3([[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]])
    }

    /// Build from three rows.
    pub const fn from_rows(rows: [[f64; 3]; 3]) -> Self {
        SquareMatrix3(rows)
    }

    /// Borrow the rows.
    #[inline]
    pub fn rows(&self) -> &[[f64; 3]; 3] {
        &self.0
    }

    /// Row `i` as an array.
    #[inline]
    pub fn row(&self, i: usize) -> [f64; 3] {
        self.0[i]
    }

    /// Swap two rows in place.
    #[inline]
    pub fn swap_rows(&mut self, i: usize, j: usize) {
        self.0.swap(i, j);
    }

    pub fn trace(&self) -> f64 {
        self.0[0][0] + self.0[1][1] + self.0[2][2]
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::zeros();
        for i in 0..3 {
            for j in 0..3 {
                out.0[j][i] = self.0[i][j];
            }
        }
        out
    }

    /// `self - s*I`.
    pub fn shift_diagonal(&self, s: f64) -> Self {
        let mut out = *self;
        for i in 0..3 {
            out.0[i][i] -= s;
        }
        out
    }

    /// True when every entry is a finite number.
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|v| v.is_finite())
    }

    /// True when `|a_ij - a_ji| <= tol` for all off-diagonal pairs.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        (self.0[0][1] - self.0[1][0]).abs() <= tol
            && (self.0[0][2] - self.0[2][0]).abs() <= tol
            && (self.0[1][2] - self.0[2][1]).abs() <= tol
    }

    /// Largest absolute entry.
    pub fn max_abs(&self) -> f64 {
        self.0.iter().flatten().fold(0.0, |m, v| m.max(v.abs()))
    }

    /// Matrix-vector product.
    pub fn mul_vec(&self, v: [f64; 3]) -> [f64; 3] {
        let m = &self.0;
        [
            m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
            m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
            m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
        ]
    }
}

impl From<[[f64; 3]; 3]> for SquareMatrix3 {
    fn from(rows: [[f64; 3]; 3]) -> Self {
        SquareMatrix3(rows)
    }
}

impl Index<(usize, usize)> for SquareMatrix3 {
    type Output = f64;

    #[inline]
    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        &self.0[i][j]
    }
}

impl IndexMut<(usize, usize)> for SquareMatrix3 {
    #[inline]
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        &mut self.0[i][j]
    }
}

impl Mul for SquareMatrix3 {
    type Output = SquareMatrix3;

    fn mul(self, rhs: SquareMatrix3) -> SquareMatrix3 {
        let mut out = SquareMatrix3::zeros();
        for i in 0..3 {
            for j in 0..3 {
                out.0[i][j] = (0..3).map(|k| self.0[i][k] * rhs.0[k][j]).sum();
            }
        }
        out
    }
}

impl Mul<[f64; 3]> for SquareMatrix3 {
    type Output = [f64; 3];

    fn mul(self, rhs: [f64; 3]) -> [f64; 3] {
        self.mul_vec(rhs)
    }
}

impl Mul<f64> for SquareMatrix3 {
    type Output = SquareMatrix3;

    fn mul(mut self, s: f64) -> SquareMatrix3 {
        self.0.iter_mut().flatten().for_each(|v| *v *= s);
        self
    }
}

impl Div<f64> for SquareMatrix3 {
    type Output = SquareMatrix3;

    fn div(mut self, s: f64) -> SquareMatrix3 {
        self.0.iter_mut().flatten().for_each(|v| *v /= s);
        self
    }
}

impl Add for SquareMatrix3 {
    type Output = SquareMatrix3;

    fn add(mut self, rhs: SquareMatrix3) -> SquareMatrix3 {
        for i in 0..3 {
            for j in 0..3 {
                self.0[i][j] += rhs.0[i][j];
            }
        }
        self
    }
}

impl Sub for SquareMatrix3 {
    type Output = SquareMatrix3;

    fn sub(mut self, rhs: SquareMatrix3) -> SquareMatrix3 {
        for i in 0..3 {
            for j in 0..3 {
                self.0[i][j] -= rhs.0[i][j];
            }
        }
        self
    }
}

/// Eigenvalues of a symmetric [`SquareMatrix3`], in closed-form order
/// (not sorted).
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct EigenTriple(pub [f64; 3]);

impl EigenTriple {
    #[inline]
    pub fn values(&self) -> [f64; 3] {
        self.0
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Values in ascending order.
    pub fn sorted(&self) -> [f64; 3] {
        let mut v = self.0;
        v.sort_by(f64::total_cmp);
        v
    }
}

impl Index<usize> for EigenTriple {
    type Output = f64;

    fn index(&self, i: usize) -> &f64 {
        &self.0[i]
    }
}

/// Determinant `a*d - c*b` of the 2×2 matrix `[[a, b], [c, d]]`.
///
/// Uses Kahan's difference of products: the rounding error of `c*b` is
/// recovered with a fused multiply-add and added back, which keeps the result
/// within 1.5 ulp even when `a*d` and `c*b` nearly cancel.
#[inline]
pub fn det2(a: f64, d: f64, c: f64, b: f64) -> f64 {
    let cb = c * b;
    let err = (-c).mul_add(b, cb);
    let dop = a.mul_add(d, -cb);
    dop + err
}

/// 3×3 determinant by cofactor expansion along the first row.
///
/// No pivoting is applied; stabilize with [`pivot`] first if needed.
pub fn det(a: &SquareMatrix3) -> f64 {
    det2(
        a[(0, 0)],
        det2(a[(1, 1)], a[(2, 2)], a[(1, 2)], a[(2, 1)]),
        a[(0, 1)],
        det2(a[(1, 0)], a[(2, 2)], a[(1, 2)], a[(2, 0)]),
    ) + a[(0, 2)] * det2(a[(1, 0)], a[(2, 1)], a[(1, 1)], a[(2, 0)])
}

/// Row operations applied by [`pivot`], replayable on a right-hand side.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PivotRecord {
    /// Row swapped into row 0.
    pub first: usize,
    /// Multipliers that eliminated column 0 from rows 1 and 2.
    pub multipliers: [f64; 2],
    /// Whether rows 1 and 2 were exchanged for the second pivot.
    pub swapped_second: bool,
}

impl PivotRecord {
    /// Apply the same permutation and elimination to a right-hand side.
    pub fn apply(&self, rhs: &mut [f64; 3]) {
        rhs.swap(0, self.first);
        rhs[1] -= self.multipliers[0] * rhs[0];
        rhs[2] -= self.multipliers[1] * rhs[0];
        if self.swapped_second {
            rhs.swap(1, 2);
        }
    }
}

/// Partial pivoting of a 3×3 matrix in place.
///
/// The largest-magnitude entry of column 0 is swapped into row 0 and column 0
/// is eliminated below it; then the larger of the eliminated `(1,1)`/`(2,1)`
/// entries is swapped into row 1. The returned [`PivotRecord`] replays these
/// operations on a right-hand side.
///
/// A zero column 0 produces NaN entries rather than an error.
pub fn pivot(a: &mut SquareMatrix3) -> PivotRecord {
    let mut first = 0;
    let mut best = -1.0;
    for i in 0..3 {
        let v = a[(i, 0)].abs();
        if v > best {
            best = v;
            first = i;
        }
    }
    a.swap_rows(0, first);

    let mut multipliers = [0.0; 2];
    for (k, i) in [1usize, 2].into_iter().enumerate() {
        let m = a[(i, 0)] / a[(0, 0)];
        multipliers[k] = m;
        a[(i, 0)] = 0.0;
        for j in 1..3 {
            a[(i, j)] -= m * a[(0, j)];
        }
    }

    let swapped_second = a[(2, 1)].abs() > a[(1, 1)].abs();
    if swapped_second {
        a.swap_rows(1, 2);
    }

    PivotRecord {
        first,
        multipliers,
        swapped_second,
    }
}

/// Solve `a x = b` with [`pivot`] followed by elimination of column 1 and
/// back substitution.
pub fn solve(a: &SquareMatrix3, b: [f64; 3]) -> [f64; 3] {
    let mut m = *a;
    let mut rhs = b;
    pivot(&mut m).apply(&mut rhs);

    let l = m[(2, 1)] / m[(1, 1)];
    let m22 = m[(2, 2)] - l * m[(1, 2)];
    rhs[2] -= l * rhs[1];

    let x2 = rhs[2] / m22;
    let x1 = (rhs[1] - m[(1, 2)] * x2) / m[(1, 1)];
    let x0 = (rhs[0] - m[(0, 1)] * x1 - m[(0, 2)] * x2) / m[(0, 0)];
    [x0, x1, x2]
}

/// Inverse via the adjugate formula, every cofactor evaluated with [`det2`].
///
/// A zero or subnormal determinant gives infinite/NaN entries.
pub fn inv(a: &SquareMatrix3) -> SquareMatrix3 {
    let inv_det = 1.0 / det(a);
    let c = |i: usize, j: usize| a[(i, j)];

    SquareMatrix3::from_rows([
        [
            det2(c(1, 1), c(2, 2), c(2, 1), c(1, 2)) * inv_det,
            det2(c(0, 2), c(2, 1), c(0, 1), c(2, 2)) * inv_det,
            det2(c(0, 1), c(1, 2), c(0, 2), c(1, 1)) * inv_det,
        ],
        [
            det2(c(1, 2), c(2, 0), c(1, 0), c(2, 2)) * inv_det,
            det2(c(0, 0), c(2, 2), c(0, 2), c(2, 0)) * inv_det,
            det2(c(1, 0), c(0, 2), c(0, 0), c(1, 2)) * inv_det,
        ],
        [
            det2(c(1, 0), c(2, 1), c(2, 0), c(1, 1)) * inv_det,
            det2(c(2, 0), c(0, 1), c(0, 0), c(2, 1)) * inv_det,
            det2(c(0, 0), c(1, 1), c(1, 0), c(0, 1)) * inv_det,
        ],
    ])
}

/// Eigenvalues of a symmetric 3×3 matrix.
///
/// Symmetry is checked in debug builds only. The third
/// value is `3q - λ0 - λ1`, so the triple sums to the trace.
/// See <https://en.wikipedia.org/wiki/Eigenvalue_algorithm#3%C3%973_matrices>.
pub fn eigen(a: &SquareMatrix3) -> EigenTriple {
    debug_assert!(
        a.is_symmetric(1e-12 * (1.0 + a.max_abs())),
        "eigen expects a symmetric matrix: {a:?}"
    );
    let p1 = a[(0, 1)] * a[(0, 1)] + a[(0, 2)] * a[(0, 2)] + a[(1, 2)] * a[(1, 2)];
    if p1 == 0.0 {
        return EigenTriple([a[(0, 0)], a[(1, 1)], a[(2, 2)]]);
    }

    let q = a.trace() / 3.0;
    let p2 = (a[(0, 0)] - q).powi(2) + (a[(1, 1)] - q).powi(2) + (a[(2, 2)] - q).powi(2) + 2.0 * p1;
    let p = (p2 / 6.0).sqrt();
    let b = a.shift_diagonal(q) / p;
    let r = (0.5 * det(&b)).clamp(-1.0, 1.0);
    let phi = r.acos() / 3.0;

    let e0 = q + 2.0 * p * phi.cos();
    let e1 = q + 2.0 * p * (phi + 2.0 * PI / 3.0).cos();
    EigenTriple([e0, e1, 3.0 * q - e0 - e1])
}
