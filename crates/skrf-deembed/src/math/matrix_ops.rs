//! 2x2 complex matrix helpers
//!
//! Every representation of a two-port at one frequency point is a [`Mat2`].
//! Sweeps are stored as `Array3<Complex64>` of shape `[nfreq, 2, 2]`; the
//! helpers here move single points in and out of that layout.

use std::ops::{Add, Mul, Neg, Sub};

use ndarray::Array3;
use num_complex::Complex64;

const ONE: Complex64 = Complex64::new(1.0, 0.0);
const ZERO: Complex64 = Complex64::new(0.0, 0.0);

/// A 2x2 complex matrix, row-major: `m[row][col]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat2(pub [[Complex64; 2]; 2]);

impl Mat2 {
    #[inline]
    pub fn new(m11: Complex64, m12: Complex64, m21: Complex64, m22: Complex64) -> Self {
        Self([[m11, m12], [m21, m22]])
    }

    #[inline]
    pub fn identity() -> Self {
        Self::new(ONE, ZERO, ZERO, ONE)
    }

    #[inline]
    pub fn zeros() -> Self {
        Self::new(ZERO, ZERO, ZERO, ZERO)
    }

    /// Diagonal matrix `diag(a, b)`
    #[inline]
    pub fn diag(a: Complex64, b: Complex64) -> Self {
        Self::new(a, ZERO, ZERO, b)
    }

    /// Element access with 0-based indices
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.0[row][col]
    }

    #[inline]
    pub fn det(&self) -> Complex64 {
        self.0[0][0] * self.0[1][1] - self.0[0][1] * self.0[1][0]
    }

    /// Inverse, or `None` when `|det|` is within `tol` of cancelling
    ///
    /// The threshold is relative to the larger of `|m11*m22|` and
    /// `|m12*m21|`, so it does not depend on the units of the entries.
    #[inline]
    pub fn inverse(&self, tol: f64) -> Option<Mat2> {
        let [[a, b], [c, d]] = self.0;
        let det = self.det();
        let scale = (a * d).norm().max((b * c).norm());
        if !det.is_finite() || det.norm() <= tol * scale {
            return None;
        }
        let inv_det = ONE / det;
        Some(Mat2::new(
            d * inv_det,
            -b * inv_det,
            -c * inv_det,
            a * inv_det,
        ))
    }

    /// Swap both ports: `new[i][j] = old[1-i][1-j]`
    #[inline]
    pub fn flipped(&self) -> Mat2 {
        let [[a, b], [c, d]] = self.0;
        Mat2::new(d, c, b, a)
    }

    #[inline]
    pub fn scale(&self, k: Complex64) -> Mat2 {
        let [[a, b], [c, d]] = self.0;
        Mat2::new(a * k, b * k, c * k, d * k)
    }

    /// True when every element is finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.0.iter().flatten().all(|c| c.is_finite())
    }

    /// Read point `f` of a `[nfreq, 2, 2]` sweep
    #[inline]
    pub fn from_sweep(arr: &Array3<Complex64>, f: usize) -> Mat2 {
        Mat2::new(
            arr[[f, 0, 0]],
            arr[[f, 0, 1]],
            arr[[f, 1, 0]],
            arr[[f, 1, 1]],
        )
    }

    /// Write this matrix to point `f` of a `[nfreq, 2, 2]` sweep
    #[inline]
    pub fn write_to(&self, arr: &mut Array3<Complex64>, f: usize) {
        for i in 0..2 {
            for j in 0..2 {
                arr[[f, i, j]] = self.0[i][j];
            }
        }
    }
}

impl Mul for Mat2 {
    type Output = Mat2;

    #[inline]
    fn mul(self, rhs: Mat2) -> Mat2 {
        let [[a11, a12], [a21, a22]] = self.0;
        let [[b11, b12], [b21, b22]] = rhs.0;
        Mat2::new(
            a11 * b11 + a12 * b21,
            a11 * b12 + a12 * b22,
            a21 * b11 + a22 * b21,
            a21 * b12 + a22 * b22,
        )
    }
}

impl Add for Mat2 {
    type Output = Mat2;

    #[inline]
    fn add(self, rhs: Mat2) -> Mat2 {
        let mut out = self;
        for i in 0..2 {
            for j in 0..2 {
                out.0[i][j] += rhs.0[i][j];
            }
        }
        out
    }
}

impl Sub for Mat2 {
    type Output = Mat2;

    #[inline]
    fn sub(self, rhs: Mat2) -> Mat2 {
        self + (-rhs)
    }
}

impl Neg for Mat2 {
    type Output = Mat2;

    #[inline]
    fn neg(self) -> Mat2 {
        self.scale(-ONE)
    }
}

/// Build a sweep from one matrix per point
pub fn sweep_from_points(points: &[Mat2]) -> Array3<Complex64> {
    let mut arr = Array3::<Complex64>::zeros((points.len(), 2, 2));
    for (f, m) in points.iter().enumerate() {
        m.write_to(&mut arr, f);
    }
    arr
}
