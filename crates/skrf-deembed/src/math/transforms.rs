//! Two-port parameter transformations
//!
//! Per-point conversions between S, Z, Y, ABCD and T parameters, plus the
//! lumped building blocks the de-embedding algorithms are assembled from.
//!
//! Conventions follow skrf: power-wave S-parameters with a per-port reference
//! impedance `z0`, `F = diag(sqrt(z0))`, and T-parameters defined so that a
//! cascade is the matrix product `T1 * T2`.
//!
//! Every function returns `None` instead of `inf`/`nan` when a matrix or
//! pivot element is singular within `tol`.

use ndarray::Array3;
use num_complex::Complex64;

use super::matrix_ops::Mat2;
use crate::error::{DeembedError, Result};

/// Reference impedance of port 1 and port 2
pub type RefImpedance = [Complex64; 2];

const ONE: Complex64 = Complex64::new(1.0, 0.0);
const TWO: Complex64 = Complex64::new(2.0, 0.0);

#[inline]
fn nonzero(x: Complex64, tol: f64) -> Option<Complex64> {
    if x.is_finite() && x.norm() >= tol {
        Some(x)
    } else {
        None
    }
}

#[inline]
fn sqrt_z0(z0: &RefImpedance) -> Mat2 {
    Mat2::diag(z0[0].sqrt(), z0[1].sqrt())
}

#[inline]
fn inv_sqrt_z0(z0: &RefImpedance) -> Mat2 {
    Mat2::diag(ONE / z0[0].sqrt(), ONE / z0[1].sqrt())
}

// ============================================================================
// S <-> Z, S <-> Y
// ============================================================================

/// S to Z: `Z = F (I + S) (I - S)^-1 F`
pub fn s2z(s: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let i = Mat2::identity();
    let inv = (i - *s).inverse(tol)?;
    let f = sqrt_z0(z0);
    Some(f * (i + *s) * inv * f)
}

/// Z to S: `S = F^-1 (Z - G) (Z + G)^-1 F`, `G = diag(z0)`
pub fn z2s(z: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let g = Mat2::diag(z0[0], z0[1]);
    let inv = (*z + g).inverse(tol)?;
    Some(inv_sqrt_z0(z0) * (*z - g) * inv * sqrt_z0(z0))
}

/// S to Y: `Y = F^-1 (I - S) (I + S)^-1 F^-1`
pub fn s2y(s: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let i = Mat2::identity();
    let inv = (i + *s).inverse(tol)?;
    let g = inv_sqrt_z0(z0);
    Some(g * (i - *s) * inv * g)
}

/// Y to S: `S = (I - y) (I + y)^-1` with the normalized `y = F Y F`
pub fn y2s(y: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let i = Mat2::identity();
    let f = sqrt_z0(z0);
    let yn = f * *y * f;
    let inv = (i + yn).inverse(tol)?;
    Some((i - yn) * inv)
}

// ============================================================================
// Z <-> Y <-> ABCD
// ============================================================================

pub fn z2y(z: &Mat2, tol: f64) -> Option<Mat2> {
    z.inverse(tol)
}

pub fn y2z(y: &Mat2, tol: f64) -> Option<Mat2> {
    y.inverse(tol)
}

/// Z to ABCD, needs `z21 != 0`
pub fn z2a(z: &Mat2, tol: f64) -> Option<Mat2> {
    let z21 = nonzero(z.get(1, 0), tol)?;
    Some(Mat2::new(z.get(0, 0), z.det(), ONE, z.get(1, 1)).scale(ONE / z21))
}

/// ABCD to Z, needs `C != 0`
pub fn a2z(a: &Mat2, tol: f64) -> Option<Mat2> {
    let c = nonzero(a.get(1, 0), tol)?;
    Some(Mat2::new(a.get(0, 0), a.det(), ONE, a.get(1, 1)).scale(ONE / c))
}

/// Y to ABCD, needs `y21 != 0`
pub fn y2a(y: &Mat2, tol: f64) -> Option<Mat2> {
    let y21 = nonzero(y.get(1, 0), tol)?;
    Some(Mat2::new(y.get(1, 1), ONE, y.det(), y.get(0, 0)).scale(-ONE / y21))
}

/// ABCD to Y, needs `B != 0`
pub fn a2y(a: &Mat2, tol: f64) -> Option<Mat2> {
    let b = nonzero(a.get(0, 1), tol)?;
    Some(Mat2::new(a.get(1, 1), -a.det(), -ONE, a.get(0, 0)).scale(ONE / b))
}

// ============================================================================
// S <-> ABCD
// ============================================================================

/// S to ABCD for per-port reference impedances, needs `S21 != 0`
pub fn s2a(s: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let [[s11, s12], [s21, s22]] = s.0;
    let s21 = nonzero(s21, tol)?;
    let (r1, r2) = (z0[0].sqrt(), z0[1].sqrt());
    let k = ONE / (TWO * s21);
    let x = s12 * s21;

    Some(Mat2::new(
        ((ONE + s11) * (ONE - s22) + x) * k * r1 / r2,
        ((ONE + s11) * (ONE + s22) - x) * k * r1 * r2,
        ((ONE - s11) * (ONE - s22) - x) * k / (r1 * r2),
        ((ONE - s11) * (ONE + s22) + x) * k * r2 / r1,
    ))
}

/// ABCD to S for per-port reference impedances
pub fn a2s(a: &Mat2, z0: &RefImpedance, tol: f64) -> Option<Mat2> {
    let [[aa, b], [c, d]] = a.0;
    let (z1, z2) = (z0[0], z0[1]);
    let den = nonzero(aa * z2 + b + c * z1 * z2 + d * z1, tol)?;
    let r = (z1 * z2).sqrt();

    Some(
        Mat2::new(
            aa * z2 + b - c * z1 * z2 - d * z1,
            TWO * a.det() * r,
            TWO * r,
            -aa * z2 + b - c * z1 * z2 + d * z1,
        )
        .scale(ONE / den),
    )
}

// ============================================================================
// S <-> T
// ============================================================================

/// S to T: `T = [[-det(S), S11], [-S22, 1]] / S21`
pub fn s2t(s: &Mat2, tol: f64) -> Option<Mat2> {
    let s21 = nonzero(s.get(1, 0), tol)?;
    Some(Mat2::new(-s.det(), s.get(0, 0), -s.get(1, 1), ONE).scale(ONE / s21))
}

/// T to S: `S = [[T12, det(T)], [1, -T21]] / T22`
pub fn t2s(t: &Mat2, tol: f64) -> Option<Mat2> {
    let t22 = nonzero(t.get(1, 1), tol)?;
    Some(Mat2::new(t.get(0, 1), t.det(), ONE, -t.get(1, 0)).scale(ONE / t22))
}

// ============================================================================
// Cascade and inverse in S
// ============================================================================

/// Connect port 2 of `a` to port 1 of `b` (signal flow graph form)
pub fn cascade_s(a: &Mat2, b: &Mat2, tol: f64) -> Option<Mat2> {
    let [[a11, a12], [a21, a22]] = a.0;
    let [[b11, b12], [b21, b22]] = b.0;
    let denom = nonzero(ONE - a22 * b11, tol)?;

    Some(Mat2::new(
        a11 + (a12 * a21 * b11) / denom,
        (a12 * b12) / denom,
        (a21 * b21) / denom,
        b22 + (b12 * b21 * a22) / denom,
    ))
}

/// The network whose cascade with `s` is an ideal thru
pub fn inverse_s(s: &Mat2, tol: f64) -> Option<Mat2> {
    let t = s2t(s, tol)?;
    t2s(&t.inverse(tol)?, tol)
}

// ============================================================================
// Lumped building blocks
// ============================================================================

/// ABCD of a series impedance
pub fn abcd_series(z: Complex64) -> Mat2 {
    Mat2::new(ONE, z, Complex64::new(0.0, 0.0), ONE)
}

/// ABCD of a shunt admittance
pub fn abcd_shunt(y: Complex64) -> Mat2 {
    Mat2::new(ONE, Complex64::new(0.0, 0.0), y, ONE)
}

/// S of a line matched to its own reference: `[[0, e^-gl], [e^-gl, 0]]`
///
/// A negative `gamma_l` gives the inverse line.
pub fn matched_line_s(gamma_l: Complex64) -> Mat2 {
    let e = (-gamma_l).exp();
    Mat2::new(Complex64::new(0.0, 0.0), e, e, Complex64::new(0.0, 0.0))
}

/// S of a zero-length junction whose port 1 is referenced to `z_from` and
/// port 2 to `z_to`
pub fn junction_s(z_from: Complex64, z_to: Complex64, tol: f64) -> Option<Mat2> {
    a2s(&Mat2::identity(), &[z_from, z_to], tol)
}

// ============================================================================
// Parasitic removal working directly on S
// ============================================================================

/// Subtract a shunt admittance matrix `y_p` from the network `s`
///
/// Equivalent to `y2s(s2y(s) - y_p)` but expressed as
/// `S' = (2S + y'(I+S)) (2I - y'(I+S))^-1` with `y' = F y_p F`, which stays
/// finite when the Y-parameters of `s` do not exist (pure shunt networks).
pub fn remove_shunt_admittance(
    s: &Mat2,
    y_p: &Mat2,
    z0: &RefImpedance,
    tol: f64,
) -> Option<Mat2> {
    let i = Mat2::identity();
    let f = sqrt_z0(z0);
    let yn = f * *y_p * f;
    let p = yn * (i + *s);
    let den = (i.scale(TWO) - p).inverse(tol)?;
    Some((s.scale(TWO) + p) * den)
}

/// Subtract a series impedance matrix `z_p` from the network `s`
///
/// Equivalent to `z2s(s2z(s) - z_p)` but expressed as
/// `S' = (2S - z'(I-S)) (2I - z'(I-S))^-1` with `z' = F^-1 z_p F^-1`, which
/// stays finite for pure series networks whose Z-parameters do not exist.
pub fn remove_series_impedance(
    s: &Mat2,
    z_p: &Mat2,
    z0: &RefImpedance,
    tol: f64,
) -> Option<Mat2> {
    let i = Mat2::identity();
    let g = inv_sqrt_z0(z0);
    let zn = g * *z_p * g;
    let q = zn * (i - *s);
    let den = (i.scale(TWO) - q).inverse(tol)?;
    Some((s.scale(TWO) - q) * den)
}

// ============================================================================
// Sweep helpers
// ============================================================================

/// Apply a per-point operation across a `[nfreq, 2, 2]` sweep
///
/// The first point where `op` returns `None` becomes a
/// [`DeembedError::SingularMatrix`] carrying that index and `context`.
pub fn map_sweep<F>(
    arr: &Array3<Complex64>,
    context: &'static str,
    mut op: F,
) -> Result<Array3<Complex64>>
where
    F: FnMut(usize, &Mat2) -> Option<Mat2>,
{
    let nfreq = arr.shape()[0];
    let mut out = Array3::<Complex64>::zeros((nfreq, 2, 2));
    for f in 0..nfreq {
        let m = Mat2::from_sweep(arr, f);
        let r = op(f, &m).ok_or(DeembedError::SingularMatrix { index: f, context })?;
        r.write_to(&mut out, f);
    }
    Ok(out)
}
