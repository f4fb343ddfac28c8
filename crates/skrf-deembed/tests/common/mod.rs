//! Synthetic fixtures shared by the integration tests
//!
//! Everything is built from closed-form circuit models so the expected DUT is
//! known exactly.

#![allow(dead_code)]

use ndarray::{Array1, Array3};
use num_complex::Complex64;
use skrf_deembed::frequency::{Frequency, FrequencyUnit, SweepType};
use skrf_deembed::math::conversions::complex_2_db;
use skrf_deembed::math::matrix_ops::sweep_from_points;
use skrf_deembed::math::transforms::{a2s, abcd_series, abcd_shunt, cascade_s};
use skrf_deembed::math::Mat2;
use skrf_deembed::Network;
use std::f64::consts::PI;

pub const Z0: f64 = 50.0;

pub fn c(re: f64, im: f64) -> Complex64 {
    Complex64::new(re, im)
}

pub fn omega(f: f64) -> f64 {
    2.0 * PI * f
}

pub fn z0_array() -> Array1<Complex64> {
    Array1::from_elem(2, c(Z0, 0.0))
}

/// 1-10 GHz in 10 points, for the lumped-element algorithms
pub fn lumped_grid() -> Frequency {
    Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear)
}

/// 50 MHz to 20 GHz in 50 MHz steps, for the 2x-thru algorithms
pub fn ieee_grid() -> Frequency {
    Frequency::new(0.05, 20.0, 400, FrequencyUnit::GHz, SweepType::Linear)
}

/// Per-point matrices `m(f)` stacked into a sweep
fn sweep(freq: &Frequency, m: impl Fn(f64) -> Mat2) -> Array3<Complex64> {
    let points: Vec<Mat2> = freq.f().iter().map(|&f| m(f)).collect();
    sweep_from_points(&points)
}

pub fn from_abcd(freq: &Frequency, abcd: impl Fn(f64) -> Mat2) -> Network {
    Network::from_abcd(freq.clone(), &sweep(freq, abcd), z0_array()).unwrap()
}

pub fn from_y(freq: &Frequency, y: impl Fn(f64) -> Mat2) -> Network {
    Network::from_y(freq.clone(), &sweep(freq, y), z0_array()).unwrap()
}

pub fn from_z(freq: &Frequency, z: impl Fn(f64) -> Mat2) -> Network {
    Network::from_z(freq.clone(), &sweep(freq, z), z0_array()).unwrap()
}

pub fn from_s(freq: &Frequency, s: impl Fn(f64) -> Mat2) -> Network {
    Network::with_z0(freq.clone(), sweep(freq, s), Z0).unwrap()
}

// ============================================================================
// Lumped pad model
// ============================================================================

/// Pad capacitance to ground
pub const C_PAD: f64 = 25e-15;
/// Pad-to-pad coupling capacitance
pub const C_COUPLING: f64 = 10e-15;
/// Access line resistance
pub const R_LINE: f64 = 2.0;
/// DUT series inductance
pub const L_DUT: f64 = 1e-9;

pub fn z_line(_f: f64) -> Complex64 {
    c(R_LINE, 0.0)
}

pub fn z_dut(f: f64) -> Complex64 {
    c(0.0, omega(f) * L_DUT)
}

/// Y of the pads with their coupling capacitance
pub fn y_pads(f: f64) -> Mat2 {
    let yp = c(0.0, omega(f) * C_PAD);
    let yc = c(0.0, omega(f) * C_COUPLING);
    Mat2::new(yp + yc, -yc, -yc, yp + yc)
}

/// Y of a series element between the two ports
pub fn y_series(z: Complex64) -> Mat2 {
    let y = c(1.0, 0.0) / z;
    Mat2::new(y, -y, -y, y)
}

// ============================================================================
// Distributed 2x-thru model
// ============================================================================

/// One-way delay of each fixture half
pub const SIDE_DELAY: f64 = 0.4e-9;
/// Shunt launch capacitance
pub const C_LAUNCH: f64 = 50e-15;

/// ABCD of a line with real impedance `zc` and `gamma*l = attenuation + j*w*delay`
pub fn abcd_line(zc: f64, f: f64, delay: f64, loss_np: f64) -> Mat2 {
    let gl = c(loss_np, omega(f) * delay);
    let zc = c(zc, 0.0);
    Mat2::new(gl.cosh(), zc * gl.sinh(), gl.sinh() / zc, gl.cosh())
}

/// Skin-effect-like loss of one fixture half, in nepers
pub fn side_loss(f: f64) -> f64 {
    0.02 * (f * 1e-9).sqrt()
}

/// S of a fixture half: launch capacitance then a lossy `zc` line
pub fn fixture_side(f: f64, zc: f64, launch_c: f64) -> Mat2 {
    let abcd = abcd_shunt(c(0.0, omega(f) * launch_c)) * abcd_line(zc, f, SIDE_DELAY, side_loss(f));
    a2s(&abcd, &[c(Z0, 0.0); 2], 1e-15).unwrap()
}

/// S-parameters of an ideal zero-length thru
pub fn thru_s() -> Mat2 {
    Mat2::new(c(0.0, 0.0), c(1.0, 0.0), c(1.0, 0.0), c(0.0, 0.0))
}

/// Two mirrored fixture halves around `dut` (S-parameters)
pub fn embed(side: &Mat2, dut: &Mat2) -> Mat2 {
    let left = cascade_s(side, dut, 1e-15).unwrap();
    cascade_s(&left, &side.flipped(), 1e-15).unwrap()
}

/// 2x-thru of two 55 Ohm fixture halves with launch capacitance
pub fn two_x_thru_55() -> Network {
    from_s(&ieee_grid(), |f| embed(&fixture_side(f, 55.0, C_LAUNCH), &thru_s())).named("2xthru")
}

/// Series inductor DUT as S-parameters
pub fn dut_series_l(f: f64, l: f64) -> Mat2 {
    a2s(&abcd_series(c(0.0, omega(f) * l)), &[c(Z0, 0.0); 2], 1e-15).unwrap()
}

// ============================================================================
// Assertions
// ============================================================================

pub fn db(v: Complex64) -> f64 {
    complex_2_db(v)
}

pub fn assert_networks_close(a: &Network, b: &Network, tol: f64) {
    assert_eq!(a.nfreq(), b.nfreq());
    for (x, y) in a.s.iter().zip(b.s.iter()) {
        assert!((x - y).norm() < tol, "{x} vs {y}");
    }
}

/// Transmission within `db_tol` of 0 dB and `deg_tol` of 0 degrees
pub fn assert_is_thru(ntwk: &Network, db_tol: f64, deg_tol: f64) {
    for k in 0..ntwk.nfreq() {
        for (i, j) in [(1, 0), (0, 1)] {
            let t = ntwk.s[[k, i, j]];
            assert!(db(t).abs() < db_tol, "S{}{} = {} dB at index {k}", i + 1, j + 1, db(t));
            assert!(
                t.arg().to_degrees().abs() < deg_tol,
                "S{}{} = {} deg at index {k}",
                i + 1,
                j + 1,
                t.arg().to_degrees()
            );
        }
    }
}
