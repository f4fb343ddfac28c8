//! IEEE P370 2x-thru split without impedance correction
//!
//! Each side is modelled as
//!
//! ```text
//! side_p = [[e00_p, k_p],
//!           [k_p,   e11_p]]
//! ```
//!
//! with port 1 at the instrument. The outer reflections `e00_p` are the
//! 2x-thru reflections gated at the transmission peak, the inner reflections
//! follow from the measured S-parameters, and the transmissions are square
//! roots tracked along the sweep so that their phase stays continuous.

use ndarray::Array3;
use num_complex::Complex64;
use tracing::debug;

use super::{column, dc_extrapolate, prepare};
use crate::constants::{Tolerances, DEFAULT_Z0};
use crate::deembedding::{Deembedding, FixtureHalves};
use crate::error::{DeembedError, Result};
use crate::frequency::Frequency;
use crate::math::conversions::unwrap_phase_dc_anchored;
use crate::math::matrix_ops::sweep_from_points;
use crate::math::time_domain::{argmax, ifftshift, impulse_response, rfft};
use crate::math::Mat2;
use crate::network::Network;

/// Configuration for [`Ieeep370NzcTwoXThru`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NzcOptions {
    /// Reference impedance of the side models (Ohm)
    pub z0: f64,
    pub tolerances: Tolerances,
}

impl Default for NzcOptions {
    fn default() -> Self {
        Self {
            z0: DEFAULT_Z0,
            tolerances: Tolerances::default(),
        }
    }
}

impl NzcOptions {
    pub fn with_z0(mut self, z0: f64) -> Self {
        self.z0 = z0;
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if !(self.z0.is_finite() && self.z0 > 0.0) {
            return Err(DeembedError::InvalidParameter(format!(
                "reference impedance must be positive, got {}",
                self.z0
            )));
        }
        Ok(())
    }
}

/// Side models of a 2x-thru split, one matrix per frequency point
pub(crate) struct TwoXThruSplit {
    pub side1: Vec<Mat2>,
    pub side2: Vec<Mat2>,
    /// Index of the transmission peak in the centred impulse response
    pub midpoint: usize,
}

/// Split the S-parameters of a 2x-thru on a grid `f_k = k*df`
pub(crate) fn split_two_x_thru(s: &Array3<Complex64>, tol: f64) -> Result<TwoXThruSplit> {
    let n = s.shape()[0];
    let s11 = column(s, 0, 0);
    let s12 = column(s, 0, 1);
    let s21 = column(s, 1, 0);
    let s22 = column(s, 1, 1);

    let t21 = impulse_response(dc_extrapolate(&s21), &s21);
    let midpoint = argmax(&t21);
    if midpoint <= n {
        return Err(DeembedError::InvalidNetwork(
            "2x-thru transmission has no positive delay".into(),
        ));
    }
    debug!(midpoint, delay_samples = midpoint - n, "2x-thru transmission peak");

    let e00_1 = gated_reflection(&s11, midpoint);
    let e00_2 = gated_reflection(&s22, midpoint);

    let mut e11_1 = Vec::with_capacity(n);
    let mut e11_2 = Vec::with_capacity(n);
    let mut k1_sq = Vec::with_capacity(n);
    let mut k2_sq = Vec::with_capacity(n);
    for k in 0..n {
        if s12[k].norm() < tol || s21[k].norm() < tol {
            return Err(DeembedError::SingularMatrix {
                index: k,
                context: "2x-thru split",
            });
        }
        let a = (s22[k] - e00_2[k]) / s12[k];
        let b = (s11[k] - e00_1[k]) / s21[k];
        let loop_gain = Complex64::new(1.0, 0.0) - a * b;
        e11_1.push(a);
        e11_2.push(b);
        k1_sq.push(s21[k] * loop_gain);
        k2_sq.push(s12[k] * loop_gain);
    }

    let k1 = continuous_sqrt(&k1_sq);
    let mut flips = 0usize;
    let k2: Vec<Complex64> = k2_sq
        .iter()
        .zip(k1.iter())
        .map(|(p, k1)| {
            let r = p.sqrt();
            if (r * k1.conj()).re >= 0.0 {
                r
            } else {
                flips += 1;
                -r
            }
        })
        .collect();
    debug!(flips, "side 2 transmission aligned to side 1 branch");

    let side1 = (0..n)
        .map(|k| Mat2::new(e00_1[k], k1[k], k1[k], e11_1[k]))
        .collect();
    let side2 = (0..n)
        .map(|k| Mat2::new(e00_2[k], k2[k], k2[k], e11_2[k]))
        .collect();

    Ok(TwoXThruSplit {
        side1,
        side2,
        midpoint,
    })
}

/// Reflection with everything from sample `gate` onwards removed
fn gated_reflection(values: &[Complex64], gate: usize) -> Vec<Complex64> {
    let mut t = impulse_response(dc_extrapolate(values), values);
    for v in t.iter_mut().skip(gate) {
        *v = 0.0;
    }
    let spectrum = rfft(&ifftshift(&t));
    spectrum[1..].to_vec()
}

/// Square root whose phase is half the causal unwrapped phase of `p`
///
/// Picking the root point by point can jump by 180 degrees wherever the
/// phase of `p` crosses the branch cut; halving a continuous phase cannot.
fn continuous_sqrt(p: &[Complex64]) -> Vec<Complex64> {
    let phase = unwrap_phase_dc_anchored(p);
    p.iter()
        .zip(phase)
        .map(|(v, ph)| Complex64::from_polar(v.norm().sqrt(), ph / 2.0))
        .collect()
}

/// IEEE P370 2x-thru de-embedding without impedance correction
///
/// # Example
/// ```no_run
/// use skrf_deembed::deembedding::{Deembedding, Ieeep370NzcTwoXThru};
/// # fn run(two_x_thru: &skrf_deembed::Network, fdf: &skrf_deembed::Network) -> skrf_deembed::error::Result<()> {
/// let dm = Ieeep370NzcTwoXThru::new(two_x_thru)?;
/// let dut = dm.deembed(fdf)?;
/// let side1 = dm.s_side1();
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Ieeep370NzcTwoXThru {
    frequency: Frequency,
    s_side1: Network,
    s_side2: Network,
    halves: FixtureHalves,
    options: NzcOptions,
}

impl Ieeep370NzcTwoXThru {
    pub fn new(s2xthru: &Network) -> Result<Self> {
        Self::with_options(s2xthru, NzcOptions::default())
    }

    pub fn with_options(s2xthru: &Network, options: NzcOptions) -> Result<Self> {
        options.validate()?;
        let tol = options.tolerances;
        let two_x = prepare(s2xthru, options.z0, &tol)?;

        let split = split_two_x_thru(two_x.s(), tol.singular)?;
        let side1 = sweep_from_points(&split.side1);
        let side2 = sweep_from_points(&split.side2);
        let side2_flipped: Vec<Mat2> = split.side2.iter().map(Mat2::flipped).collect();
        let halves = FixtureHalves::new(&side1, &sweep_from_points(&side2_flipped), tol.singular)?;

        Ok(Self {
            frequency: two_x.frequency().clone(),
            s_side1: two_x.with_s(side1)?.named("side1"),
            s_side2: two_x.with_s(side2)?.named("side2"),
            halves,
            options,
        })
    }

    /// Fixture half at port 1 (port 1 at the instrument)
    pub fn s_side1(&self) -> &Network {
        &self.s_side1
    }

    /// Fixture half at port 2 (port 1 at the instrument)
    pub fn s_side2(&self) -> &Network {
        &self.s_side2
    }
}

impl Deembedding for Ieeep370NzcTwoXThru {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.options.tolerances.frequency)?;
        let raw = raw.renormalized(self.options.z0)?;
        self.halves.remove(&raw, self.options.tolerances.singular)
    }
}
