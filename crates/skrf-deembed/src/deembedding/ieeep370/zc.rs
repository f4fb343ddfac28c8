//! IEEE P370 2x-thru split with impedance correction
//!
//! Starts from the NZC split, then for each side:
//!
//! 1. reads the fixture impedance from the band-limited TDR of the
//!    fixture-dut-fixture just before the DUT,
//! 2. pulls the reference plane back by `pullback` TDR samples of fixture
//!    line,
//! 3. re-references the DUT-facing port from the fixture impedance to `z0`.
//!
//! With NRP enabled the 2x-thru delay is first aligned to a whole number of
//! samples so the midpoint falls on a sample instead of between two.

use ndarray::{Array1, Array2, Array3};
use num_complex::Complex64;
use std::f64::consts::PI;
use tracing::debug;

use super::nzc::split_two_x_thru;
use super::{column, prepare};
use crate::constants::{Tolerances, DEFAULT_Z0};
use crate::deembedding::{Deembedding, FixtureHalves};
use crate::error::{DeembedError, Result};
use crate::frequency::Frequency;
use crate::math::conversions::unwrap_phase_dc_anchored;
use crate::math::linalg::lstsq;
use crate::math::matrix_ops::sweep_from_points;
use crate::math::time_domain::{com_receiver_filter, impulse_response, step_response};
use crate::math::transforms::{cascade_s, junction_s, matched_line_s};
use crate::math::Mat2;
use crate::network::Network;

/// TDR samples kept between the impedance window and the DUT edge
const GUARD_SAMPLES: usize = 3;

/// Configuration for [`Ieeep370ZcTwoXThru`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZcOptions {
    /// Reference impedance of the side models (Ohm)
    pub z0: f64,
    /// Upper frequency of the loss fit and TDR filter corner (Hz), 0 for the full band
    pub bandwidth_limit: f64,
    /// TDR samples of fixture line left in the DUT at port 1
    pub pullback1: usize,
    /// TDR samples of fixture line left in the DUT at port 2
    pub pullback2: usize,
    /// Extra TDR samples averaged into the impedance estimate
    pub leadin: usize,
    /// Align the 2x-thru delay to a whole number of samples
    pub nrp_enable: bool,
    pub tolerances: Tolerances,
}

impl Default for ZcOptions {
    fn default() -> Self {
        Self {
            z0: DEFAULT_Z0,
            bandwidth_limit: 0.0,
            pullback1: 0,
            pullback2: 0,
            leadin: 0,
            nrp_enable: false,
            tolerances: Tolerances::default(),
        }
    }
}

impl ZcOptions {
    pub fn with_z0(mut self, z0: f64) -> Self {
        self.z0 = z0;
        self
    }

    pub fn with_bandwidth_limit(mut self, hz: f64) -> Self {
        self.bandwidth_limit = hz;
        self
    }

    pub fn with_pullback(mut self, pullback1: usize, pullback2: usize) -> Self {
        self.pullback1 = pullback1;
        self.pullback2 = pullback2;
        self
    }

    pub fn with_leadin(mut self, leadin: usize) -> Self {
        self.leadin = leadin;
        self
    }

    pub fn with_nrp(mut self, enable: bool) -> Self {
        self.nrp_enable = enable;
        self
    }

    pub fn with_tolerances(mut self, tolerances: Tolerances) -> Self {
        self.tolerances = tolerances;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.z0.is_finite() && self.z0 > 0.0) {
            return Err(DeembedError::InvalidParameter(format!(
                "reference impedance must be positive, got {}",
                self.z0
            )));
        }
        if !(self.bandwidth_limit.is_finite() && self.bandwidth_limit >= 0.0) {
            return Err(DeembedError::InvalidParameter(format!(
                "bandwidth limit must be zero or positive, got {}",
                self.bandwidth_limit
            )));
        }
        Ok(())
    }
}

/// IEEE P370 2x-thru de-embedding with impedance correction
#[derive(Debug, Clone)]
pub struct Ieeep370ZcTwoXThru {
    frequency: Frequency,
    s_side1: Network,
    s_side2: Network,
    z_fixture: [f64; 2],
    nrp_shift: f64,
    halves: FixtureHalves,
    options: ZcOptions,
}

impl Ieeep370ZcTwoXThru {
    /// Extract the sides from a 2x-thru and a fixture-dut-fixture on the same grid
    pub fn new(s2xthru: &Network, sfix_dut_fix: &Network) -> Result<Self> {
        Self::with_options(s2xthru, sfix_dut_fix, ZcOptions::default())
    }

    pub fn with_options(s2xthru: &Network, sfix_dut_fix: &Network, options: ZcOptions) -> Result<Self> {
        options.validate()?;
        let tol = options.tolerances;
        let two_x = prepare(s2xthru, options.z0, &tol)?;
        let fdf = prepare(sfix_dut_fix, options.z0, &tol)?;
        two_x
            .frequency()
            .ensure_matches(fdf.frequency(), tol.frequency)?;

        let f = two_x.f().to_vec();
        let n = f.len();
        let f_max = f[n - 1];
        let dt = 1.0 / (2.0 * f_max);

        let (two_x_s, fdf_s, nrp_shift) = if options.nrp_enable {
            let tau = transmission_delay(&column(two_x.s(), 1, 0), f_max);
            let shift = (tau / dt).round() * dt - tau;
            debug!(tau, shift, "NRP delay alignment");
            (
                delay_outer_ports(two_x.s(), &f, shift / 2.0),
                delay_outer_ports(fdf.s(), &f, shift / 2.0),
                shift,
            )
        } else {
            (two_x.s().clone(), fdf.s().clone(), 0.0)
        };

        let split = split_two_x_thru(&two_x_s, tol.singular)?;
        let delay_samples = split.midpoint - n;
        let gamma = propagation_constant(&two_x_s, &f, options.bandwidth_limit)?;

        let fr = if options.bandwidth_limit > 0.0 {
            options.bandwidth_limit
        } else {
            f_max / 2.0
        };
        let filter = com_receiver_filter(&f, fr);
        let pullbacks = [options.pullback1, options.pullback2];

        let mut z_fixture = [0.0; 2];
        for (p, z) in z_fixture.iter_mut().enumerate() {
            let window = delay_samples
                .checked_sub(pullbacks[p] + GUARD_SAMPLES + options.leadin)
                .filter(|&start| start > 0)
                .map(|start| (n + start, n + start + options.leadin))
                .ok_or_else(|| {
                    DeembedError::InvalidParameter(format!(
                        "pullback {} with leadin {} does not fit in a fixture of {} TDR samples",
                        pullbacks[p], options.leadin, delay_samples
                    ))
                })?;
            let reflection = column(&fdf_s, p, p);
            *z = fixture_impedance(&reflection, &filter, options.z0, window)?;
        }
        debug!(
            z1 = z_fixture[0],
            z2 = z_fixture[1],
            delay_samples,
            "fixture impedance from TDR"
        );

        let z0 = Complex64::new(options.z0, 0.0);
        let nzc = [&split.side1, &split.side2];
        let mut sides: [Vec<Mat2>; 2] = [Vec::with_capacity(n), Vec::with_capacity(n)];
        for (p, side) in sides.iter_mut().enumerate() {
            let length = pullbacks[p] as f64 / (2.0 * delay_samples as f64);
            let junction = junction_s(Complex64::new(z_fixture[p], 0.0), z0, tol.singular)
                .ok_or_else(|| DeembedError::InvalidParameter("fixture impedance is zero".into()))?;

            for k in 0..n {
                let line = matched_line_s(-gamma[k] * length);
                let corrected = cascade_s(&nzc[p][k], &line, tol.singular)
                    .and_then(|m| cascade_s(&m, &junction, tol.singular))
                    .and_then(|m| {
                        let w = 2.0 * PI * f[k];
                        let undo = matched_line_s(Complex64::new(0.0, -w * nrp_shift / 2.0));
                        cascade_s(&undo, &m, tol.singular)
                    })
                    .ok_or(DeembedError::SingularMatrix {
                        index: k,
                        context: "impedance-corrected side",
                    })?;
                side.push(corrected);
            }
        }

        let side1 = sweep_from_points(&sides[0]);
        let side2 = sweep_from_points(&sides[1]);
        let side2_flipped: Vec<Mat2> = sides[1].iter().map(Mat2::flipped).collect();
        let halves = FixtureHalves::new(&side1, &sweep_from_points(&side2_flipped), tol.singular)?;

        Ok(Self {
            frequency: two_x.frequency().clone(),
            s_side1: two_x.with_s(side1)?.named("side1"),
            s_side2: two_x.with_s(side2)?.named("side2"),
            z_fixture,
            nrp_shift,
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

    /// Fixture impedance estimated at each port (Ohm)
    pub fn z_fixture(&self) -> [f64; 2] {
        self.z_fixture
    }

    /// Delay added to the 2x-thru by NRP alignment (s), 0 when disabled
    pub fn nrp_shift(&self) -> f64 {
        self.nrp_shift
    }
}

impl Deembedding for Ieeep370ZcTwoXThru {
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

/// Delay of a transmission from its causal unwrapped phase at the top of the band
fn transmission_delay(s21: &[Complex64], f_max: f64) -> f64 {
    let phase = unwrap_phase_dc_anchored(s21);
    -phase[phase.len() - 1] / (2.0 * PI * f_max)
}

/// Matched delay `d` cascaded at both outer ports: every entry gains `e^{-j2wd}`
fn delay_outer_ports(s: &Array3<Complex64>, f: &[f64], d: f64) -> Array3<Complex64> {
    let mut out = s.clone();
    for (k, &fk) in f.iter().enumerate() {
        let rot = Complex64::from_polar(1.0, -2.0 * 2.0 * PI * fk * d);
        for i in 0..2 {
            for j in 0..2 {
                out[[k, i, j]] *= rot;
            }
        }
    }
    out
}

/// Propagation constant over the full 2x-thru length
///
/// `beta = -unwrap(arg S21)`, `alpha = -ln(|S21|^2 / (1 - |S11|^2)) / 2`.
/// With a positive `bandwidth_limit` alpha is replaced by its least-squares
/// fit on `sqrt(f)`, `f`, `f^2` below the limit.
fn propagation_constant(s: &Array3<Complex64>, f: &[f64], bandwidth_limit: f64) -> Result<Vec<Complex64>> {
    let s11 = column(s, 0, 0);
    let s21 = column(s, 1, 0);
    let beta: Vec<f64> = unwrap_phase_dc_anchored(&s21).iter().map(|p| -p).collect();

    let mut alpha = Vec::with_capacity(f.len());
    for (k, (a, b)) in s21.iter().zip(s11.iter()).enumerate() {
        let transmitted = 1.0 - b.norm_sqr();
        if transmitted <= 0.0 {
            return Err(DeembedError::InvalidNetwork(format!(
                "2x-thru reflects all power at frequency index {k}"
            )));
        }
        alpha.push(-(a.norm_sqr() / transmitted).ln() / 2.0);
    }

    if bandwidth_limit > 0.0 {
        // GHz keeps the normal equations well scaled
        let fit: Vec<(f64, f64)> = f
            .iter()
            .zip(alpha.iter())
            .filter(|&(&fk, _)| fk <= bandwidth_limit)
            .map(|(&fk, &a)| (fk * 1e-9, a))
            .collect();
        if fit.len() < 3 {
            return Err(DeembedError::InvalidParameter(format!(
                "bandwidth limit {bandwidth_limit} Hz leaves {} points for the loss fit",
                fit.len()
            )));
        }
        let a = Array2::from_shape_fn((fit.len(), 3), |(i, j)| {
            let x = fit[i].0;
            match j {
                0 => x.sqrt(),
                1 => x,
                _ => x * x,
            }
        });
        let b = Array1::from_iter(fit.iter().map(|&(_, y)| y));
        let fitted = lstsq(&a, &b)?;
        debug!(points = fit.len(), condition = fitted.condition, "attenuation fit");
        let coeffs = fitted.solution;
        alpha = f
            .iter()
            .map(|&fk| {
                let x = fk * 1e-9;
                coeffs[0] * x.sqrt() + coeffs[1] * x + coeffs[2] * x * x
            })
            .collect();
    }

    Ok(alpha
        .into_iter()
        .zip(beta)
        .map(|(a, b)| Complex64::new(a, b))
        .collect())
}

/// Mean TDR impedance over centred samples `window.0..=window.1`
///
/// The unknown DC value of the reflection is chosen so the step response is
/// zero half a record before the launch.
fn fixture_impedance(
    reflection: &[Complex64],
    filter: &[Complex64],
    z0: f64,
    window: (usize, usize),
) -> Result<f64> {
    let n = reflection.len();
    let filtered: Vec<Complex64> = reflection.iter().zip(filter).map(|(r, h)| r * h).collect();
    let step_for = |dc: f64| step_response(&impulse_response(Complex64::new(dc, 0.0), &filtered));

    let anchor = n / 2;
    let base = step_for(0.0);
    let slope = step_for(1.0)[anchor] - base[anchor];
    let step = step_for(-base[anchor] / slope);

    let (start, end) = window;
    if end >= step.len() {
        return Err(DeembedError::InvalidParameter(
            "impedance window extends past the TDR record".into(),
        ));
    }
    let samples = &step[start..=end];
    let z = samples
        .iter()
        .map(|rho| z0 * (1.0 + rho) / (1.0 - rho))
        .sum::<f64>()
        / samples.len() as f64;
    Ok(z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frequency::{FrequencyUnit, SweepType};
    use approx::assert_relative_eq;

    fn grid(n: usize, df: f64) -> Vec<f64> {
        (1..=n).map(|k| k as f64 * df).collect()
    }

    #[test]
    fn test_transmission_delay() {
        let f = grid(100, 100e6);
        let s21: Vec<Complex64> = f
            .iter()
            .map(|&fk| Complex64::from_polar(0.9, -2.0 * PI * fk * 0.37e-9))
            .collect();
        assert_relative_eq!(transmission_delay(&s21, f[99]), 0.37e-9, epsilon = 1e-15);
    }

    #[test]
    fn test_propagation_constant_fit() {
        let f = grid(100, 100e6);
        let loss = |fk: f64| 0.02 * (fk * 1e-9).sqrt() + 0.005 * fk * 1e-9;
        let s = Array3::from_shape_fn((100, 2, 2), |(k, i, j)| {
            if i == j {
                Complex64::new(0.0, 0.0)
            } else {
                Complex64::from_polar((-loss(f[k])).exp(), -2.0 * PI * f[k] * 0.5e-9)
            }
        });

        let gamma = propagation_constant(&s, &f, 5e9).unwrap();
        for (k, g) in gamma.iter().enumerate() {
            assert_relative_eq!(g.re, loss(f[k]), epsilon = 1e-9);
            assert_relative_eq!(g.im, 2.0 * PI * f[k] * 0.5e-9, epsilon = 1e-9);
        }

        assert!(matches!(
            propagation_constant(&s, &f, 150e6),
            Err(DeembedError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_tdr_of_mismatched_load() {
        // A 75 Ohm load behind 20 samples of matched 50 Ohm line
        let n = 256;
        let f = grid(n, 50e6);
        let dt = 1.0 / (2.0 * f[n - 1]);
        let rho = 0.2;
        let reflection: Vec<Complex64> = f
            .iter()
            .map(|&fk| Complex64::from_polar(rho, -2.0 * PI * fk * 20.0 * dt))
            .collect();
        let filter = com_receiver_filter(&f, f[n - 1] / 2.0);

        let before = fixture_impedance(&reflection, &filter, 50.0, (n + 5, n + 10)).unwrap();
        let after = fixture_impedance(&reflection, &filter, 50.0, (n + 40, n + 50)).unwrap();
        assert_relative_eq!(before, 50.0, epsilon = 0.5);
        assert_relative_eq!(after, 75.0, epsilon = 1.0);
    }

    #[test]
    fn test_delay_outer_ports() {
        let f = grid(4, 1e9);
        let s = Array3::from_elem((4, 2, 2), Complex64::new(0.5, 0.0));
        let out = delay_outer_ports(&s, &f, 0.125e-9);
        // 2 * 360 * 1 GHz * 0.125 ns = 90 degrees at the first point
        assert_relative_eq!(out[[0, 1, 0]].im, -0.5, epsilon = 1e-12);
        assert_relative_eq!(out[[0, 0, 0]].re, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_options_builder() {
        let opts = ZcOptions::default()
            .with_bandwidth_limit(10e9)
            .with_pullback(2, 3)
            .with_leadin(1)
            .with_nrp(true);
        assert_eq!(opts.pullback1, 2);
        assert_eq!(opts.pullback2, 3);
        assert_eq!(opts.leadin, 1);
        assert!(opts.nrp_enable);
        assert_eq!(opts.z0, 50.0);
        assert!(ZcOptions::default().with_bandwidth_limit(-1.0).validate().is_err());
    }

    #[test]
    fn test_rejects_log_grid() {
        let freq = Frequency::new(0.1, 10.0, 50, FrequencyUnit::GHz, SweepType::Log);
        let s = Array3::from_elem((50, 2, 2), Complex64::new(0.1, 0.0));
        let ntwk = Network::with_z0(freq, s, 50.0).unwrap();
        assert!(matches!(
            Ieeep370ZcTwoXThru::new(&ntwk, &ntwk),
            Err(DeembedError::NotImplemented(_))
        ));
    }
}
