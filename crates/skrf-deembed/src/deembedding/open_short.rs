//! Open and short dummy de-embedding
//!
//! Pad-style fixtures are modelled as shunt admittances (removed with an open
//! dummy) and series impedances (removed with a short dummy). The two-step
//! variants differ only in which element sits closest to the probe ports.

use ndarray::Array3;
use num_complex::Complex64;

use super::{common_frequency, remove_series, remove_shunt, Deembedding};
use crate::constants::Tolerances;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::transforms::{map_sweep, s2y, s2z};
use crate::math::Mat2;
use crate::network::Network;

fn y_params(ntwk: &Network, tol: &Tolerances) -> Result<Array3<Complex64>> {
    let z0 = ntwk.z0_pair();
    map_sweep(ntwk.s(), "S to Y conversion", |_, s| s2y(s, &z0, tol.singular))
}

fn z_params(ntwk: &Network, tol: &Tolerances) -> Result<Array3<Complex64>> {
    let z0 = ntwk.z0_pair();
    map_sweep(ntwk.s(), "S to Z conversion", |_, s| s2z(s, &z0, tol.singular))
}

/// Removes the shunt admittance measured on an open dummy
///
/// `dut = y2s(Y_raw - Y_open)`
#[derive(Debug, Clone)]
pub struct Open {
    frequency: Frequency,
    y_open: Array3<Complex64>,
    tolerances: Tolerances,
}

impl Open {
    pub fn new(open: &Network) -> Result<Self> {
        Self::with_tolerances(open, Tolerances::default())
    }

    pub fn with_tolerances(open: &Network, tolerances: Tolerances) -> Result<Self> {
        Ok(Self {
            frequency: open.frequency().clone(),
            y_open: y_params(open, &tolerances)?,
            tolerances,
        })
    }
}

impl Deembedding for Open {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        remove_shunt(raw, &self.y_open, &self.tolerances)
    }
}

/// Removes the series impedance measured on a short dummy
///
/// `dut = z2s(Z_raw - Z_short)`
#[derive(Debug, Clone)]
pub struct Short {
    frequency: Frequency,
    z_short: Array3<Complex64>,
    tolerances: Tolerances,
}

impl Short {
    pub fn new(short: &Network) -> Result<Self> {
        Self::with_tolerances(short, Tolerances::default())
    }

    pub fn with_tolerances(short: &Network, tolerances: Tolerances) -> Result<Self> {
        Ok(Self {
            frequency: short.frequency().clone(),
            z_short: z_params(short, &tolerances)?,
            tolerances,
        })
    }
}

impl Deembedding for Short {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        remove_series(raw, &self.z_short, &self.tolerances)
    }
}

/// Open then short: shunt pads at the probe ports, series lines behind them
///
/// The short dummy still carries the pad admittance, so the series part is
/// `Z_sc = (Y_short - Y_open)^-1`.
#[derive(Debug, Clone)]
pub struct OpenShort {
    frequency: Frequency,
    y_open: Array3<Complex64>,
    z_series: Array3<Complex64>,
    tolerances: Tolerances,
}

impl OpenShort {
    pub fn new(open: &Network, short: &Network) -> Result<Self> {
        Self::with_tolerances(open, short, Tolerances::default())
    }

    pub fn with_tolerances(open: &Network, short: &Network, tolerances: Tolerances) -> Result<Self> {
        let frequency = common_frequency(&[open, short], &tolerances)?;
        let y_open = y_params(open, &tolerances)?;
        let y_short = y_params(short, &tolerances)?;

        let z_series = map_sweep(&y_short, "short dummy correction", |f, ys| {
            (*ys - Mat2::from_sweep(&y_open, f)).inverse(tolerances.singular)
        })?;

        Ok(Self {
            frequency,
            y_open,
            z_series,
            tolerances,
        })
    }
}

impl Deembedding for OpenShort {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        let without_pads = remove_shunt(raw, &self.y_open, &self.tolerances)?;
        remove_series(&without_pads, &self.z_series, &self.tolerances)
    }
}

/// Short then open: series lines at the probe ports, shunt pads behind them
///
/// The open dummy still carries the series impedance, so the shunt part is
/// `Y_oc = (Z_open - Z_short)^-1`.
#[derive(Debug, Clone)]
pub struct ShortOpen {
    frequency: Frequency,
    z_short: Array3<Complex64>,
    y_shunt: Array3<Complex64>,
    tolerances: Tolerances,
}

impl ShortOpen {
    pub fn new(short: &Network, open: &Network) -> Result<Self> {
        Self::with_tolerances(short, open, Tolerances::default())
    }

    pub fn with_tolerances(short: &Network, open: &Network, tolerances: Tolerances) -> Result<Self> {
        let frequency = common_frequency(&[short, open], &tolerances)?;
        let z_short = z_params(short, &tolerances)?;
        let z_open = z_params(open, &tolerances)?;

        let y_shunt = map_sweep(&z_open, "open dummy correction", |f, zo| {
            (*zo - Mat2::from_sweep(&z_short, f)).inverse(tolerances.singular)
        })?;

        Ok(Self {
            frequency,
            z_short,
            y_shunt,
            tolerances,
        })
    }
}

impl Deembedding for ShortOpen {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        let without_lines = remove_series(raw, &self.z_short, &self.tolerances)?;
        remove_shunt(&without_lines, &self.y_shunt, &self.tolerances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeembedError;
    use crate::frequency::{FrequencyUnit, SweepType};
    use crate::math::transforms::{a2s, abcd_series, abcd_shunt};
    use approx::assert_relative_eq;

    fn c(re: f64, im: f64) -> Complex64 {
        Complex64::new(re, im)
    }

    fn from_abcd(freq: &Frequency, a: Mat2) -> Network {
        let z0 = [c(50.0, 0.0), c(50.0, 0.0)];
        let s = a2s(&a, &z0, 1e-15).unwrap();
        let arr = Array3::from_shape_fn((freq.npoints(), 2, 2), |(_, i, j)| s.get(i, j));
        Network::with_z0(freq.clone(), arr, 50.0).unwrap()
    }

    /// Open dummy: the same pad admittance `y` at each port, ports isolated
    fn open_dummy(freq: &Frequency, y: Complex64) -> Network {
        let z0 = [c(50.0, 0.0); 2];
        let s = crate::math::transforms::y2s(&Mat2::diag(y, y), &z0, 1e-15).unwrap();
        let arr = Array3::from_shape_fn((freq.npoints(), 2, 2), |(_, i, j)| s.get(i, j));
        Network::with_z0(freq.clone(), arr, 50.0).unwrap()
    }

    fn freq(n: usize) -> Frequency {
        Frequency::new(1.0, 2.0, n, FrequencyUnit::GHz, SweepType::Linear)
    }

    #[test]
    fn test_open_removes_pad() {
        let f = freq(2);
        let pad = abcd_shunt(c(0.0, 2e-3));
        let dut = abcd_series(c(10.0, 20.0));

        let open = open_dummy(&f, c(0.0, 2e-3));

        let raw = from_abcd(&f, pad * dut * pad);
        let out = Open::new(&open).unwrap().deembed(&raw).unwrap();
        let expected = from_abcd(&f, dut);
        for (a, b) in out.s.iter().zip(expected.s.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_short_removes_series() {
        let f = freq(2);
        let line = abcd_series(c(2.0, 5.0));
        let dut = abcd_shunt(c(0.01, 0.0));

        let z0 = [c(50.0, 0.0); 2];
        let z_short = Mat2::diag(c(2.0, 5.0), c(2.0, 5.0));
        let short_s = crate::math::transforms::z2s(&z_short, &z0, 1e-15).unwrap();
        let short_arr = Array3::from_shape_fn((2, 2, 2), |(_, i, j)| short_s.get(i, j));
        let short = Network::with_z0(f.clone(), short_arr, 50.0).unwrap();

        let raw = from_abcd(&f, line * dut * line);
        let out = Short::new(&short).unwrap().deembed(&raw).unwrap();
        // A lone shunt 10 mS element: every Z entry is 100 Ohm
        let z = out.z().unwrap();
        assert_relative_eq!(z[[0, 0, 0]].re, 100.0, epsilon = 1e-9);
        assert_relative_eq!(z[[0, 1, 0]].re, 100.0, epsilon = 1e-9);
        assert!(z[[0, 1, 1]].im.abs() < 1e-9);
    }

    #[test]
    fn test_small_admittance_difference_is_not_singular() {
        // 100 MOhm behind the pads: Y_short - Y_open has |det| = 1e-16
        let f = freq(2);
        let open = open_dummy(&f, c(0.0, 2e-3));
        let short = open_dummy(&f, c(1e-8, 2e-3));

        let dm = OpenShort::new(&open, &short).unwrap();
        assert_relative_eq!(dm.z_series[[0, 0, 0]].re, 1e8, max_relative = 1e-6);
        assert!(dm.z_series[[0, 0, 0]].im.abs() < 1e2);
    }

    #[test]
    fn test_mismatched_dummies_rejected() {
        let open = open_dummy(&freq(3), c(0.0, 1e-3));
        let short = from_abcd(&freq(4), abcd_series(c(1.0, 0.0)));
        assert!(matches!(
            OpenShort::new(&open, &short),
            Err(DeembedError::FrequencyMismatch { .. })
        ));
        assert!(matches!(
            ShortOpen::new(&short, &open),
            Err(DeembedError::FrequencyMismatch { .. })
        ));
    }

    #[test]
    fn test_raw_on_other_grid_rejected() {
        let open = Open::new(&open_dummy(&freq(3), c(0.0, 1e-3))).unwrap();
        let raw = from_abcd(&freq(5), abcd_series(c(1.0, 0.0)));
        assert!(matches!(
            open.deembed(&raw),
            Err(DeembedError::FrequencyMismatch {
                expected: 3,
                found: 5
            })
        ));
    }
}
