//! Network operations
//!
//! Provides cascade, inversion, port flipping and single-point selection.

use ndarray::{s, Array1, Array3};
use num_complex::Complex64;

use super::core::Network;
use crate::constants::{FREQ_TOL_HZ, NEAR_ZERO};
use crate::error::{DeembedError, Result};
use crate::frequency::parse_label;
use crate::math::transforms::{a2s, cascade_s, inverse_s, map_sweep, s2a};
use crate::math::Mat2;

impl Network {
    /// Cascade with another network (self ** other)
    ///
    /// Connects port 2 of self to port 1 of other. Both networks must share
    /// the same frequency grid.
    pub fn cascade(&self, other: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(&other.frequency, FREQ_TOL_HZ)?;

        let s = map_sweep(&self.s, "cascade", |f, a| {
            let b = Mat2::from_sweep(&other.s, f);
            cascade_s(a, &b, NEAR_ZERO)
        })?;

        let z0 = Array1::from_vec(vec![self.z0[0], other.z0[1]]);
        Network::new(self.frequency.clone(), s, z0)
    }

    /// Inverse network for de-embedding
    ///
    /// The inverse is defined such that `self.cascade(&self.inv()?)` is an
    /// ideal thru. Computed through T-parameters.
    pub fn inv(&self) -> Result<Network> {
        let s = map_sweep(&self.s, "network inverse", |_, m| inverse_s(m, NEAR_ZERO))?;
        let z0 = Array1::from_vec(vec![self.z0[1], self.z0[0]]);
        Network::new(self.frequency.clone(), s, z0)
    }

    /// Flip the ports (swap port 1 and port 2)
    pub fn flipped(&self) -> Network {
        let nfreq = self.nfreq();
        let mut s_flipped = Array3::<Complex64>::zeros((nfreq, 2, 2));

        for f in 0..nfreq {
            // Swap indices: new[i,j] = old[1-i, 1-j]
            s_flipped[[f, 0, 0]] = self.s[[f, 1, 1]];
            s_flipped[[f, 0, 1]] = self.s[[f, 1, 0]];
            s_flipped[[f, 1, 0]] = self.s[[f, 0, 1]];
            s_flipped[[f, 1, 1]] = self.s[[f, 0, 0]];
        }

        Network {
            frequency: self.frequency.clone(),
            s: s_flipped,
            z0: Array1::from_vec(vec![self.z0[1], self.z0[0]]),
            name: self.name.clone(),
        }
    }

    /// Copy with new S-parameter data on the same grid
    pub fn with_s(&self, s: Array3<Complex64>) -> Result<Network> {
        let mut out = Network::new(self.frequency.clone(), s, self.z0.clone())?;
        out.name = self.name.clone();
        Ok(out)
    }

    /// Same network with both ports referenced to the real impedance `z0`
    ///
    /// Goes through ABCD parameters, which exist for thru-like networks
    /// whose Z and Y parameters do not.
    pub fn renormalized(&self, z0: f64) -> Result<Network> {
        let old = self.z0_pair();
        let new_z0 = [Complex64::new(z0, 0.0); 2];
        if old == new_z0 {
            return Ok(self.clone());
        }
        let s = map_sweep(&self.s, "renormalization", |_, m| {
            a2s(&s2a(m, &old, NEAR_ZERO)?, &new_z0, NEAR_ZERO)
        })?;
        let mut out = Network::new(self.frequency.clone(), s, Array1::from_elem(2, new_z0[0]))?;
        out.name = self.name.clone();
        Ok(out)
    }

    /// Single-point network at sweep index `idx`
    pub fn point(&self, idx: usize) -> Result<Network> {
        let frequency = self.frequency.point(idx).ok_or_else(|| {
            DeembedError::InvalidParameter(format!(
                "index {idx} outside a sweep of {} points",
                self.nfreq()
            ))
        })?;
        let s = self.s.slice(s![idx..idx + 1, .., ..]).to_owned();
        let mut out = Network::new(frequency, s, self.z0.clone())?;
        out.name = self.name.clone();
        Ok(out)
    }

    /// Single-point network at `hz`, which must lie on the grid
    pub fn at_frequency(&self, hz: f64) -> Result<Network> {
        let idx = self
            .frequency
            .nearest_index(hz)
            .filter(|&i| (self.f()[i] - hz).abs() <= FREQ_TOL_HZ.max(hz * 1e-12))
            .ok_or_else(|| {
                DeembedError::InvalidParameter(format!("{hz} Hz is not a point of the sweep"))
            })?;
        self.point(idx)
    }

    /// Single-point network selected by a label such as `"10GHz"`
    pub fn at_label(&self, label: &str) -> Result<Network> {
        self.at_frequency(parse_label(label)?)
    }
}
