//! Core Network struct and constructors
//!
//! Contains the two-port Network data structure and factory methods for
//! every supported representation.

use ndarray::{Array1, Array3};
use num_complex::Complex64;

use crate::constants::NEAR_ZERO;
use crate::error::{DeembedError, Result};
use crate::frequency::Frequency;
use crate::math::transforms::{a2s, map_sweep, y2s, z2s, RefImpedance};

/// A two-port electrical network
///
/// S-parameters are the stored representation; Z, Y, ABCD and T are derived
/// on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    /// Frequency data
    pub frequency: Frequency,
    /// S-parameter data [nfreq, 2, 2]
    pub s: Array3<Complex64>,
    /// Reference impedance (per port)
    pub z0: Array1<Complex64>,
    /// Network name
    pub name: Option<String>,
}

impl Network {
    /// Create a new Network from S-parameters
    ///
    /// Fails with [`DeembedError::InvalidNetwork`] when the array is not
    /// `[nfreq, 2, 2]` for the given grid, the grid is empty, or `z0` does
    /// not hold two impedances with a positive real part.
    pub fn new(frequency: Frequency, s: Array3<Complex64>, z0: Array1<Complex64>) -> Result<Self> {
        check_shape(&frequency, &s, "S")?;
        if z0.len() != 2 {
            return Err(DeembedError::InvalidNetwork(format!(
                "expected 2 reference impedances, got {}",
                z0.len()
            )));
        }
        if z0.iter().any(|z| !z.is_finite() || z.re <= 0.0) {
            return Err(DeembedError::InvalidNetwork(
                "reference impedance must have a positive real part".into(),
            ));
        }

        Ok(Self {
            frequency,
            s,
            z0,
            name: None,
        })
    }

    /// Same as [`Network::new`] with the same real impedance at both ports
    pub fn with_z0(frequency: Frequency, s: Array3<Complex64>, z0: f64) -> Result<Self> {
        Self::new(frequency, s, Array1::from_elem(2, Complex64::new(z0, 0.0)))
    }

    /// Create from Z-parameters
    pub fn from_z(frequency: Frequency, z: &Array3<Complex64>, z0: Array1<Complex64>) -> Result<Self> {
        check_shape(&frequency, z, "Z")?;
        let pair = ref_pair(&z0)?;
        let s = map_sweep(z, "Z to S conversion", |_, m| z2s(m, &pair, NEAR_ZERO))?;
        Self::new(frequency, s, z0)
    }

    /// Create from Y-parameters
    pub fn from_y(frequency: Frequency, y: &Array3<Complex64>, z0: Array1<Complex64>) -> Result<Self> {
        check_shape(&frequency, y, "Y")?;
        let pair = ref_pair(&z0)?;
        let s = map_sweep(y, "Y to S conversion", |_, m| y2s(m, &pair, NEAR_ZERO))?;
        Self::new(frequency, s, z0)
    }

    /// Create from ABCD parameters
    pub fn from_abcd(
        frequency: Frequency,
        abcd: &Array3<Complex64>,
        z0: Array1<Complex64>,
    ) -> Result<Self> {
        check_shape(&frequency, abcd, "ABCD")?;
        let pair = ref_pair(&z0)?;
        let s = map_sweep(abcd, "ABCD to S conversion", |_, m| a2s(m, &pair, NEAR_ZERO))?;
        Self::new(frequency, s, z0)
    }

    /// Attach a name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Get the number of ports
    #[inline]
    pub fn nports(&self) -> usize {
        self.s.shape()[1]
    }

    /// Get the number of frequency points
    #[inline]
    pub fn nfreq(&self) -> usize {
        self.s.shape()[0]
    }

    /// Reference impedances as a fixed pair
    #[inline]
    pub fn z0_pair(&self) -> RefImpedance {
        [self.z0[0], self.z0[1]]
    }
}

/// Parameter arrays are `[nfreq, 2, 2]` on a non-empty grid
fn check_shape(frequency: &Frequency, params: &Array3<Complex64>, what: &str) -> Result<()> {
    let nfreq = frequency.npoints();
    if nfreq == 0 {
        return Err(DeembedError::InvalidNetwork("empty frequency grid".into()));
    }
    if params.dim() != (nfreq, 2, 2) {
        return Err(DeembedError::InvalidNetwork(format!(
            "expected {what} shape [{nfreq}, 2, 2], got {:?}",
            params.shape()
        )));
    }
    Ok(())
}

fn ref_pair(z0: &Array1<Complex64>) -> Result<RefImpedance> {
    if z0.len() != 2 {
        return Err(DeembedError::InvalidNetwork(format!(
            "expected 2 reference impedances, got {}",
            z0.len()
        )));
    }
    Ok([z0[0], z0[1]])
}
