//! Single-element cancellation from a thru dummy
//!
//! For fixtures that add only a shunt admittance or only a series impedance
//! at each port. The element is read from the thru's ABCD parameters because
//! a thru has neither finite Y nor finite Z parameters. Both ports are
//! assumed to carry the same element.

use ndarray::Array3;
use num_complex::Complex64;

use super::{remove_series, remove_shunt, Deembedding};
use crate::constants::Tolerances;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::transforms::{map_sweep, s2a};
use crate::math::Mat2;
use crate::network::Network;

const HALF: Complex64 = Complex64::new(0.5, 0.0);

/// Per-port element `pick(ABCD) / 2` placed on both ports of a diagonal matrix
fn half_element(
    thru: &Network,
    context: &'static str,
    pick: impl Fn(&Mat2) -> Complex64,
    tol: f64,
) -> Result<Array3<Complex64>> {
    let z0 = thru.z0_pair();
    map_sweep(thru.s(), context, |_, s| {
        let a = s2a(s, &z0, tol)?;
        let e = pick(&a) * HALF;
        Some(Mat2::diag(e, e))
    })
}

/// Removes a shunt admittance `Yp = C/2` from each port
#[derive(Debug, Clone)]
pub struct AdmittanceCancel {
    frequency: Frequency,
    y_shunt: Array3<Complex64>,
    tolerances: Tolerances,
}

impl AdmittanceCancel {
    pub fn new(thru: &Network) -> Result<Self> {
        Self::with_tolerances(thru, Tolerances::default())
    }

    pub fn with_tolerances(thru: &Network, tolerances: Tolerances) -> Result<Self> {
        Ok(Self {
            frequency: thru.frequency().clone(),
            y_shunt: half_element(thru, "admittance cancel", |a| a.get(1, 0), tolerances.singular)?,
            tolerances,
        })
    }
}

impl Deembedding for AdmittanceCancel {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        remove_shunt(raw, &self.y_shunt, &self.tolerances)
    }
}

/// Removes a series impedance `Zp = B/2` from each port
#[derive(Debug, Clone)]
pub struct ImpedanceCancel {
    frequency: Frequency,
    z_series: Array3<Complex64>,
    tolerances: Tolerances,
}

impl ImpedanceCancel {
    pub fn new(thru: &Network) -> Result<Self> {
        Self::with_tolerances(thru, Tolerances::default())
    }

    pub fn with_tolerances(thru: &Network, tolerances: Tolerances) -> Result<Self> {
        Ok(Self {
            frequency: thru.frequency().clone(),
            z_series: half_element(thru, "impedance cancel", |a| a.get(0, 1), tolerances.singular)?,
            tolerances,
        })
    }
}

impl Deembedding for ImpedanceCancel {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        remove_series(raw, &self.z_series, &self.tolerances)
    }
}
