//! De-embedding algorithms
//!
//! Every algorithm captures its reference (dummy) networks at construction,
//! derives what it needs from them once, and then removes the fixture from
//! any number of raw measurements through [`Deembedding::deembed`].
//!
//! | Algorithm | References | Fixture model |
//! |---|---|---|
//! | [`Open`] | open | shunt admittance |
//! | [`Short`] | short | series impedance |
//! | [`OpenShort`] | open, short | shunt pads, then series lines |
//! | [`ShortOpen`] | short, open | series lines, then shunt pads |
//! | [`SplitPi`] | thru | symmetric pi |
//! | [`SplitTee`] | thru | symmetric tee |
//! | [`AdmittanceCancel`] | thru | symmetric shunt admittance |
//! | [`ImpedanceCancel`] | thru | symmetric series impedance |
//! | [`Ieeep370NzcTwoXThru`] | 2x-thru | distributed halves |
//! | [`Ieeep370ZcTwoXThru`] | 2x-thru, fixture-dut-fixture | distributed halves with impedance correction |

mod cancel;
pub mod ieeep370;
mod open_short;
mod split;

use ndarray::Array3;
use num_complex::Complex64;

pub use cancel::{AdmittanceCancel, ImpedanceCancel};
pub use ieeep370::{Ieeep370NzcTwoXThru, Ieeep370ZcTwoXThru, NzcOptions, ZcOptions};
pub use open_short::{Open, OpenShort, Short, ShortOpen};
pub use split::{SplitPi, SplitTee};

use crate::constants::Tolerances;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::transforms::{
    cascade_s, inverse_s, map_sweep, remove_series_impedance, remove_shunt_admittance,
};
use crate::math::Mat2;
use crate::network::Network;

/// A fixture-removal algorithm
///
/// Implementations are immutable after construction, so `deembed` may be
/// called concurrently from several threads.
pub trait Deembedding {
    /// Frequency grid captured from the reference networks
    fn frequency(&self) -> &Frequency;

    /// Remove the fixture from `raw`
    ///
    /// Fails with [`DeembedError::FrequencyMismatch`](crate::error::DeembedError)
    /// unless `raw` sits on [`Deembedding::frequency`].
    fn deembed(&self, raw: &Network) -> Result<Network>;
}

/// Common frequency grid of a set of reference networks
pub(crate) fn common_frequency(dummies: &[&Network], tol: &Tolerances) -> Result<Frequency> {
    let first = dummies[0].frequency();
    for d in &dummies[1..] {
        first.ensure_matches(d.frequency(), tol.frequency)?;
    }
    Ok(first.clone())
}

/// Subtract a per-point shunt admittance matrix from `raw`
pub(crate) fn remove_shunt(raw: &Network, y: &Array3<Complex64>, tol: &Tolerances) -> Result<Network> {
    let z0 = raw.z0_pair();
    let s = map_sweep(raw.s(), "shunt admittance removal", |f, s| {
        remove_shunt_admittance(s, &Mat2::from_sweep(y, f), &z0, tol.singular)
    })?;
    raw.with_s(s)
}

/// Subtract a per-point series impedance matrix from `raw`
pub(crate) fn remove_series(raw: &Network, z: &Array3<Complex64>, tol: &Tolerances) -> Result<Network> {
    let z0 = raw.z0_pair();
    let s = map_sweep(raw.s(), "series impedance removal", |f, s| {
        remove_series_impedance(s, &Mat2::from_sweep(z, f), &z0, tol.singular)
    })?;
    raw.with_s(s)
}

/// Inverses of the two fixture halves surrounding a DUT
///
/// `left` is the half at port 1 and `right` the half at port 2, both in the
/// orientation they have inside the raw measurement.
#[derive(Debug, Clone)]
pub(crate) struct FixtureHalves {
    left_inv: Array3<Complex64>,
    right_inv: Array3<Complex64>,
}

impl FixtureHalves {
    pub(crate) fn new(left: &Array3<Complex64>, right: &Array3<Complex64>, tol: f64) -> Result<Self> {
        Ok(Self {
            left_inv: map_sweep(left, "fixture half inverse", |_, l| inverse_s(l, tol))?,
            right_inv: map_sweep(right, "fixture half inverse", |_, r| inverse_s(r, tol))?,
        })
    }

    /// Halves where the right one is the mirror image of `left`
    pub(crate) fn symmetric(left: &Array3<Complex64>, tol: f64) -> Result<Self> {
        let right = map_sweep(left, "fixture half flip", |_, l| Some(l.flipped()))?;
        Self::new(left, &right, tol)
    }

    /// `left^-1 ** raw ** right^-1`
    pub(crate) fn remove(&self, raw: &Network, tol: f64) -> Result<Network> {
        let s = map_sweep(raw.s(), "fixture removal", |f, s| {
            let inner = cascade_s(&Mat2::from_sweep(&self.left_inv, f), s, tol)?;
            cascade_s(&inner, &Mat2::from_sweep(&self.right_inv, f), tol)
        })?;
        raw.with_s(s)
    }
}
