//! Thru-only de-embedding by splitting a symmetric lumped model
//!
//! The thru dummy is read as a pi (shunt-series-shunt) or tee
//! (series-shunt-series) network and cut in half. Both halves are assumed to
//! be identical; an asymmetric thru is not detected and biases the result.

use num_complex::Complex64;

use super::{Deembedding, FixtureHalves};
use crate::constants::Tolerances;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::transforms::{map_sweep, s2y, s2z, y2s, z2s};
use crate::math::Mat2;
use crate::network::Network;

const HALF: Complex64 = Complex64::new(0.5, 0.0);

/// Splits a pi-model thru and removes one half from each port
///
/// The left half keeps the port-1 shunt admittance and half the series
/// impedance:
///
/// ```text
/// Y_left = [[(y11 - y21 + y22 - y12)/2,  y21 + y12],
///           [y21 + y12,                 -y21 - y12]]
/// ```
#[derive(Debug, Clone)]
pub struct SplitPi {
    frequency: Frequency,
    halves: FixtureHalves,
    tolerances: Tolerances,
}

impl SplitPi {
    pub fn new(thru: &Network) -> Result<Self> {
        Self::with_tolerances(thru, Tolerances::default())
    }

    pub fn with_tolerances(thru: &Network, tolerances: Tolerances) -> Result<Self> {
        let z0 = thru.z0_pair();
        let left = map_sweep(thru.s(), "pi split", |_, s| {
            let y = s2y(s, &z0, tolerances.singular)?;
            let [[y11, y12], [y21, y22]] = y.0;
            let series = y21 + y12;
            let left_y = Mat2::new((y11 - y21 + y22 - y12) * HALF, series, series, -series);
            y2s(&left_y, &z0, tolerances.singular)
        })?;

        Ok(Self {
            frequency: thru.frequency().clone(),
            halves: FixtureHalves::symmetric(&left, tolerances.singular)?,
            tolerances,
        })
    }
}

impl Deembedding for SplitPi {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        self.halves.remove(raw, self.tolerances.singular)
    }
}

/// Splits a tee-model thru and removes one half from each port
///
/// The left half keeps the port-1 series impedance and half the shunt
/// admittance:
///
/// ```text
/// Z_left = [[(z11 + z21 + z22 + z12)/2, z21 + z12],
///           [z21 + z12,                 z21 + z12]]
/// ```
#[derive(Debug, Clone)]
pub struct SplitTee {
    frequency: Frequency,
    halves: FixtureHalves,
    tolerances: Tolerances,
}

impl SplitTee {
    pub fn new(thru: &Network) -> Result<Self> {
        Self::with_tolerances(thru, Tolerances::default())
    }

    pub fn with_tolerances(thru: &Network, tolerances: Tolerances) -> Result<Self> {
        let z0 = thru.z0_pair();
        let left = map_sweep(thru.s(), "tee split", |_, s| {
            let z = s2z(s, &z0, tolerances.singular)?;
            let [[z11, z12], [z21, z22]] = z.0;
            let shunt = z21 + z12;
            let left_z = Mat2::new((z11 + z21 + z22 + z12) * HALF, shunt, shunt, shunt);
            z2s(&left_z, &z0, tolerances.singular)
        })?;

        Ok(Self {
            frequency: thru.frequency().clone(),
            halves: FixtureHalves::symmetric(&left, tolerances.singular)?,
            tolerances,
        })
    }
}

impl Deembedding for SplitTee {
    fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    fn deembed(&self, raw: &Network) -> Result<Network> {
        self.frequency
            .ensure_matches(raw.frequency(), self.tolerances.frequency)?;
        self.halves.remove(raw, self.tolerances.singular)
    }
}
