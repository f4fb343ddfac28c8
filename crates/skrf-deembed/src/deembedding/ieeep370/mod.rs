//! IEEE P370 2x-thru fixture extraction
//!
//! A 2x-thru is two fixture halves connected back to back. Splitting it in
//! the time domain at the transmission peak yields one side model per half.
//! [`Ieeep370NzcTwoXThru`] stops there; [`Ieeep370ZcTwoXThru`] also corrects
//! each side for the fixture impedance measured on a fixture-dut-fixture.
//!
//! Both need a uniform grid `f_k = k*df`. A leading DC point is dropped.

mod nzc;
mod zc;

use ndarray::{s, Array3};
use num_complex::Complex64;
use tracing::warn;

pub use nzc::{Ieeep370NzcTwoXThru, NzcOptions};
pub use zc::{Ieeep370ZcTwoXThru, ZcOptions};

use crate::constants::{Tolerances, UNIFORM_GRID_RTOL};
use crate::error::{DeembedError, Result};
use crate::network::Network;

/// Validate the grid of an extraction input and reference it to `z0`
///
/// Drops a DC point, then requires at least two points on a uniform grid
/// starting at one step.
pub(crate) fn prepare(ntwk: &Network, z0: f64, tol: &Tolerances) -> Result<Network> {
    let ntwk = if ntwk.f()[0].abs() <= tol.frequency {
        warn!(
            network = ntwk.name.as_deref().unwrap_or("unnamed"),
            "dropping DC point before IEEE P370 extraction"
        );
        drop_first_point(ntwk)?
    } else {
        ntwk.clone()
    };

    let freq = ntwk.frequency();
    if freq.npoints() < 2 {
        return Err(DeembedError::InvalidNetwork(
            "IEEE P370 extraction needs at least two frequency points".into(),
        ));
    }
    if !freq.is_uniform(UNIFORM_GRID_RTOL) {
        return Err(DeembedError::NotImplemented(
            "IEEE P370 extraction on a non-uniform frequency grid".into(),
        ));
    }
    let df = freq.step();
    if (freq.start() - df).abs() > UNIFORM_GRID_RTOL * df {
        return Err(DeembedError::NotImplemented(format!(
            "IEEE P370 extraction on a grid starting at {} Hz with a {} Hz step",
            freq.start(),
            df
        )));
    }

    ntwk.renormalized(z0)
}

fn drop_first_point(ntwk: &Network) -> Result<Network> {
    let s = ntwk.s().slice(s![1.., .., ..]).to_owned();
    let mut out = Network::new(ntwk.frequency().tail(1), s, ntwk.z0().clone())?;
    out.name = ntwk.name.clone();
    Ok(out)
}

/// S_ij across the sweep
pub(crate) fn column(s: &Array3<Complex64>, i: usize, j: usize) -> Vec<Complex64> {
    s.slice(s![.., i, j]).to_vec()
}

/// DC estimate from the two lowest points
///
/// The real part is extended as an even function `a + b*f^2` through
/// `f = df` and `f = 2*df`; the imaginary part of a real impulse response
/// vanishes at DC.
pub(crate) fn dc_extrapolate(values: &[Complex64]) -> Complex64 {
    match values {
        [s0, s1, ..] => Complex64::new((4.0 * s0.re - s1.re) / 3.0, 0.0),
        [s0] => Complex64::new(s0.re, 0.0),
        [] => Complex64::new(0.0, 0.0),
    }
}
