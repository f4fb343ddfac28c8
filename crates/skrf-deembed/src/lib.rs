//! skrf-deembed: two-port de-embedding for RF/microwave measurements
//!
//! Removes the electrical contribution of test fixtures (pads, lines,
//! launches) from measured two-port S-parameters, using dummy structures
//! measured on the same frequency grid.
//!
//! ## Modules
//!
//! - `frequency` - Frequency grid representation
//! - `math` - 2x2 matrix algebra, S/Z/Y/ABCD/T conversions, FFT helpers
//! - `network` - Two-port network representation
//! - `deembedding` - Fixture-removal algorithms behind the [`Deembedding`] trait
//!
//! ## Example
//!
//! ```no_run
//! use skrf_deembed::{Deembedding, Network, OpenShort};
//! # fn run(open: &Network, short: &Network, raw: &Network) -> skrf_deembed::error::Result<()> {
//! let dm = OpenShort::new(open, short)?;
//! let dut = dm.deembed(raw)?;
//! # Ok(())
//! # }
//! ```

pub mod constants;
pub mod deembedding;
pub mod error;
pub mod frequency;
pub mod math;
pub mod network;

pub use constants::Tolerances;
pub use deembedding::{
    AdmittanceCancel, Deembedding, Ieeep370NzcTwoXThru, Ieeep370ZcTwoXThru, ImpedanceCancel,
    NzcOptions, Open, OpenShort, Short, ShortOpen, SplitPi, SplitTee, ZcOptions,
};
pub use error::{DeembedError, Result};
pub use frequency::Frequency;
pub use network::Network;
