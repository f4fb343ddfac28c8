//! Network module - two-port electrical network representation
//!
//! Provides the Network container and the operations the de-embedding
//! algorithms compose: representation conversion, cascade, inverse, flip,
//! point selection and noise injection.

mod core;
mod noise;
mod operators;
mod params;

pub use core::Network;
