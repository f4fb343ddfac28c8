//! Numerical constants for de-embedding
//!
//! Provides the default tolerance values. Algorithms never read these
//! directly; they carry a [`Tolerances`] value that starts from them.

/// Default singular threshold: a 2x2 determinant this small relative to its
/// products, or a pivot this small in magnitude, is treated as zero.
pub const NEAR_ZERO: f64 = 1e-15;

/// Default absolute tolerance (Hz) when comparing two frequency grids.
pub const FREQ_TOL_HZ: f64 = 1e-4;

/// Relative tolerance on the step size when checking that a sweep is uniform.
pub const UNIFORM_GRID_RTOL: f64 = 1e-6;

/// Default system reference impedance (Ohm).
pub const DEFAULT_Z0: f64 = 50.0;

/// Tolerances used by the algebra layer and the frequency checks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerances {
    /// Singular-matrix threshold, relative for determinants
    /// and absolute for single pivots
    pub singular: f64,
    /// Absolute frequency-grid match tolerance (Hz)
    pub frequency: f64,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            singular: NEAR_ZERO,
            frequency: FREQ_TOL_HZ,
        }
    }
}
