//! Error types for de-embedding
//!
//! Every failure is local and synchronous: callers fix their inputs and call again.

use thiserror::Error;

/// De-embedding errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DeembedError {
    /// Two networks combined in one operation sit on different frequency grids
    #[error("frequency grids do not match: expected {expected} points, found {found} (or values differ)")]
    FrequencyMismatch { expected: usize, found: usize },

    /// A conversion or inversion hit a singular matrix at a sweep point
    #[error("singular matrix in {context} at frequency index {index}")]
    SingularMatrix { index: usize, context: &'static str },

    /// The input is valid but the algorithm does not handle it (e.g. non-uniform sweeps)
    #[error("not implemented: {0}")]
    NotImplemented(String),

    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

pub type Result<T> = std::result::Result<T, DeembedError>;
