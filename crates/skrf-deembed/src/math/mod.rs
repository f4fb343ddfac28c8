//! Mathematical functions module
//!
//! Two-port algebra, unit conversions and the signal-processing helpers used
//! by the fixture extraction algorithms.

pub mod conversions;
pub mod linalg;
pub mod matrix_ops;
pub mod time_domain;
pub mod transforms;

pub use conversions::*;
pub use matrix_ops::Mat2;
pub use transforms::*;
