//! Network parameter representations (S, Z, Y, ABCD, T)
//!
//! Derived representations are computed point by point and fail with
//! [`DeembedError::SingularMatrix`](crate::error::DeembedError) where they
//! do not exist.

use ndarray::{Array1, Array3};
use num_complex::Complex64;

use super::core::Network;
use crate::constants::NEAR_ZERO;
use crate::error::Result;
use crate::frequency::Frequency;
use crate::math::conversions::{complex_2_db, complex_2_degree};
use crate::math::transforms::{map_sweep, s2a, s2t, s2y, s2z};

impl Network {
    /// Get reference impedance
    pub fn z0(&self) -> &Array1<Complex64> {
        &self.z0
    }

    /// Get S-parameters
    pub fn s(&self) -> &Array3<Complex64> {
        &self.s
    }

    /// Get frequency object
    pub fn frequency(&self) -> &Frequency {
        &self.frequency
    }

    /// Get frequency vector in Hz
    pub fn f(&self) -> &[f64] {
        self.frequency.f()
    }

    /// Get Z-parameters (impedance)
    pub fn z(&self) -> Result<Array3<Complex64>> {
        let z0 = self.z0_pair();
        map_sweep(&self.s, "S to Z conversion", |_, s| s2z(s, &z0, NEAR_ZERO))
    }

    /// Get Y-parameters (admittance)
    pub fn y(&self) -> Result<Array3<Complex64>> {
        let z0 = self.z0_pair();
        map_sweep(&self.s, "S to Y conversion", |_, s| s2y(s, &z0, NEAR_ZERO))
    }

    /// Get ABCD parameters (chain/cascade parameters)
    ///
    /// ABCD matrix organization: [[A, B], [C, D]]
    pub fn a(&self) -> Result<Array3<Complex64>> {
        let z0 = self.z0_pair();
        map_sweep(&self.s, "S to ABCD conversion", |_, s| s2a(s, &z0, NEAR_ZERO))
    }

    /// Get T-parameters (scattering transfer)
    pub fn t(&self) -> Result<Array3<Complex64>> {
        map_sweep(&self.s, "S to T conversion", |_, s| s2t(s, NEAR_ZERO))
    }

    /// S-parameter magnitude in dB
    pub fn s_db(&self) -> Array3<f64> {
        self.s.mapv(complex_2_db)
    }

    /// S-parameter phase in degrees
    pub fn s_deg(&self) -> Array3<f64> {
        self.s.mapv(complex_2_degree)
    }
}
