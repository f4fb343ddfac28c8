//! Measurement noise injection
//!
//! Perturbs S-parameters with Gaussian magnitude and phase noise, the way a
//! VNA trace jitters. Used to check that extraction algorithms stay stable on
//! imperfect data.

use num_complex::Complex64;
use rand::Rng;
use rand_distr::{Distribution, Normal};

use super::core::Network;
use crate::error::{DeembedError, Result};
use crate::math::conversions::degree_2_radian;

impl Network {
    /// Copy of this network with polar noise added to every S-parameter
    ///
    /// Each element gets `|s| + N(0, mag_dev)` and `arg(s) + N(0, phase_dev_deg)`,
    /// drawn independently. Pass a seeded generator for reproducible results.
    ///
    /// # Example
    /// ```
    /// use rand::{rngs::StdRng, SeedableRng};
    /// use skrf_deembed::frequency::{Frequency, FrequencyUnit, SweepType};
    /// use skrf_deembed::Network;
    /// # use ndarray::Array3;
    /// # use num_complex::Complex64;
    /// let freq = Frequency::new(1.0, 2.0, 2, FrequencyUnit::GHz, SweepType::Linear);
    /// let s = Array3::from_elem((2, 2, 2), Complex64::new(0.5, 0.0));
    /// let ntwk = Network::with_z0(freq, s, 50.0).unwrap();
    /// let mut rng = StdRng::seed_from_u64(1);
    /// let noisy = ntwk.add_noise_polar(0.0002, 0.2, &mut rng).unwrap();
    /// assert_eq!(noisy.nfreq(), 2);
    /// ```
    pub fn add_noise_polar<R: Rng + ?Sized>(
        &self,
        mag_dev: f64,
        phase_dev_deg: f64,
        rng: &mut R,
    ) -> Result<Network> {
        let mag_noise = normal(mag_dev, "magnitude")?;
        let phase_noise = normal(phase_dev_deg, "phase")?;

        let s = self.s.map(|v| {
            let mag = v.norm() + mag_noise.sample(rng);
            let phase = v.arg() + degree_2_radian(phase_noise.sample(rng));
            Complex64::from_polar(mag, phase)
        });

        self.with_s(s)
    }
}

fn normal(std_dev: f64, what: &str) -> Result<Normal<f64>> {
    // rand_distr 0.4 accepts negative deviations and mirrors them
    if !(std_dev.is_finite() && std_dev >= 0.0) {
        return Err(DeembedError::InvalidParameter(format!(
            "{what} noise deviation must be finite and non-negative, got {std_dev}"
        )));
    }
    Normal::new(0.0, std_dev).map_err(|e| {
        DeembedError::InvalidParameter(format!("{what} noise deviation {std_dev}: {e}"))
    })
}
