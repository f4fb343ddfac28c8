//! Unit and phase conversion functions
//!
//! Conversions between complex values and their magnitude (dB) and phase
//! representations, plus phase unwrapping for swept data.

use num_complex::Complex64;
use std::f64::consts::PI;

/// Convert complex number to dB (20*log10(|z|))
pub fn complex_2_db(z: Complex64) -> f64 {
    20.0 * z.norm().log10()
}

/// Convert complex number to phase in degrees
pub fn complex_2_degree(z: Complex64) -> f64 {
    z.arg() * 180.0 / PI
}

pub fn degree_2_radian(deg: f64) -> f64 {
    deg * PI / 180.0
}

/// Unwrap a phase sequence in radians
///
/// Adds multiples of 2π so that no two neighbours differ by more than π.
/// The first sample is left untouched.
pub fn unwrap_phase(phase: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(phase.len());
    let mut offset = 0.0;
    for (i, &p) in phase.iter().enumerate() {
        if i > 0 {
            let d = p - phase[i - 1];
            if d > PI {
                offset -= 2.0 * PI * ((d + PI) / (2.0 * PI)).floor();
            } else if d < -PI {
                offset += 2.0 * PI * ((-d + PI) / (2.0 * PI)).floor();
            }
        }
        out.push(p + offset);
    }
    out
}

/// Unwrapped phase of a swept complex quantity, shifted by a multiple of 2π
/// so that its linear extrapolation to DC lies within (-π, π]
///
/// For a causal response sampled at `f0 = df, 2df, ...` this picks the branch
/// whose phase tends to zero at DC.
pub fn unwrap_phase_dc_anchored(values: &[Complex64]) -> Vec<f64> {
    let raw: Vec<f64> = values.iter().map(|v| v.arg()).collect();
    let mut phase = unwrap_phase(&raw);
    if phase.len() >= 2 {
        let dc = 2.0 * phase[0] - phase[1];
        let shift = 2.0 * PI * (dc / (2.0 * PI)).round();
        for p in phase.iter_mut() {
            *p -= shift;
        }
    }
    phase
}
