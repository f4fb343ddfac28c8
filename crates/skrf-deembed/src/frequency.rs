//! Frequency module - represents a frequency sweep
//!
//! The grid is the identity key of every de-embedding operation: two
//! networks are only ever combined when their grids match.

use std::str::FromStr;

use crate::error::{DeembedError, Result};

/// Frequency unit enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencyUnit {
    Hz,
    KHz,
    MHz,
    #[default]
    GHz,
    THz,
}

impl FrequencyUnit {
    /// Get the multiplier to convert to Hz
    pub fn multiplier(&self) -> f64 {
        match self {
            FrequencyUnit::Hz => 1.0,
            FrequencyUnit::KHz => 1e3,
            FrequencyUnit::MHz => 1e6,
            FrequencyUnit::GHz => 1e9,
            FrequencyUnit::THz => 1e12,
        }
    }
}

impl FromStr for FrequencyUnit {
    type Err = DeembedError;

    /// Parse from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hz" => Ok(FrequencyUnit::Hz),
            "khz" => Ok(FrequencyUnit::KHz),
            "mhz" => Ok(FrequencyUnit::MHz),
            "ghz" => Ok(FrequencyUnit::GHz),
            "thz" => Ok(FrequencyUnit::THz),
            other => Err(DeembedError::InvalidParameter(format!(
                "unknown frequency unit '{other}'"
            ))),
        }
    }
}

/// Sweep type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SweepType {
    #[default]
    Linear,
    Log,
}

/// A frequency sweep
#[derive(Debug, Clone, PartialEq)]
pub struct Frequency {
    /// Frequency vector in Hz
    f: Vec<f64>,
    /// Display unit
    unit: FrequencyUnit,
    /// Sweep type the grid was generated with
    sweep_type: SweepType,
}

impl Frequency {
    /// Create a new Frequency with start/stop/npoints
    ///
    /// # Arguments
    /// * `start` - Start frequency in the specified unit
    /// * `stop` - Stop frequency in the specified unit
    /// * `npoints` - Number of frequency points
    /// * `unit` - Frequency unit
    /// * `sweep_type` - Linear or logarithmic sweep
    ///
    /// # Example
    /// ```
    /// use skrf_deembed::frequency::{Frequency, FrequencyUnit, SweepType};
    /// let freq = Frequency::new(1.0, 10.0, 10, FrequencyUnit::GHz, SweepType::Linear);
    /// assert_eq!(freq.npoints(), 10);
    /// ```
    pub fn new(
        start: f64,
        stop: f64,
        npoints: usize,
        unit: FrequencyUnit,
        sweep_type: SweepType,
    ) -> Self {
        let mult = unit.multiplier();
        let start_hz = start * mult;
        let stop_hz = stop * mult;

        let f = match (npoints, sweep_type) {
            (0, _) => Vec::new(),
            (1, _) => vec![start_hz],
            (_, SweepType::Linear) => {
                let step = (stop_hz - start_hz) / (npoints - 1) as f64;
                (0..npoints).map(|i| start_hz + i as f64 * step).collect()
            }
            (_, SweepType::Log) => {
                let log_start = start_hz.ln();
                let log_step = (stop_hz.ln() - log_start) / (npoints - 1) as f64;
                (0..npoints)
                    .map(|i| (log_start + i as f64 * log_step).exp())
                    .collect()
            }
        };

        Self {
            f,
            unit,
            sweep_type,
        }
    }

    /// Create from a frequency vector given in `unit`
    pub fn from_f(f: Vec<f64>, unit: FrequencyUnit) -> Self {
        let mult = unit.multiplier();
        Self {
            f: f.iter().map(|&x| x * mult).collect(),
            unit,
            sweep_type: SweepType::Linear,
        }
    }

    /// Get frequency vector in Hz
    #[inline]
    pub fn f(&self) -> &[f64] {
        &self.f
    }

    /// Get frequency vector in the display unit
    pub fn f_scaled(&self) -> Vec<f64> {
        let mult = self.unit.multiplier();
        self.f.iter().map(|&x| x / mult).collect()
    }

    /// Get the number of frequency points
    #[inline]
    pub fn npoints(&self) -> usize {
        self.f.len()
    }

    /// Get the start frequency in Hz
    #[inline]
    pub fn start(&self) -> f64 {
        *self.f.first().unwrap_or(&0.0)
    }

    /// Get the stop frequency in Hz
    #[inline]
    pub fn stop(&self) -> f64 {
        *self.f.last().unwrap_or(&0.0)
    }

    /// Get the display unit
    #[inline]
    pub fn unit(&self) -> FrequencyUnit {
        self.unit
    }

    /// Get the sweep type the grid was generated with
    #[inline]
    pub fn sweep_type(&self) -> SweepType {
        self.sweep_type
    }

    /// Spacing between the first two points (Hz), 0 for grids shorter than 2
    pub fn step(&self) -> f64 {
        if self.f.len() < 2 {
            0.0
        } else {
            self.f[1] - self.f[0]
        }
    }

    /// True when two grids have the same length and values within `tol` Hz
    pub fn matches(&self, other: &Frequency, tol: f64) -> bool {
        self.f.len() == other.f.len()
            && self
                .f
                .iter()
                .zip(other.f.iter())
                .all(|(a, b)| (a - b).abs() <= tol)
    }

    /// Fail with [`DeembedError::FrequencyMismatch`] unless the grids match
    pub fn ensure_matches(&self, other: &Frequency, tol: f64) -> Result<()> {
        if self.matches(other, tol) {
            Ok(())
        } else {
            Err(DeembedError::FrequencyMismatch {
                expected: self.npoints(),
                found: other.npoints(),
            })
        }
    }

    /// True when every spacing equals the first one within `rtol * step`
    ///
    /// Judged from the values, not from `sweep_type`.
    pub fn is_uniform(&self, rtol: f64) -> bool {
        let df = self.step();
        if self.f.len() < 2 {
            return true;
        }
        if df <= 0.0 {
            return false;
        }
        self.f
            .windows(2)
            .all(|w| ((w[1] - w[0]) - df).abs() <= rtol * df)
    }

    /// Index of the point closest to `hz`
    pub fn nearest_index(&self, hz: f64) -> Option<usize> {
        self.f
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - hz).abs().total_cmp(&(*b - hz).abs()))
            .map(|(i, _)| i)
    }

    /// A grid holding the points from `first` onwards
    pub fn tail(&self, first: usize) -> Frequency {
        Frequency {
            f: self.f.iter().skip(first).copied().collect(),
            unit: self.unit,
            sweep_type: self.sweep_type,
        }
    }

    /// A single-point grid at index `idx`
    pub fn point(&self, idx: usize) -> Option<Frequency> {
        self.f.get(idx).map(|&hz| Frequency {
            f: vec![hz],
            unit: self.unit,
            sweep_type: self.sweep_type,
        })
    }
}

/// Parse a frequency label such as `"10GHz"` or `"250 MHz"` into Hz
pub fn parse_label(label: &str) -> Result<f64> {
    let label = label.trim();
    let split = label
        .find(|c: char| c.is_ascii_alphabetic())
        .ok_or_else(|| DeembedError::InvalidParameter(format!("missing unit in '{label}'")))?;
    let (value, unit) = label.split_at(split);
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| DeembedError::InvalidParameter(format!("bad frequency value in '{label}'")))?;
    let unit: FrequencyUnit = unit.parse()?;
    Ok(value * unit.multiplier())
}
