//! Time-domain transforms for uniformly sampled sweeps
//!
//! A sweep `x_1..x_n` at `f_k = k*df` plus a DC value maps to `2n` real
//! time samples with period `1/(2*f_max)`. After [`fftshift`], sample `n` is
//! t = 0.

use num_complex::Complex64;
use rustfft::FftPlanner;

/// Inverse real FFT of a one-sided spectrum `[DC, x_1, .., x_n]`
///
/// The Nyquist bin is taken as real. Returns `2n` samples.
pub fn irfft(spectrum: &[Complex64]) -> Vec<f64> {
    if spectrum.len() < 2 {
        return spectrum.iter().map(|c| c.re).collect();
    }
    let n = spectrum.len() - 1;
    let len = 2 * n;

    let mut buffer = vec![Complex64::new(0.0, 0.0); len];
    buffer[0] = Complex64::new(spectrum[0].re, 0.0);
    for k in 1..n {
        buffer[k] = spectrum[k];
        buffer[len - k] = spectrum[k].conj();
    }
    buffer[n] = Complex64::new(spectrum[n].re, 0.0);

    let mut planner = FftPlanner::new();
    let plan = planner.plan_fft_inverse(len);
    plan.process(&mut buffer);

    let scale = 1.0 / len as f64;
    buffer.iter().map(|c| c.re * scale).collect()
}

/// Forward FFT of a real signal of even length `2n`, returning bins `0..=n`
pub fn rfft(signal: &[f64]) -> Vec<Complex64> {
    let len = signal.len();
    if len == 0 {
        return vec![];
    }
    let mut buffer: Vec<Complex64> = signal.iter().map(|&x| Complex64::new(x, 0.0)).collect();

    let mut planner = FftPlanner::new();
    let plan = planner.plan_fft_forward(len);
    plan.process(&mut buffer);

    buffer.truncate(len / 2 + 1);
    buffer
}

/// Rotate so that sample 0 moves to the centre
pub fn fftshift(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let half = n / 2;
    (0..n).map(|k| x[(k + n - half) % n]).collect()
}

/// Inverse of [`fftshift`]
pub fn ifftshift(x: &[f64]) -> Vec<f64> {
    let n = x.len();
    let half = n / 2;
    (0..n).map(|k| x[(k + half) % n]).collect()
}

/// Centred impulse response of `[dc, values..]`
pub fn impulse_response(dc: Complex64, values: &[Complex64]) -> Vec<f64> {
    let mut spectrum = Vec::with_capacity(values.len() + 1);
    spectrum.push(dc);
    spectrum.extend_from_slice(values);
    fftshift(&irfft(&spectrum))
}

/// Running sum of an impulse response
pub fn step_response(impulse: &[f64]) -> Vec<f64> {
    impulse
        .iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Index of the largest sample
pub fn argmax(x: &[f64]) -> usize {
    x.iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| {
            if v > bv {
                (i, v)
            } else {
                (bi, bv)
            }
        })
        .0
}

/// Fourth-order receiver filter used for band-limited TDR
///
/// `H(x) = 1 / (1 - 3.414214 x^2 + x^4 + j 2.613126 (x - x^3))`, `x = f / fr`
pub fn com_receiver_filter(f: &[f64], fr: f64) -> Vec<Complex64> {
    f.iter()
        .map(|&fk| {
            let x = fk / fr;
            let x2 = x * x;
            let den = Complex64::new(1.0 - 3.414214 * x2 + x2 * x2, 2.613126 * (x - x * x2));
            Complex64::new(1.0, 0.0) / den
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::PI;

    #[test]
    fn test_fftshift_roundtrip() {
        let x: Vec<f64> = (0..8).map(|k| k as f64).collect();
        let shifted = fftshift(&x);
        assert_eq!(shifted[4], 0.0);
        assert_eq!(shifted[0], 4.0);
        assert_eq!(ifftshift(&shifted), x);
    }

    #[test]
    fn test_irfft_rfft_roundtrip() {
        let n = 16;
        let spectrum: Vec<Complex64> = (0..=n)
            .map(|k| {
                let im = if k == 0 || k == n { 0.0 } else { 0.1 * k as f64 };
                Complex64::new(1.0 / (k as f64 + 1.0), im)
            })
            .collect();

        let x = irfft(&spectrum);
        assert_eq!(x.len(), 2 * n);

        let back = rfft(&x);
        assert_eq!(back.len(), n + 1);
        for (a, b) in back.iter().zip(spectrum.iter()) {
            assert!((a - b).norm() < 1e-12);
        }
    }

    #[test]
    fn test_delay_peaks_at_expected_sample() {
        // Pure delay of 5 samples: e^{-j pi k 5 / n}
        let n = 32;
        let values: Vec<Complex64> = (1..=n)
            .map(|k| Complex64::from_polar(1.0, -PI * k as f64 * 5.0 / n as f64))
            .collect();

        let h = impulse_response(Complex64::new(1.0, 0.0), &values);
        assert_eq!(argmax(&h), n + 5);
        assert_relative_eq!(h[n + 5], 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_step_of_constant_reflection() {
        let n = 32;
        let values = vec![Complex64::new(0.2, 0.0); n];
        let h = impulse_response(Complex64::new(0.2, 0.0), &values);
        let step = step_response(&h);

        assert!(step[n - 1].abs() < 1e-12);
        assert_relative_eq!(step[n], 0.2, epsilon = 1e-12);
        assert_relative_eq!(step[2 * n - 1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn test_com_filter_passes_dc() {
        let h = com_receiver_filter(&[0.0, 1e9, 10e9], 10e9);
        assert_relative_eq!(h[0].re, 1.0, epsilon = 1e-12);
        assert!(h[1].norm() > 0.99);
        assert!(h[2].norm() < 1.0);
    }
}
