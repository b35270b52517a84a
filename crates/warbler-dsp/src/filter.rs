//! Butterworth bandpass filter, designed once at startup.
//!
//! The design path is the classic analog-prototype route: Butterworth
//! lowpass poles, lowpass-to-bandpass transform, bilinear transform to
//! the z-plane, then expand pole/zero form into transfer-function
//! coefficients. Applied per block as a direct-form II transposed IIR
//! with zero initial state.

use rustfft::num_complex::Complex;
use std::f64::consts::{FRAC_PI_2, PI};

/// Sampling rate the normalized design math runs at. The band edges are
/// normalized to Nyquist before prewarping, so the actual stream rate
/// only enters through that normalization.
const DESIGN_FS: f64 = 2.0;

#[derive(Debug, Clone)]
pub struct BandpassFilter {
    b: Vec<f64>,
    a: Vec<f64>,
}

impl BandpassFilter {
    /// Design an `order`-th order Butterworth bandpass with edges
    /// `low_hz`..`high_hz` at `sample_rate_hz`. Coefficients are fully
    /// determined by the parameters; no runtime failure modes.
    pub fn design(order: usize, low_hz: f64, high_hz: f64, sample_rate_hz: f64) -> Self {
        debug_assert!(order > 0);
        debug_assert!(0.0 < low_hz && low_hz < high_hz && high_hz < sample_rate_hz / 2.0);

        let nyquist = sample_rate_hz / 2.0;

        // Prewarp the band edges to analog frequencies.
        let warped_low = 2.0 * DESIGN_FS * (PI * (low_hz / nyquist) / 2.0).tan();
        let warped_high = 2.0 * DESIGN_FS * (PI * (high_hz / nyquist) / 2.0).tan();
        let bandwidth = warped_high - warped_low;
        let center = (warped_low * warped_high).sqrt();

        // Analog Butterworth lowpass prototype: poles evenly spaced on
        // the left half of the unit circle, no finite zeros, unit gain.
        let prototype: Vec<Complex<f64>> = (0..order)
            .map(|k| {
                let theta = FRAC_PI_2 + PI * (2 * k + 1) as f64 / (2 * order) as f64;
                Complex::from_polar(1.0, theta)
            })
            .collect();

        // Lowpass -> bandpass: each prototype pole splits into a pair
        // around the center frequency; `order` zeros appear at s = 0.
        let mut poles = Vec::with_capacity(2 * order);
        for &p in &prototype {
            let scaled = p * (bandwidth / 2.0);
            let offset = (scaled * scaled - center * center).sqrt();
            poles.push(scaled + offset);
            poles.push(scaled - offset);
        }
        let gain = bandwidth.powi(order as i32);

        // Bilinear transform into the z-plane.
        let fs2 = 2.0 * DESIGN_FS;
        let poles_z: Vec<Complex<f64>> = poles.iter().map(|&p| (fs2 + p) / (fs2 - p)).collect();
        // The analog zeros at the origin land on z = 1; the remaining
        // degree shows up as zeros at z = -1.
        let mut zeros_z = vec![Complex::new(1.0, 0.0); order];
        zeros_z.extend(std::iter::repeat(Complex::new(-1.0, 0.0)).take(order));

        let numerator = Complex::new(fs2.powi(order as i32), 0.0);
        let denominator = poles
            .iter()
            .fold(Complex::new(1.0, 0.0), |acc, &p| acc * (fs2 - p));
        let gain_z = gain * (numerator / denominator).re;

        let b = poly(&zeros_z)
            .into_iter()
            .map(|c| c.re * gain_z)
            .collect();
        let a = poly(&poles_z).into_iter().map(|c| c.re).collect();

        Self { b, a }
    }

    /// Filter one block. State is not carried across blocks, matching a
    /// fresh `lfilter` pass per capture buffer.
    pub fn apply(&self, input: &[f32]) -> Vec<f32> {
        let n = self.a.len();
        let mut state = vec![0.0f64; n - 1];
        input
            .iter()
            .map(|&x| {
                let x = x as f64;
                let y = self.b[0] * x + state[0];
                for i in 1..n - 1 {
                    state[i - 1] = self.b[i] * x - self.a[i] * y + state[i];
                }
                state[n - 2] = self.b[n - 1] * x - self.a[n - 1] * y;
                y as f32
            })
            .collect()
    }
}

/// Expand a root list into monic polynomial coefficients.
fn poly(roots: &[Complex<f64>]) -> Vec<Complex<f64>> {
    let mut coeffs = vec![Complex::new(1.0, 0.0)];
    for root in roots {
        coeffs.push(Complex::new(0.0, 0.0));
        for i in (1..coeffs.len()).rev() {
            let carry = coeffs[i - 1] * root;
            coeffs[i] -= carry;
        }
    }
    coeffs
}
