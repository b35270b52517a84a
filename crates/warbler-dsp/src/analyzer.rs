use rustfft::num_complex::Complex;
use rustfft::FftPlanner;

use warbler_detect::{BlockAnalysis, BlockAnalyzer};

use crate::filter::BandpassFilter;

/// Matches the classic analog design the detection thresholds were
/// tuned against.
const FILTER_ORDER: usize = 5;

/// RMS amplitude of a block in raw i16 sample units.
///
/// Empty blocks measure 0.0. A non-finite result is flagged and coerced
/// to 0.0 so it can never poison the threshold comparison downstream.
pub fn rms(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: i64 = samples
        .iter()
        .map(|&sample| {
            let s = sample as i64;
            s * s
        })
        .sum();

    let value = (sum_squares as f64 / samples.len() as f64).sqrt();
    if !value.is_finite() {
        tracing::warn!("Non-finite RMS computed, treating block as silent");
        return 0.0;
    }
    value as f32
}

/// Bandpass-then-FFT dominant frequency estimator.
pub struct SpectralAnalyzer {
    sample_rate_hz: u32,
    min_hz: f32,
    max_hz: f32,
    filter: BandpassFilter,
    planner: FftPlanner<f32>,
}

impl SpectralAnalyzer {
    pub fn new(sample_rate_hz: u32, min_hz: f32, max_hz: f32) -> Self {
        let filter = BandpassFilter::design(
            FILTER_ORDER,
            min_hz as f64,
            max_hz as f64,
            sample_rate_hz as f64,
        );
        Self {
            sample_rate_hz,
            min_hz,
            max_hz,
            filter,
            planner: FftPlanner::new(),
        }
    }

    /// Estimate the dominant frequency of one block.
    ///
    /// The block is band-limited, transformed, and the peak magnitude
    /// bin over the non-negative frequencies picked out. The estimate is
    /// only reported when it falls inside the configured band; a peak
    /// outside it means no qualifying tone was present. Numerical
    /// anomalies degrade to "no detection", never a panic.
    pub fn dominant_frequency(&mut self, samples: &[i16]) -> Option<f32> {
        if samples.is_empty() {
            return None;
        }

        let floats: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
        let filtered = self.filter.apply(&floats);

        let n = filtered.len();
        let mut spectrum: Vec<Complex<f32>> =
            filtered.iter().map(|&s| Complex::new(s, 0.0)).collect();
        let fft = self.planner.plan_fft_forward(n);
        fft.process(&mut spectrum);

        // Real input: only the non-negative-frequency half is distinct.
        let bins = n / 2 + 1;
        let mut peak_bin = 0usize;
        let mut peak_magnitude = f32::NEG_INFINITY;
        let mut anomalies = 0usize;
        for (bin, value) in spectrum.iter().take(bins).enumerate() {
            let magnitude = value.norm();
            if !magnitude.is_finite() {
                anomalies += 1;
                continue;
            }
            if magnitude > peak_magnitude {
                peak_magnitude = magnitude;
                peak_bin = bin;
            }
        }
        if anomalies > 0 {
            tracing::warn!(anomalies, "Non-finite FFT magnitudes in block");
        }
        if peak_magnitude == f32::NEG_INFINITY {
            return None;
        }

        let frequency = peak_bin as f32 * self.sample_rate_hz as f32 / n as f32;
        if frequency >= self.min_hz && frequency <= self.max_hz {
            Some(frequency)
        } else {
            None
        }
    }
}

impl BlockAnalyzer for SpectralAnalyzer {
    fn analyze(&mut self, samples: &[i16]) -> BlockAnalysis {
        BlockAnalysis {
            rms: rms(samples),
            dominant_hz: self.dominant_frequency(samples),
        }
    }
}
