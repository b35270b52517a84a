use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::constants::{
    AMPLITUDE_THRESHOLD, MAX_FREQUENCY_HZ, MAX_SILENCE_SECS, MIN_FREQUENCY_HZ,
    SILENCE_RMS_THRESHOLD,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Lower edge of the bird-call band (Hz)
    pub min_frequency_hz: f32,
    /// Upper edge of the bird-call band (Hz)
    pub max_frequency_hz: f32,
    /// RMS a block must exceed to qualify (raw i16 units)
    pub amplitude_threshold: f32,
    /// RMS below which a block is noise floor and ignored entirely
    pub silence_rms_threshold: f32,
    /// How long without a qualifying block before the episode closes
    pub max_silence: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_frequency_hz: MIN_FREQUENCY_HZ,
            max_frequency_hz: MAX_FREQUENCY_HZ,
            amplitude_threshold: AMPLITUDE_THRESHOLD,
            silence_rms_threshold: SILENCE_RMS_THRESHOLD,
            max_silence: Duration::from_secs(MAX_SILENCE_SECS),
        }
    }
}

impl DetectorConfig {
    pub fn band_contains(&self, frequency_hz: f32) -> bool {
        frequency_hz >= self.min_frequency_hz && frequency_hz <= self.max_frequency_hz
    }
}
