use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use warbler_audio::CaptureConfig;
use warbler_detect::constants::{
    AMPLITUDE_THRESHOLD, BLOCK_SIZE_SAMPLES, MAX_FREQUENCY_HZ, MAX_SILENCE_SECS, MIN_FREQUENCY_HZ,
    SAMPLE_RATE_HZ, SILENCE_RMS_THRESHOLD,
};
use warbler_detect::DetectorConfig;
use warbler_foundation::AppError;

/// Runtime settings. Everything defaults to the tuned constants; an
/// optional `warbler.toml` (or the file named by WARBLER_CONFIG) and
/// WARBLER_* environment variables override individual fields. There
/// are deliberately no command-line flags: the process is start,
/// record, interrupt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Input device name; host default when unset.
    pub device: Option<String>,
    pub block_size_samples: usize,
    pub sample_rate_hz: u32,
    pub min_frequency_hz: f32,
    pub max_frequency_hz: f32,
    pub amplitude_threshold: f32,
    pub silence_rms_threshold: f32,
    pub max_silence_secs: u64,
    /// Where snippets land; created on first write if absent.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            device: None,
            block_size_samples: BLOCK_SIZE_SAMPLES,
            sample_rate_hz: SAMPLE_RATE_HZ,
            min_frequency_hz: MIN_FREQUENCY_HZ,
            max_frequency_hz: MAX_FREQUENCY_HZ,
            amplitude_threshold: AMPLITUDE_THRESHOLD,
            silence_rms_threshold: SILENCE_RMS_THRESHOLD,
            max_silence_secs: MAX_SILENCE_SECS,
            output_dir: PathBuf::from("calls"),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self, AppError> {
        let file = std::env::var("WARBLER_CONFIG").unwrap_or_else(|_| "warbler".to_string());
        let loaded = config::Config::builder()
            .add_source(config::File::with_name(&file).required(false))
            .add_source(config::Environment::with_prefix("WARBLER").try_parsing(true))
            .build()
            .map_err(|e| AppError::Config(e.to_string()))?;
        let settings: Settings = loaded
            .try_deserialize()
            .map_err(|e| AppError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.block_size_samples == 0 {
            return Err(AppError::Config("block_size_samples must be > 0".into()));
        }
        let nyquist = self.sample_rate_hz as f32 / 2.0;
        if !(0.0 < self.min_frequency_hz
            && self.min_frequency_hz < self.max_frequency_hz
            && self.max_frequency_hz < nyquist)
        {
            return Err(AppError::Config(format!(
                "frequency band [{}, {}] must sit inside (0, {})",
                self.min_frequency_hz, self.max_frequency_hz, nyquist
            )));
        }
        Ok(())
    }

    pub fn detector(&self) -> DetectorConfig {
        DetectorConfig {
            min_frequency_hz: self.min_frequency_hz,
            max_frequency_hz: self.max_frequency_hz,
            amplitude_threshold: self.amplitude_threshold,
            silence_rms_threshold: self.silence_rms_threshold,
            max_silence: Duration::from_secs(self.max_silence_secs),
        }
    }

    pub fn capture(&self) -> CaptureConfig {
        CaptureConfig {
            device: self.device.clone(),
            sample_rate_hz: self.sample_rate_hz,
            channels: warbler_detect::constants::CHANNELS_MONO,
        }
    }
}
