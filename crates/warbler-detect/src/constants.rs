//! Capture and detection defaults.

/// Capture buffer size (samples per block)
pub const BLOCK_SIZE_SAMPLES: usize = 1024;

/// Sampling rate for the whole pipeline (Hz)
pub const SAMPLE_RATE_HZ: u32 = 44_100;

/// Mono capture only
pub const CHANNELS_MONO: u16 = 1;

/// 16-bit signed samples
pub const SAMPLE_WIDTH_BYTES: u16 = 2;

/// Bird-call frequency band (Hz)
pub const MIN_FREQUENCY_HZ: f32 = 1_000.0;
pub const MAX_FREQUENCY_HZ: f32 = 10_000.0;

/// RMS amplitude a block must exceed to qualify as a call
/// (raw i16 sample units, not normalized)
pub const AMPLITUDE_THRESHOLD: f32 = 1_000.0;

/// Blocks below this RMS are noise floor and skipped outright
pub const SILENCE_RMS_THRESHOLD: f32 = 0.01;

/// Seconds without a qualifying block before an episode is closed
pub const MAX_SILENCE_SECS: u64 = 30;

/// Block duration in milliseconds (derived constant)
pub const BLOCK_DURATION_MS: f32 = (BLOCK_SIZE_SAMPLES as f32 * 1000.0) / SAMPLE_RATE_HZ as f32;
