pub mod analyzer;
pub mod config;
pub mod constants;
pub mod tracker;
pub mod types;

pub use analyzer::BlockAnalyzer;
pub use config::DetectorConfig;
pub use constants::{BLOCK_SIZE_SAMPLES, CHANNELS_MONO, SAMPLE_RATE_HZ, SAMPLE_WIDTH_BYTES};
pub use tracker::EpisodeTracker;
pub use types::{AudioBlock, BlockAnalysis, DetectorState, Episode, EpisodeEvent};
