pub mod analyzer;
pub mod filter;

pub use analyzer::{rms, SpectralAnalyzer};
pub use filter::BandpassFilter;
