use crate::types::BlockAnalysis;

/// Seam between the DSP layer and the episode state machine.
///
/// The tracker only sees [`BlockAnalysis`] values, so its transition
/// logic can be exercised with a scripted analyzer while the spectral
/// implementation is tested separately against synthesized tones.
pub trait BlockAnalyzer {
    fn analyze(&mut self, samples: &[i16]) -> BlockAnalysis;
}
