use std::time::Instant;

use warbler_foundation::SharedClock;

use crate::config::DetectorConfig;
use crate::types::{AudioBlock, BlockAnalysis, DetectorState, Episode, EpisodeEvent};

/// Episode state machine. Consumes one block plus its analysis at a
/// time and decides when a call episode starts, keeps growing, and
/// closes.
///
/// Transition table per block B with analysis A:
/// - A.rms below the silence floor: B is skipped outright. It is not
///   buffered and does not refresh the silence timer, in either state.
/// - qualifying (rms above amplitude threshold, dominant frequency in
///   band): Idle opens a new episode with B; Capturing appends B. Both
///   refresh `last_active`.
/// - non-qualifying while Capturing: B is appended anyway (echo and
///   transition noise belong to the recording), and the episode closes
///   once `max_silence` has elapsed since the last qualifying block.
/// - non-qualifying while Idle: B is dropped.
///
/// Near-silent blocks are dropped from the buffer even while capturing
/// but still count toward the timeout, so a long quiet run trims the
/// gap instead of padding the recording.
pub struct EpisodeTracker {
    state: DetectorState,
    episode: Option<Episode>,
    last_active: Option<Instant>,
    config: DetectorConfig,
    clock: SharedClock,
}

impl EpisodeTracker {
    pub fn new(config: DetectorConfig, clock: SharedClock) -> Self {
        Self {
            state: DetectorState::Idle,
            episode: None,
            last_active: None,
            config,
            clock,
        }
    }

    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Blocks currently buffered in the live episode.
    pub fn buffered_blocks(&self) -> usize {
        self.episode.as_ref().map_or(0, |e| e.len())
    }

    /// Feed one block through the state machine.
    pub fn process(&mut self, block: AudioBlock, analysis: &BlockAnalysis) -> Option<EpisodeEvent> {
        // Noise floor guard runs before anything else.
        if analysis.rms < self.config.silence_rms_threshold {
            return None;
        }

        let qualifying = analysis.rms > self.config.amplitude_threshold
            && analysis
                .dominant_hz
                .is_some_and(|hz| self.config.band_contains(hz));

        match (self.state, qualifying) {
            (DetectorState::Idle, true) => {
                let frequency_hz = analysis.dominant_hz.unwrap_or_default();
                self.state = DetectorState::Capturing;
                self.episode = Some(Episode::starting_with(block));
                self.last_active = Some(self.clock.now());
                Some(EpisodeEvent::CallStarted {
                    frequency_hz,
                    rms: analysis.rms,
                })
            }
            (DetectorState::Capturing, true) => {
                if let Some(episode) = self.episode.as_mut() {
                    episode.push(block);
                }
                self.last_active = Some(self.clock.now());
                None
            }
            (DetectorState::Capturing, false) => {
                if let Some(episode) = self.episode.as_mut() {
                    episode.push(block);
                }
                let timed_out = self
                    .last_active
                    .is_some_and(|t| self.clock.now() - t > self.config.max_silence);
                if timed_out {
                    self.close_episode().map(EpisodeEvent::EpisodeClosed)
                } else {
                    None
                }
            }
            (DetectorState::Idle, false) => None,
        }
    }

    /// Shutdown flush: whatever is buffered is returned for persistence.
    /// Applies on every exit path, interrupt included.
    pub fn finish(&mut self) -> Option<Episode> {
        self.close_episode()
    }

    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.episode = None;
        self.last_active = None;
    }

    fn close_episode(&mut self) -> Option<Episode> {
        self.state = DetectorState::Idle;
        self.last_active = None;
        // An episode is created with its first block, so it can never
        // be handed out empty.
        match self.episode.take() {
            Some(e) if !e.is_empty() => Some(e),
            _ => None,
        }
    }
}
