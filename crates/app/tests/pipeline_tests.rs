use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use warbler_app::pipeline::{run_pipeline, BlockSource};
use warbler_app::snippet::{SnippetError, SnippetSink};
use warbler_detect::{
    AudioBlock, BlockAnalysis, BlockAnalyzer, DetectorConfig, Episode, EpisodeTracker,
};
use warbler_dsp::SpectralAnalyzer;
use warbler_foundation::{real_clock, AudioError, ShutdownToken, TestClock};

const BLOCK_SIZE: usize = 1024;
const SAMPLE_RATE: u32 = 44_100;

struct VecSource {
    blocks: VecDeque<AudioBlock>,
    fail_at_end: bool,
}

impl VecSource {
    fn new(blocks: Vec<AudioBlock>) -> Self {
        Self {
            blocks: blocks.into(),
            fail_at_end: false,
        }
    }

    /// Stream that ends in a device disconnect instead of normal EOF.
    fn failing(blocks: Vec<AudioBlock>) -> Self {
        Self {
            blocks: blocks.into(),
            fail_at_end: true,
        }
    }
}

impl BlockSource for VecSource {
    fn next_block(&mut self) -> Result<Option<AudioBlock>, AudioError> {
        match self.blocks.pop_front() {
            Some(block) => Ok(Some(block)),
            None if self.fail_at_end => Err(AudioError::DeviceDisconnected),
            None => Ok(None),
        }
    }
}

struct ScriptedAnalyzer {
    script: VecDeque<BlockAnalysis>,
}

impl ScriptedAnalyzer {
    fn new(script: Vec<BlockAnalysis>) -> Self {
        Self {
            script: script.into(),
        }
    }
}

impl BlockAnalyzer for ScriptedAnalyzer {
    fn analyze(&mut self, _samples: &[i16]) -> BlockAnalysis {
        self.script.pop_front().expect("script exhausted")
    }
}

#[derive(Default)]
struct RecordingSink {
    episodes: Vec<Episode>,
    fail_writes: bool,
}

impl SnippetSink for RecordingSink {
    fn write_episode(&mut self, episode: &Episode) -> Result<PathBuf, SnippetError> {
        assert!(!episode.is_empty(), "a flush must never be empty");
        if self.fail_writes {
            return Err(SnippetError::Io(std::io::Error::other("disk full")));
        }
        self.episodes.push(episode.clone());
        Ok(PathBuf::from(format!(
            "snippet_{}.wav",
            self.episodes.len()
        )))
    }
}

fn tone_block(freq_hz: f32, amplitude: f32) -> AudioBlock {
    let samples = (0..BLOCK_SIZE)
        .map(|i| {
            let phase = 2.0 * std::f32::consts::PI * freq_hz * i as f32 / SAMPLE_RATE as f32;
            (phase.sin() * amplitude) as i16
        })
        .collect();
    AudioBlock::new(samples)
}

fn silent_block() -> AudioBlock {
    AudioBlock::new(vec![0i16; BLOCK_SIZE])
}

fn qualifying() -> BlockAnalysis {
    BlockAnalysis {
        rms: 5_000.0,
        dominant_hz: Some(3_000.0),
    }
}

fn quiet() -> BlockAnalysis {
    BlockAnalysis {
        rms: 100.0,
        dominant_hz: None,
    }
}

#[test]
fn forty_tone_blocks_flush_as_one_episode_at_stream_end() {
    // End-to-end with the real spectral analyzer: 40 consecutive 3 kHz
    // tone blocks, then the stream ends.
    let blocks: Vec<AudioBlock> = (0..40).map(|_| tone_block(3_000.0, 8_000.0)).collect();
    let mut source = VecSource::new(blocks);
    let mut analyzer = SpectralAnalyzer::new(SAMPLE_RATE, 1_000.0, 10_000.0);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();

    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    assert_eq!(summary.blocks_processed, 40);
    assert_eq!(summary.episodes_written, 1);
    assert_eq!(sink.episodes.len(), 1);
    assert_eq!(sink.episodes[0].len(), 40);
    assert_eq!(sink.episodes[0].total_samples(), 40 * BLOCK_SIZE);
}

#[test]
fn all_silent_stream_writes_nothing() {
    let blocks: Vec<AudioBlock> = (0..40).map(|_| silent_block()).collect();
    let mut source = VecSource::new(blocks);
    let mut analyzer = SpectralAnalyzer::new(SAMPLE_RATE, 1_000.0, 10_000.0);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();

    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    assert_eq!(summary.blocks_processed, 40);
    assert_eq!(summary.episodes_written, 0);
    assert!(sink.episodes.is_empty());
}

#[test]
fn single_qualifying_block_is_flushed_on_shutdown() {
    let mut source = VecSource::new(vec![tone_block(3_000.0, 8_000.0)]);
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying()]);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();

    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    assert_eq!(summary.episodes_written, 1);
    assert_eq!(sink.episodes[0].len(), 1);
}

#[test]
fn device_failure_still_flushes_the_open_episode() {
    let mut source = VecSource::failing(vec![tone_block(3_000.0, 8_000.0)]);
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying()]);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();

    let result = run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown);

    assert!(result.is_err(), "disconnect must surface as an error");
    assert_eq!(sink.episodes.len(), 1, "flush happens before exiting");
}

#[test]
fn triggered_shutdown_flushes_before_reading_more() {
    let mut source = VecSource::new(vec![
        tone_block(3_000.0, 8_000.0),
        tone_block(3_000.0, 8_000.0),
    ]);
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying(), qualifying()]);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();
    shutdown.trigger();

    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    // Nothing was read and nothing was buffered, so nothing flushes.
    assert_eq!(summary.blocks_processed, 0);
    assert_eq!(summary.episodes_written, 0);
}

#[test]
fn failed_write_is_counted_and_does_not_abort() {
    let mut source = VecSource::new(vec![tone_block(3_000.0, 8_000.0)]);
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying()]);
    let mut tracker = EpisodeTracker::new(DetectorConfig::default(), real_clock());
    let mut sink = RecordingSink {
        fail_writes: true,
        ..Default::default()
    };
    let shutdown = ShutdownToken::new();

    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    assert_eq!(summary.writes_failed, 1);
    assert_eq!(summary.episodes_written, 0);
    assert!(sink.episodes.is_empty());
}

#[test]
fn silence_timeout_splits_two_calls_into_two_snippets() {
    let clock = Arc::new(TestClock::new());
    let config = DetectorConfig {
        max_silence: Duration::from_secs(30),
        ..Default::default()
    };
    let mut tracker = EpisodeTracker::new(config, clock.clone());
    let mut sink = RecordingSink::default();
    let shutdown = ShutdownToken::new();

    // First call, then a quiet stretch past the timeout, then a second
    // call. Two separate sources stand in for two stretches of stream,
    // advancing the virtual clock between blocks.
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying(), quiet(), quiet()]);
    let mut source = VecSource::new(vec![
        tone_block(3_000.0, 8_000.0),
        silent_block(),
        silent_block(),
    ]);
    // Feed the first stretch block by block, advancing time so the
    // second quiet block lands past the timeout.
    {
        let mut first = VecDeque::new();
        while let Ok(Some(block)) = source.next_block() {
            first.push_back(block);
        }
        let mut events = 0;
        for (i, block) in first.into_iter().enumerate() {
            let analysis = analyzer.analyze(block.samples());
            if tracker.process(block, &analysis).is_some() {
                events += 1;
            }
            if i == 0 {
                clock.advance(Duration::from_secs(31));
            }
        }
        // CallStarted plus EpisodeClosed.
        assert_eq!(events, 2);
    }

    // Second call flushes via the normal end-of-stream path.
    let mut source = VecSource::new(vec![tone_block(3_000.0, 8_000.0)]);
    let mut analyzer = ScriptedAnalyzer::new(vec![qualifying()]);
    let summary =
        run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown).unwrap();

    assert_eq!(summary.episodes_written, 1);
    assert_eq!(sink.episodes.len(), 1);
}
