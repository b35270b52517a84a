use warbler_audio::{AudioCapture, BlockReader};
use warbler_detect::{AudioBlock, BlockAnalyzer, EpisodeTracker};
use warbler_detect::{Episode, EpisodeEvent};
use warbler_foundation::{AppError, AudioError, ShutdownToken};

use crate::snippet::SnippetSink;

/// Pull-based source of fixed-size blocks. The live implementation
/// wraps the capture ring buffer; tests feed pre-built block vectors.
pub trait BlockSource {
    /// Blocks until the next full block is available. Ok(None) means the
    /// stream ended normally (or shutdown was requested mid-wait).
    fn next_block(&mut self) -> Result<Option<AudioBlock>, AudioError>;
}

/// Live microphone source: capture stream feeding a ring buffer, read
/// out in fixed blocks. Owns the stream handle, so dropping the source
/// releases the device no matter how the loop exited.
pub struct CaptureSource {
    capture: AudioCapture,
    reader: BlockReader,
    shutdown: ShutdownToken,
}

impl CaptureSource {
    pub fn new(capture: AudioCapture, reader: BlockReader, shutdown: ShutdownToken) -> Self {
        Self {
            capture,
            reader,
            shutdown,
        }
    }
}

impl BlockSource for CaptureSource {
    fn next_block(&mut self) -> Result<Option<AudioBlock>, AudioError> {
        let capture = &self.capture;
        let shutdown = &self.shutdown;
        let block = self
            .reader
            .read_block(|| shutdown.is_triggered() || capture.is_failed());
        match block {
            Some(samples) => Ok(Some(AudioBlock::new(samples))),
            None if self.capture.is_failed() => Err(AudioError::DeviceDisconnected),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct PipelineSummary {
    pub blocks_processed: u64,
    pub episodes_written: u64,
    pub writes_failed: u64,
}

/// The synchronous capture loop: read block, analyze, step the state
/// machine, persist closed episodes. Runs until the source ends, the
/// shutdown token trips, or the device fails; whatever is still
/// buffered is flushed on the way out in every case.
pub fn run_pipeline<S, A, W>(
    source: &mut S,
    analyzer: &mut A,
    tracker: &mut EpisodeTracker,
    sink: &mut W,
    shutdown: &ShutdownToken,
) -> Result<PipelineSummary, AppError>
where
    S: BlockSource,
    A: BlockAnalyzer,
    W: SnippetSink,
{
    let mut summary = PipelineSummary::default();

    let loop_result = loop {
        if shutdown.is_triggered() {
            break Ok(());
        }
        match source.next_block() {
            Ok(Some(block)) => {
                summary.blocks_processed += 1;
                let analysis = analyzer.analyze(block.samples());
                tracing::trace!(
                    rms = analysis.rms,
                    dominant_hz = ?analysis.dominant_hz,
                    "block analyzed"
                );
                match tracker.process(block, &analysis) {
                    Some(EpisodeEvent::CallStarted { frequency_hz, rms }) => {
                        tracing::info!(frequency_hz, rms, "Bird call detected, recording");
                    }
                    Some(EpisodeEvent::EpisodeClosed(episode)) => {
                        tracing::info!("Max silence reached, closing episode");
                        persist(sink, &episode, &mut summary);
                    }
                    None => {}
                }
            }
            Ok(None) => break Ok(()),
            Err(e) if e.is_fatal() => break Err(e),
            Err(e) => {
                tracing::warn!("Transient capture failure, skipping block: {}", e);
            }
        }
    };

    // Shutdown flush: identical on normal end, interrupt, and failure.
    if let Some(episode) = tracker.finish() {
        tracing::info!(blocks = episode.len(), "Flushing final episode");
        persist(sink, &episode, &mut summary);
    }

    match loop_result {
        Ok(()) => Ok(summary),
        Err(e) => {
            tracing::error!(
                blocks = summary.blocks_processed,
                episodes = summary.episodes_written,
                "Capture loop aborted: {}",
                e
            );
            Err(AppError::Audio(e))
        }
    }
}

/// A failed write loses that episode's audio; the loop keeps running.
fn persist<W: SnippetSink>(sink: &mut W, episode: &Episode, summary: &mut PipelineSummary) {
    match sink.write_episode(episode) {
        Ok(path) => {
            summary.episodes_written += 1;
            tracing::info!(
                path = %path.display(),
                blocks = episode.len(),
                "Saved bird call snippet"
            );
        }
        Err(e) => {
            summary.writes_failed += 1;
            tracing::error!("Failed to save snippet: {}", e);
        }
    }
}
