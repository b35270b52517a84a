use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;

use warbler_app::pipeline::{run_pipeline, CaptureSource};
use warbler_app::settings::Settings;
use warbler_app::snippet::WavSnippetWriter;
use warbler_audio::{AudioCapture, AudioRingBuffer, BlockReader};
use warbler_detect::constants::CHANNELS_MONO;
use warbler_detect::EpisodeTracker;
use warbler_dsp::SpectralAnalyzer;
use warbler_foundation::{real_clock, ShutdownToken};

/// Ring buffer headroom in blocks. Enough to ride out a synchronous
/// snippet write without the callback dropping samples.
const RING_BUFFER_BLOCKS: usize = 32;

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all("logs")?;
    let file_appender = RollingFileAppender::new(Rotation::DAILY, "logs", "warbler.log");
    let (non_blocking_file, _guard) = tracing_appender::non_blocking(file_appender);
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout.and(non_blocking_file))
        .with_env_filter(log_level)
        .init();
    std::mem::forget(_guard);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    init_logging().map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let settings = Settings::load()?;
    tracing::info!(
        block_size = settings.block_size_samples,
        sample_rate = settings.sample_rate_hz,
        band = format!("{}-{} Hz", settings.min_frequency_hz, settings.max_frequency_hz),
        output_dir = %settings.output_dir.display(),
        "Starting warbler"
    );

    let shutdown = ShutdownToken::new().install()?;

    let ring = AudioRingBuffer::new(settings.block_size_samples * RING_BUFFER_BLOCKS);
    let (producer, consumer) = ring.split();
    let capture = AudioCapture::start(&settings.capture(), producer)?;
    let reader = BlockReader::new(consumer, settings.block_size_samples);
    let mut source = CaptureSource::new(capture, reader, shutdown.clone());

    let mut analyzer = SpectralAnalyzer::new(
        settings.sample_rate_hz,
        settings.min_frequency_hz,
        settings.max_frequency_hz,
    );
    let mut tracker = EpisodeTracker::new(settings.detector(), real_clock());
    let mut sink = WavSnippetWriter::new(
        settings.output_dir.clone(),
        settings.sample_rate_hz,
        CHANNELS_MONO,
    );

    tracing::info!("Recording...");
    let summary = run_pipeline(&mut source, &mut analyzer, &mut tracker, &mut sink, &shutdown)?;

    tracing::info!(
        blocks = summary.blocks_processed,
        episodes = summary.episodes_written,
        failed_writes = summary.writes_failed,
        "Recording stopped"
    );
    Ok(())
}
