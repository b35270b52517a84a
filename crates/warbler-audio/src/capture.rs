use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use warbler_foundation::AudioError;

use super::ring_buffer::AudioProducer;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// Input device name; None selects the host default.
    pub device: Option<String>,
    pub sample_rate_hz: u32,
    pub channels: u16,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate_hz: 44_100,
            channels: 1,
        }
    }
}

#[derive(Debug, Default)]
pub struct CaptureStats {
    pub callbacks: AtomicU64,
    pub samples_captured: AtomicU64,
    pub samples_dropped: AtomicU64,
    pub stream_errors: AtomicU64,
}

/// Owns the cpal input stream. The callback converts whatever sample
/// format the device delivers to i16 and pushes into the ring buffer;
/// the processing loop pulls blocks out on its own schedule. Dropping
/// the capture stops the stream, so the device is released on every
/// exit path.
pub struct AudioCapture {
    _stream: Stream,
    stats: Arc<CaptureStats>,
    failed: Arc<AtomicBool>,
}

impl AudioCapture {
    pub fn start(config: &CaptureConfig, producer: AudioProducer) -> Result<Self, AudioError> {
        let host = cpal::default_host();
        let device = match &config.device {
            Some(name) => host
                .input_devices()
                .map_err(|e| AudioError::Fatal(format!("Failed to enumerate devices: {}", e)))?
                .find(|d| d.name().map(|n| n == *name).unwrap_or(false))
                .ok_or_else(|| AudioError::DeviceNotFound {
                    name: Some(name.clone()),
                })?,
            None => host
                .default_input_device()
                .ok_or(AudioError::DeviceNotFound { name: None })?,
        };
        if let Ok(name) = device.name() {
            tracing::info!("Selected input device: {}", name);
        }

        let sample_format = device.default_input_config()?.sample_format();
        let stream_config = StreamConfig {
            channels: config.channels,
            sample_rate: cpal::SampleRate(config.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        let stats = Arc::new(CaptureStats::default());
        let failed = Arc::new(AtomicBool::new(false));
        let stream = Self::build_stream(
            &device,
            &stream_config,
            sample_format,
            producer,
            stats.clone(),
            failed.clone(),
        )?;
        stream.play()?;
        tracing::info!(
            rate = config.sample_rate_hz,
            channels = config.channels,
            format = ?sample_format,
            "Audio stream started"
        );

        Ok(Self {
            _stream: stream,
            stats,
            failed,
        })
    }

    pub fn stats(&self) -> Arc<CaptureStats> {
        self.stats.clone()
    }

    /// True once the stream reported an unrecoverable error (typically a
    /// disconnected device). No frames will arrive after this.
    pub fn is_failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    fn build_stream(
        device: &cpal::Device,
        config: &StreamConfig,
        sample_format: SampleFormat,
        producer: AudioProducer,
        stats: Arc<CaptureStats>,
        failed: Arc<AtomicBool>,
    ) -> Result<Stream, AudioError> {
        let producer = Arc::new(Mutex::new(producer));

        let err_stats = stats.clone();
        let err_fn = move |err: cpal::StreamError| {
            tracing::error!("Audio stream error: {}", err);
            err_stats.stream_errors.fetch_add(1, Ordering::Relaxed);
            failed.store(true, Ordering::SeqCst);
        };

        // Common path once the callback data is i16.
        let handle_i16 = move |data: &[i16]| {
            stats.callbacks.fetch_add(1, Ordering::Relaxed);
            let written = producer.lock().write(data);
            stats
                .samples_captured
                .fetch_add(written as u64, Ordering::Relaxed);
            if written < data.len() {
                stats
                    .samples_dropped
                    .fetch_add((data.len() - written) as u64, Ordering::Relaxed);
            }
        };

        // Avoid allocating in the audio callback for converted formats.
        thread_local! {
            static CONVERT_BUFFER: std::cell::RefCell<Vec<i16>> =
                const { std::cell::RefCell::new(Vec::new()) };
        }

        let stream = match sample_format {
            SampleFormat::I16 => device.build_input_stream(
                config,
                move |data: &[i16], _: &_| {
                    handle_i16(data);
                },
                err_fn,
                None,
            )?,
            SampleFormat::F32 => device.build_input_stream(
                config,
                move |data: &[f32], _: &_| {
                    CONVERT_BUFFER.with(|buf| {
                        let mut converted = buf.borrow_mut();
                        converted.clear();
                        converted.reserve(data.len());
                        for &s in data {
                            let clamped = s.clamp(-1.0, 1.0);
                            converted.push((clamped * 32767.0).round() as i16);
                        }
                        handle_i16(&converted);
                    });
                },
                err_fn,
                None,
            )?,
            SampleFormat::U16 => device.build_input_stream(
                config,
                move |data: &[u16], _: &_| {
                    CONVERT_BUFFER.with(|buf| {
                        let mut converted = buf.borrow_mut();
                        converted.clear();
                        converted.reserve(data.len());
                        for &s in data {
                            converted.push((s as i32 - 32768) as i16);
                        }
                        handle_i16(&converted);
                    });
                },
                err_fn,
                None,
            )?,
            other => {
                return Err(AudioError::FormatNotSupported {
                    format: format!("{:?}", other),
                });
            }
        };

        Ok(stream)
    }
}
