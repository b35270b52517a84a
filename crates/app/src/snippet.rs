use chrono::Local;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;

use warbler_detect::Episode;

#[derive(Error, Debug)]
pub enum SnippetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}

/// Persistence seam for closed episodes, so the pipeline can be tested
/// against an in-memory sink.
pub trait SnippetSink {
    fn write_episode(&mut self, episode: &Episode) -> Result<PathBuf, SnippetError>;
}

/// Writes each episode as one standard uncompressed PCM WAV file under
/// the output directory, named by flush time to microsecond precision
/// so rapid consecutive episodes never collide.
pub struct WavSnippetWriter {
    output_dir: PathBuf,
    spec: WavSpec,
}

impl WavSnippetWriter {
    pub fn new(output_dir: PathBuf, sample_rate_hz: u32, channels: u16) -> Self {
        Self {
            output_dir,
            spec: WavSpec {
                channels,
                sample_rate: sample_rate_hz,
                bits_per_sample: 16,
                sample_format: SampleFormat::Int,
            },
        }
    }
}

impl SnippetSink for WavSnippetWriter {
    fn write_episode(&mut self, episode: &Episode) -> Result<PathBuf, SnippetError> {
        fs::create_dir_all(&self.output_dir)?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S_%6f");
        let path = self
            .output_dir
            .join(format!("possible_bird_call_{}.wav", timestamp));

        let mut writer = WavWriter::create(&path, self.spec)?;
        for sample in episode.iter_samples() {
            writer.write_sample(sample)?;
        }
        writer.finalize()?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warbler_detect::AudioBlock;

    fn episode(blocks: usize, samples_per_block: usize) -> Episode {
        let blocks = (0..blocks)
            .map(|b| {
                AudioBlock::new(
                    (0..samples_per_block)
                        .map(|i| (b * samples_per_block + i) as i16)
                        .collect(),
                )
            })
            .collect();
        Episode::from_blocks(blocks).unwrap()
    }

    #[test]
    fn writes_playable_wav_with_all_samples() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = WavSnippetWriter::new(dir.path().to_path_buf(), 44_100, 1);

        let episode = episode(3, 1024);
        let path = writer.write_episode(&episode).unwrap();

        let reader = hound::WavReader::open(&path).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 44_100);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 3 * 1024);
        assert_eq!(samples, episode.iter_samples().collect::<Vec<_>>());
    }

    #[test]
    fn filenames_are_timestamped_and_unique() {
        let dir = tempfile::tempdir().unwrap();
        let mut writer = WavSnippetWriter::new(dir.path().to_path_buf(), 44_100, 1);

        let episode = episode(1, 64);
        let first = writer.write_episode(&episode).unwrap();
        let second = writer.write_episode(&episode).unwrap();

        assert_ne!(first, second);
        for path in [&first, &second] {
            let name = path.file_name().unwrap().to_string_lossy();
            assert!(name.starts_with("possible_bird_call_"));
            assert!(name.ends_with(".wav"));
        }
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("calls").join("today");
        let mut writer = WavSnippetWriter::new(nested.clone(), 44_100, 1);

        let path = writer.write_episode(&episode(1, 16)).unwrap();
        assert!(nested.is_dir());
        assert!(path.exists());
    }
}
