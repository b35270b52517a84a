/// One capture buffer of mono signed 16-bit samples. Immutable once
/// produced; either dropped or moved into the live episode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBlock {
    samples: Vec<i16>,
}

impl AudioBlock {
    pub fn new(samples: Vec<i16>) -> Self {
        Self { samples }
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Per-block analysis attached to one [`AudioBlock`]. `dominant_hz` is
/// present only when the spectral peak of the band-filtered block fell
/// inside the configured frequency band.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockAnalysis {
    pub rms: f32,
    pub dominant_hz: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    Idle,
    Capturing,
}

/// A contiguous run of blocks believed to contain a bird call plus
/// trailing context, from the first qualifying block until the silence
/// timeout lapses. Created non-empty and only ever appended to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    blocks: Vec<AudioBlock>,
}

impl Episode {
    pub(crate) fn starting_with(block: AudioBlock) -> Self {
        Self {
            blocks: vec![block],
        }
    }

    /// Assemble an episode from pre-recorded blocks. None when `blocks`
    /// is empty; an episode can never exist without content.
    pub fn from_blocks(blocks: Vec<AudioBlock>) -> Option<Self> {
        if blocks.is_empty() {
            None
        } else {
            Some(Self { blocks })
        }
    }

    pub(crate) fn push(&mut self, block: AudioBlock) {
        self.blocks.push(block);
    }

    pub fn blocks(&self) -> &[AudioBlock] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn total_samples(&self) -> usize {
        self.blocks.iter().map(|b| b.len()).sum()
    }

    /// Samples of every block in capture order.
    pub fn iter_samples(&self) -> impl Iterator<Item = i16> + '_ {
        self.blocks.iter().flat_map(|b| b.samples().iter().copied())
    }
}

/// Emitted by the tracker as blocks flow through it.
#[derive(Debug)]
pub enum EpisodeEvent {
    /// A qualifying block opened a new episode.
    CallStarted { frequency_hz: f32, rms: f32 },
    /// The silence timeout lapsed; the episode is ready to persist.
    EpisodeClosed(Episode),
}
