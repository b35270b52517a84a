pub mod block_reader;
pub mod capture;
pub mod ring_buffer;

pub use block_reader::BlockReader;
pub use capture::{AudioCapture, CaptureConfig, CaptureStats};
pub use ring_buffer::{AudioConsumer, AudioProducer, AudioRingBuffer};
