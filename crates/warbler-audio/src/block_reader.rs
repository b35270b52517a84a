use std::time::Duration;

use super::ring_buffer::AudioConsumer;

/// Polling interval while waiting for the callback thread to fill a
/// block. At 44.1 kHz a 1024-sample block arrives every ~23 ms, so 5 ms
/// keeps latency low without spinning.
const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Pulls fixed-size blocks out of the capture ring buffer. This is the
/// processing loop's only suspension point: `read_block` parks until a
/// full block is available or `stopped` reports that no more data will
/// come.
pub struct BlockReader {
    consumer: AudioConsumer,
    block_size: usize,
}

impl BlockReader {
    pub fn new(consumer: AudioConsumer, block_size: usize) -> Self {
        Self {
            consumer,
            block_size,
        }
    }

    /// Block until a full block of samples is available and return it.
    /// Returns None once `stopped` is true and the buffer no longer
    /// holds a full block; a trailing partial block is discarded.
    pub fn read_block(&mut self, stopped: impl Fn() -> bool) -> Option<Vec<i16>> {
        loop {
            if self.consumer.available() >= self.block_size {
                let mut block = vec![0i16; self.block_size];
                let read = self.consumer.read(&mut block);
                debug_assert_eq!(read, self.block_size);
                return Some(block);
            }
            if stopped() {
                return None;
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}
