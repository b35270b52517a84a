//! Lock-free SPSC sample buffer between the stream callback and the
//! processing loop.

use rtrb::{Consumer, Producer, RingBuffer};

pub struct AudioRingBuffer {
    capacity: usize,
}

impl AudioRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        let (producer, consumer) = RingBuffer::new(self.capacity);
        (AudioProducer { inner: producer }, AudioConsumer { inner: consumer })
    }
}

pub struct AudioProducer {
    inner: Producer<i16>,
}

impl AudioProducer {
    /// Write as many samples as fit. Returns the number written; the
    /// caller counts the shortfall as dropped samples.
    pub fn write(&mut self, samples: &[i16]) -> usize {
        let writable = samples.len().min(self.inner.slots());
        if writable == 0 {
            return 0;
        }
        match self.inner.write_chunk_uninit(writable) {
            Ok(chunk) => chunk.fill_from_iter(samples.iter().copied()),
            Err(_) => 0,
        }
    }
}

pub struct AudioConsumer {
    inner: Consumer<i16>,
}

impl AudioConsumer {
    pub fn available(&self) -> usize {
        self.inner.slots()
    }

    /// Read up to `out.len()` samples. Returns the number read.
    pub fn read(&mut self, out: &mut [i16]) -> usize {
        let readable = out.len().min(self.inner.slots());
        if readable == 0 {
            return 0;
        }
        match self.inner.read_chunk(readable) {
            Ok(chunk) => {
                let (first, second) = chunk.as_slices();
                out[..first.len()].copy_from_slice(first);
                out[first.len()..first.len() + second.len()].copy_from_slice(second);
                chunk.commit_all();
                readable
            }
            Err(_) => 0,
        }
    }
}
