use parking_lot::Mutex;
use ringbuf::{traits::*, HeapRb};
use std::sync::Arc;

/// Thread-safe ring buffer of mono samples shared between the capture
/// callback and the session worker. When full, the oldest samples are
/// dropped so live metering never stalls the audio thread.
pub struct SampleRingBuffer {
    inner: Arc<Mutex<HeapRb<f32>>>,
}

impl SampleRingBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HeapRb::new(capacity))),
        }
    }

    /// Append samples, evicting the oldest on overflow
    pub fn write(&self, samples: &[f32]) {
        let mut rb = self.inner.lock();
        for &sample in samples {
            if rb.try_push(sample).is_err() {
                let _ = rb.try_pop();
                let _ = rb.try_push(sample);
            }
        }
    }

    /// Take up to `count` samples, oldest first
    pub fn read(&self, count: usize) -> Vec<f32> {
        let mut rb = self.inner.lock();
        let mut out = Vec::with_capacity(count.min(rb.occupied_len()));
        for _ in 0..count {
            match rb.try_pop() {
                Some(sample) => out.push(sample),
                None => break,
            }
        }
        out
    }

    /// Take everything currently buffered
    pub fn drain(&self) -> Vec<f32> {
        let available = self.len();
        self.read(available)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().occupied_len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn clear(&self) {
        self.inner.lock().clear();
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity().get()
    }
}

impl Clone for SampleRingBuffer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_then_read() {
        let buffer = SampleRingBuffer::new(256);
        let data: Vec<f32> = (0..100).map(|i| i as f32).collect();

        buffer.write(&data);
        assert_eq!(buffer.len(), 100);
        assert_eq!(buffer.read(100), data);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_overflow_keeps_newest() {
        let buffer = SampleRingBuffer::new(10);
        let data: Vec<f32> = (0..20).map(|i| i as f32).collect();

        buffer.write(&data);
        let out = buffer.read(20);
        assert_eq!(out.len(), 10);
        assert_eq!(out[0], 10.0);
        assert_eq!(out[9], 19.0);
    }

    #[test]
    fn test_drain() {
        let buffer = SampleRingBuffer::new(64);
        buffer.write(&[1.0, 2.0, 3.0]);
        assert_eq!(buffer.drain(), vec![1.0, 2.0, 3.0]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_shared_clone() {
        let a = SampleRingBuffer::new(64);
        let b = a.clone();
        a.write(&[0.5; 8]);
        assert_eq!(b.len(), 8);
    }
}
