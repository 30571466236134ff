//! Typed Records over the Byte Ring

use crate::{RingBuffer, RingBufferError};
use std::marker::PhantomData;

/// A value with a fixed-size byte layout
pub trait Record: Sized {
    /// Encoded size in bytes
    const SIZE: usize;

    /// Write the encoding into `out` (exactly `SIZE` bytes)
    fn encode(&self, out: &mut [u8]);

    /// Read a value back from `bytes` (exactly `SIZE` bytes)
    fn decode(bytes: &[u8]) -> Self;
}

/// Ring buffer of typed records
pub struct RecordRing<'a, R: Record> {
    inner: RingBuffer<'a>,
    /// Encode buffer, allocated once so pushes stay allocation free
    scratch: Vec<u8>,
    _record: PhantomData<R>,
}

impl<'a, R: Record> RecordRing<'a, R> {
    /// Create a typed ring spanning the whole storage slice
    pub fn new(storage: &'a mut [u8]) -> Result<Self, RingBufferError> {
        Self::from_ring(RingBuffer::over(storage, R::SIZE)?)
    }

    /// Wrap an existing byte ring whose record size matches `R`
    pub fn from_ring(inner: RingBuffer<'a>) -> Result<Self, RingBufferError> {
        if inner.record_size() != R::SIZE {
            return Err(RingBufferError::RecordSizeMismatch {
                expected: R::SIZE,
                actual: inner.record_size(),
            });
        }
        Ok(Self {
            inner,
            scratch: vec![0u8; R::SIZE],
            _record: PhantomData,
        })
    }

    /// Encode and push one record
    pub fn push_record(&mut self, record: &R) -> Result<(), RingBufferError> {
        record.encode(&mut self.scratch);
        self.inner.push(&self.scratch)
    }

    /// Decode the record at logical `index`
    pub fn record_at(&self, index: usize) -> R {
        R::decode(self.inner.get_at_index(index))
    }

    /// Decode the newest `count` valid records, oldest first
    pub fn latest(&self, count: usize) -> Result<Vec<R>, RingBufferError> {
        let count = count.min(self.inner.len());
        let mut bytes = vec![0u8; count * R::SIZE];
        let copied = self.inner.pop_latest(count, &mut bytes)?;
        Ok(bytes[..copied * R::SIZE]
            .chunks_exact(R::SIZE)
            .map(R::decode)
            .collect())
    }

    /// Byte-level ring
    pub fn inner(&self) -> &RingBuffer<'a> {
        &self.inner
    }
}
