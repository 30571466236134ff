//! Fixed-Record Byte Ring Buffer

use crate::RingBufferError;
use tracing::debug;

/// Fixed-capacity circular byte store of equally sized records.
///
/// The buffer borrows its storage for its whole lifetime and never
/// allocates. Pushing past capacity silently overwrites the oldest record.
///
/// Single-writer contract: `push` needs `&mut self`, every read takes
/// `&self`. Sharing one buffer between a producer and a consumer running
/// in different contexts requires an external lock.
pub struct RingBuffer<'a> {
    /// Borrowed backing memory
    storage: &'a mut [u8],
    /// Bytes per record
    record_size: usize,
    /// Usable bytes, always a multiple of `record_size`
    capacity: usize,
    /// Byte offset of the next write (oldest record once wrapped)
    cursor: usize,
    /// Total records pushed since construction
    total_written: u64,
}

impl<'a> RingBuffer<'a> {
    /// Create a ring over the first `requested_size` bytes of `storage`.
    ///
    /// Capacity is aligned down to a multiple of `record_size`, so a
    /// partial record never straddles the wrap point.
    pub fn new(
        storage: &'a mut [u8],
        requested_size: usize,
        record_size: usize,
    ) -> Result<Self, RingBufferError> {
        if record_size == 0 {
            return Err(RingBufferError::ZeroRecordSize);
        }
        if storage.len() < requested_size {
            return Err(RingBufferError::StorageTooSmall {
                available: storage.len(),
                requested: requested_size,
            });
        }
        if requested_size < record_size {
            return Err(RingBufferError::CapacityTooSmall {
                requested: requested_size,
                record_size,
            });
        }

        let capacity = requested_size / record_size * record_size;
        debug!(
            "Ring buffer created: {} records of {} bytes ({} of {} bytes used)",
            capacity / record_size,
            record_size,
            capacity,
            requested_size
        );

        Ok(Self {
            storage,
            record_size,
            capacity,
            cursor: 0,
            total_written: 0,
        })
    }

    /// Create a ring spanning the whole storage slice
    pub fn over(storage: &'a mut [u8], record_size: usize) -> Result<Self, RingBufferError> {
        let len = storage.len();
        Self::new(storage, len, record_size)
    }

    /// Push one record, overwriting the oldest if the ring is full
    pub fn push(&mut self, data: &[u8]) -> Result<(), RingBufferError> {
        if data.len() != self.record_size {
            return Err(RingBufferError::RecordSizeMismatch {
                expected: self.record_size,
                actual: data.len(),
            });
        }

        self.storage[self.cursor..self.cursor + self.record_size].copy_from_slice(data);
        self.cursor = (self.cursor + self.record_size) % self.capacity;
        self.total_written += 1;
        Ok(())
    }

    /// Copy `count` records starting at logical `offset` into `destination`.
    ///
    /// The window is reconstructed linearly regardless of where it wraps,
    /// and may span more than one full capacity.
    pub fn pop(
        &self,
        offset: usize,
        count: usize,
        destination: &mut [u8],
    ) -> Result<(), RingBufferError> {
        let total = count
            .checked_mul(self.record_size)
            .ok_or(RingBufferError::WindowTooLarge {
                count,
                record_size: self.record_size,
            })?;
        if destination.len() < total {
            return Err(RingBufferError::DestinationTooSmall {
                required: total,
                available: destination.len(),
            });
        }

        let mut index = self.byte_offset(offset);
        let mut filled = 0;
        while filled < total {
            let chunk = (total - filled).min(self.capacity - index);
            destination[filled..filled + chunk]
                .copy_from_slice(&self.storage[index..index + chunk]);
            filled += chunk;
            index = (index + chunk) % self.capacity;
        }
        Ok(())
    }

    /// Copy the newest `count` valid records, oldest first.
    ///
    /// Returns how many records were copied, which is less than `count`
    /// when the ring holds fewer valid records.
    pub fn pop_latest(
        &self,
        count: usize,
        destination: &mut [u8],
    ) -> Result<usize, RingBufferError> {
        let count = count.min(self.len());
        let offset = self.capacity_records() - count;
        self.pop(offset, count, destination)?;
        Ok(count)
    }

    /// Byte offset of the next write
    pub fn get_index(&self) -> usize {
        self.cursor
    }

    /// Borrow the record at logical `index` without copying
    pub fn get_at_index(&self, index: usize) -> &[u8] {
        let start = self.byte_offset(index);
        &self.storage[start..start + self.record_size]
    }

    /// Bytes per record
    pub fn record_size(&self) -> usize {
        self.record_size
    }

    /// Usable bytes of storage
    pub fn capacity_bytes(&self) -> usize {
        self.capacity
    }

    /// Number of record slots
    pub fn capacity_records(&self) -> usize {
        self.capacity / self.record_size
    }

    /// Number of valid records held
    pub fn len(&self) -> usize {
        let slots = self.capacity_records();
        if self.total_written >= slots as u64 {
            slots
        } else {
            self.total_written as usize
        }
    }

    /// Check whether nothing has been pushed yet
    pub fn is_empty(&self) -> bool {
        self.total_written == 0
    }

    /// Logical offset of the oldest valid record (0 once wrapped)
    pub fn oldest_offset(&self) -> usize {
        self.capacity_records() - self.len()
    }

    /// Total records pushed since construction
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Physical byte offset of logical record `index`
    fn byte_offset(&self, index: usize) -> usize {
        // Reduce first so huge indices cannot overflow the multiply
        let records = index % self.capacity_records();
        (self.cursor + records * self.record_size) % self.capacity
    }
}

impl std::fmt::Debug for RingBuffer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RingBuffer")
            .field("record_size", &self.record_size)
            .field("capacity", &self.capacity)
            .field("cursor", &self.cursor)
            .field("total_written", &self.total_written)
            .finish()
    }
}
