//! Ring Buffer Error Types

use thiserror::Error;

/// Errors raised at the ring buffer API boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RingBufferError {
    /// Record size of zero
    #[error("Record size must be non-zero")]
    ZeroRecordSize,

    /// Requested size smaller than a single record
    #[error("Requested size {requested} bytes cannot hold one {record_size}-byte record")]
    CapacityTooSmall { requested: usize, record_size: usize },

    /// Backing storage shorter than the requested size
    #[error("Storage of {available} bytes is smaller than requested {requested} bytes")]
    StorageTooSmall { available: usize, requested: usize },

    /// Pushed data is not exactly one record
    #[error("Record must be {expected} bytes, got {actual}")]
    RecordSizeMismatch { expected: usize, actual: usize },

    /// Window byte length does not fit in `usize`
    #[error("Window of {count} records of {record_size} bytes overflows")]
    WindowTooLarge { count: usize, record_size: usize },

    /// Destination cannot hold the requested window
    #[error("Destination holds {available} bytes, window needs {required}")]
    DestinationTooSmall { required: usize, available: usize },
}
