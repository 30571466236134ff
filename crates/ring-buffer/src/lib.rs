//! Fixed-Record Ring Buffer
//!
//! Circular byte store for crash and telemetry records. Storage is borrowed
//! from the caller (typically a statically allocated block), the capacity is
//! aligned to whole records, and old records are silently overwritten.

mod buffer;
mod error;
mod record;

pub use buffer::RingBuffer;
pub use error::RingBufferError;
pub use record::{Record, RecordRing};
