//! GATT Error Types

use ring_buffer::RingBufferError;
use thiserror::Error;

/// Errors returned to the Bluetooth stack for attribute access
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GattError {
    /// Handle outside the attribute table
    #[error("Unknown attribute handle 0x{0:04X}")]
    UnknownHandle(u16),

    /// Table does not fit in the handle space
    #[error("Start handle 0x{0:04X} leaves no room for the attribute table")]
    InvalidHandleRange(u16),

    /// Attribute is not readable
    #[error("Read not permitted on handle 0x{0:04X}")]
    ReadNotPermitted(u16),

    /// Attribute is not writable
    #[error("Write not permitted on handle 0x{0:04X}")]
    WriteNotPermitted(u16),

    /// Written value has the wrong length
    #[error("Invalid value length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Written value outside the accepted range
    #[error("Value {value} out of range [{min}, {max}]")]
    ValueOutOfRange { value: usize, min: usize, max: usize },

    /// Read offset past the value or not record aligned
    #[error("Invalid read offset {0}")]
    InvalidOffset(usize),

    /// Value encoding failed
    #[error("Encoding error: {0}")]
    Encode(String),

    /// Ring buffer access failed
    #[error("Ring buffer error: {0}")]
    Ring(#[from] RingBufferError),
}

impl GattError {
    /// ATT protocol error code reported to the client
    pub fn att_code(&self) -> u8 {
        match self {
            GattError::UnknownHandle(_) | GattError::InvalidHandleRange(_) => 0x01,
            GattError::ReadNotPermitted(_) => 0x02,
            GattError::WriteNotPermitted(_) => 0x03,
            GattError::InvalidOffset(_) => 0x07,
            GattError::InvalidLength { .. } => 0x0D,
            GattError::ValueOutOfRange { .. } => 0x13,
            GattError::Encode(_) | GattError::Ring(_) => 0x0E,
        }
    }
}
