//! CrashBuddy GATT Service
//!
//! Attribute table, handle assignment and read/write handling for the
//! crash data service. The Bluetooth stack itself lives outside this crate;
//! it forwards attribute reads and writes by handle.

mod attribute;
mod error;
mod service;
mod table;

pub use attribute::{AttributeIndex, AttributeKind, ATTRIBUTE_COUNT};
pub use error::GattError;
pub use service::{CrashService, CrashServiceConfig, DeviceStatus, Notification, StatusReport};
pub use table::{AttributeEntry, AttributeTable};

/// Largest attribute value the service will produce or accept
pub const MAX_ATTRIBUTE_LEN: usize = 512;

/// Characteristic property bits
pub mod property {
    /// Value may be read
    pub const READ: u8 = 0x02;
    /// Value may be written with response
    pub const WRITE: u8 = 0x08;
    /// Value changes may be notified
    pub const NOTIFY: u8 = 0x10;
}

/// Attribute permission bits
pub mod permission {
    /// Client may read
    pub const READABLE: u8 = 0x01;
    /// Client may write
    pub const WRITABLE: u8 = 0x02;
}

/// 16-bit UUIDs used by the table
pub mod uuid16 {
    /// Primary service declaration
    pub const PRIMARY_SERVICE: u16 = 0x2800;
    /// Characteristic declaration
    pub const CHARACTERISTIC: u16 = 0x2803;
    /// CrashBuddy service
    pub const CRASH_SERVICE: u16 = 0x00FF;
    /// Device status
    pub const STATUS: u16 = 0xFF01;
    /// Crash data available flag
    pub const DATA_AVAILABLE: u16 = 0xFF02;
    /// Logged data size in bytes
    pub const DATA_SIZE: u16 = 0xFF03;
    /// Crash threshold (milli-g)
    pub const SET_THRESHOLD: u16 = 0xFF04;
    /// Debug output switch
    pub const SET_ENABLE_DEBUG: u16 = 0xFF05;
    /// Bytes per data points read
    pub const CRASH_DATA_CHAR_SIZE: u16 = 0xFF06;
    /// Logged data points
    pub const DATA_POINTS: u16 = 0xFF07;
}
